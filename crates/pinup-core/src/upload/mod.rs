//! Upload stages: key generation, retrying single uploads, and batches.
//!
//! A `BatchCoordinator` walks a batch in order and hands each image to the
//! `UploadOrchestrator`, which owns the retry loop for that image.

pub mod batch;
pub mod key;
pub mod orchestrator;
pub mod retry;

pub use batch::BatchCoordinator;
pub use orchestrator::UploadOrchestrator;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
