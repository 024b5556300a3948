//! Command handlers for the `pinup` binary.

pub mod config;
pub mod encode;
pub mod upload;
