//! Benchmarks for the Pinup ingestion pipeline.
//!
//! Run with: cargo bench -p pinup-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat};
use pinup_core::config::IngestConfig;
use pinup_core::pipeline::{codec, Compressor, ImageIngestor};
use pinup_core::PendingImage;
use std::io::Cursor;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("encode fixture");
    buffer.into_inner()
}

fn benchmark_codec_decode(c: &mut Criterion) {
    // Roughly the size of a compressed 1600px photo
    let data_url = codec::encode(&vec![0xA5u8; 400 * 1024], "image/jpeg");

    c.bench_function("codec_decode_400k", |b| {
        b.iter(|| {
            let _ = codec::decode(black_box(&data_url));
        })
    });
}

fn benchmark_compress(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(4032, 3024);
    let compressor = Compressor::new(&IngestConfig::default());

    c.bench_function("compress_12mp_to_1600", |b| {
        b.iter(|| {
            let _ = compressor.compress_image(black_box(&img));
        })
    });
}

fn benchmark_ingest(c: &mut Criterion) {
    let bytes = png_bytes(1920, 1080);
    let ingestor = ImageIngestor::new(&IngestConfig::default());
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");

    c.bench_function("ingest_1080p_png", |b| {
        b.iter(|| {
            let image = PendingImage::new(black_box(bytes.clone()), "image/png");
            let _ = rt.block_on(ingestor.ingest(image));
        })
    });
}

criterion_group!(
    benches,
    benchmark_codec_decode,
    benchmark_compress,
    benchmark_ingest,
);
criterion_main!(benches);
