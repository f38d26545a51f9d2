//! Preprocessing and validation latency benchmarks

use bytes::Bytes;
use candle_core::Device;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pokedex_classifier::preprocess::image_to_batch;
use pokedex_classifier::{validate_upload, UploadLimits};
use std::io::Cursor;

fn photo(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

fn encoded(image: &DynamicImage, format: ImageFormat) -> Bytes {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    Bytes::from(buf)
}

fn bench_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocess");

    for (name, image) in [("vga", photo(640, 480)), ("1080p", photo(1920, 1080))] {
        group.bench_function(format!("image_to_batch_{}", name), |b| {
            b.iter(|| image_to_batch(black_box(&image), 224, &Device::Cpu).unwrap())
        });
    }

    group.finish();
}

fn bench_upload(c: &mut Criterion) {
    let mut group = c.benchmark_group("upload");
    let limits = UploadLimits::default();
    let png = encoded(&photo(640, 480), ImageFormat::Png);
    let jpeg = encoded(&photo(640, 480), ImageFormat::Jpeg);

    group.bench_function("validate_png", |b| {
        b.iter(|| validate_upload(black_box(png.clone()), Some("image/png"), &limits).unwrap())
    });

    group.bench_function("validate_and_decode_jpeg", |b| {
        b.iter(|| {
            validate_upload(black_box(jpeg.clone()), Some("image/jpeg"), &limits)
                .unwrap()
                .decode()
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_preprocess, bench_upload);
criterion_main!(benches);
