//! Performance benchmarks for frame decoding.
//!
//! Every tick of the scan loop decodes one frame, and most frames contain no
//! symbol, so both the miss path and the hit path matter.
//!
//! # Run Benchmarks
//!
//! ```sh
//! # Run all decode benchmarks
//! cargo bench --bench decode_bench
//!
//! # Only the polarity comparison
//! cargo bench --bench decode_bench -- polarity
//!
//! # Compare against a saved baseline
//! cargo bench --bench decode_bench -- --save-baseline before
//! cargo bench --bench decode_bench -- --baseline before
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use qrcode::{Color, QrCode};
use shelfscan_camera::{Frame, PixelFormat};
use shelfscan_decoder::{DecodeOptions, QrDecoder, decode_frame};
use std::hint::black_box;

/// Render `payload` centred in a `side`x`side` greyscale frame.
fn frame_with_symbol(payload: &str, side: usize) -> Frame {
    let code = QrCode::new(payload.as_bytes()).unwrap();
    let modules = code.width();
    let scale = (side / (modules + 8)).max(1);
    let offset = (side - modules * scale) / 2;

    let mut data = vec![u8::MAX; side * side];
    for (i, color) in code.to_colors().iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let (mx, my) = (i % modules, i / modules);
        for dy in 0..scale {
            let row = (offset + my * scale + dy) * side;
            let col = offset + mx * scale;
            data[row + col..row + col + scale].fill(0);
        }
    }

    Frame::new(data, side as u32, side as u32, PixelFormat::Luma8).unwrap()
}

fn blank_frame(width: u32, height: u32) -> Frame {
    Frame::new(
        vec![200u8; (width * height) as usize],
        width,
        height,
        PixelFormat::Luma8,
    )
    .unwrap()
}

/// Frames without a symbol, at common capture sizes.
fn bench_decode_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_miss");
    let decoder = QrDecoder::new();
    let options = DecodeOptions::default();

    for (width, height) in [(320u32, 240u32), (640, 480), (1280, 720)] {
        let frame = blank_frame(width, height);
        group.throughput(Throughput::Elements(u64::from(width * height)));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &frame,
            |b, frame| b.iter(|| black_box(decode_frame(&decoder, black_box(frame), &options))),
        );
    }

    group.finish();
}

/// Frames containing an inventory label.
fn bench_decode_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_hit");
    let decoder = QrDecoder::new();
    let options = DecodeOptions::default();

    for side in [240usize, 480, 720] {
        let frame = frame_with_symbol("INV-0a1B2c3D4e5F6g7H", side);
        group.bench_with_input(BenchmarkId::from_parameter(side), &frame, |b, frame| {
            b.iter(|| black_box(decode_frame(&decoder, black_box(frame), &options)))
        });
    }

    group.finish();
}

/// Cost of the inverted second pass on a frame with nothing in it.
fn bench_polarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("polarity");
    let decoder = QrDecoder::new();
    let frame = blank_frame(640, 480);

    for tolerate in [false, true] {
        let options = DecodeOptions::default().with_tolerate_polarity(tolerate);
        group.bench_with_input(
            BenchmarkId::new("miss_640x480", tolerate),
            &options,
            |b, options| b.iter(|| black_box(decode_frame(&decoder, black_box(&frame), options))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_decode_miss, bench_decode_hit, bench_polarity);
criterion_main!(benches);
