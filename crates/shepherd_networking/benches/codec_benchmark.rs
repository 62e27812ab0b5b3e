//! # Codec Benchmark
//!
//! Measures framing throughput:
//! 1. Encoding payloads of typical game sizes
//! 2. Decoding a stream delivered in small reads
//!
//! Run with: `cargo bench --package shepherd_networking`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shepherd_networking::{encode_frame_into, FrameDecoder};

/// Sizes seen in practice: selection packet, setup packet, a large blob.
const PAYLOAD_SIZES: [usize; 3] = [9, 116, 64 * 1024];

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_frame");

    for size in PAYLOAD_SIZES {
        let payload = vec![0x5A_u8; size];
        let mut out = Vec::with_capacity(size + 4);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| {
                out.clear();
                encode_frame_into(black_box(payload), &mut out).unwrap();
                black_box(out.len())
            });
        });
    }

    group.finish();
}

fn bench_decode_fragmented(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_fragmented");

    for chunk in [7_usize, 512, 8192] {
        let mut stream = Vec::new();
        for i in 0..256_u32 {
            let payload = i.to_be_bytes().repeat(29);
            encode_frame_into(&payload, &mut stream).unwrap();
        }
        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &stream, |b, stream| {
            b.iter(|| {
                let mut decoder = FrameDecoder::new();
                let mut frames = 0;
                for piece in stream.chunks(chunk) {
                    decoder.push(piece);
                    while let Some(frame) = decoder.next_frame().unwrap() {
                        black_box(frame);
                        frames += 1;
                    }
                }
                frames
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode_fragmented);
criterion_main!(benches);
