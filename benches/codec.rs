extern crate criterion;
extern crate zessl;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use zessl::{
    decode::{Decoder, LzssStatus},
    encode::Encoder,
    Padding,
};

pub fn encode_benchmark(c: &mut Criterion, file: &str) {
    let data = fs::read(file).expect("Benchmark input not found");
    let mut group = c.benchmark_group("encode");
    let id = BenchmarkId::new(file, data.len());
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_with_input(id, &data, |b, data| {
        b.iter(|| {
            let mut encoder = Encoder::with_padding(Padding::None);
            let mut buffer = Vec::with_capacity(2 * data.len() + 40);
            encoder
                .into_stream(&mut buffer)
                .encode(data)
                .status
                .expect("Error");
            black_box(&buffer[..]);
        })
    });
}

pub fn decode_benchmark(c: &mut Criterion, file: &str) {
    let raw = fs::read(file).expect("Benchmark input not found");
    let mut encoded = vec![];
    Encoder::with_padding(Padding::Exact)
        .into_stream(&mut encoded)
        .encode(&raw)
        .status
        .expect("Error");

    let mut group = c.benchmark_group("decode");
    let id = BenchmarkId::new(file, encoded.len());
    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_with_input(id, &encoded, |b, data| {
        b.iter(|| {
            let mut decoder = Decoder::new();
            decoder.finish();
            let mut outbuf = vec![0; 1 << 12];
            let mut data = data.as_slice();
            loop {
                let result = decoder.decode_bytes(data, &mut outbuf[..]);
                let done = result.status.expect("Error");
                data = &data[result.consumed_in..];
                black_box(&outbuf[..result.consumed_out]);
                if let LzssStatus::Done = done {
                    break;
                }
                if let LzssStatus::NoProgress = done {
                    panic!("Need to make progress");
                }
            }
        })
    });
}

pub fn bench_toml(c: &mut Criterion) {
    encode_benchmark(c, "Cargo.toml");
    decode_benchmark(c, "Cargo.toml");
}

pub fn bench_encode_src(c: &mut Criterion) {
    encode_benchmark(c, "src/encode.rs");
    decode_benchmark(c, "src/encode.rs");
}

pub fn bench_decode_src(c: &mut Criterion) {
    encode_benchmark(c, "src/decode.rs");
    decode_benchmark(c, "src/decode.rs");
}

criterion_group!(benches, bench_toml, bench_encode_src, bench_decode_src);
criterion_main!(benches);
