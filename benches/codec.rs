//! Benchmarks for page compression, Reed-Solomon and whole-file decoding

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dwgcodec::io::dwg::compression::{Lz77Ac18Compressor, Lz77Ac18Decompressor};
use dwgcodec::io::dwg::reed_solomon;
use dwgcodec::io::dwg::{Compressor, Decompressor};
use dwgcodec::objects::{Layer, Line};
use dwgcodec::{DwgDocument, DwgObject, DwgVersion, Handle, ObjectData, ObjectRef, Vector3};

/// Page-like payload: repeated records with a varying counter.
fn payload(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| match i % 16 {
            0..=3 => (i / 16) as u8,
            4..=11 => 0x40,
            _ => (i % 7) as u8,
        })
        .collect()
}

fn drawing(version: DwgVersion, lines: u64) -> DwgDocument {
    let mut doc = DwgDocument::new(version);
    doc.add_object(DwgObject::new_object(
        0x33,
        Handle::new(0x10),
        ObjectRef::NULL,
        ObjectData::Layer(Layer::new("0")),
    ));
    for i in 0..lines {
        let x = i as f64;
        doc.add_object(DwgObject::new_entity(
            0x13,
            Handle::new(0x100 + i),
            ObjectRef::NULL,
            Handle::new(0x10),
            ObjectData::Line(Line::from_points(
                Vector3::new(x, 0.0, 0.0),
                Vector3::new(x, 10.0, 0.0),
            )),
        ));
    }
    doc
}

fn benchmark_compression(c: &mut Criterion) {
    let mut group = c.benchmark_group("lz77_ac18");

    for size in [0x400, 0x2000, 0x7400].iter() {
        let data = payload(*size);
        let packed = Lz77Ac18Compressor.compress(&data).unwrap();
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("compress", size), &data, |b, data| {
            b.iter(|| Lz77Ac18Compressor.compress(black_box(data)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("decompress", size), &packed, |b, packed| {
            b.iter(|| {
                Lz77Ac18Decompressor
                    .decompress(black_box(packed), *size)
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn benchmark_reed_solomon(c: &mut Criterion) {
    let mut group = c.benchmark_group("reed_solomon");
    let data = payload(reed_solomon::DATA_SIZE);
    let clean = reed_solomon::encode(&data).unwrap();

    group.bench_function("encode", |b| {
        b.iter(|| reed_solomon::encode(black_box(&data)).unwrap());
    });
    group.bench_function("decode_clean", |b| {
        b.iter(|| {
            let mut block = clean;
            reed_solomon::decode(black_box(&mut block), 0).unwrap()
        });
    });
    group.bench_function("decode_eight_errors", |b| {
        b.iter(|| {
            let mut block = clean;
            for i in 0..reed_solomon::MAX_CORRECTABLE {
                block[i * 31] ^= 0xA5;
            }
            reed_solomon::decode(black_box(&mut block), 0).unwrap()
        });
    });

    group.finish();
}

fn benchmark_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("document");

    for version in [DwgVersion::AC1015, DwgVersion::AC1018, DwgVersion::AC1032] {
        let doc = drawing(version, 2000);
        let bytes = dwgcodec::encode(&doc, version).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("decode", version), &bytes, |b, bytes| {
            b.iter(|| dwgcodec::decode(black_box(bytes)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("encode", version), &doc, |b, doc| {
            b.iter(|| dwgcodec::encode(black_box(doc), version).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_compression,
    benchmark_reed_solomon,
    benchmark_document
);
criterion_main!(benches);
