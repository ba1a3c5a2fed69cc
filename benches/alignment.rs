use criterion::{black_box, criterion_group, criterion_main, Criterion};

use specserver::align::{align_records, span_of};
use specserver::spectrum::{columns, npy, Column, ColumnData, SpectrumRecord};

fn spectrum(start: f64, len: usize) -> SpectrumRecord {
    let disp = 0.0001;
    let loglam: Vec<f32> = (0..len).map(|i| (start + disp * i as f64) as f32).collect();
    let flux: Vec<f32> = (0..len).map(|i| (i % 13) as f32).collect();
    SpectrumRecord::new(vec![
        Column::new(columns::LOGLAM, ColumnData::F32(loglam)),
        Column::new(columns::FLUX, ColumnData::F32(flux)),
        Column::new(columns::IVAR, ColumnData::F32(vec![1.0; len])),
        Column::new(columns::MODEL, ColumnData::F32(vec![0.0; len])),
        Column::new(columns::SKY, ColumnData::F32(vec![0.0; len])),
    ])
    .expect("valid record")
}

fn bench_alignment(c: &mut Criterion) {
    // A typical bulk request: 64 survey-sized spectra with staggered
    // starting wavelengths.
    let records: Vec<SpectrumRecord> = (0..64)
        .map(|k| spectrum(3.55 + 0.0002 * k as f64, 4600))
        .collect();
    let span = span_of(&records).expect("span");

    c.bench_function("span_of_64", |b| {
        b.iter(|| span_of(black_box(&records)).expect("span"))
    });

    c.bench_function("align_64", |b| {
        b.iter(|| align_records(black_box(&records), span.w0, span.w1).expect("align"))
    });

    let rows = align_records(&records, span.w0, span.w1).expect("align");
    c.bench_function("encode_stack_64", |b| {
        b.iter(|| npy::encode_2d(black_box(&rows)).expect("encode"))
    });
}

criterion_group!(benches, bench_alignment);
criterion_main!(benches);
