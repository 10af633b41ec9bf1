use benchmarks::data::CaliforniaHousingDataset;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use housing_prep::preprocessing::{DerivedFeatureComputer, Preprocessor};

const TARGET: &str = "median_house_value";

fn bench_derived_features(c: &mut Criterion) {
    for size in [1_000, 10_000, 20_640].iter() {
        let table = CaliforniaHousingDataset::synthetic(*size, 42).unwrap().into_table();
        let computer = DerivedFeatureComputer::new();
        c.bench_with_input(BenchmarkId::new("derived_features", size), &table, |b, table| {
            b.iter(|| black_box(computer.compute(black_box(table))));
        });
    }
}

fn bench_fit_transform(c: &mut Criterion) {
    for size in [1_000, 10_000, 20_640].iter() {
        let table = CaliforniaHousingDataset::synthetic(*size, 42).unwrap().into_table();
        c.bench_with_input(BenchmarkId::new("fit_transform", size), &table, |b, table| {
            b.iter(|| {
                let mut preprocessor = Preprocessor::new(TARGET);
                black_box(preprocessor.fit_transform(black_box(table)).unwrap())
            });
        });
    }
}

fn bench_transform(c: &mut Criterion) {
    let train = CaliforniaHousingDataset::synthetic(16_512, 42).unwrap().into_table();
    let mut preprocessor = Preprocessor::new(TARGET);
    preprocessor.fit_transform(&train).unwrap();

    // Single-request latency and batch throughput
    for size in [1, 100, 4_128].iter() {
        let batch = CaliforniaHousingDataset::synthetic(*size, 7).unwrap().into_table();
        c.bench_with_input(BenchmarkId::new("transform", size), &batch, |b, batch| {
            b.iter(|| black_box(preprocessor.transform(black_box(batch)).unwrap()));
        });
    }
}

fn bench_reload(c: &mut Criterion) {
    let train = CaliforniaHousingDataset::synthetic(10_000, 42).unwrap().into_table();
    let mut preprocessor = Preprocessor::new(TARGET);
    preprocessor.fit_transform(&train).unwrap();
    let bytes = preprocessor.to_bytes().unwrap();

    c.bench_function("from_bytes", |b| {
        b.iter(|| black_box(Preprocessor::from_bytes(black_box(&bytes)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_derived_features,
    bench_fit_transform,
    bench_transform,
    bench_reload
);
criterion_main!(benches);
