use cml_core::indicators::{bollinger, ema, macd, rsi, sma};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, black_box};

fn gen_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + (i as f64 * 0.01).sin() * 10.0 + i as f64 * 0.0001).collect()
}

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");
    for &n in &[10_000usize, 100_000usize] {
        let closes = gen_closes(n);
        group.bench_with_input(BenchmarkId::new("ema20", n), &closes, |b, v| b.iter(|| black_box(ema(v, 20))));
        group.bench_with_input(BenchmarkId::new("sma20", n), &closes, |b, v| b.iter(|| black_box(sma(v, 20))));
        group.bench_with_input(BenchmarkId::new("bollinger20", n), &closes, |b, v| {
            b.iter(|| black_box(bollinger(v, 20, 2.0)))
        });
        group.bench_with_input(BenchmarkId::new("rsi14", n), &closes, |b, v| b.iter(|| black_box(rsi(v, 14))));
        group.bench_with_input(BenchmarkId::new("macd", n), &closes, |b, v| {
            b.iter(|| black_box(macd(v, 12, 26, 9)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_indicators);
criterion_main!(benches);
