use chrono::{TimeDelta, TimeZone, Utc};
use cml_core::{parse, write_bars, Bar};
use criterion::{criterion_group, criterion_main, Criterion, black_box};

fn gen_document(n: usize) -> String {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut price = 100.0f64;
    let bars: Vec<Bar> = (0..n)
        .map(|i| {
            let o = price;
            let c = o + (i as f64 * 0.1).sin();
            price = c;
            Bar::new(start + TimeDelta::minutes(i as i64), o, o.max(c) + 0.5, o.min(c) - 0.5, c)
        })
        .collect();
    let mut doc = String::from("meta:\n  title: \"bench\"\nsettings:\n  grid: grid(opacity=0.4)\n");
    doc.push_str(&write_bars(&bars));
    doc.push_str("drawings:\n  rectangle(2024/01/01 00:10, 95; 2024/01/01 00:40, 105)\n    fill-color=#0A0\n");
    doc.push_str("indicators:\n  ema(period=20)\n  bollinger(period=20, stddev=2)\n");
    doc
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for &n in &[1_000usize, 10_000usize] {
        let doc = gen_document(n);
        group.bench_function(format!("bars_{n}"), |b| b.iter(|| black_box(parse(&doc))));
    }
    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
