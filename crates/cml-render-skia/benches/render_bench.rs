use anyhow::Result;
use chrono::{TimeDelta, TimeZone, Utc};
use cml_core::{Bar, Chart, Indicator, IndicatorKind, RenderOptions, Scalar};
use cml_render_skia::render_to_png_bytes;
use criterion::{criterion_group, criterion_main, Criterion, black_box};

fn build_chart(n: usize) -> Chart {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut chart = Chart::new();
    let mut price = 100.0f64;
    for i in 0..n {
        let open = price;
        let close = open + (i as f64 * 0.01).sin();
        price = close;
        chart.bars.push(Bar::new(start + TimeDelta::minutes(i as i64), open, open.max(close) + 0.5, open.min(close) - 0.5, close));
    }
    chart.indicators.push(Indicator::new(IndicatorKind::Ema).with_param("period", Scalar::Number(20.0)));
    chart.indicators.push(Indicator::new(IndicatorKind::Bollinger));
    chart
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_png_bytes");
    for &n in &[500usize, 5_000usize] {
        group.bench_function(format!("bars_{n}"), |b| {
            let chart = build_chart(n);
            let opts = RenderOptions::default();
            b.iter(|| -> Result<()> {
                let bytes = render_to_png_bytes(&chart, &opts)?;
                black_box(bytes);
                Ok(())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
