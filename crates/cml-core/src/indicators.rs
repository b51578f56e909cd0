// File: crates/cml-core/src/indicators.rs
// Summary: Indicator engine; moving averages, bands, oscillators and Heikin-Ashi over bar closes.

use tracing::{debug, warn};

use crate::model::{Bar, Indicator, IndicatorKind, Scalar};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_STDDEV: f64 = 2.0;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_MACD: (usize, usize, usize) = (12, 26, 9);

/// Exponential moving average seeded with the first value. Defined everywhere.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    for (i, &v) in values.iter().enumerate() {
        let next = if i == 0 { v } else { alpha * v + (1.0 - alpha) * out[i - 1] };
        out.push(next);
    }
    out
}

/// Trailing simple moving average; `NaN` before index `period - 1`.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 {
        return out;
    }
    let mut sum = 0.0;
    for i in 0..values.len() {
        sum += values[i];
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out[i] = sum / period as f64;
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// SMA middle band with population standard deviation over the same window.
pub fn bollinger(values: &[f64], period: usize, k: f64) -> Bands {
    let middle = sma(values, period);
    let mut upper = vec![f64::NAN; values.len()];
    let mut lower = vec![f64::NAN; values.len()];
    for i in 0..values.len() {
        let mean = middle[i];
        if mean.is_nan() {
            continue;
        }
        let window = &values[i + 1 - period..=i];
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
        let sigma = variance.sqrt();
        upper[i] = mean + k * sigma;
        lower[i] = mean - k * sigma;
    }
    Bands { upper, middle, lower }
}

/// Wilder RSI. The first `period` deltas seed the averages; defined from
/// index `period`, and 100 whenever the average loss is exactly zero.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }
    let delta = |i: usize| values[i] - values[i - 1];
    let gain = |i: usize| delta(i).max(0.0);
    let loss = |i: usize| (-delta(i)).max(0.0);

    let p = period as f64;
    let mut avg_gain = (1..=period).map(gain).sum::<f64>() / p;
    let mut avg_loss = (1..=period).map(loss).sum::<f64>() / p;
    for i in period..values.len() {
        if i > period {
            avg_gain = (avg_gain * (p - 1.0) + gain(i)) / p;
            avg_loss = (avg_loss * (p - 1.0) + loss(i)) / p;
        }
        out[i] = if avg_loss == 0.0 { 100.0 } else { 100.0 - 100.0 / (1.0 + avg_gain / avg_loss) };
    }
    out
}

#[derive(Clone, Debug, PartialEq)]
pub struct Macd {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let line: Vec<f64> = ema(values, fast).iter().zip(ema(values, slow)).map(|(f, s)| f - s).collect();
    let signal = ema(&line, signal);
    let histogram = line.iter().zip(&signal).map(|(m, s)| m - s).collect();
    Macd { line, signal, histogram }
}

/// Heikin-Ashi candles aligned with `bars`.
pub fn heikin_ashi(bars: &[Bar]) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        let close = (bar.open + bar.high + bar.low + bar.close) / 4.0;
        let open = match out.last() {
            Some(prev) => (prev.open + prev.close) / 2.0,
            None => (bar.open + bar.close) / 2.0,
        };
        let high = bar.high.max(open).max(close);
        let low = bar.low.min(open).min(close);
        out.push(Bar::new(bar.time, open, high, low, close));
    }
    out
}

/// Output of one indicator, aligned with the bar series.
#[derive(Clone, Debug, PartialEq)]
pub enum IndicatorSeries {
    Ema(Vec<f64>),
    Sma(Vec<f64>),
    Bollinger(Bands),
    Rsi(Vec<f64>),
    Macd(Macd),
}

impl IndicatorSeries {
    /// Whether the compositor draws this series on the price pane.
    pub fn is_overlay(&self) -> bool {
        matches!(self, Self::Ema(_) | Self::Sma(_) | Self::Bollinger(_))
    }
}

/// Read an integer parameter; absent means `default`, text or non-positive
/// values are unusable.
fn period_param(indicator: &Indicator, key: &str, default: usize) -> Option<usize> {
    match indicator.params.get(key) {
        None => Some(default),
        Some(Scalar::Number(n)) if *n >= 1.0 => Some(*n as usize),
        Some(_) => None,
    }
}

fn float_param(indicator: &Indicator, key: &str, default: f64) -> Option<f64> {
    match indicator.params.get(key) {
        None => Some(default),
        Some(Scalar::Number(n)) => Some(*n),
        Some(Scalar::Text(_)) => None,
    }
}

/// Compute `indicator` over `bars`. Returns `None` (and logs) when a parameter
/// is unusable or there are too few bars.
pub fn compute(indicator: &Indicator, bars: &[Bar]) -> Option<IndicatorSeries> {
    let name = indicator.kind.name();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let enough = |needed: usize| {
        let ok = closes.len() >= needed;
        if !ok {
            warn!(indicator = name, needed, bars = closes.len(), "not enough bars; skipping indicator");
        }
        ok
    };
    let series = match indicator.kind {
        IndicatorKind::Ema => {
            let period = period_param(indicator, "period", DEFAULT_PERIOD);
            period.filter(|p| enough(*p)).map(|p| IndicatorSeries::Ema(ema(&closes, p)))
        }
        IndicatorKind::Sma => {
            let period = period_param(indicator, "period", DEFAULT_PERIOD);
            period.filter(|p| enough(*p)).map(|p| IndicatorSeries::Sma(sma(&closes, p)))
        }
        IndicatorKind::Bollinger => {
            let period = period_param(indicator, "period", DEFAULT_PERIOD);
            let k = float_param(indicator, "stddev", DEFAULT_STDDEV);
            match (period, k) {
                (Some(p), Some(k)) if enough(p) => Some(IndicatorSeries::Bollinger(bollinger(&closes, p, k))),
                _ => None,
            }
        }
        IndicatorKind::Rsi => {
            let period = period_param(indicator, "period", DEFAULT_RSI_PERIOD);
            period
                .filter(|p| p.checked_add(1).is_some_and(&enough))
                .map(|p| IndicatorSeries::Rsi(rsi(&closes, p)))
        }
        IndicatorKind::Macd => {
            let (df, ds, dsig) = DEFAULT_MACD;
            let fast = period_param(indicator, "fast", df);
            let slow = period_param(indicator, "slow", ds);
            let signal = period_param(indicator, "signal", dsig);
            match (fast, slow, signal) {
                (Some(f), Some(s), Some(g)) if enough(s) => Some(IndicatorSeries::Macd(macd(&closes, f, s, g))),
                _ => None,
            }
        }
    };
    if series.is_none() && !closes.is_empty() {
        debug!(indicator = name, params = ?indicator.params, "indicator produced no series");
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    #[test]
    fn constant_series_averages_to_itself() {
        let values = vec![42.0; 30];
        for v in &sma(&values, 5)[4..] {
            assert_relative_eq!(*v, 42.0);
        }
        for v in ema(&values, 5) {
            assert_relative_eq!(v, 42.0);
        }
        assert!(sma(&values, 5)[3].is_nan());
    }

    #[test]
    fn bollinger_bands_collapse_on_flat_input() {
        let bands = bollinger(&[10.0; 8], 4, 2.0);
        assert!(bands.upper[2].is_nan());
        assert_relative_eq!(bands.upper[3], 10.0);
        assert_relative_eq!(bands.lower[7], 10.0);
    }

    #[test]
    fn bollinger_uses_population_sigma() {
        let bands = bollinger(&[1.0, 3.0], 2, 1.0);
        assert_relative_eq!(bands.middle[1], 2.0);
        assert_relative_eq!(bands.upper[1], 3.0);
        assert_relative_eq!(bands.lower[1], 1.0);
    }

    #[test]
    fn rsi_is_100_without_losses() {
        let values: Vec<f64> = (0..10).map(f64::from).collect();
        let out = rsi(&values, 3);
        assert!(out[2].is_nan());
        assert_relative_eq!(out[3], 100.0);
        assert_relative_eq!(out[9], 100.0);
    }

    #[test]
    fn rsi_balanced_moves_is_50() {
        let out = rsi(&[1.0, 2.0, 1.0], 2);
        assert_relative_eq!(out[2], 50.0);
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let values: Vec<f64> = (0..40).map(|i| (i as f64 * 0.3).sin() * 5.0 + 100.0).collect();
        let m = macd(&values, 12, 26, 9);
        assert_relative_eq!(m.line[0], 0.0);
        for i in 0..values.len() {
            assert_relative_eq!(m.histogram[i], m.line[i] - m.signal[i]);
        }
    }

    #[test]
    fn heikin_ashi_smooths_opens() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = [Bar::new(t, 10.0, 12.0, 9.0, 11.0), Bar::new(t, 11.0, 13.0, 10.0, 12.0)];
        let ha = heikin_ashi(&bars);
        assert_relative_eq!(ha[0].open, 10.5);
        assert_relative_eq!(ha[0].close, 10.5);
        assert_relative_eq!(ha[1].open, 10.5);
        assert_relative_eq!(ha[1].close, 11.5);
        assert_relative_eq!(ha[1].high, 13.0);
        assert_relative_eq!(ha[1].low, 10.0);
    }

    #[test]
    fn unusable_parameters_skip() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = vec![Bar::new(t, 1.0, 1.0, 1.0, 1.0); 30];
        let text = Indicator::new(IndicatorKind::Sma).with_param("period", Scalar::Text("long".into()));
        assert!(compute(&text, &bars).is_none());
        let zero = Indicator::new(IndicatorKind::Ema).with_param("period", Scalar::Number(0.0));
        assert!(compute(&zero, &bars).is_none());
        assert!(matches!(compute(&Indicator::new(IndicatorKind::Macd), &bars), Some(IndicatorSeries::Macd(_))));
        assert!(compute(&Indicator::new(IndicatorKind::Rsi), &bars[..14]).is_none());
    }

    #[test]
    fn huge_periods_skip_without_overflow() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = vec![Bar::new(t, 1.0, 1.0, 1.0, 1.0); 3];
        for kind in [IndicatorKind::Rsi, IndicatorKind::Ema, IndicatorKind::Sma, IndicatorKind::Bollinger] {
            let huge = Indicator::new(kind).with_param("period", Scalar::Number(1e30));
            assert!(compute(&huge, &bars).is_none(), "{}", kind.name());
        }
        let slow = Indicator::new(IndicatorKind::Macd).with_param("slow", Scalar::Number(f64::INFINITY));
        assert!(compute(&slow, &bars).is_none());
    }
}
