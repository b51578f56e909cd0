// File: crates/cml-core/src/axis.rs
// Summary: Axis tick selection and label formatting for the time and price axes.

use chrono::{DateTime, TimeDelta, Utc};

use crate::scale::ChartBounds;

/// Upper bound on vertical grid lines / time labels.
pub const MAX_TIME_TICKS: usize = 8;
/// Horizontal grid lines / price labels, bottom to top inclusive.
pub const PRICE_TICKS: usize = 6;

const INTRADAY_STEPS_MIN: [i64; 6] = [5, 15, 30, 60, 120, 360];

/// A tick position with its rendered label.
#[derive(Clone, Debug, PartialEq)]
pub struct Tick<T> {
    pub value: T,
    pub label: String,
}

/// Snap `range / min(6, bar_count)` to a readable interval.
pub fn select_tick_interval(range: TimeDelta, bar_count: usize) -> TimeDelta {
    if range <= TimeDelta::hours(24) {
        let target = bar_count.clamp(1, 6) as i32;
        let raw = range / target;
        return INTRADAY_STEPS_MIN
            .iter()
            .map(|m| TimeDelta::minutes(*m))
            .find(|step| raw <= *step)
            .unwrap_or(TimeDelta::hours(12));
    }
    if range <= TimeDelta::days(7) {
        TimeDelta::days(1)
    } else if range <= TimeDelta::days(30) {
        TimeDelta::days(7)
    } else if range <= TimeDelta::days(90) {
        TimeDelta::days(14)
    } else {
        TimeDelta::days(30)
    }
}

/// Tick instants on whole multiples of the interval since the Unix epoch,
/// starting at the first one not before `min_time`.
pub fn time_ticks(bounds: &ChartBounds, bar_count: usize) -> Vec<DateTime<Utc>> {
    let step = select_tick_interval(bounds.time_range(), bar_count).num_seconds();
    if step <= 0 {
        return Vec::new();
    }
    let min = bounds.min_time.timestamp();
    let first = min.div_euclid(step) * step + if min.rem_euclid(step) == 0 { 0 } else { step };
    (0..MAX_TIME_TICKS as i64)
        .map_while(|i| DateTime::from_timestamp(first + i * step, 0))
        .take_while(|t| *t <= bounds.max_time)
        .collect()
}

/// `HH:MM` for ranges up to a day, `MM/DD` beyond.
pub fn time_label(t: DateTime<Utc>, range: TimeDelta) -> String {
    if range <= TimeDelta::hours(24) {
        t.format("%H:%M").to_string()
    } else {
        t.format("%m/%d").to_string()
    }
}

pub fn time_axis(bounds: &ChartBounds, bar_count: usize) -> Vec<Tick<DateTime<Utc>>> {
    let range = bounds.time_range();
    time_ticks(bounds, bar_count)
        .into_iter()
        .map(|t| Tick { value: t, label: time_label(t, range) })
        .collect()
}

/// `steps` evenly spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (steps - 1) as f64;
            (0..steps).map(|i| start + step * i as f64).collect()
        }
    }
}

pub fn price_ticks(bounds: &ChartBounds) -> Vec<f64> {
    linspace(bounds.min_price, bounds.max_price, PRICE_TICKS)
}

pub fn price_label(price: f64, precision: usize) -> String {
    format!("{price:.precision$}")
}

pub fn price_axis(bounds: &ChartBounds, precision: usize) -> Vec<Tick<f64>> {
    price_ticks(bounds)
        .into_iter()
        .map(|p| Tick { value: p, label: price_label(p, precision) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn linspace_counts_match_steps() {
        assert_eq!(linspace(0.0, 10.0, 6), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert!(linspace(3.0, 9.0, 0).is_empty());
    }

    #[test]
    fn intraday_interval_snaps_up() {
        assert_eq!(select_tick_interval(TimeDelta::hours(2), 24), TimeDelta::minutes(30));
        assert_eq!(select_tick_interval(TimeDelta::minutes(5), 4), TimeDelta::minutes(5));
        assert_eq!(select_tick_interval(TimeDelta::hours(3), 2), TimeDelta::hours(2));
        assert_eq!(select_tick_interval(TimeDelta::hours(24), 6), TimeDelta::hours(6));
        assert_eq!(select_tick_interval(TimeDelta::hours(24), 1), TimeDelta::hours(12));
    }

    #[test]
    fn multi_day_interval_buckets() {
        assert_eq!(select_tick_interval(TimeDelta::days(3), 50), TimeDelta::days(1));
        assert_eq!(select_tick_interval(TimeDelta::days(10), 50), TimeDelta::days(7));
        assert_eq!(select_tick_interval(TimeDelta::days(60), 50), TimeDelta::days(14));
        assert_eq!(select_tick_interval(TimeDelta::days(400), 50), TimeDelta::days(30));
    }

    #[test]
    fn ticks_start_on_epoch_multiples() {
        let bounds = ChartBounds {
            min_time: Utc.with_ymd_and_hms(2024, 1, 1, 9, 59, 0).unwrap(),
            max_time: Utc.with_ymd_and_hms(2024, 1, 1, 12, 1, 0).unwrap(),
            min_price: 0.0,
            max_price: 1.0,
        };
        let ticks = time_axis(&bounds, 10);
        let labels: Vec<&str> = ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["10:00", "10:30", "11:00", "11:30", "12:00"]);
    }

    #[test]
    fn tick_count_is_capped() {
        let bounds = ChartBounds {
            min_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            max_time: Utc.with_ymd_and_hms(2025, 2, 4, 0, 0, 0).unwrap(),
            min_price: 0.0,
            max_price: 1.0,
        };
        let ticks = time_ticks(&bounds, 300);
        assert_eq!(ticks.len(), MAX_TIME_TICKS);
        assert_eq!(ticks[1] - ticks[0], TimeDelta::days(30));
    }

    #[test]
    fn price_labels_use_precision() {
        let bounds = ChartBounds {
            min_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            max_time: Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
            min_price: 100.0,
            max_price: 110.0,
        };
        let axis = price_axis(&bounds, 1);
        assert_eq!(axis.len(), 6);
        assert_eq!(axis[1].label, "102.0");
        assert_eq!(price_label(7.6, 0), "8");
    }
}
