// File: crates/cml-core/src/scale.rs
// Summary: Chart bounds and the time (X) / price (Y) transforms between data and pixel space.

use chrono::{DateTime, TimeDelta, Utc};

use crate::geometry::{Point, Rect};
use crate::model::Bar;
use crate::types::Insets;

/// Padded data extent of a chart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartBounds {
    pub min_time: DateTime<Utc>,
    pub max_time: DateTime<Utc>,
    pub min_price: f64,
    pub max_price: f64,
}

impl ChartBounds {
    /// Time extent widened by one bar interval (`bars[1] - bars[0]`) on each
    /// side; price extent widened by 5% of its range, or by 1.0 when flat.
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        let first = bars.first()?;
        let mut b = Self { min_time: first.time, max_time: first.time, min_price: first.low, max_price: first.high };
        for bar in bars {
            b.min_time = b.min_time.min(bar.time);
            b.max_time = b.max_time.max(bar.time);
            b.min_price = b.min_price.min(bar.low);
            b.max_price = b.max_price.max(bar.high);
        }

        let range = b.max_price - b.min_price;
        let pad = if range > 0.0 { range * 0.05 } else { 1.0 };
        b.min_price -= pad;
        b.max_price += pad;

        if let [a, c, ..] = bars {
            let interval = c.time - a.time;
            b.min_time -= interval;
            b.max_time += interval;
        }
        Some(b)
    }

    pub fn time_range(&self) -> TimeDelta { self.max_time - self.min_time }

    pub fn price_range(&self) -> f64 { self.max_price - self.min_price }

    /// Price `fraction` of the way from the bottom of the range.
    pub fn price_at(&self, fraction: f64) -> f64 { self.min_price + self.price_range() * fraction }
}

/// Plot rectangle left after removing `insets` from a `width` x `height` canvas.
pub fn plot_area(width: i32, height: i32, insets: Insets) -> Rect {
    Rect::from_ltrb(
        insets.left as f64,
        insets.top as f64,
        width as f64 - insets.right as f64,
        height as f64 - insets.bottom as f64,
    )
}

fn seconds(t: DateTime<Utc>) -> f64 { t.timestamp_millis() as f64 / 1000.0 }

/// Linear time axis mapping `[min, max]` onto `[left_px, right_px]`.
#[derive(Clone, Copy, Debug)]
pub struct TimeScale {
    pub left_px: f64,
    pub right_px: f64,
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
}

impl TimeScale {
    #[inline]
    pub fn to_px(&self, t: DateTime<Utc>) -> f64 {
        let span = seconds(self.max) - seconds(self.min);
        if span <= 0.0 {
            return self.left_px + (self.right_px - self.left_px) / 2.0;
        }
        self.left_px + (self.right_px - self.left_px) * ((seconds(t) - seconds(self.min)) / span)
    }

    /// Inverse of [`to_px`](Self::to_px), rounded to the millisecond.
    pub fn from_px(&self, px: f64) -> DateTime<Utc> {
        let width = self.right_px - self.left_px;
        if width == 0.0 {
            return self.min;
        }
        let span = seconds(self.max) - seconds(self.min);
        let secs = seconds(self.min) + (px - self.left_px) / width * span;
        DateTime::from_timestamp_millis((secs * 1000.0).round() as i64).unwrap_or(self.min)
    }
}

/// Linear price axis mapping `[min, max]` onto `[bottom_px, top_px]` (inverted).
#[derive(Clone, Copy, Debug)]
pub struct PriceScale {
    pub top_px: f64,
    pub bottom_px: f64,
    pub min: f64,
    pub max: f64,
}

impl PriceScale {
    #[inline]
    pub fn to_px(&self, price: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return self.top_px + (self.bottom_px - self.top_px) / 2.0;
        }
        self.bottom_px - (self.bottom_px - self.top_px) * ((price - self.min) / span)
    }

    pub fn from_px(&self, py: f64) -> f64 {
        let height = self.bottom_px - self.top_px;
        if height == 0.0 {
            return self.min;
        }
        self.min + (self.bottom_px - py) / height * (self.max - self.min)
    }
}

/// Combined data-to-screen transform for one render.
#[derive(Clone, Copy, Debug)]
pub struct Scale {
    pub time: TimeScale,
    pub price: PriceScale,
}

impl Scale {
    pub fn new(bounds: &ChartBounds, area: Rect) -> Self {
        Self {
            time: TimeScale { left_px: area.left, right_px: area.right, min: bounds.min_time, max: bounds.max_time },
            price: PriceScale { top_px: area.top, bottom_px: area.bottom, min: bounds.min_price, max: bounds.max_price },
        }
    }

    #[inline]
    pub fn to_screen(&self, time: DateTime<Utc>, price: f64) -> Point {
        Point::new(self.time.to_px(time), self.price.to_px(price))
    }

    pub fn from_screen(&self, p: Point) -> (DateTime<Utc>, f64) {
        (self.time.from_px(p.x), self.price.from_px(p.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn bar(min: u32, low: f64, high: f64) -> Bar {
        Bar::new(Utc.with_ymd_and_hms(2024, 1, 2, 10, min, 0).unwrap(), low, high, low, high)
    }

    #[test]
    fn bounds_pad_time_and_price() {
        let b = ChartBounds::from_bars(&[bar(0, 100.0, 110.0), bar(1, 101.0, 112.0), bar(2, 99.0, 105.0)]).unwrap();
        assert_eq!(b.min_time, Utc.with_ymd_and_hms(2024, 1, 2, 9, 59, 0).unwrap());
        assert_eq!(b.max_time, Utc.with_ymd_and_hms(2024, 1, 2, 10, 3, 0).unwrap());
        assert_relative_eq!(b.min_price, 99.0 - 0.65);
        assert_relative_eq!(b.max_price, 112.0 + 0.65);
    }

    #[test]
    fn single_flat_bar_pads_by_one() {
        let b = ChartBounds::from_bars(&[bar(0, 50.0, 50.0)]).unwrap();
        assert_eq!(b.min_time, b.max_time);
        assert_eq!((b.min_price, b.max_price), (49.0, 51.0));
        assert!(ChartBounds::from_bars(&[]).is_none());
    }

    #[test]
    fn zero_time_range_maps_to_midpoint() {
        let b = ChartBounds::from_bars(&[bar(0, 50.0, 50.0)]).unwrap();
        let area = plot_area(800, 600, Insets::default());
        let p = Scale::new(&b, area).to_screen(b.min_time, 50.0);
        assert_relative_eq!(p.x, 420.0);
        assert_relative_eq!(p.y, 290.0);
    }

    #[test]
    fn screen_round_trip() {
        let b = ChartBounds::from_bars(&[bar(0, 10.0, 20.0), bar(5, 12.0, 18.0)]).unwrap();
        let scale = Scale::new(&b, plot_area(800, 600, Insets::default()));
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 10, 3, 0).unwrap();
        let (t2, p2) = scale.from_screen(scale.to_screen(t, 15.5));
        assert_eq!(t2, t);
        assert_relative_eq!(p2, 15.5, epsilon = 1e-9);
    }
}
