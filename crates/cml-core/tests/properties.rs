// File: crates/cml-core/tests/properties.rs
// Summary: Property checks for the data-to-screen transforms and color parsing.

use chrono::{TimeDelta, TimeZone, Utc};
use cml_core::scale::{plot_area, ChartBounds};
use cml_core::types::Insets;
use cml_core::{Bar, Rgba, Scale};
use proptest::prelude::*;

fn bounds(min_price: f64, span: f64, minutes: i64) -> ChartBounds {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    ChartBounds { min_time: start, max_time: start + TimeDelta::minutes(minutes), min_price, max_price: min_price + span }
}

proptest! {
    #[test]
    fn price_mapping_is_strictly_decreasing(
        min in -1.0e4f64..1.0e4,
        span in 0.01f64..1.0e4,
        a in 0.0f64..1.0,
        b in 0.0f64..1.0,
    ) {
        prop_assume!((a - b).abs() > 1e-6);
        let scale = Scale::new(&bounds(min, span, 60), plot_area(800, 600, Insets::default()));
        let (pa, pb) = (min + a * span, min + b * span);
        let (ya, yb) = (scale.price.to_px(pa), scale.price.to_px(pb));
        prop_assert!((pa < pb) == (ya > yb));
        prop_assert!((40.0 - 1e-6..=540.0 + 1e-6).contains(&ya));
    }

    #[test]
    fn time_mapping_is_increasing(m1 in 0i64..10_000, m2 in 0i64..10_000) {
        prop_assume!(m1 != m2);
        let b = bounds(0.0, 1.0, 10_000);
        let scale = Scale::new(&b, plot_area(800, 600, Insets::default()));
        let x1 = scale.time.to_px(b.min_time + TimeDelta::minutes(m1));
        let x2 = scale.time.to_px(b.min_time + TimeDelta::minutes(m2));
        prop_assert_eq!(m1 < m2, x1 < x2);
    }

    #[test]
    fn screen_round_trip(price in 0.0f64..500.0, minute in 0i64..600) {
        let b = bounds(0.0, 500.0, 600);
        let scale = Scale::new(&b, plot_area(800, 600, Insets::default()));
        let t = b.min_time + TimeDelta::minutes(minute);
        let (back_t, back_p) = scale.from_screen(scale.to_screen(t, price));
        prop_assert!((back_p - price).abs() < 1e-6);
        prop_assert!((back_t - t).num_milliseconds().abs() <= 1);
    }

    #[test]
    fn bounds_contain_every_bar(
        rows in prop::collection::vec((1.0f64..1000.0, 0.0f64..50.0, 0.0f64..50.0), 1..40)
    ) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars: Vec<Bar> = rows
            .iter()
            .enumerate()
            .map(|(i, (mid, up, down))| Bar::new(start + TimeDelta::minutes(i as i64), *mid, mid + up, mid - down, *mid))
            .collect();
        let b = ChartBounds::from_bars(&bars).unwrap();
        for bar in &bars {
            prop_assert!(b.min_price <= bar.low && bar.high <= b.max_price);
            prop_assert!(b.min_time <= bar.time && bar.time <= b.max_time);
        }
    }

    #[test]
    fn hex_parse_never_panics(s in "\\PC{0,8}") {
        let _ = Rgba::from_hex(&s);
    }

    #[test]
    fn six_digit_hex_round_trips(r: u8, g: u8, b: u8) {
        let c = Rgba::rgb(r, g, b);
        prop_assert_eq!(Rgba::from_hex(&c.to_string()), c);
    }
}
