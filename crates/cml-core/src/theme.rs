// File: crates/cml-core/src/theme.rs
// Summary: Default colors for every chart element; per-drawing styles override these.

use crate::style::Rgba;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub background: Rgba,
    pub frame: Rgba,
    pub axis_label: Rgba,
    pub title: Rgba,
    pub wick: Rgba,
    pub body_outline: Rgba,
    pub candle_up: Rgba,
    pub candle_down: Rgba,
    pub rectangle_fill: Rgba,
    pub rectangle_border: Rgba,
    pub line: Rgba,
    pub continuous_line: Rgba,
    pub triangle_fill: Rgba,
    pub circle_fill: Rgba,
    pub marker_border: Rgba,
    pub note_text: Rgba,
    pub ema: Rgba,
    pub sma: Rgba,
    pub bollinger: Rgba,
}

impl Theme {
    /// White canvas with black frame and labels.
    pub const fn classic() -> Self {
        Self {
            background: Rgba::WHITE,
            frame: Rgba::BLACK,
            axis_label: Rgba::BLACK,
            title: Rgba::BLACK,
            wick: Rgba::BLACK,
            body_outline: Rgba::BLACK,
            candle_up: Rgba::rgb(0, 150, 0),
            candle_down: Rgba::rgb(200, 0, 0),
            rectangle_fill: Rgba::new(170, 170, 170, 128),
            rectangle_border: Rgba::BLACK,
            line: Rgba::rgb(0, 0, 255),
            continuous_line: Rgba::rgb(0, 128, 0),
            triangle_fill: Rgba::rgb(170, 170, 170),
            circle_fill: Rgba::rgb(255, 255, 0),
            marker_border: Rgba::BLACK,
            note_text: Rgba::BLACK,
            ema: Rgba::new(255, 0, 0, 200),
            sma: Rgba::new(0, 255, 0, 200),
            bollinger: Rgba::new(0, 0, 255, 150),
        }
    }
}

impl Default for Theme {
    fn default() -> Self { Self::classic() }
}
