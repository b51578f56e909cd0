// File: crates/cml-core/src/model.rs
// Summary: Chart document model: meta/settings entries, bars, drawings, indicators and config accessors.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::style::{Arrow, LineStyle, Rgba, Styles};

pub const DEFAULT_GRID_LINE_WIDTH: f64 = 0.5;
pub const DEFAULT_GRID_COLOR: &str = "#000000";
pub const DEFAULT_Y_AXIS_PRECISION: usize = 2;
/// Digits past the point that an f64 can still carry.
pub const MAX_Y_AXIS_PRECISION: usize = 17;
pub const DEFAULT_BAR_OPACITY: f64 = 1.0;

/// Number or text, as written on the right-hand side of `key=value`.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Numeric parse is tried first; anything else stays text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<f64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

/// Grid properties as written; `None` fields are filled in by [`Chart::grid`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GridConfig {
    pub enabled: Option<bool>,
    pub line_width: Option<f64>,
    pub color: Option<String>,
    pub opacity: Option<f64>,
}

impl GridConfig {
    /// Explicit `grid(...)` constructor: every property starts at its default.
    pub fn with_defaults() -> Self {
        Self {
            enabled: Some(true),
            line_width: Some(DEFAULT_GRID_LINE_WIDTH),
            color: Some(DEFAULT_GRID_COLOR.to_string()),
            opacity: Some(1.0),
        }
    }

    pub fn resolve(&self) -> Grid {
        let color_hex = self.color.clone().unwrap_or_else(|| DEFAULT_GRID_COLOR.to_string());
        Grid {
            enabled: self.enabled.unwrap_or(true),
            line_width: self.line_width.unwrap_or(DEFAULT_GRID_LINE_WIDTH),
            color: Rgba::from_hex(&color_hex),
            color_hex,
            opacity: self.opacity.unwrap_or(1.0),
        }
    }
}

/// Fully resolved grid settings.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    pub enabled: bool,
    pub line_width: f64,
    pub color_hex: String,
    pub color: Rgba,
    pub opacity: f64,
}

impl Default for Grid {
    fn default() -> Self { GridConfig::default().resolve() }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct YAxisConfig {
    pub precision: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BarOpacityConfig {
    pub opacity: Option<f64>,
}

/// How bars are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BarType {
    #[default]
    Candlestick,
    Ohlc,
    HeikinAshi,
}

impl BarType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "candlestick" => Some(Self::Candlestick),
            "ohlc" => Some(Self::Ohlc),
            "heikin-ashi" => Some(Self::HeikinAshi),
            _ => None,
        }
    }
}

/// Right-hand side of a meta or settings entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Grid(GridConfig),
    YAxis(YAxisConfig),
    BarOpacity(BarOpacityConfig),
    BarType(BarType),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: Value,
}

pub type MetaEntry = Entry;
pub type SettingsEntry = Entry;

/// One OHLC bar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self { time, open, high, low, close }
    }

    pub fn is_up(&self) -> bool { self.close >= self.open }

    pub fn midpoint(&self) -> f64 { (self.high + self.low) / 2.0 }
}

/// Formats as a `bars:` row that parses back to the same values.
impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {:?}, {:?}, {:?}, {:?}",
            self.time.format("%Y/%m/%d %H:%M:%S"),
            self.open,
            self.high,
            self.low,
            self.close
        )
    }
}

/// Render a complete `bars:` section.
pub fn write_bars(bars: &[Bar]) -> String {
    let mut out = String::from("bars:\n");
    for bar in bars {
        out.push_str("  ");
        out.push_str(&bar.to_string());
        out.push('\n');
    }
    out
}

/// A time/price pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub time: DateTime<Utc>,
    pub price: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Which side of the bar a circle or note sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Over,
    Under,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rectangle {
    pub start: Anchor,
    pub end: Anchor,
    pub styles: Styles,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub start: Anchor,
    pub end: Anchor,
    pub line_style: LineStyle,
    pub arrow: Arrow,
    pub styles: Styles,
}

/// Horizontal-ish line spanning the full plot width.
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuousLine {
    pub start: Anchor,
    pub end: Anchor,
    pub line_style: LineStyle,
    pub styles: Styles,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Triangle {
    pub time: DateTime<Utc>,
    pub direction: Direction,
    pub styles: Styles,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    pub time: DateTime<Utc>,
    pub position: Position,
    pub styles: Styles,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub time: DateTime<Utc>,
    pub text: String,
    pub position: Position,
    pub styles: Styles,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Drawing {
    Rectangle(Rectangle),
    Line(Line),
    ContinuousLine(ContinuousLine),
    Triangle(Triangle),
    Circle(Circle),
    Note(Note),
}

impl Drawing {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rectangle(_) => "rectangle",
            Self::Line(_) => "line",
            Self::ContinuousLine(_) => "continuous-line",
            Self::Triangle(t) => match t.direction {
                Direction::Up => "uptick-triangle",
                Direction::Down => "downtick-triangle",
            },
            Self::Circle(c) => match c.position {
                Position::Over => "overcircle",
                Position::Under => "undercircle",
            },
            Self::Note(n) => match n.position {
                Position::Over => "overnote",
                Position::Under => "undernote",
            },
        }
    }

    pub fn styles(&self) -> &Styles {
        match self {
            Self::Rectangle(d) => &d.styles,
            Self::Line(d) => &d.styles,
            Self::ContinuousLine(d) => &d.styles,
            Self::Triangle(d) => &d.styles,
            Self::Circle(d) => &d.styles,
            Self::Note(d) => &d.styles,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Ema,
    Sma,
    Rsi,
    Macd,
    Bollinger,
}

impl IndicatorKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ema" => Some(Self::Ema),
            "sma" => Some(Self::Sma),
            "rsi" => Some(Self::Rsi),
            "macd" => Some(Self::Macd),
            "bollinger" => Some(Self::Bollinger),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ema => "ema",
            Self::Sma => "sma",
            Self::Rsi => "rsi",
            Self::Macd => "macd",
            Self::Bollinger => "bollinger",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Indicator {
    pub kind: IndicatorKind,
    pub params: BTreeMap<String, Scalar>,
}

impl Indicator {
    pub fn new(kind: IndicatorKind) -> Self {
        Self { kind, params: BTreeMap::new() }
    }

    pub fn with_param(mut self, key: &str, value: Scalar) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(Scalar::as_f64)
    }
}

/// Parsed CML document. Built once by the parser and read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chart {
    pub meta: Vec<MetaEntry>,
    pub settings: Vec<SettingsEntry>,
    pub bars: Vec<Bar>,
    pub drawings: Vec<Drawing>,
    pub indicators: Vec<Indicator>,
}

impl Chart {
    pub fn new() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.bars.is_empty() }

    /// First meta text value stored under `key`.
    pub fn meta_text(&self, key: &str) -> Option<&str> {
        self.meta.iter().find_map(|e| match &e.value {
            Value::Text(s) if e.key == key => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn title(&self) -> Option<&str> { self.meta_text("title") }

    /// Settings grid with unset fields repaired; a grid given in meta is
    /// used when settings has none.
    pub fn grid(&self) -> Grid {
        self.settings
            .iter()
            .chain(&self.meta)
            .find_map(|e| match &e.value {
                Value::Grid(g) if e.key == "grid" => Some(g.resolve()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Capped at [`MAX_Y_AXIS_PRECISION`].
    pub fn y_axis_precision(&self) -> usize {
        self.settings
            .iter()
            .find_map(|e| match e.value {
                Value::YAxis(c) if e.key == "y-axis-precision" => c.precision,
                _ => None,
            })
            .unwrap_or(DEFAULT_Y_AXIS_PRECISION)
            .min(MAX_Y_AXIS_PRECISION)
    }

    pub fn bar_opacity(&self) -> f64 {
        self.settings
            .iter()
            .find_map(|e| match e.value {
                Value::BarOpacity(c) if e.key == "bar-opacity" => c.opacity,
                _ => None,
            })
            .unwrap_or(DEFAULT_BAR_OPACITY)
    }

    pub fn bar_type(&self) -> BarType {
        self.settings
            .iter()
            .find_map(|e| match e.value {
                Value::BarType(t) if e.key == "bar-type" => Some(t),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Exact-timestamp lookup used to anchor markers.
    pub fn bar_at(&self, time: DateTime<Utc>) -> Option<&Bar> {
        self.bars.iter().find(|b| b.time == time)
    }
}
