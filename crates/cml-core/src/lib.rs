// File: crates/cml-core/src/lib.rs
// Summary: Core library entry point; CML parsing, indicators, layout and backend-agnostic compositing.

pub mod error;
pub mod scanner;
pub mod model;
pub mod style;
pub mod parser;
pub mod indicators;
pub mod types;
pub mod geometry;
pub mod scale;
pub mod axis;
pub mod theme;
pub mod surface;
pub mod render;

pub use error::{ParseError, ParseResult};
pub use model::{
    write_bars, Anchor, Bar, BarType, Chart, Drawing, Entry, Grid, GridConfig, Indicator, IndicatorKind, Scalar,
    Value,
};
pub use parser::parse;
pub use style::{Arrow, LineStyle, Rgba, StyleMap, Styles};
pub use indicators::{compute, IndicatorSeries};
pub use scale::{ChartBounds, Scale};
pub use geometry::{Point, Rect};
pub use theme::Theme;
pub use surface::{DrawCommand, Layer, RecordingSurface, Stroke, Surface, TextAnchor, TextStyle};
pub use render::{render, render_recording, RenderContext, RenderOptions};
