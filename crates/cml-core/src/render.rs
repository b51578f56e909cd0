// File: crates/cml-core/src/render.rs
// Summary: Compositor; walks frame, grid, axes, bars, drawings, indicators and title onto a Surface.

use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::axis::{price_axis, time_axis};
use crate::geometry::{arrowhead, regular_polygon, Point, Rect};
use crate::indicators::{compute, heikin_ashi, IndicatorSeries};
use crate::model::{
    Bar, BarType, Chart, Circle, ContinuousLine, Direction, Drawing, Grid, Line, Note, Position, Rectangle, Triangle,
};
use crate::scale::{plot_area, ChartBounds, Scale};
use crate::surface::{Layer, RecordingSurface, Stroke, Surface, TextAnchor, TextStyle};
use crate::style::Rgba;
use crate::theme::Theme;
use crate::types::{Insets, HEIGHT, WIDTH};

pub const BODY_WIDTH_RATIO: f64 = 0.6;
pub const MARKER_SIZE: f64 = 8.0;
pub const CIRCLE_RADIUS: f64 = 6.0;
pub const NOTE_OFFSET: f64 = 15.0;
pub const ARROW_SIZE: f64 = 10.0;
pub const ARROW_HALF_ANGLE: f64 = PI / 6.0;
pub const ARROW_WIDTH: f64 = 2.0;
pub const LABEL_FONT_SIZE: f64 = 12.0;
pub const TITLE_FONT_SIZE: f64 = 14.0;
/// Gap between the plot frame and axis labels.
pub const PRICE_LABEL_GAP: f64 = 10.0;
pub const TIME_LABEL_GAP: f64 = 20.0;
pub const TITLE_Y: f64 = 20.0;

#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    pub width: i32,
    pub height: i32,
    pub insets: Insets,
    pub theme: Theme,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { width: WIDTH, height: HEIGHT, insets: Insets::default(), theme: Theme::default() }
    }
}

/// Everything a draw function needs, resolved once before drawing starts.
#[derive(Clone, Debug)]
pub struct RenderContext<'a> {
    pub chart: &'a Chart,
    pub options: &'a RenderOptions,
    pub theme: &'a Theme,
    pub bounds: ChartBounds,
    pub area: Rect,
    pub scale: Scale,
    pub grid: Grid,
    pub precision: usize,
    pub bar_opacity: f64,
}

impl<'a> RenderContext<'a> {
    /// `None` for a chart without bars, since there is nothing to scale against.
    pub fn new(chart: &'a Chart, options: &'a RenderOptions) -> Option<Self> {
        let bounds = ChartBounds::from_bars(&chart.bars)?;
        let area = plot_area(options.width, options.height, options.insets);
        Some(Self {
            chart,
            options,
            theme: &options.theme,
            bounds,
            area,
            scale: Scale::new(&bounds, area),
            grid: chart.grid(),
            precision: chart.y_axis_precision(),
            bar_opacity: chart.bar_opacity(),
        })
    }

    fn to_screen(&self, time: DateTime<Utc>, price: f64) -> Point { self.scale.to_screen(time, price) }

    /// Price a marker anchors to: the matching bar's price, or a fixed
    /// fraction of the price range when no bar has that exact timestamp.
    fn marker_price(&self, time: DateTime<Utc>, on_bar: impl Fn(&Bar) -> f64, fallback: f64, kind: &str) -> f64 {
        match self.chart.bar_at(time) {
            Some(bar) => on_bar(bar),
            None => {
                debug!(kind, %time, "no bar at marker time; using fallback price");
                self.bounds.price_at(fallback)
            }
        }
    }
}

/// Render `chart` onto `surface`. Never fails; missing data is skipped.
pub fn render(chart: &Chart, options: &RenderOptions, surface: &mut dyn Surface) {
    surface.clear(options.theme.background);

    match RenderContext::new(chart, options) {
        Some(ctx) => {
            draw_frame(&ctx, surface);
            if ctx.grid.enabled {
                draw_grid(&ctx, surface);
            }
            draw_axes(&ctx, surface);
            draw_bars(&ctx, surface);
            for (i, drawing) in chart.drawings.iter().enumerate() {
                surface.begin_layer(Layer::Drawing(i));
                draw_drawing(&ctx, surface, drawing);
            }
            draw_indicators(&ctx, surface);
        }
        None => warn!(
            drawings = chart.drawings.len(),
            indicators = chart.indicators.len(),
            "chart has no bars; only the title is drawn"
        ),
    }

    draw_title(chart, options, surface);
}

/// Render into a fresh [`RecordingSurface`] sized from `options`.
pub fn render_recording(chart: &Chart, options: &RenderOptions) -> RecordingSurface {
    let mut surface = RecordingSurface::new(options.width, options.height);
    render(chart, options, &mut surface);
    surface
}

fn draw_frame(ctx: &RenderContext<'_>, s: &mut dyn Surface) {
    s.begin_layer(Layer::Frame);
    s.stroke_rect(ctx.area, &Stroke::solid(ctx.theme.frame, 1.0));
}

fn draw_grid(ctx: &RenderContext<'_>, s: &mut dyn Surface) {
    s.begin_layer(Layer::Grid);
    let stroke = Stroke::solid(ctx.grid.color.with_opacity(ctx.grid.opacity), ctx.grid.line_width);
    let area = ctx.area;
    for tick in price_axis(&ctx.bounds, ctx.precision) {
        let y = ctx.scale.price.to_px(tick.value);
        s.stroke_line(Point::new(area.left, y), Point::new(area.right, y), &stroke);
    }
    for tick in time_axis(&ctx.bounds, ctx.chart.bars.len()) {
        let x = ctx.scale.time.to_px(tick.value);
        s.stroke_line(Point::new(x, area.top), Point::new(x, area.bottom), &stroke);
    }
}

fn draw_axes(ctx: &RenderContext<'_>, s: &mut dyn Surface) {
    s.begin_layer(Layer::Axes);
    let area = ctx.area;
    let label = |anchor| TextStyle { color: ctx.theme.axis_label, size: LABEL_FONT_SIZE, anchor };
    for tick in price_axis(&ctx.bounds, ctx.precision) {
        let at = Point::new(area.left - PRICE_LABEL_GAP, ctx.scale.price.to_px(tick.value));
        s.draw_text(&tick.label, at, &label(TextAnchor::RIGHT_MIDDLE));
    }
    for tick in time_axis(&ctx.bounds, ctx.chart.bars.len()) {
        let at = Point::new(ctx.scale.time.to_px(tick.value), area.bottom + TIME_LABEL_GAP);
        s.draw_text(&tick.label, at, &label(TextAnchor::TOP_CENTER));
    }
}

// ---- bars -------------------------------------------------------------------

fn draw_bars(ctx: &RenderContext<'_>, s: &mut dyn Surface) {
    let bar_type = ctx.chart.bar_type();
    let smoothed;
    let bars: &[Bar] = match bar_type {
        BarType::HeikinAshi => {
            smoothed = heikin_ashi(&ctx.chart.bars);
            &smoothed
        }
        BarType::Candlestick | BarType::Ohlc => &ctx.chart.bars,
    };
    let width = ctx.area.width() / bars.len() as f64 * BODY_WIDTH_RATIO;
    debug!(?bar_type, bars = bars.len(), width, "drawing bars");
    for (i, bar) in bars.iter().enumerate() {
        s.begin_layer(Layer::Bar(i));
        match bar_type {
            BarType::Ohlc => draw_ohlc(ctx, s, bar, width),
            BarType::Candlestick | BarType::HeikinAshi => draw_candle(ctx, s, bar, width),
        }
    }
}

fn body_color(ctx: &RenderContext<'_>, bar: &Bar) -> Rgba {
    let base = if bar.is_up() { ctx.theme.candle_up } else { ctx.theme.candle_down };
    base.with_alpha((255.0 * ctx.bar_opacity.clamp(0.0, 1.0)) as u8)
}

fn draw_candle(ctx: &RenderContext<'_>, s: &mut dyn Surface, bar: &Bar, width: f64) {
    let high = ctx.to_screen(bar.time, bar.high);
    let low_y = ctx.scale.price.to_px(bar.low);
    let open = ctx.to_screen(bar.time, bar.open);
    let close = ctx.to_screen(bar.time, bar.close);
    let body_top = open.y.min(close.y);
    let body_bottom = open.y.max(close.y);
    let outline = Stroke::solid(ctx.theme.wick, 1.0);

    if high.y < body_top {
        s.stroke_line(high, Point::new(high.x, body_top), &outline);
    }
    if low_y > body_bottom {
        s.stroke_line(Point::new(high.x, low_y), Point::new(high.x, body_bottom), &outline);
    }
    s.stroke_line(Point::new(open.x - width / 4.0, open.y), open, &outline);
    s.stroke_line(close, Point::new(close.x + width / 4.0, close.y), &outline);

    let body = Rect::from_ltwh(open.x - width / 2.0, body_top, width, (body_bottom - body_top).max(1.0));
    s.fill_rect(body, body_color(ctx, bar));
    s.stroke_rect(body, &Stroke::solid(ctx.theme.body_outline, 1.0));
}

fn draw_ohlc(ctx: &RenderContext<'_>, s: &mut dyn Surface, bar: &Bar, width: f64) {
    let stroke = Stroke::solid(body_color(ctx, bar), 1.0);
    let high = ctx.to_screen(bar.time, bar.high);
    let low = ctx.to_screen(bar.time, bar.low);
    let open = ctx.to_screen(bar.time, bar.open);
    let close = ctx.to_screen(bar.time, bar.close);
    s.stroke_line(high, low, &stroke);
    s.stroke_line(Point::new(open.x - width / 4.0, open.y), open, &stroke);
    s.stroke_line(close, Point::new(close.x + width / 4.0, close.y), &stroke);
}

// ---- drawings ---------------------------------------------------------------

fn draw_drawing(ctx: &RenderContext<'_>, s: &mut dyn Surface, drawing: &Drawing) {
    match drawing {
        Drawing::Rectangle(d) => draw_rectangle(ctx, s, d),
        Drawing::Line(d) => draw_line(ctx, s, d),
        Drawing::ContinuousLine(d) => draw_continuous_line(ctx, s, d),
        Drawing::Triangle(d) => draw_triangle(ctx, s, d),
        Drawing::Circle(d) => draw_circle(ctx, s, d),
        Drawing::Note(d) => draw_note(ctx, s, d),
    }
}

fn draw_rectangle(ctx: &RenderContext<'_>, s: &mut dyn Surface, d: &Rectangle) {
    let rect = Rect::from_corners(
        ctx.to_screen(d.start.time, d.start.price),
        ctx.to_screen(d.end.time, d.end.price),
    );
    let st = &d.styles;
    let fill = st.fill_color_or(ctx.theme.rectangle_fill).with_opacity(st.fill_opacity_or(0.3));
    let border = st.border_color_or(ctx.theme.rectangle_border).with_opacity(st.line_opacity_or(1.0));
    s.fill_rect(rect, fill);
    s.stroke_rect(rect, &Stroke::solid(border, st.line_width_or(1.0)));
}

fn draw_line(ctx: &RenderContext<'_>, s: &mut dyn Surface, d: &Line) {
    let from = ctx.to_screen(d.start.time, d.start.price);
    let to = ctx.to_screen(d.end.time, d.end.price);
    let st = &d.styles;
    let base = st.border_color_or(ctx.theme.line);
    let width = st.line_width_or(2.0);
    let stroke = Stroke::dashed(base.with_opacity(st.line_opacity_or(1.0)), width, d.line_style.dash_pattern(width));
    s.stroke_line(from, to, &stroke);

    // Arrowheads use the border color without line opacity.
    let head = Stroke::solid(base, ARROW_WIDTH);
    let mut barbs = |tail: Point, tip: Point| {
        if let Some(points) = arrowhead(tail, tip, ARROW_SIZE, ARROW_HALF_ANGLE) {
            for p in points {
                s.stroke_line(tip, p, &head);
            }
        }
    };
    if d.arrow.has_left() {
        barbs(to, from);
    }
    if d.arrow.has_right() {
        barbs(from, to);
    }
}

fn draw_continuous_line(ctx: &RenderContext<'_>, s: &mut dyn Surface, d: &ContinuousLine) {
    let from = Point::new(ctx.area.left, ctx.scale.price.to_px(d.start.price));
    let to = Point::new(ctx.area.right, ctx.scale.price.to_px(d.end.price));
    let st = &d.styles;
    let color = st.border_color_or(ctx.theme.continuous_line).with_opacity(st.line_opacity_or(1.0));
    let width = st.line_width_or(1.0);
    s.stroke_line(from, to, &Stroke::dashed(color, width, d.line_style.dash_pattern(width)));
}

fn draw_triangle(ctx: &RenderContext<'_>, s: &mut dyn Surface, d: &Triangle) {
    let (price, offset, rotation) = match d.direction {
        Direction::Up => (ctx.marker_price(d.time, |b| b.low, 0.1, "uptick-triangle"), MARKER_SIZE, 0.0),
        Direction::Down => (ctx.marker_price(d.time, |b| b.high, 0.9, "downtick-triangle"), -MARKER_SIZE, PI),
    };
    let at = ctx.to_screen(d.time, price);
    let points = regular_polygon(Point::new(at.x, at.y + offset), MARKER_SIZE, 3, rotation);
    let st = &d.styles;
    s.fill_polygon(&points, st.fill_color_or(ctx.theme.triangle_fill));
    s.stroke_polygon(&points, &Stroke::solid(st.border_color_or(ctx.theme.marker_border), st.line_width_or(1.0)));
}

fn draw_circle(ctx: &RenderContext<'_>, s: &mut dyn Surface, d: &Circle) {
    let price = ctx.marker_price(d.time, Bar::midpoint, 0.5, "circle");
    let at = ctx.to_screen(d.time, price);
    let st = &d.styles;
    s.fill_ellipse(at, CIRCLE_RADIUS, CIRCLE_RADIUS, st.fill_color_or(ctx.theme.circle_fill));
    let stroke = Stroke::solid(st.border_color_or(ctx.theme.marker_border), st.line_width_or(1.0));
    s.stroke_ellipse(at, CIRCLE_RADIUS, CIRCLE_RADIUS, &stroke);
}

fn draw_note(ctx: &RenderContext<'_>, s: &mut dyn Surface, d: &Note) {
    let (price, dy, anchor) = match d.position {
        Position::Over => (ctx.marker_price(d.time, |b| b.high, 0.9, "overnote"), -NOTE_OFFSET, TextAnchor::BOTTOM_CENTER),
        Position::Under => (ctx.marker_price(d.time, |b| b.low, 0.1, "undernote"), NOTE_OFFSET, TextAnchor::TOP_CENTER),
    };
    let at = ctx.to_screen(d.time, price);
    let style = TextStyle {
        color: d.styles.font_color_or(ctx.theme.note_text),
        size: d.styles.font_size_or(LABEL_FONT_SIZE),
        anchor,
    };
    s.draw_text(&d.text, Point::new(at.x, at.y + dy), &style);
}

// ---- indicators -------------------------------------------------------------

/// Screen points for the defined (non-NaN) part of a series aligned with `bars`.
fn series_points(ctx: &RenderContext<'_>, values: &[f64]) -> Vec<Point> {
    ctx.chart
        .bars
        .iter()
        .zip(values)
        .filter(|(_, v)| v.is_finite())
        .map(|(b, v)| ctx.to_screen(b.time, *v))
        .collect()
}

fn draw_series(ctx: &RenderContext<'_>, s: &mut dyn Surface, values: &[f64], stroke: &Stroke) {
    let points = series_points(ctx, values);
    if points.len() >= 2 {
        s.stroke_polyline(&points, stroke);
    }
}

fn draw_indicators(ctx: &RenderContext<'_>, s: &mut dyn Surface) {
    let theme = ctx.theme;
    for (i, indicator) in ctx.chart.indicators.iter().enumerate() {
        let Some(series) = compute(indicator, &ctx.chart.bars) else { continue };
        if !series.is_overlay() {
            debug!(indicator = indicator.kind.name(), "computed; not drawn on the price pane");
            continue;
        }
        s.begin_layer(Layer::Indicator(i));
        match &series {
            IndicatorSeries::Ema(v) => draw_series(ctx, s, v, &Stroke::solid(theme.ema, 2.0)),
            IndicatorSeries::Sma(v) => draw_series(ctx, s, v, &Stroke::solid(theme.sma, 2.0)),
            IndicatorSeries::Bollinger(bands) => {
                let stroke = Stroke::solid(theme.bollinger, 1.0);
                for band in [&bands.upper, &bands.middle, &bands.lower] {
                    draw_series(ctx, s, band, &stroke);
                }
            }
            IndicatorSeries::Rsi(_) | IndicatorSeries::Macd(_) => {}
        }
    }
}

fn draw_title(chart: &Chart, options: &RenderOptions, s: &mut dyn Surface) {
    let Some(title) = chart.title().filter(|t| !t.is_empty()) else { return };
    s.begin_layer(Layer::Title);
    let style = TextStyle { color: options.theme.title, size: TITLE_FONT_SIZE, anchor: TextAnchor::CENTER };
    let (width, _) = s.size();
    s.draw_text(title, Point::new(width as f64 / 2.0, TITLE_Y), &style);
}
