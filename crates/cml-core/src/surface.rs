// File: crates/cml-core/src/surface.rs
// Summary: Backend-agnostic drawing surface trait plus a recording implementation for headless use.

use crate::geometry::{Point, Rect};
use crate::style::Rgba;

/// Stroke paint: color, width and an optional on/off dash pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
    pub dash: Vec<f64>,
}

impl Stroke {
    pub fn solid(color: Rgba, width: f64) -> Self { Self { color, width, dash: Vec::new() } }

    pub fn dashed(color: Rgba, width: f64, dash: Vec<f64>) -> Self { Self { color, width, dash } }
}

/// Fractional text anchor: `(0, 0)` puts the text's top-left corner on the
/// target point, `(1, 1)` its bottom-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextAnchor {
    pub ax: f64,
    pub ay: f64,
}

impl TextAnchor {
    pub const CENTER: Self = Self { ax: 0.5, ay: 0.5 };
    pub const RIGHT_MIDDLE: Self = Self { ax: 1.0, ay: 0.5 };
    pub const TOP_CENTER: Self = Self { ax: 0.5, ay: 0.0 };
    pub const BOTTOM_CENTER: Self = Self { ax: 0.5, ay: 1.0 };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub color: Rgba,
    pub size: f64,
    pub anchor: TextAnchor,
}

/// Logical group of primitives announced before they are drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Frame,
    Grid,
    Axes,
    Bar(usize),
    Drawing(usize),
    Indicator(usize),
    Title,
}

/// 2D drawing primitives the compositor renders through. Coordinates are
/// pixels with the origin at the top-left corner.
pub trait Surface {
    fn size(&self) -> (i32, i32);

    fn clear(&mut self, color: Rgba);

    fn begin_layer(&mut self, _layer: Layer) {}

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke);

    /// Open polyline; backends with path support should override.
    fn stroke_polyline(&mut self, points: &[Point], stroke: &Stroke) {
        for pair in points.windows(2) {
            self.stroke_line(pair[0], pair[1], stroke);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke);

    fn fill_polygon(&mut self, points: &[Point], color: Rgba);

    fn stroke_polygon(&mut self, points: &[Point], stroke: &Stroke);

    fn fill_ellipse(&mut self, center: Point, rx: f64, ry: f64, color: Rgba);

    fn stroke_ellipse(&mut self, center: Point, rx: f64, ry: f64, stroke: &Stroke);

    fn draw_text(&mut self, text: &str, at: Point, style: &TextStyle);
}

/// One recorded call on a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba),
    Layer(Layer),
    Line { from: Point, to: Point, stroke: Stroke },
    Polyline { points: Vec<Point>, stroke: Stroke },
    FillRect { rect: Rect, color: Rgba },
    StrokeRect { rect: Rect, stroke: Stroke },
    FillPolygon { points: Vec<Point>, color: Rgba },
    StrokePolygon { points: Vec<Point>, stroke: Stroke },
    FillEllipse { center: Point, rx: f64, ry: f64, color: Rgba },
    StrokeEllipse { center: Point, rx: f64, ry: f64, stroke: Stroke },
    Text { text: String, at: Point, style: TextStyle },
}

/// Surface that keeps every call for later inspection.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    width: i32,
    height: i32,
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: i32, height: i32) -> Self { Self { width, height, commands: Vec::new() } }

    /// Commands issued under `layer`, across every time it was announced.
    pub fn layer(&self, layer: Layer) -> Vec<&DrawCommand> {
        let mut current = None;
        let mut out = Vec::new();
        for cmd in &self.commands {
            match cmd {
                DrawCommand::Layer(l) => current = Some(*l),
                other if current == Some(layer) => out.push(other),
                _ => {}
            }
        }
        out
    }

    /// Distinct layers in first-announced order.
    pub fn layers(&self) -> Vec<Layer> {
        let mut out = Vec::new();
        for cmd in &self.commands {
            if let DrawCommand::Layer(l) = cmd {
                if !out.contains(l) {
                    out.push(*l);
                }
            }
        }
        out
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (i32, i32) { (self.width, self.height) }

    fn clear(&mut self, color: Rgba) { self.commands.push(DrawCommand::Clear(color)); }

    fn begin_layer(&mut self, layer: Layer) { self.commands.push(DrawCommand::Layer(layer)); }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.commands.push(DrawCommand::Line { from, to, stroke: stroke.clone() });
    }

    fn stroke_polyline(&mut self, points: &[Point], stroke: &Stroke) {
        self.commands.push(DrawCommand::Polyline { points: points.to_vec(), stroke: stroke.clone() });
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) { self.commands.push(DrawCommand::FillRect { rect, color }); }

    fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokeRect { rect, stroke: stroke.clone() });
    }

    fn fill_polygon(&mut self, points: &[Point], color: Rgba) {
        self.commands.push(DrawCommand::FillPolygon { points: points.to_vec(), color });
    }

    fn stroke_polygon(&mut self, points: &[Point], stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokePolygon { points: points.to_vec(), stroke: stroke.clone() });
    }

    fn fill_ellipse(&mut self, center: Point, rx: f64, ry: f64, color: Rgba) {
        self.commands.push(DrawCommand::FillEllipse { center, rx, ry, color });
    }

    fn stroke_ellipse(&mut self, center: Point, rx: f64, ry: f64, stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokeEllipse { center, rx, ry, stroke: stroke.clone() });
    }

    fn draw_text(&mut self, text: &str, at: Point, style: &TextStyle) {
        self.commands.push(DrawCommand::Text { text: text.to_string(), at, style: *style });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_group_by_layer() {
        let mut s = RecordingSurface::new(10, 10);
        s.clear(Rgba::WHITE);
        s.begin_layer(Layer::Bar(0));
        s.stroke_line(Point::new(0.0, 0.0), Point::new(1.0, 1.0), &Stroke::solid(Rgba::BLACK, 1.0));
        s.begin_layer(Layer::Title);
        s.draw_text("t", Point::new(5.0, 5.0), &TextStyle { color: Rgba::BLACK, size: 12.0, anchor: TextAnchor::CENTER });
        assert_eq!(s.layer(Layer::Bar(0)).len(), 1);
        assert_eq!(s.layer(Layer::Title).len(), 1);
        assert!(s.layer(Layer::Bar(1)).is_empty());
        assert_eq!(s.layers(), vec![Layer::Bar(0), Layer::Title]);
        assert_eq!(s.count(|c| matches!(c, DrawCommand::Clear(_))), 1);
    }
}
