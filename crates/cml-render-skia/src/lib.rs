// File: crates/cml-render-skia/src/lib.rs
// Summary: Skia CPU raster Surface implementation and PNG rendering entry points.

mod text;

use std::path::Path;

use anyhow::{Context, Result};
use skia_safe as skia;
use tracing::{debug, info, trace};

use cml_core::{render, Chart, Layer, Point, Rect, RenderOptions, Rgba, Stroke, Surface, TextStyle};

pub use text::TextShaper;

fn color(c: Rgba) -> skia::Color { skia::Color::from_argb(c.a, c.r, c.g, c.b) }

fn point(p: Point) -> (f32, f32) { (p.x as f32, p.y as f32) }

fn rect(r: Rect) -> skia::Rect {
    skia::Rect::from_ltrb(r.left as f32, r.top as f32, r.right as f32, r.bottom as f32)
}

fn fill_paint(c: Rgba) -> skia::Paint {
    let mut paint = skia::Paint::default();
    paint.set_anti_alias(true);
    paint.set_style(skia::paint::Style::Fill);
    paint.set_color(color(c));
    paint
}

fn stroke_paint(stroke: &Stroke) -> skia::Paint {
    let mut paint = skia::Paint::default();
    paint.set_anti_alias(true);
    paint.set_style(skia::paint::Style::Stroke);
    paint.set_stroke_width(stroke.width as f32);
    paint.set_color(color(stroke.color));
    if !stroke.dash.is_empty() {
        let intervals: Vec<f32> = stroke.dash.iter().map(|d| *d as f32).collect();
        paint.set_path_effect(skia::PathEffect::dash(&intervals, 0.0));
    }
    paint
}

fn path(points: &[Point], closed: bool) -> Option<skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut path = skia::Path::new();
    path.move_to(point(*first));
    for p in rest {
        path.line_to(point(*p));
    }
    if closed {
        path.close();
    }
    Some(path)
}

fn oval(center: Point, rx: f64, ry: f64) -> skia::Rect {
    rect(Rect::from_ltrb(center.x - rx, center.y - ry, center.x + rx, center.y + ry))
}

/// CPU raster canvas the compositor draws onto.
pub struct SkiaSurface {
    surface: skia::Surface,
    text: TextShaper,
    width: i32,
    height: i32,
}

impl SkiaSurface {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        let surface = skia::surfaces::raster_n32_premul((width, height))
            .with_context(|| format!("failed to create {width}x{height} raster surface"))?;
        Ok(Self { surface, text: TextShaper::new(), width, height })
    }

    pub fn encode_png(&mut self) -> Result<Vec<u8>> {
        let image = self.surface.image_snapshot();
        #[allow(deprecated)]
        let data = image
            .encode_to_data(skia::EncodedImageFormat::PNG)
            .context("PNG encoding failed")?;
        Ok(data.as_bytes().to_vec())
    }
}

impl Surface for SkiaSurface {
    fn size(&self) -> (i32, i32) { (self.width, self.height) }

    fn clear(&mut self, c: Rgba) { self.surface.canvas().clear(color(c)); }

    fn begin_layer(&mut self, layer: Layer) { trace!(?layer, "layer"); }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.surface.canvas().draw_line(point(from), point(to), &stroke_paint(stroke));
    }

    fn stroke_polyline(&mut self, points: &[Point], stroke: &Stroke) {
        if let Some(p) = path(points, false) {
            self.surface.canvas().draw_path(&p, &stroke_paint(stroke));
        }
    }

    fn fill_rect(&mut self, r: Rect, c: Rgba) { self.surface.canvas().draw_rect(rect(r), &fill_paint(c)); }

    fn stroke_rect(&mut self, r: Rect, stroke: &Stroke) {
        self.surface.canvas().draw_rect(rect(r), &stroke_paint(stroke));
    }

    fn fill_polygon(&mut self, points: &[Point], c: Rgba) {
        if let Some(p) = path(points, true) {
            self.surface.canvas().draw_path(&p, &fill_paint(c));
        }
    }

    fn stroke_polygon(&mut self, points: &[Point], stroke: &Stroke) {
        if let Some(p) = path(points, true) {
            self.surface.canvas().draw_path(&p, &stroke_paint(stroke));
        }
    }

    fn fill_ellipse(&mut self, center: Point, rx: f64, ry: f64, c: Rgba) {
        self.surface.canvas().draw_oval(oval(center, rx, ry), &fill_paint(c));
    }

    fn stroke_ellipse(&mut self, center: Point, rx: f64, ry: f64, stroke: &Stroke) {
        self.surface.canvas().draw_oval(oval(center, rx, ry), &stroke_paint(stroke));
    }

    fn draw_text(&mut self, text: &str, at: Point, style: &TextStyle) {
        let canvas = self.surface.canvas();
        self.text.draw_anchored(canvas, text, point(at), style.size as f32, color(style.color), style.anchor);
    }
}

/// Render `chart` and return the encoded PNG.
pub fn render_to_png_bytes(chart: &Chart, options: &RenderOptions) -> Result<Vec<u8>> {
    let mut surface = SkiaSurface::new(options.width, options.height)?;
    render(chart, options, &mut surface);
    let bytes = surface.encode_png()?;
    debug!(bytes = bytes.len(), "encoded PNG");
    Ok(bytes)
}

/// Render `chart` to a PNG file at `path`, creating parent directories.
pub fn render_to_png(chart: &Chart, options: &RenderOptions, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = render_to_png_bytes(chart, options)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), width = options.width, height = options.height, "wrote chart");
    Ok(())
}
