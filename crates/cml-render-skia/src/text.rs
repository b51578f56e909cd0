// File: crates/cml-render-skia/src/text.rs
// Summary: Paragraph-based text shaping with fractional anchoring.

use skia_safe as skia;
use skia::textlayout::{FontCollection, Paragraph, ParagraphBuilder, ParagraphStyle, TextAlign, TextStyle};

use cml_core::TextAnchor;

const FAMILIES: [&str; 6] = ["Arial", "Helvetica", "Segoe UI", "Roboto", "DejaVu Sans", "sans-serif"];

pub struct TextShaper {
    fonts: FontCollection,
}

impl Default for TextShaper {
    fn default() -> Self { Self::new() }
}

impl TextShaper {
    pub fn new() -> Self {
        let mut fonts = FontCollection::new();
        fonts.set_default_font_manager(skia::FontMgr::default(), None);
        Self { fonts }
    }

    pub fn layout(&self, text: &str, size: f32, color: skia::Color) -> Paragraph {
        let mut pstyle = ParagraphStyle::new();
        pstyle.set_text_align(TextAlign::Left);
        let mut style = TextStyle::new();
        style.set_font_size(size.max(1.0));
        style.set_color(color);
        style.set_font_families(&FAMILIES);

        let mut builder = ParagraphBuilder::new(&pstyle, &self.fonts);
        builder.push_style(&style);
        builder.add_text(text);
        let mut paragraph = builder.build();
        paragraph.layout(10_000.0);
        paragraph
    }

    /// Width of the longest line and total height.
    pub fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        let p = self.layout(text, size, skia::Color::TRANSPARENT);
        (p.longest_line(), p.height())
    }

    /// Draw `text` so that the fractional point `anchor` of its box lands on `(x, y)`.
    pub fn draw_anchored(
        &self,
        canvas: &skia::Canvas,
        text: &str,
        (x, y): (f32, f32),
        size: f32,
        color: skia::Color,
        anchor: TextAnchor,
    ) {
        let mut p = self.layout(text, size, color);
        let (w, h) = (p.longest_line(), p.height());
        let left = x - w * anchor.ax as f32;
        let top = y - h * anchor.ay as f32;
        p.paint(canvas, (left, top));
    }
}
