// File: crates/cml-core/src/style.rs
// Summary: Style resolution: hex colors, opacity scaling, raw style maps and typed drawing styles.

use std::fmt;

use crate::model::Scalar;

/// Straight 8-bit RGBA color handed to the drawing surface as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self { Self { r, g, b, a } }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self { Self::new(r, g, b, 255) }

    /// Parse `#RGB` / `#RRGGBB` (the `#` is optional). Malformed input yields
    /// opaque black rather than an error.
    pub fn from_hex(s: &str) -> Self {
        parse_hex(s).unwrap_or(Self::BLACK)
    }

    /// Scale R, G and B by `opacity` and replace alpha with `255 * opacity`.
    /// Channels truncate toward zero. This only scales the foreground sample;
    /// no blending with the background takes place.
    pub fn with_opacity(self, opacity: f64) -> Self {
        let o = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
        let scale = |c: u8| (c as f64 * o) as u8;
        Self { r: scale(self.r), g: scale(self.g), b: scale(self.b), a: (255.0 * o) as u8 }
    }

    /// Replace only the alpha channel.
    pub const fn with_alpha(self, a: u8) -> Self { Self { a, ..self } }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

fn parse_hex(s: &str) -> Option<Rgba> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).ok();
    match hex.len() {
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
            Some(Rgba::rgb(expand(0)?, expand(1)?, expand(2)?))
        }
        6 => Some(Rgba::rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

/// Ordered `key=value` style assignments attached to one drawing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleMap {
    entries: Vec<(String, Scalar)>,
}

impl StyleMap {
    pub fn new() -> Self { Self::default() }

    /// Later assignments of the same key replace earlier ones.
    pub fn insert(&mut self, key: impl Into<String>, value: Scalar) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Text values are parsed as hex colors; numbers are the wrong kind.
    pub fn color(&self, key: &str) -> Option<Rgba> {
        match self.get(key)? {
            Scalar::Text(s) => Some(Rgba::from_hex(s)),
            Scalar::Number(_) => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(_) => None,
        }
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Scalar::Text(s) => Some(s.as_str()),
            Scalar::Number(_) => None,
        }
    }

    pub fn color_or(&self, key: &str, default: Rgba) -> Rgba { self.color(key).unwrap_or(default) }

    pub fn float_or(&self, key: &str, default: f64) -> f64 { self.float(key).unwrap_or(default) }

    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str { self.string(key).unwrap_or(default) }

    /// `true` only for a text value spelling `true` (any case).
    pub fn flag(&self, key: &str) -> bool {
        self.string(key).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

/// Stroke pattern selected by the `style=` key of lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    /// Unknown names fall back to solid.
    pub fn from_name(name: &str) -> Self {
        match name {
            "dashed" => Self::Dashed,
            "dotted" => Self::Dotted,
            _ => Self::Solid,
        }
    }

    /// On/off dash intervals for a stroke of `width`; empty for solid.
    pub fn dash_pattern(self, width: f64) -> Vec<f64> {
        match self {
            Self::Solid => Vec::new(),
            Self::Dashed => vec![width * 2.0, width * 2.0],
            Self::Dotted => vec![width * 0.5, width * 2.5],
        }
    }
}

/// Arrowheads requested for a line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Arrow {
    #[default]
    None,
    Left,
    Right,
    Both,
}

impl Arrow {
    pub fn from_flags(left: bool, right: bool) -> Self {
        match (left, right) {
            (true, true) => Self::Both,
            (true, false) => Self::Left,
            (false, true) => Self::Right,
            (false, false) => Self::None,
        }
    }

    pub fn has_left(self) -> bool { matches!(self, Self::Left | Self::Both) }

    pub fn has_right(self) -> bool { matches!(self, Self::Right | Self::Both) }
}

/// Typed view of a drawing's style map. `None` means the key was absent or
/// held the wrong kind of value; the compositor supplies per-drawing defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Styles {
    pub border_color: Option<Rgba>,
    pub fill_color: Option<Rgba>,
    pub font_color: Option<Rgba>,
    pub line_width: Option<f64>,
    pub fill_opacity: Option<f64>,
    pub line_opacity: Option<f64>,
    pub font_size: Option<f64>,
}

impl Styles {
    pub fn border_color_or(&self, default: Rgba) -> Rgba { self.border_color.unwrap_or(default) }
    pub fn fill_color_or(&self, default: Rgba) -> Rgba { self.fill_color.unwrap_or(default) }
    pub fn font_color_or(&self, default: Rgba) -> Rgba { self.font_color.unwrap_or(default) }
    pub fn line_width_or(&self, default: f64) -> f64 { self.line_width.unwrap_or(default) }
    pub fn fill_opacity_or(&self, default: f64) -> f64 { self.fill_opacity.unwrap_or(default) }
    pub fn line_opacity_or(&self, default: f64) -> f64 { self.line_opacity.unwrap_or(default) }
    pub fn font_size_or(&self, default: f64) -> f64 { self.font_size.unwrap_or(default) }
}

impl From<&StyleMap> for Styles {
    fn from(map: &StyleMap) -> Self {
        Self {
            border_color: map.color("border-color"),
            fill_color: map.color("fill-color"),
            font_color: map.color("font-color"),
            line_width: map.float("line-width"),
            fill_opacity: map.float("fill-opacity"),
            line_opacity: map.float("line-opacity"),
            font_size: map.float("font-size"),
        }
    }
}
