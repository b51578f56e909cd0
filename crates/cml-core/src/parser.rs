// File: crates/cml-core/src/parser.rs
// Summary: Section state machine turning scanned CML lines into a Chart.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::error::{ErrorKind, ParseResult};
use crate::model::{
    Anchor, Bar, BarOpacityConfig, BarType, Chart, Circle, ContinuousLine, Direction, Drawing, Entry,
    GridConfig, Indicator, IndicatorKind, Line as LineDrawing, Note, Position, Rectangle, Scalar, Triangle,
    Value, YAxisConfig,
};
use crate::scanner::{scan, Line};
use crate::style::{Arrow, LineStyle, StyleMap, Styles};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Meta,
    Settings,
    Bars,
    Drawings,
    Indicators,
}

impl Section {
    fn from_header(line: &Line<'_>) -> Option<Self> {
        if line.is_indented() {
            return None;
        }
        match line.text.strip_suffix(':')?.trim() {
            "meta" => Some(Self::Meta),
            "settings" => Some(Self::Settings),
            "bars" => Some(Self::Bars),
            "drawings" => Some(Self::Drawings),
            "indicators" => Some(Self::Indicators),
            _ => None,
        }
    }
}

/// Parse a complete CML document. The first malformed line aborts the parse.
pub fn parse(text: &str) -> ParseResult<Chart> {
    Parser { lines: scan(text), pos: 0, chart: Chart::new() }.run()
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
    chart: Chart,
}

impl<'a> Parser<'a> {
    fn run(mut self) -> ParseResult<Chart> {
        let mut section = None;
        while let Some(line) = self.advance() {
            if line.is_skippable() {
                continue;
            }
            if let Some(next) = Section::from_header(&line) {
                debug!(?next, line = line.number, "section");
                section = Some(next);
                continue;
            }
            let Some(current) = section else {
                return Err(ErrorKind::format("content before any section header").at(line.number, line.text));
            };
            match current {
                Section::Meta => {
                    let entry = parse_meta(line.text).map_err(|k| k.at(line.number, line.text))?;
                    self.chart.meta.push(entry);
                }
                Section::Settings => self.settings_entry(line)?,
                Section::Bars => {
                    let bar = parse_bar(line.text).map_err(|k| k.at(line.number, line.text))?;
                    self.chart.bars.push(bar);
                }
                Section::Drawings => self.drawing(line)?,
                Section::Indicators => {
                    let indicator = parse_indicator(line.text).map_err(|k| k.at(line.number, line.text))?;
                    self.chart.indicators.push(indicator);
                }
            }
        }
        debug!(
            meta = self.chart.meta.len(),
            settings = self.chart.settings.len(),
            bars = self.chart.bars.len(),
            drawings = self.chart.drawings.len(),
            indicators = self.chart.indicators.len(),
            "parsed chart"
        );
        Ok(self.chart)
    }

    fn advance(&mut self) -> Option<Line<'a>> {
        let line = self.lines.get(self.pos).copied();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }

    fn peek(&self) -> Option<Line<'a>> { self.lines.get(self.pos).copied() }

    fn settings_entry(&mut self, line: Line<'a>) -> ParseResult<()> {
        let at = |k: ErrorKind| k.at(line.number, line.text);
        let (key, value) = split_entry(line.text).map_err(at)?;
        let value = match key {
            "bar-type" => BarType::from_name(value)
                .map(Value::BarType)
                .ok_or_else(|| at(ErrorKind::format(format!("unknown bar type `{value}`"))))?,
            "y-axis-precision" => Value::YAxis(parse_y_axis(value).map_err(at)?),
            "bar-opacity" => Value::BarOpacity(parse_bar_opacity(value).map_err(at)?),
            "grid" if value.is_empty() => Value::Grid(self.grid_block(line)?),
            "grid" => Value::Grid(parse_inline_grid(value).map_err(at)?),
            other => return Err(at(ErrorKind::format(format!("unknown settings key `{other}`")))),
        };
        self.chart.settings.push(Entry { key: key.to_string(), value });
        Ok(())
    }

    /// Properties under a bare `grid:` line: lines indented deeper, or indented
    /// `key=value` lines at any depth. A blank line or any other line ends the
    /// block and is left for the caller.
    fn grid_block(&mut self, opener: Line<'a>) -> ParseResult<GridConfig> {
        let mut config = GridConfig::default();
        while let Some(line) = self.peek() {
            if line.is_blank() || !(line.indent > opener.indent || is_grid_prop(&line)) {
                break;
            }
            self.pos += 1;
            if line.is_comment() {
                continue;
            }
            let (key, value) = split_prop(line.text).map_err(|k| k.at(line.number, line.text))?;
            apply_grid_prop(&mut config, key, value).map_err(|k| k.at(line.number, line.text))?;
        }
        Ok(config)
    }

    fn drawing(&mut self, opener: Line<'a>) -> ParseResult<()> {
        let mut map = StyleMap::new();
        while let Some(line) = self.peek() {
            if !line.is_skippable() && line.indent <= opener.indent {
                break;
            }
            self.pos += 1;
            if line.is_skippable() {
                continue;
            }
            let (key, value) = split_prop(line.text).map_err(|k| k.at(line.number, line.text))?;
            map.insert(key, Scalar::parse(value));
        }
        let drawing = parse_drawing(opener.text, &map).map_err(|k| k.at(opener.number, opener.text))?;
        debug!(kind = drawing.kind(), line = opener.number, styles = map.len(), "drawing");
        self.chart.drawings.push(drawing);
        Ok(())
    }
}

/// Indented `key=value` with no `:`, so it cannot be the next settings entry.
fn is_grid_prop(line: &Line<'_>) -> bool {
    line.is_indented() && !line.text.contains(':') && line.text.contains('=')
}

fn split_entry(text: &str) -> Result<(&str, &str), ErrorKind> {
    text.split_once(':')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| ErrorKind::format("expected `key: value`"))
}

fn split_prop(text: &str) -> Result<(&str, &str), ErrorKind> {
    text.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| ErrorKind::format("expected `key=value`"))
}

/// `k=v, k=v` with empty segments ignored.
fn split_props(inner: &str) -> Result<Vec<(&str, &str)>, ErrorKind> {
    inner.split(',').map(str::trim).filter(|s| !s.is_empty()).map(split_prop).collect()
}

/// Contents of `name(...)`, or `None` when the value is not in that form.
fn call_args<'t>(value: &'t str, name: &str) -> Option<&'t str> {
    value.strip_prefix(name)?.strip_prefix('(')?.strip_suffix(')')
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"').and_then(|r| r.strip_suffix('"')).unwrap_or(s)
}

fn parse_number(s: &str) -> Result<f64, ErrorKind> {
    let s = s.trim();
    s.parse::<f64>().map_err(|_| ErrorKind::Numeric(s.to_string()))
}

/// Strict `YYYY/MM/DD HH:MM[:SS]`, UTC.
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ErrorKind> {
    let s = s.trim();
    let invalid = || ErrorKind::DateTime(s.to_string());
    let mut parts = s.split_whitespace();
    let (Some(date), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    let date = fields(date, '/', &[4, 2, 2]).ok_or_else(invalid)?;
    let time = fields(time, ':', &[2, 2])
        .or_else(|| fields(time, ':', &[2, 2, 2]))
        .ok_or_else(invalid)?;
    NaiveDate::from_ymd_opt(date[0] as i32, date[1], date[2])
        .and_then(|d| d.and_hms_opt(time[0], time[1], time.get(2).copied().unwrap_or(0)))
        .map(|naive| naive.and_utc())
        .ok_or_else(invalid)
}

/// Split on `sep` into all-digit fields of exactly the given widths.
fn fields(s: &str, sep: char, widths: &[usize]) -> Option<Vec<u32>> {
    let parts: Vec<&str> = s.split(sep).collect();
    if parts.len() != widths.len() {
        return None;
    }
    parts
        .iter()
        .zip(widths)
        .map(|(p, w)| (p.len() == *w && p.bytes().all(|b| b.is_ascii_digit())).then(|| p.parse().ok()).flatten())
        .collect()
}

fn parse_meta(text: &str) -> Result<Entry, ErrorKind> {
    let (key, value) = split_entry(text)?;
    let value = if let Some(inner) = (key == "grid").then(|| call_args(value, "grid")).flatten() {
        Value::Grid(grid_from_props(inner)?)
    } else if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Value::Text(unquote(value).to_string())
    } else {
        match Scalar::parse(value) {
            Scalar::Number(n) => Value::Number(n),
            Scalar::Text(s) => Value::Text(s),
        }
    };
    Ok(Entry { key: key.to_string(), value })
}

fn parse_y_axis(value: &str) -> Result<YAxisConfig, ErrorKind> {
    let precision = |v: &str| v.parse::<usize>().map_err(|_| ErrorKind::Numeric(v.to_string()));
    if let Some(inner) = call_args(value, "y-axis-precision") {
        let mut config = YAxisConfig::default();
        for (k, v) in split_props(inner)? {
            if k == "precision" {
                config.precision = Some(precision(v)?);
            }
        }
        return Ok(config);
    }
    Ok(YAxisConfig { precision: Some(precision(value)?) })
}

fn parse_bar_opacity(value: &str) -> Result<BarOpacityConfig, ErrorKind> {
    if let Some(inner) = call_args(value, "bar-opacity") {
        let mut config = BarOpacityConfig::default();
        for (k, v) in split_props(inner)? {
            if k == "opacity" {
                config.opacity = Some(parse_number(v)?);
            }
        }
        return Ok(config);
    }
    Ok(BarOpacityConfig { opacity: Some(parse_number(value)?) })
}

fn parse_inline_grid(value: &str) -> Result<GridConfig, ErrorKind> {
    let inner = call_args(value, "grid")
        .or_else(|| value.strip_prefix('(').and_then(|v| v.strip_suffix(')')))
        .ok_or_else(|| ErrorKind::format("expected `grid(key=value, ...)`"))?;
    grid_from_props(inner)
}

fn grid_from_props(inner: &str) -> Result<GridConfig, ErrorKind> {
    let mut config = GridConfig::with_defaults();
    for (k, v) in split_props(inner)? {
        apply_grid_prop(&mut config, k, v)?;
    }
    Ok(config)
}

fn apply_grid_prop(config: &mut GridConfig, key: &str, value: &str) -> Result<(), ErrorKind> {
    match key {
        "enabled" => {
            config.enabled = Some(match value {
                "true" => true,
                "false" => false,
                other => return Err(ErrorKind::format(format!("grid `enabled` must be true or false, got `{other}`"))),
            })
        }
        "line-width" => config.line_width = Some(parse_number(value)?),
        "color" => config.color = Some(value.to_string()),
        "opacity" => config.opacity = Some(parse_number(value)?),
        other => debug!(key = other, "ignoring unknown grid property"),
    }
    Ok(())
}

fn parse_bar(text: &str) -> Result<Bar, ErrorKind> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    let [time, open, high, low, close] = fields.as_slice() else {
        return Err(ErrorKind::format(format!("expected 5 bar fields, found {}", fields.len())));
    };
    Ok(Bar::new(
        parse_datetime(time)?,
        parse_number(open)?,
        parse_number(high)?,
        parse_number(low)?,
        parse_number(close)?,
    ))
}

fn parse_anchor(s: &str) -> Result<Anchor, ErrorKind> {
    let (time, price) = s
        .split_once(',')
        .filter(|(_, p)| !p.contains(','))
        .ok_or_else(|| ErrorKind::format("expected `datetime, price`"))?;
    Ok(Anchor { time: parse_datetime(time)?, price: parse_number(price)? })
}

fn parse_span(args: &str) -> Result<(Anchor, Anchor), ErrorKind> {
    let (start, end) = args
        .split_once(';')
        .filter(|(_, e)| !e.contains(';'))
        .ok_or_else(|| ErrorKind::format("expected `datetime, price; datetime, price`"))?;
    Ok((parse_anchor(start)?, parse_anchor(end)?))
}

const CONSTRUCTORS: [&str; 9] = [
    "rectangle",
    "line",
    "continuous-line",
    "uptick-triangle",
    "downtick-triangle",
    "undercircle",
    "overcircle",
    "undernote",
    "overnote",
];

fn parse_drawing(text: &str, map: &StyleMap) -> Result<Drawing, ErrorKind> {
    let (name, rest) = CONSTRUCTORS
        .iter()
        .find_map(|name| text.strip_prefix(name).and_then(|r| r.strip_prefix('(')).map(|r| (*name, r)))
        .ok_or_else(|| ErrorKind::format("unknown drawing type"))?;
    let args = rest.strip_suffix(')').ok_or_else(|| ErrorKind::format("drawing must end with `)`"))?;
    let styles = Styles::from(map);
    let line_style = LineStyle::from_name(map.str_or("style", "solid"));

    let drawing = match name {
        "rectangle" => {
            let (start, end) = parse_span(args)?;
            Drawing::Rectangle(Rectangle { start, end, styles })
        }
        "line" => {
            let (start, end) = parse_span(args)?;
            let arrow = Arrow::from_flags(map.flag("left-arrow"), map.flag("right-arrow"));
            Drawing::Line(LineDrawing { start, end, line_style, arrow, styles })
        }
        "continuous-line" => {
            let (start, end) = parse_span(args)?;
            Drawing::ContinuousLine(ContinuousLine { start, end, line_style, styles })
        }
        "uptick-triangle" | "downtick-triangle" => {
            let direction = if name.starts_with("up") { Direction::Up } else { Direction::Down };
            Drawing::Triangle(Triangle { time: parse_datetime(args)?, direction, styles })
        }
        "undercircle" | "overcircle" => Drawing::Circle(Circle { time: parse_datetime(args)?, position: position_of(name), styles }),
        _ => {
            let (time, note) = args
                .split_once(',')
                .ok_or_else(|| ErrorKind::format("expected `datetime, \"text\"`"))?;
            Drawing::Note(Note {
                time: parse_datetime(time)?,
                text: unquote(note.trim()).to_string(),
                position: position_of(name),
                styles,
            })
        }
    };
    Ok(drawing)
}

fn position_of(name: &str) -> Position {
    if name.starts_with("over") { Position::Over } else { Position::Under }
}

fn parse_indicator(text: &str) -> Result<Indicator, ErrorKind> {
    let (name, rest) = text
        .split_once('(')
        .ok_or_else(|| ErrorKind::format("expected `name(key=value, ...)`"))?;
    let name = name.trim();
    let kind = IndicatorKind::from_name(name).ok_or_else(|| ErrorKind::format(format!("unknown indicator `{name}`")))?;
    let inner = rest.trim_end().strip_suffix(')').ok_or_else(|| ErrorKind::format("indicator must end with `)`"))?;
    let mut indicator = Indicator::new(kind);
    for (k, v) in split_props(inner)? {
        indicator.params.insert(k.to_string(), Scalar::parse(v));
    }
    Ok(indicator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn datetime_accepts_optional_seconds() {
        let dt = parse_datetime("2024/02/29 09:05").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute(), dt.second()), (2024, 2, 29, 9, 5, 0));
        let dt = parse_datetime("2024/02/29   09:05:07").unwrap();
        assert_eq!(dt.second(), 7);
    }

    #[test]
    fn datetime_rejects_loose_or_impossible_input() {
        for bad in ["2024/2/29 09:05", "2024-02-29 09:05", "2023/02/29 09:05", "2024/02/29", "2024/02/29 9:05", "2024/02/29 09:05 x"] {
            assert!(matches!(parse_datetime(bad), Err(ErrorKind::DateTime(_))), "{bad}");
        }
    }

    #[test]
    fn meta_values_are_typed() {
        assert_eq!(parse_meta("title: \"Q1: review\"").unwrap().value, Value::Text("Q1: review".into()));
        assert_eq!(parse_meta("version: 2").unwrap().value, Value::Number(2.0));
        assert_eq!(parse_meta("quoted: \"2\"").unwrap().value, Value::Text("2".into()));
        assert!(matches!(parse_meta("grid: grid(opacity=0.5)").unwrap().value, Value::Grid(_)));
    }

    #[test]
    fn y_axis_and_opacity_forms() {
        assert_eq!(parse_y_axis("3").unwrap().precision, Some(3));
        assert_eq!(parse_y_axis("y-axis-precision(precision=4)").unwrap().precision, Some(4));
        assert_eq!(parse_y_axis("y-axis-precision()").unwrap().precision, None);
        assert_eq!(parse_bar_opacity("bar-opacity(opacity=0.25)").unwrap().opacity, Some(0.25));
        assert!(parse_bar_opacity("half").is_err());
    }

    #[test]
    fn note_text_keeps_commas() {
        let d = parse_drawing("overnote(2024/01/01 10:00, \"buy, then hold\")", &StyleMap::new()).unwrap();
        match d {
            Drawing::Note(n) => {
                assert_eq!(n.text, "buy, then hold");
                assert_eq!(n.position, Position::Over);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn drawing_requires_closing_paren() {
        assert!(parse_drawing("rectangle(2024/01/01 10:00,1;2024/01/01 11:00,2", &StyleMap::new()).is_err());
        assert!(parse_drawing("hexagon(2024/01/01 10:00)", &StyleMap::new()).is_err());
    }
}
