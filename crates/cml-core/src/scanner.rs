// File: crates/cml-core/src/scanner.rs
// Summary: Line scanner; splits CML text into trimmed, indentation-aware lines.

/// One physical line of a CML document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Count of leading space/tab characters.
    pub indent: usize,
    /// Line content with surrounding whitespace removed.
    pub text: &'a str,
}

impl<'a> Line<'a> {
    pub fn is_blank(&self) -> bool { self.text.is_empty() }

    pub fn is_comment(&self) -> bool { self.text.starts_with('#') }

    /// Blank and comment lines carry no content for any section.
    pub fn is_skippable(&self) -> bool { self.is_blank() || self.is_comment() }

    pub fn is_indented(&self) -> bool { self.indent > 0 }
}

pub fn scan(text: &str) -> Vec<Line<'_>> {
    text.lines()
        .enumerate()
        .map(|(i, raw)| {
            let indent = raw.chars().take_while(|c| *c == ' ' || *c == '\t').count();
            Line { number: i + 1, indent, text: raw.trim() }
        })
        .collect()
}
