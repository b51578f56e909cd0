// File: crates/cml-core/src/error.rs
// Summary: Parse error taxonomy (format, numeric, datetime) with line context.

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Error raised while parsing a CML document. Every variant carries the
/// 1-based line number and the trimmed text of the offending line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: {message}: `{text}`")]
    Format { line: usize, text: String, message: String },

    #[error("line {line}: invalid number `{value}`: `{text}`")]
    Numeric { line: usize, text: String, value: String },

    #[error("line {line}: invalid datetime `{value}` (expected YYYY/MM/DD HH:MM[:SS]): `{text}`")]
    DateTime { line: usize, text: String, value: String },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            Self::Format { line, .. } | Self::Numeric { line, .. } | Self::DateTime { line, .. } => *line,
        }
    }
}

/// Line-less error produced by the field parsers; the parser attaches the
/// line context with [`ErrorKind::at`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ErrorKind {
    Format(String),
    Numeric(String),
    DateTime(String),
}

impl ErrorKind {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub(crate) fn at(self, line: usize, text: &str) -> ParseError {
        let text = text.to_string();
        match self {
            Self::Format(message) => ParseError::Format { line, text, message },
            Self::Numeric(value) => ParseError::Numeric { line, text, value },
            Self::DateTime(value) => ParseError::DateTime { line, text, value },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_attaches_line_context() {
        let err = ErrorKind::Numeric("abc".into()).at(7, "2024/01/01 10:00, abc, 1, 1, 1");
        assert_eq!(err.line(), 7);
        let msg = err.to_string();
        assert!(msg.starts_with("line 7: invalid number `abc`"), "{msg}");
    }
}
