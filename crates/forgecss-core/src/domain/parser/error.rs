use thiserror::Error;

/// A syntax error with the position of the offending input.
///
/// `line` and `column` are 1-based; `column` counts characters, not bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("syntax error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub(crate) fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit('\n')
            .next()
            .map_or(0, |tail| tail.chars().count())
            + 1;

        Self {
            message: message.into(),
            offset,
            line,
            column,
        }
    }
}
