use crate::lang::Span;

/// A parsing error with source location.
///
/// `line` and `col` are 1-based positions coming from the lexer spans.
/// Errors at end of input point at the `Eof` token, which sits just past
/// the last character.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{line}:{col}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            line: span.line,
            col: span.col,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.line, self.col)
    }
}
