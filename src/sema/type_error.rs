use crate::lang::Span;

/// A static-semantics violation, reported at the offending node.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{line}:{col}: {message}")]
pub struct TypeError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl TypeError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        TypeError {
            message: message.into(),
            line: span.line,
            col: span.col,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.line, self.col)
    }
}
