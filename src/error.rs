use crate::bytecode::CodeGenError;
use crate::frontend::{LexError, ParseError};
use crate::lang::Span;
use crate::runtime::RuntimeError;
use crate::sema::TypeError;

/// Any failure along the pipeline, tagged by the stage that raised it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("codegen error: {0}")]
    CodeGen(#[from] CodeGenError),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),

    #[error("invalid bytecode image: {0}")]
    Image(#[from] postcard::Error),
}

impl Error {
    /// Source position of the error, `0:0` when the stage has none.
    pub fn position(&self) -> Span {
        match self {
            Error::Lex(e) => e.span(),
            Error::Parse(e) => e.span(),
            Error::Type(e) => e.span(),
            Error::Runtime(e) => Span::new(e.line, e.col),
            Error::CodeGen(_) | Error::Image(_) => Span::none(),
        }
    }
}
