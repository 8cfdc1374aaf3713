//! Source text to AST: lexer, parser, and the token dump used by `--tokens`.

pub mod lexer;
pub mod parser;
pub mod parser_error;
pub mod token;
pub mod token_dumper;

pub use lexer::{LexError, Lexer, Spanned};
pub use parser::Parser;
pub use parser_error::ParseError;
pub use token::Token;
