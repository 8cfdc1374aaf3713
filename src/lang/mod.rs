//! # SimpleLang syntax tree
//!
//! The AST is produced by the parser, validated by the type checker and
//! consumed by the IR generator. Every node family is a closed enum so each
//! consumer matches exhaustively.
//!
//! Ownership is a strict tree: parents own their children through `Box` and
//! `Vec`, and nothing is shared.

pub mod ast;
pub mod span;

pub use ast::{
    BinaryOp, Expr, ExprKind, FunctionDecl, Param, Program, Stmt, StmtKind, Type, TypeName,
    UnaryOp,
};
pub use span::Span;
