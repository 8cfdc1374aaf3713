//! Name resolution and static typing over the AST.

pub mod symbol_table;
pub mod type_checker;
pub mod type_error;

pub use symbol_table::{FunctionSignature, SymbolError, SymbolTable};
pub use type_checker::TypeChecker;
pub use type_error::TypeError;
