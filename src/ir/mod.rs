//! Three-address intermediate representation.

pub mod instr;
pub mod lower;

pub use instr::{Instr, ValueRef, format_ir};
pub use lower::{IrGenerator, function_label};
