pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod op;
pub mod program;

pub use compile::CodeGenerator;
pub use compile_error::CodeGenError;
pub use op::{Op, Target};
pub use program::BytecodeProgram;
