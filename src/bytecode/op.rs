use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// TARGET - Jump and call operands
// =============================================================================

/// A control-transfer operand. Code generation emits `Label`; label
/// resolution rewrites every one of them to `Addr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Label(String),
    Addr(usize),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Label(name) => write!(f, "{}", name),
            Target::Addr(addr) => write!(f, "@{}", addr),
        }
    }
}

// =============================================================================
// OP - Bytecode instructions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    // literals & variables
    Push(i64),
    Load(String),
    Store(String),

    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,

    // comparison
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,

    // logic (non-zero is true)
    And,
    Or,
    Not,

    // ==========================================================================
    // Control flow - absolute targets
    // ==========================================================================
    Jmp(Target),

    /// Pop, jump if zero.
    Jz(Target),

    /// Pop, jump if non-zero.
    Jnz(Target),

    /// Push the return address (pc + 1) on the call stack and jump.
    Call(Target),

    /// Pop a return address and jump to it; halts on an empty call stack.
    Ret,

    Halt,

    // stack
    Pop,
}

impl Op {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Push(_) => "PUSH",
            Op::Load(_) => "LOAD",
            Op::Store(_) => "STORE",
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::Mod => "MOD",
            Op::Neg => "NEG",
            Op::Lt => "LT",
            Op::Gt => "GT",
            Op::Le => "LE",
            Op::Ge => "GE",
            Op::Eq => "EQ",
            Op::Ne => "NE",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Not => "NOT",
            Op::Jmp(_) => "JMP",
            Op::Jz(_) => "JZ",
            Op::Jnz(_) => "JNZ",
            Op::Call(_) => "CALL",
            Op::Ret => "RET",
            Op::Halt => "HALT",
            Op::Pop => "POP",
        }
    }

    /// The jump or call operand, if this op transfers control.
    pub fn target(&self) -> Option<&Target> {
        match self {
            Op::Jmp(t) | Op::Jz(t) | Op::Jnz(t) | Op::Call(t) => Some(t),
            _ => None,
        }
    }

    pub fn target_mut(&mut self) -> Option<&mut Target> {
        match self {
            Op::Jmp(t) | Op::Jz(t) | Op::Jnz(t) | Op::Call(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Push(n) => write!(f, "{} {}", self.mnemonic(), n),
            Op::Load(name) | Op::Store(name) => write!(f, "{} {}", self.mnemonic(), name),
            Op::Jmp(t) | Op::Jz(t) | Op::Jnz(t) | Op::Call(t) => {
                write!(f, "{} {}", self.mnemonic(), t)
            }
            _ => f.write_str(self.mnemonic()),
        }
    }
}
