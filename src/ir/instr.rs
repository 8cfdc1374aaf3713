use std::fmt;

use crate::lang::{BinaryOp, UnaryOp};

/// An IR operand: an integer literal or a symbolic name (temporary or variable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueRef {
    Const(i64),
    Name(String),
}

impl fmt::Display for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Const(n) => write!(f, "{}", n),
            ValueRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Three-address instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Binary {
        dest: String,
        op: BinaryOp,
        left: ValueRef,
        right: ValueRef,
    },
    Unary {
        dest: String,
        op: UnaryOp,
        operand: ValueRef,
    },
    Copy {
        dest: String,
        source: ValueRef,
    },
    Label(String),
    Jump(String),
    /// Jumps when `cond` is non-zero; falls through otherwise.
    CondJump {
        cond: ValueRef,
        label: String,
    },
    /// `dest` is `None` for calls to void functions.
    Call {
        dest: Option<String>,
        function: String,
        args: Vec<ValueRef>,
    },
    Return(Option<ValueRef>),
    Param(ValueRef),
}

impl Instr {
    pub fn is_label(&self) -> bool {
        matches!(self, Instr::Label(_))
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Binary {
                dest,
                op,
                left,
                right,
            } => write!(f, "{} = {} {} {}", dest, left, op, right),
            Instr::Unary { dest, op, operand } => write!(f, "{} = {}{}", dest, op, operand),
            Instr::Copy { dest, source } => write!(f, "{} = {}", dest, source),
            Instr::Label(name) => write!(f, "{}:", name),
            Instr::Jump(label) => write!(f, "goto {}", label),
            Instr::CondJump { cond, label } => write!(f, "if {} goto {}", cond, label),
            Instr::Call {
                dest,
                function,
                args,
            } => {
                if let Some(dest) = dest {
                    write!(f, "{} = ", dest)?;
                }
                write!(f, "call {}(", function)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Instr::Return(Some(value)) => write!(f, "return {}", value),
            Instr::Return(None) => write!(f, "return"),
            Instr::Param(value) => write!(f, "param {}", value),
        }
    }
}

/// Renders an instruction listing, one per line, with labels flush left.
pub fn format_ir(instrs: &[Instr]) -> String {
    let mut out = String::new();
    for instr in instrs {
        if !instr.is_label() {
            out.push_str("    ");
        }
        out.push_str(&instr.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ValueRef {
        ValueRef::Name(s.to_string())
    }

    #[test]
    fn test_display() {
        let binary = Instr::Binary {
            dest: "t0".to_string(),
            op: BinaryOp::Add,
            left: name("x"),
            right: ValueRef::Const(1),
        };
        assert_eq!(binary.to_string(), "t0 = x + 1");

        let unary = Instr::Unary {
            dest: "t1".to_string(),
            op: UnaryOp::Not,
            operand: name("b"),
        };
        assert_eq!(unary.to_string(), "t1 = !b");

        let call = Instr::Call {
            dest: Some("t2".to_string()),
            function: "f".to_string(),
            args: vec![ValueRef::Const(1), name("y")],
        };
        assert_eq!(call.to_string(), "t2 = call f(1, y)");

        let void_call = Instr::Call {
            dest: None,
            function: "g".to_string(),
            args: vec![],
        };
        assert_eq!(void_call.to_string(), "call g()");

        assert_eq!(
            Instr::CondJump {
                cond: name("t0"),
                label: "L3".to_string()
            }
            .to_string(),
            "if t0 goto L3"
        );
        assert_eq!(Instr::Return(None).to_string(), "return");
        assert_eq!(Instr::Param(ValueRef::Const(-4)).to_string(), "param -4");
    }

    #[test]
    fn test_format_ir_indents_non_labels() {
        let listing = format_ir(&[
            Instr::Label("func_main".to_string()),
            Instr::Return(Some(ValueRef::Const(0))),
        ]);
        assert_eq!(listing, "func_main:\n    return 0\n");
    }
}
