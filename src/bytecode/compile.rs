use crate::{
    bytecode::{BytecodeProgram, CodeGenError, Op, Target},
    ir::{Instr, ValueRef, function_label},
    lang::{BinaryOp, UnaryOp},
};

/// Lowers IR to stack bytecode.
///
/// Pass one translates each instruction and records label positions, then
/// appends `HALT`. Pass two rewrites every symbolic target to an address.
pub struct CodeGenerator {
    /// Output bytecode program
    program: BytecodeProgram,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            program: BytecodeProgram::new(),
        }
    }

    pub fn generate(mut self, instrs: &[Instr]) -> Result<BytecodeProgram, CodeGenError> {
        for instr in instrs {
            self.compile_instr(instr)?;
        }
        self.program.emit(Op::Halt);

        self.program.resolve_labels()?;
        Ok(self.program)
    }

    fn emit(&mut self, op: Op) {
        self.program.emit(op);
    }

    fn load_value(&mut self, value: &ValueRef) {
        match value {
            ValueRef::Const(n) => self.emit(Op::Push(*n)),
            ValueRef::Name(name) => self.emit(Op::Load(name.clone())),
        }
    }

    fn compile_instr(&mut self, instr: &Instr) -> Result<(), CodeGenError> {
        match instr {
            Instr::Binary {
                dest,
                op,
                left,
                right,
            } => {
                self.load_value(left);
                self.load_value(right);
                self.emit(binary_op(*op));
                self.emit(Op::Store(dest.clone()));
            }

            Instr::Unary { dest, op, operand } => {
                self.load_value(operand);
                self.emit(unary_op(*op));
                self.emit(Op::Store(dest.clone()));
            }

            Instr::Copy { dest, source } => {
                self.load_value(source);
                self.emit(Op::Store(dest.clone()));
            }

            Instr::Label(name) => self.program.mark_label(name)?,

            Instr::Jump(label) => self.emit(Op::Jmp(Target::Label(label.clone()))),

            Instr::CondJump { cond, label } => {
                self.load_value(cond);
                self.emit(Op::Jnz(Target::Label(label.clone())));
            }

            Instr::Call { dest, function, .. } => {
                self.emit(Op::Call(Target::Label(function_label(function))));
                if let Some(dest) = dest {
                    self.emit(Op::Store(dest.clone()));
                }
            }

            Instr::Return(value) => {
                if let Some(value) = value {
                    self.load_value(value);
                }
                self.emit(Op::Ret);
            }

            // arguments are not transferred; the callee reads the shared store
            Instr::Param(_) => {}
        }

        Ok(())
    }
}

fn binary_op(op: BinaryOp) -> Op {
    match op {
        BinaryOp::Add => Op::Add,
        BinaryOp::Sub => Op::Sub,
        BinaryOp::Mul => Op::Mul,
        BinaryOp::Div => Op::Div,
        BinaryOp::Mod => Op::Mod,
        BinaryOp::Lt => Op::Lt,
        BinaryOp::Gt => Op::Gt,
        BinaryOp::Le => Op::Le,
        BinaryOp::Ge => Op::Ge,
        BinaryOp::Eq => Op::Eq,
        BinaryOp::Ne => Op::Ne,
        BinaryOp::And => Op::And,
        BinaryOp::Or => Op::Or,
    }
}

fn unary_op(op: UnaryOp) -> Op {
    match op {
        UnaryOp::Neg => Op::Neg,
        UnaryOp::Not => Op::Not,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ValueRef {
        ValueRef::Name(s.to_string())
    }

    fn label(s: &str) -> Instr {
        Instr::Label(s.to_string())
    }

    #[test]
    fn test_binary_pushes_left_then_right() {
        let bc = CodeGenerator::new()
            .generate(&[Instr::Binary {
                dest: "t0".to_string(),
                op: BinaryOp::Sub,
                left: name("x"),
                right: ValueRef::Const(1),
            }])
            .unwrap();

        assert_eq!(
            bc.code,
            vec![
                Op::Load("x".to_string()),
                Op::Push(1),
                Op::Sub,
                Op::Store("t0".to_string()),
                Op::Halt,
            ]
        );
    }

    #[test]
    fn test_unary_and_copy() {
        let bc = CodeGenerator::new()
            .generate(&[
                Instr::Unary {
                    dest: "t0".to_string(),
                    op: UnaryOp::Not,
                    operand: ValueRef::Const(0),
                },
                Instr::Copy {
                    dest: "b".to_string(),
                    source: name("t0"),
                },
            ])
            .unwrap();

        assert_eq!(
            bc.code,
            vec![
                Op::Push(0),
                Op::Not,
                Op::Store("t0".to_string()),
                Op::Load("t0".to_string()),
                Op::Store("b".to_string()),
                Op::Halt,
            ]
        );
    }

    #[test]
    fn test_jumps_resolve_to_label_positions() {
        let bc = CodeGenerator::new()
            .generate(&[
                label("L0"),
                Instr::CondJump {
                    cond: name("c"),
                    label: "L1".to_string(),
                },
                Instr::Jump("L0".to_string()),
                label("L1"),
                Instr::Return(None),
            ])
            .unwrap();

        assert_eq!(
            bc.code,
            vec![
                Op::Load("c".to_string()),
                Op::Jnz(Target::Addr(3)),
                Op::Jmp(Target::Addr(0)),
                Op::Ret,
                Op::Halt,
            ]
        );
        assert_eq!(bc.address_of("L0"), Some(0));
        assert_eq!(bc.address_of("L1"), Some(3));
    }

    #[test]
    fn test_call_targets_function_label() {
        let bc = CodeGenerator::new()
            .generate(&[
                label("func_f"),
                Instr::Return(Some(ValueRef::Const(7))),
                label("func_main"),
                Instr::Param(ValueRef::Const(1)),
                Instr::Call {
                    dest: Some("t0".to_string()),
                    function: "f".to_string(),
                    args: vec![ValueRef::Const(1)],
                },
                Instr::Call {
                    dest: None,
                    function: "f".to_string(),
                    args: vec![],
                },
                Instr::Return(Some(name("t0"))),
            ])
            .unwrap();

        assert_eq!(
            bc.code,
            vec![
                Op::Push(7),
                Op::Ret,
                Op::Call(Target::Addr(0)),
                Op::Store("t0".to_string()),
                Op::Call(Target::Addr(0)),
                Op::Load("t0".to_string()),
                Op::Ret,
                Op::Halt,
            ]
        );
        assert_eq!(bc.address_of("func_main"), Some(2));
    }

    #[test]
    fn test_param_emits_nothing() {
        let bc = CodeGenerator::new()
            .generate(&[Instr::Param(name("x"))])
            .unwrap();
        assert_eq!(bc.code, vec![Op::Halt]);
    }

    #[test]
    fn test_unresolved_label() {
        let err = CodeGenerator::new()
            .generate(&[Instr::Jump("L9".to_string())])
            .unwrap_err();
        assert!(matches!(err, CodeGenError::UnresolvedLabel { ref label, at: 0 } if label == "L9"));
    }

    #[test]
    fn test_duplicate_label() {
        let err = CodeGenerator::new()
            .generate(&[label("L0"), label("L0")])
            .unwrap_err();
        assert!(matches!(err, CodeGenError::DuplicateLabel(_)));
    }

    #[test]
    fn test_call_to_unknown_function_is_unresolved() {
        let err = CodeGenerator::new()
            .generate(&[Instr::Call {
                dest: None,
                function: "ghost".to_string(),
                args: vec![],
            }])
            .unwrap_err();
        assert!(err.to_string().contains("func_ghost"));
    }
}
