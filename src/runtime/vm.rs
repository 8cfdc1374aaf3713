use crate::bytecode::{BytecodeProgram, Op, Target};
use crate::ir::lower::FUNCTION_LABEL_PREFIX;
use crate::ir::function_label;
use crate::runtime::runtime_error::{
    RuntimeError, division_by_zero, integer_overflow, jump_out_of_bounds, missing_entry,
    modulo_by_zero, stack_underflow, undefined_variable, unresolved_target,
};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Function whose label execution starts at.
    pub entry: String,
    /// Deepest allowed chain of `CALL`s not yet returned from.
    pub max_call_depth: Option<usize>,
    pub max_steps: Option<usize>,
    /// Print each executed instruction to stderr.
    pub trace: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            entry: "main".to_string(),
            max_call_depth: None,
            max_steps: None,
            trace: false,
        }
    }
}

/// Stack machine over integers with one flat variable store.
///
/// There are no per-call frames: every function reads and writes the same
/// `variables` map, and `CALL`/`RET` only move the program counter.
pub struct Vm {
    stack: Vec<i64>,
    variables: HashMap<String, i64>,
    call_stack: Vec<usize>,
    config: VmConfig,
    pc: usize,
    steps: usize,

    /// Entry addresses of the functions entered and not yet returned from.
    frames: Vec<usize>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            stack: Vec::new(),
            variables: HashMap::new(),
            call_stack: Vec::new(),
            config,
            pc: 0,
            steps: 0,
            frames: Vec::new(),
        }
    }

    pub fn stack(&self) -> &[i64] {
        &self.stack
    }

    pub fn variable(&self, name: &str) -> Option<i64> {
        self.variables.get(name).copied()
    }

    pub fn reset_execution_state(&mut self) {
        self.stack.clear();
        self.variables.clear();
        self.call_stack.clear();
        self.frames.clear();
        self.pc = 0;
        self.steps = 0;
    }

    /// Runs `program` from the entry function and returns the value left on
    /// top of the stack, or 0 when the stack is empty.
    pub fn run(&mut self, program: &BytecodeProgram) -> Result<i64, RuntimeError> {
        self.reset_execution_state();

        let entry = &self.config.entry;
        let start = program
            .address_of(&function_label(entry))
            .ok_or_else(|| missing_entry(entry))?;
        self.pc = start;
        self.frames.push(start);

        let functions = function_names(program);
        self.exec(program, &functions).map_err(|e| {
            let frames = self.frames.iter().map(|addr| frame_name(&functions, *addr));
            e.at_pc(self.pc).with_call_stack(frames.collect())
        })?;

        Ok(self.stack.last().copied().unwrap_or(0))
    }

    // Execution

    fn check_call_depth(&self, callee: &str) -> Result<(), RuntimeError> {
        if let Some(max) = self.config.max_call_depth {
            if self.call_stack.len() >= max {
                return Err(RuntimeError::new(&format!(
                    "call depth limit exceeded ({}) - possible infinite recursion in '{}'",
                    max, callee
                )));
            }
        }

        Ok(())
    }

    fn check_limits(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;

        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                return Err(RuntimeError::new(&format!(
                    "execution step limit exceeded ({})",
                    max
                )));
            }
        }

        Ok(())
    }

    fn exec(
        &mut self,
        program: &BytecodeProgram,
        functions: &HashMap<usize, String>,
    ) -> Result<(), RuntimeError> {
        let code = &program.code;

        while self.pc < code.len() {
            self.check_limits()?;

            let op = &code[self.pc];
            if self.config.trace {
                self.trace(op);
            }

            let mut next = self.pc + 1;

            match op {
                Op::Push(n) => self.push(*n),
                Op::Load(name) => {
                    let value = self
                        .variables
                        .get(name)
                        .copied()
                        .ok_or_else(|| undefined_variable(name))?;
                    self.push(value);
                }
                Op::Store(name) => {
                    let value = self.pop("STORE")?;
                    self.variables.insert(name.clone(), value);
                }

                // Arithmetic
                Op::Add => self.arith(op, i64::checked_add)?,
                Op::Sub => self.arith(op, i64::checked_sub)?,
                Op::Mul => self.arith(op, i64::checked_mul)?,
                Op::Div => {
                    let (a, b) = self.pop_two(op)?;
                    if b == 0 {
                        return Err(division_by_zero());
                    }
                    let q = floor_div(a, b).ok_or_else(|| integer_overflow("DIV"))?;
                    self.push(q);
                }
                Op::Mod => {
                    let (a, b) = self.pop_two(op)?;
                    if b == 0 {
                        return Err(modulo_by_zero());
                    }
                    self.push(floor_mod(a, b));
                }
                Op::Neg => {
                    let a = self.pop("NEG")?;
                    let r = a.checked_neg().ok_or_else(|| integer_overflow("NEG"))?;
                    self.push(r);
                }

                // Comparison
                Op::Lt => self.compare(op, |a, b| a < b)?,
                Op::Gt => self.compare(op, |a, b| a > b)?,
                Op::Le => self.compare(op, |a, b| a <= b)?,
                Op::Ge => self.compare(op, |a, b| a >= b)?,
                Op::Eq => self.compare(op, |a, b| a == b)?,
                Op::Ne => self.compare(op, |a, b| a != b)?,

                // Logic
                Op::And => self.compare(op, |a, b| a != 0 && b != 0)?,
                Op::Or => self.compare(op, |a, b| a != 0 || b != 0)?,
                Op::Not => {
                    let a = self.pop("NOT")?;
                    self.push(i64::from(a == 0));
                }

                // Control flow
                Op::Jmp(target) => next = resolve(target, code.len())?,
                Op::Jz(target) => {
                    if self.pop("JZ")? == 0 {
                        next = resolve(target, code.len())?;
                    }
                }
                Op::Jnz(target) => {
                    if self.pop("JNZ")? != 0 {
                        next = resolve(target, code.len())?;
                    }
                }
                Op::Call(target) => {
                    let addr = resolve(target, code.len())?;
                    self.check_call_depth(&frame_name(functions, addr))?;
                    self.call_stack.push(self.pc + 1);
                    self.frames.push(addr);
                    next = addr;
                }
                Op::Ret => match self.call_stack.pop() {
                    Some(ret) => {
                        self.frames.pop();
                        next = ret;
                    }
                    None => return Ok(()),
                },
                Op::Halt => return Ok(()),

                Op::Pop => {
                    self.pop("POP")?;
                }
            }

            self.pc = next;
        }

        Ok(())
    }

    fn trace(&self, op: &Op) {
        eprintln!(
            "[vm] {:04} {:<16} stack={:?}",
            self.pc,
            op.to_string(),
            self.stack
        );
    }

    fn arith(&mut self, op: &Op, f: fn(i64, i64) -> Option<i64>) -> Result<(), RuntimeError> {
        let (a, b) = self.pop_two(op)?;
        let r = f(a, b).ok_or_else(|| integer_overflow(op.mnemonic()))?;
        self.push(r);
        Ok(())
    }

    fn compare(&mut self, op: &Op, f: fn(i64, i64) -> bool) -> Result<(), RuntimeError> {
        let (a, b) = self.pop_two(op)?;
        self.push(i64::from(f(a, b)));
        Ok(())
    }

    // Stack operations

    fn push(&mut self, value: i64) {
        self.stack.push(value);
    }

    fn pop(&mut self, op: &str) -> Result<i64, RuntimeError> {
        self.stack.pop().ok_or_else(|| stack_underflow(op))
    }

    /// Pops the right operand, then the left; returns `(left, right)`.
    fn pop_two(&mut self, op: &Op) -> Result<(i64, i64), RuntimeError> {
        let b = self.pop(op.mnemonic())?;
        let a = self.pop(op.mnemonic())?;
        Ok((a, b))
    }
}

fn resolve(target: &Target, len: usize) -> Result<usize, RuntimeError> {
    match target {
        Target::Addr(addr) if *addr < len => Ok(*addr),
        Target::Addr(addr) => Err(jump_out_of_bounds(*addr, len)),
        Target::Label(label) => Err(unresolved_target(label)),
    }
}

/// Function entry address -> function name.
fn function_names(program: &BytecodeProgram) -> HashMap<usize, String> {
    program
        .labels
        .iter()
        .filter_map(|(label, addr)| {
            label
                .strip_prefix(FUNCTION_LABEL_PREFIX)
                .map(|name| (*addr, name.to_string()))
        })
        .collect()
}

fn frame_name(functions: &HashMap<usize, String>, addr: usize) -> String {
    functions
        .get(&addr)
        .cloned()
        .unwrap_or_else(|| format!("@{}", addr))
}

/// Quotient rounded toward negative infinity. `None` on overflow.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && (a < 0) != (b < 0) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Remainder with the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) { r + b } else { r }
}
