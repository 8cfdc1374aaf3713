#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub message: String,
    /// Source position; bytecode carries none, so these stay 0 unless set.
    pub line: usize,
    pub col: usize,
    /// Index of the faulting instruction.
    pub pc: Option<usize>,
    /// Functions active when the error was raised, outermost first.
    pub call_stack: Vec<String>,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "runtime error: {}", self.message)?;

        if let Some(pc) = self.pc {
            write!(f, " (at instruction {})", pc)?;
        }

        if !self.call_stack.is_empty() {
            write!(f, "\n  call stack:")?;

            for (i, frame) in self.call_stack.iter().rev().enumerate() {
                write!(f, "\n    {}: {}", i, frame)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

impl RuntimeError {
    pub fn new(msg: &str) -> Self {
        RuntimeError {
            message: msg.to_string(),
            line: 0,
            col: 0,
            pc: None,
            call_stack: Vec::new(),
        }
    }

    pub fn at_pc(mut self, pc: usize) -> Self {
        self.pc.get_or_insert(pc);
        self
    }

    pub fn with_call_stack(mut self, frames: Vec<String>) -> Self {
        self.call_stack = frames;
        self
    }
}

// Constructors for the errors the VM raises.

pub fn division_by_zero() -> RuntimeError {
    RuntimeError::new("division by zero")
}

pub fn modulo_by_zero() -> RuntimeError {
    RuntimeError::new("modulo by zero")
}

pub fn stack_underflow(op: &str) -> RuntimeError {
    RuntimeError::new(&format!("stack underflow in {}", op))
}

pub fn undefined_variable(name: &str) -> RuntimeError {
    RuntimeError::new(&format!("undefined variable '{}'", name))
}

pub fn missing_entry(name: &str) -> RuntimeError {
    RuntimeError::new(&format!("no '{}' function found", name))
}

pub fn integer_overflow(op: &str) -> RuntimeError {
    RuntimeError::new(&format!("integer overflow in {}", op))
}

pub fn unresolved_target(label: &str) -> RuntimeError {
    RuntimeError::new(&format!("unresolved jump target '{}'", label))
}

pub fn jump_out_of_bounds(addr: usize, len: usize) -> RuntimeError {
    RuntimeError::new(&format!(
        "jump target {} outside program of {} instructions",
        addr, len
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_plain() {
        assert_eq!(division_by_zero().to_string(), "runtime error: division by zero");
    }

    #[test]
    fn test_display_with_pc_and_call_stack() {
        let err = undefined_variable("n")
            .at_pc(12)
            .with_call_stack(vec!["main".to_string(), "double".to_string()]);
        assert_eq!(
            err.to_string(),
            "runtime error: undefined variable 'n' (at instruction 12)\n  call stack:\n    0: double\n    1: main"
        );
    }

    #[test]
    fn test_first_pc_wins() {
        let err = modulo_by_zero().at_pc(3).at_pc(9);
        assert_eq!(err.pc, Some(3));
    }
}
