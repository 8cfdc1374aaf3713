use crate::bytecode::{CodeGenError, Op, Target};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A compiled bytecode program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BytecodeProgram {
    /// One flat instruction stream holding every function.
    pub code: Vec<Op>,

    /// Label name -> index of the instruction that follows it. Ordered, so
    /// the encoded image is the same on every compile.
    pub labels: BTreeMap<String, usize>,
}

impl BytecodeProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Appends an op and returns its index.
    pub fn emit(&mut self, op: Op) -> usize {
        self.code.push(op);
        self.code.len() - 1
    }

    /// Binds `name` to the next instruction index.
    pub fn mark_label(&mut self, name: &str) -> Result<(), CodeGenError> {
        if self.labels.contains_key(name) {
            return Err(CodeGenError::DuplicateLabel(name.to_string()));
        }
        self.labels.insert(name.to_string(), self.code.len());
        Ok(())
    }

    pub fn address_of(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    /// Rewrites every symbolic jump/call target to its absolute index.
    pub fn resolve_labels(&mut self) -> Result<(), CodeGenError> {
        for (at, op) in self.code.iter_mut().enumerate() {
            if let Some(target) = op.target_mut() {
                if let Target::Label(label) = target {
                    let addr = self.labels.get(label.as_str()).copied().ok_or_else(|| {
                        CodeGenError::UnresolvedLabel {
                            label: label.clone(),
                            at,
                        }
                    })?;
                    *target = Target::Addr(addr);
                }
            }
        }
        Ok(())
    }

    /// True once no symbolic target remains.
    pub fn is_resolved(&self) -> bool {
        self.code
            .iter()
            .filter_map(Op::target)
            .all(|t| matches!(t, Target::Addr(_)))
    }

    /// Encodes the program as a compact binary image.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}
