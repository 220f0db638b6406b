use crate::bytecode::Op;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resolved register-machine program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Instruction stream. Execution starts at index 0.
    pub ops: Vec<Op>,

    /// Label names by instruction index. Only used for disassembly; jumps
    /// already carry absolute targets.
    pub labels: BTreeMap<usize, String>,
}

impl Program {
    pub fn new(ops: Vec<Op>) -> Self {
        Self {
            ops,
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, at: usize, name: impl Into<String>) -> Self {
        self.labels.insert(at, name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
