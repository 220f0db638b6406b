use std::io;

use thiserror::Error;

use crate::bytecode::Op;
use crate::storage::StorageError;

/// What went wrong. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{op} by zero")]
    DivisionByZero { op: &'static str },

    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),

    #[error("execution step limit exceeded ({0})")]
    StepLimitExceeded(u64),

    #[error("jump target {target} is outside the program ({len} ops)")]
    JumpOutOfRange { target: usize, len: usize },

    #[error("execution ran past the last instruction without halting")]
    NoHalt,
}

#[derive(Debug)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    /// Index of the faulting instruction.
    pub pc: usize,
    pub op: Option<Op>,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "runtime error: {}", self.kind)?;
        match &self.op {
            Some(op) => write!(f, "\n  at {:04}: {:?}", self.pc, op),
            None => write!(f, "\n  at {:04}", self.pc),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, pc: usize, op: Option<Op>) -> Self {
        RuntimeError { kind, pc, op }
    }
}
