use serde::{Deserialize, Serialize};

use crate::Integer;

/// Scratch register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reg {
    A,
    B,
}

impl Reg {
    pub fn name(self) -> &'static str {
        match self {
            Reg::A => "a",
            Reg::B => "b",
        }
    }
}

// =============================================================================
// OP - register machine instructions
// =============================================================================
//
// "Selected bank" is the bank named by the selector register. "Head" is the
// element the next pop removes: a stack's top, the queue's front.
// Jump targets are absolute instruction indices.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Nop,

    /// Flush output, pop the selected bank's head and return it (0 if empty).
    Halt,

    // arithmetic: A := A op B
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    /// A := (A >= B) as 0/1
    Compare,

    // banks
    Select(u32),
    Pop(Reg),
    Push(Reg),
    PushConst(Integer),
    /// Queue bank only.
    PushFront(Reg),
    /// Push onto `bank`, leaving the selector unchanged.
    PushTo {
        reg: Reg,
        bank: u32,
    },
    Dup,
    Swap,
    Drop,

    // I/O on register A
    PrintDecimal,
    PrintChar,
    ReadDecimal,
    ReadChar,

    // control flow
    Jump(usize),
    JumpIfNonZero(usize),
    /// Jump when the selected bank holds fewer than `min` elements.
    JumpIfSizeBelow {
        min: usize,
        target: usize,
    },
    /// Jump when the selected bank holds at least `min` elements.
    JumpIfSizeAtLeast {
        min: usize,
        target: usize,
    },
}

impl Op {
    /// Jump target, if this op can transfer control.
    pub fn target(&self) -> Option<usize> {
        match *self {
            Op::Jump(t)
            | Op::JumpIfNonZero(t)
            | Op::JumpIfSizeBelow { target: t, .. }
            | Op::JumpIfSizeAtLeast { target: t, .. } => Some(t),
            _ => None,
        }
    }

    /// Whether execution never falls through to the next instruction.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Op::Halt | Op::Jump(_))
    }
}
