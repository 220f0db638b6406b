use std::collections::BTreeSet;

use thiserror::Error;

use crate::bytecode::{Op, Program};
use crate::storage::{BANK_COUNT, BankKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("verify error at {ip:04}: jump target {target} is outside the program ({len} ops)")]
    JumpOutOfRange { ip: usize, target: usize, len: usize },

    #[error("verify error at {ip:04}: bank {bank} out of range (0..{})", BANK_COUNT)]
    BankOutOfRange { ip: usize, bank: u32 },

    #[error("verify error at {ip:04}: push_front on bank {bank}, which is a stack")]
    PushFrontOnStack { ip: usize, bank: usize },

    #[error("verify error at {ip:04}: execution can run past the last instruction")]
    FallsOffEnd { ip: usize },

    #[error("verify error: program is empty")]
    Empty,
}

/// Statically check a program before running it.
///
/// Rejects out-of-range jump targets and bank operands, a final instruction
/// that can fall through, and `push_front` on a bank known to be a stack.
/// The selector is only tracked within straight-line code: it becomes
/// unknown at every jump target, so this catches the obvious cases and the
/// runtime checks the rest.
pub fn verify(program: &Program) -> Result<(), VerifyError> {
    let ops = &program.ops;
    let Some(last) = ops.last() else {
        return Err(VerifyError::Empty);
    };

    let targets = jump_targets(ops)?;

    // Entry starts with bank 0 selected.
    let mut selector = Some(0usize);
    for (ip, op) in ops.iter().enumerate() {
        if targets.contains(&ip) {
            selector = None;
        }
        match *op {
            Op::Select(bank) => {
                selector = Some(checked_bank(ip, bank)?);
            }
            Op::PushTo { bank, .. } => {
                checked_bank(ip, bank)?;
            }
            Op::PushFront(_) => {
                if let Some(bank) = selector {
                    if BankKind::of(bank) == BankKind::Stack {
                        return Err(VerifyError::PushFrontOnStack { ip, bank });
                    }
                }
            }
            _ => {}
        }
        if op.is_terminator() {
            // Only reachable again through a jump target.
            selector = None;
        }
    }

    if !last.is_terminator() {
        return Err(VerifyError::FallsOffEnd { ip: ops.len() - 1 });
    }
    Ok(())
}

fn jump_targets(ops: &[Op]) -> Result<BTreeSet<usize>, VerifyError> {
    let mut targets = BTreeSet::new();
    for (ip, op) in ops.iter().enumerate() {
        if let Some(target) = op.target() {
            if target >= ops.len() {
                return Err(VerifyError::JumpOutOfRange {
                    ip,
                    target,
                    len: ops.len(),
                });
            }
            targets.insert(target);
        }
    }
    Ok(targets)
}

fn checked_bank(ip: usize, bank: u32) -> Result<usize, VerifyError> {
    if (bank as usize) < BANK_COUNT {
        Ok(bank as usize)
    } else {
        Err(VerifyError::BankOutOfRange { ip, bank })
    }
}
