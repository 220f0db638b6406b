//! Storage banks: the growable stack and ring-buffer queue, and the fixed
//! array of 28 banks addressed through the selector register.

pub mod bank;
pub mod queue;
pub mod stack;

pub use bank::{BANK_COUNT, Bank, BankArray, BankKind, QUEUE_BANK};
pub use queue::Queue;
pub use stack::Stack;

use thiserror::Error;

/// Misuse of a bank. The compiled program is expected never to trigger
/// these; the runtime reports them instead of trusting it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("pop from empty bank {bank}")]
    EmptyBank { bank: usize },

    #[error("bank {bank} out of range (0..{})", BANK_COUNT)]
    BankOutOfRange { bank: u32 },

    #[error("bank {bank} is a stack; push_front needs the queue bank {}", QUEUE_BANK)]
    NotAQueue { bank: usize },
}
