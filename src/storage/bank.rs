use std::fmt;

use super::{Queue, Stack, StorageError};
use crate::Integer;

/// Number of addressable banks.
pub const BANK_COUNT: usize = 28;

/// The one bank configured as a queue; every other bank is a stack.
pub const QUEUE_BANK: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankKind {
    Stack,
    Queue,
}

impl BankKind {
    pub fn of(bank: usize) -> Self {
        if bank == QUEUE_BANK {
            BankKind::Queue
        } else {
            BankKind::Stack
        }
    }
}

impl fmt::Display for BankKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankKind::Stack => write!(f, "stack"),
            BankKind::Queue => write!(f, "queue"),
        }
    }
}

/// A single storage bank. "Head" is the element the next pop removes:
/// the top of a stack, the front of a queue.
#[derive(Debug, Clone)]
pub enum Bank {
    Stack(Stack),
    Queue(Queue),
}

impl Bank {
    fn new(kind: BankKind, capacity: usize) -> Self {
        match kind {
            BankKind::Stack => Bank::Stack(Stack::with_capacity(capacity)),
            BankKind::Queue => Bank::Queue(Queue::with_capacity(capacity)),
        }
    }

    pub fn kind(&self) -> BankKind {
        match self {
            Bank::Stack(_) => BankKind::Stack,
            Bank::Queue(_) => BankKind::Queue,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Bank::Stack(st) => st.len(),
            Bank::Queue(q) => q.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stack push / queue push_back.
    pub fn push(&mut self, value: Integer) {
        match self {
            Bank::Stack(st) => st.push(value),
            Bank::Queue(q) => q.push_back(value),
        }
    }

    /// Stack pop / queue pop_front.
    pub fn pop(&mut self) -> Option<Integer> {
        match self {
            Bank::Stack(st) => st.pop(),
            Bank::Queue(q) => q.pop_front(),
        }
    }

    /// Put `value` where the next pop will find it (stack push / queue push_front).
    pub fn push_head(&mut self, value: Integer) {
        match self {
            Bank::Stack(st) => st.push(value),
            Bank::Queue(q) => q.push_front(value),
        }
    }
}

/// The fixed array of banks together with the bank-selector register.
///
/// All push/pop/size operations act on the selected bank. The bank kinds
/// are fixed at construction (bank 21 is the queue) and never change.
#[derive(Debug, Clone)]
pub struct BankArray {
    banks: [Bank; BANK_COUNT],
    selector: usize,
}

impl BankArray {
    pub fn new(capacity: usize) -> Self {
        Self {
            banks: std::array::from_fn(|i| Bank::new(BankKind::of(i), capacity)),
            selector: 0,
        }
    }

    #[inline]
    pub fn selector(&self) -> usize {
        self.selector
    }

    pub fn select(&mut self, bank: u32) -> Result<(), StorageError> {
        self.selector = checked_bank(bank)?;
        Ok(())
    }

    pub fn selected(&self) -> &Bank {
        &self.banks[self.selector]
    }

    pub fn bank(&self, bank: usize) -> Option<&Bank> {
        self.banks.get(bank)
    }

    /// Element count of the selected bank.
    pub fn size(&self) -> usize {
        self.selected().len()
    }

    /// Snapshot of every bank's element count, indexed by bank number.
    pub fn sizes(&self) -> [usize; BANK_COUNT] {
        std::array::from_fn(|i| self.banks[i].len())
    }

    pub fn push(&mut self, value: Integer) {
        self.banks[self.selector].push(value);
    }

    pub fn pop(&mut self) -> Result<Integer, StorageError> {
        let bank = self.selector;
        self.banks[bank]
            .pop()
            .ok_or(StorageError::EmptyBank { bank })
    }

    pub fn push_head(&mut self, value: Integer) {
        self.banks[self.selector].push_head(value);
    }

    /// Queue-only: insert `value` at the front of the selected bank.
    pub fn push_front(&mut self, value: Integer) -> Result<(), StorageError> {
        let bank = self.selector;
        match &mut self.banks[bank] {
            Bank::Queue(q) => {
                q.push_front(value);
                Ok(())
            }
            Bank::Stack(_) => Err(StorageError::NotAQueue { bank }),
        }
    }

    /// Push onto `bank` without disturbing the caller's selection.
    pub fn push_to(&mut self, bank: u32, value: Integer) -> Result<(), StorageError> {
        let saved = self.selector;
        self.select(bank)?;
        self.push(value);
        self.selector = saved;
        Ok(())
    }
}

fn checked_bank(bank: u32) -> Result<usize, StorageError> {
    let index = bank as usize;
    if index < BANK_COUNT {
        Ok(index)
    } else {
        Err(StorageError::BankOutOfRange { bank })
    }
}
