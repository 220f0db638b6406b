use tracing::trace;

use crate::Integer;

/// Growable LIFO container.
///
/// The backing buffer is a fixed-length boxed slice that is replaced by one
/// twice as large whenever a push fills it, so `capacity() > len()` holds
/// after every push and capacity never shrinks.
#[derive(Debug, Clone)]
pub struct Stack {
    memory: Box<[Integer]>,
    len: usize,
}

impl Stack {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            memory: vec![0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    /// Push `value` as the new top. Doubles the buffer when the push makes
    /// the element count reach capacity.
    pub fn push(&mut self, value: Integer) {
        self.memory[self.len] = value;
        self.len += 1;
        if self.len >= self.memory.len() {
            self.grow();
        }
    }

    pub fn pop(&mut self) -> Option<Integer> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.memory[self.len])
    }

    pub fn peek(&self) -> Option<Integer> {
        self.len.checked_sub(1).map(|top| self.memory[top])
    }

    fn grow(&mut self) {
        let old_capacity = self.memory.len();
        let mut memory = vec![0; old_capacity * 2].into_boxed_slice();
        memory[..self.len].copy_from_slice(&self.memory[..self.len]);
        self.memory = memory;
        trace!(old_capacity, new_capacity = self.memory.len(), "stack grown");
    }
}
