use tracing::trace;

use crate::Integer;

/// Growable double-ended ring buffer.
///
/// `front` and `back` are always in `[0, capacity)`. A push that would make
/// them coincide while elements are present (indistinguishable from empty)
/// relinearizes the contents into a buffer twice the size before returning,
/// so the queue is never observed full.
#[derive(Debug, Clone)]
pub struct Queue {
    memory: Box<[Integer]>,
    front: usize,
    back: usize,
    len: usize,
}

impl Queue {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            memory: vec![0; capacity].into_boxed_slice(),
            front: 0,
            back: 0,
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

    pub fn push_back(&mut self, value: Integer) {
        self.memory[self.back] = value;
        self.back += 1;
        if self.back == self.memory.len() {
            self.back = 0;
        }
        self.len += 1;
        if self.back == self.front {
            self.grow();
        }
    }

    pub fn push_front(&mut self, value: Integer) {
        if self.front == 0 {
            self.front = self.memory.len();
        }
        self.front -= 1;
        self.memory[self.front] = value;
        self.len += 1;
        if self.front == self.back {
            self.grow();
        }
    }

    pub fn pop_front(&mut self) -> Option<Integer> {
        if self.len == 0 {
            return None;
        }
        let value = self.memory[self.front];
        self.front += 1;
        if self.front == self.memory.len() {
            self.front = 0;
        }
        self.len -= 1;
        Some(value)
    }

    pub fn peek_front(&self) -> Option<Integer> {
        (self.len > 0).then(|| self.memory[self.front])
    }

    /// Copy the logical contents (front first) into a buffer of twice the
    /// capacity starting at index 0, then reset `front = 0`, `back = len`.
    fn grow(&mut self) {
        let old_capacity = self.memory.len();
        let mut memory = vec![0; old_capacity * 2].into_boxed_slice();

        // [front, old_capacity) then the wrapped part [0, len - head).
        let head = (old_capacity - self.front).min(self.len);
        memory[..head].copy_from_slice(&self.memory[self.front..self.front + head]);
        memory[head..self.len].copy_from_slice(&self.memory[..self.len - head]);

        self.memory = memory;
        self.front = 0;
        self.back = self.len;
        trace!(old_capacity, new_capacity = self.memory.len(), "queue relinearized");
    }
}
