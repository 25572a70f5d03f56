use std::collections::VecDeque;

/// Bounded first-in first-out buffer.
///
/// Unlike `VecDeque` it never grows: pushing into a full buffer hands the value back.
#[derive(Debug, Clone)]
pub struct Fifo<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> Fifo<T> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Fifo capacity must be non-zero");
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        self.items.push_back(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free(&self) -> usize {
        self.capacity - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Moves up to `out.len()` values into `out`, oldest first.
    pub fn drain_into(&mut self, out: &mut [T]) -> usize {
        let count = out.len().min(self.items.len());
        for (slot, value) in out.iter_mut().zip(self.items.drain(..count)) {
            *slot = value;
        }
        count
    }
}
