//! Limited buffer implementation.

/// Buffer limited by elements count.
/// Holds the records of a single chunk until it is flushed to disk.
/// Memory is allocated as elements arrive, so a large limit costs nothing up front.
pub struct LimitedBuffer<T> {
    limit: usize,
    inner: Vec<T>,
}

impl<T> LimitedBuffer<T> {
    pub fn new(limit: usize) -> Self {
        LimitedBuffer {
            limit,
            inner: Vec::new(),
        }
    }

    /// Adds a new element to the buffer.
    pub fn push(&mut self, item: T) {
        self.inner.push(item);
    }

    /// Returns buffer length
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Checks if the buffer reached the limit.
    pub fn is_full(&self) -> bool {
        self.inner.len() >= self.limit
    }

    /// Takes the buffered elements out leaving the buffer empty and ready for reuse.
    pub fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.inner.drain(..)
    }
}
