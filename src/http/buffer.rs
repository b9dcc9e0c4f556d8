//! Growable read buffer.
//!
//! Holds the bytes read from a transport that the parser has not consumed
//! yet. Capacity doubles whenever the filled region reaches it and never
//! shrinks; consumed bytes are compacted away by shifting the tail to the
//! front.

use crate::http::error::ParseError;

/// Lookahead buffer sitting between a transport and the request parser.
#[derive(Debug)]
pub struct ReadBuffer {
    buf: Vec<u8>,
    /// End of the filled region, `buf[..read_to]`.
    read_to: usize,
    max_size: usize,
}

impl ReadBuffer {
    /// Create a buffer with `initial_size` bytes of capacity that may grow up
    /// to `max_size`.
    pub fn new(initial_size: usize, max_size: usize) -> Self {
        let initial_size = initial_size.max(1);
        Self {
            buf: vec![0; initial_size],
            read_to: 0,
            max_size: max_size.max(initial_size),
        }
    }

    /// Buffered bytes not yet consumed by the parser.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.read_to]
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.read_to
    }

    pub fn is_empty(&self) -> bool {
        self.read_to == 0
    }

    /// Current backing capacity.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Writable tail for the next read. Doubles the capacity first if the
    /// buffer is full.
    pub fn spare_mut(&mut self) -> Result<&mut [u8], ParseError> {
        if self.read_to == self.buf.len() {
            self.grow()?;
        }
        Ok(&mut self.buf[self.read_to..])
    }

    /// Mark `n` bytes of the spare region as filled.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.read_to + n <= self.buf.len());
        self.read_to += n;
    }

    /// Drop the first `n` buffered bytes, shifting the rest to the front.
    pub fn consume(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        debug_assert!(n <= self.read_to);
        self.buf.copy_within(n..self.read_to, 0);
        self.read_to -= n;
    }

    fn grow(&mut self) -> Result<(), ParseError> {
        let current = self.buf.len();
        if current >= self.max_size {
            return Err(ParseError::BufferLimitExceeded(self.max_size));
        }
        let next = current.saturating_mul(2).min(self.max_size);
        tracing::trace!(from = current, to = next, "Growing read buffer");
        self.buf.resize(next, 0);
        Ok(())
    }
}
