//! Register store
//!
//! One contiguous, packed byte arena holding every register's elements at
//! the offsets fixed by the register map. Only the bank controller holds
//! a store; callers see read-only views.

use core::ops::Range;

/// Byte arena backing a register bank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterStore<const BYTES: usize> {
    bytes: [u8; BYTES],
}

impl<const BYTES: usize> Default for RegisterStore<BYTES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const BYTES: usize> RegisterStore<BYTES> {
    /// Zeroed store
    pub const fn new() -> Self {
        Self { bytes: [0; BYTES] }
    }

    /// Size in bytes
    pub const fn len(&self) -> usize {
        BYTES
    }

    /// Check for a zero-sized store
    pub const fn is_empty(&self) -> bool {
        BYTES == 0
    }

    /// Read-only view of a register slot
    ///
    /// Spans come from the register map, which guarantees they fit.
    pub fn slot(&self, span: Range<usize>) -> &[u8] {
        &self.bytes[span]
    }

    /// Mutable view of a register slot
    pub fn slot_mut(&mut self, span: Range<usize>) -> &mut [u8] {
        &mut self.bytes[span]
    }

    /// Read-only view of an arbitrary byte range, if in bounds
    pub fn get(&self, span: Range<usize>) -> Option<&[u8]> {
        self.bytes.get(span)
    }

    /// The whole arena
    pub fn as_bytes(&self) -> &[u8; BYTES] {
        &self.bytes
    }
}
