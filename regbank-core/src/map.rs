//! Register map
//!
//! Pairs the descriptor array with the dispatch table, index aligned, and
//! fixes the byte layout of the register store. A map is meant to live in
//! a `static`: construction is a `const fn` whose checks turn an invalid
//! map into a build error rather than a runtime fault.

use core::ops::Range;

use crate::handler::{Actuation, Handler, InputSource};
use crate::mailbox::{MAX_COUNTERS, MAX_LATCH_BYTES};
use crate::register::{Access, RegisterDescriptor};

/// Upper bound on registers per map (one event flag each)
pub const MAX_REGISTERS: usize = 32;

/// Validated register map: descriptors, handlers and byte layout
#[derive(Debug)]
pub struct RegisterMap<const N: usize> {
    base: u8,
    descriptors: [RegisterDescriptor; N],
    handlers: [Handler; N],
    offsets: [usize; N],
    total_bytes: usize,
}

impl<const N: usize> RegisterMap<N> {
    /// Build a register map
    ///
    /// # Panics
    ///
    /// When addresses are not contiguous from the first descriptor, an
    /// access flag disagrees with the handler, or a handler does not fit
    /// its register's type and size. Evaluated in a `static` this is a
    /// compile error.
    pub const fn new(descriptors: [RegisterDescriptor; N], handlers: [Handler; N]) -> Self {
        assert!(N > 0, "register map is empty");
        assert!(N <= MAX_REGISTERS, "too many registers");

        let base = descriptors[0].address;
        assert!(
            base as usize + N - 1 <= u8::MAX as usize,
            "register addresses overflow"
        );

        let mut offsets = [0usize; N];
        let mut total_bytes = 0;
        let mut i = 0;
        while i < N {
            let descriptor = &descriptors[i];
            let handler = &handlers[i];
            let bits = descriptor.ty.width() * 8;

            assert!(
                descriptor.address as usize == base as usize + i,
                "register addresses must be contiguous"
            );
            assert!(descriptor.count > 0, "register holds no elements");
            assert!(
                descriptor.access.contains(Access::READ),
                "register must be readable"
            );
            assert!(
                descriptor.access.contains(Access::WRITE) == handler.accepts_writes(),
                "write access flag disagrees with handler"
            );

            match handler {
                Handler::Input(InputSource::Pins(pins)) => {
                    assert!(descriptor.ty.is_integer(), "pin input needs integer type");
                    assert!(pins.len() <= bits, "more pins than register bits");
                }
                Handler::Input(InputSource::Latch(slot)) => {
                    assert!(
                        slot.len as usize == descriptor.size_bytes(),
                        "latch size differs from register"
                    );
                    assert!(slot.end() <= MAX_LATCH_BYTES, "latch out of bounds");
                }
                Handler::Counter { counter, .. } => {
                    assert!(descriptor.ty.is_integer(), "counter needs integer type");
                    assert!(counter.index() < MAX_COUNTERS, "counter out of bounds");
                }
                Handler::Actuator {
                    action: Actuation::Drive(lines),
                    ..
                } => {
                    assert!(descriptor.ty.is_integer(), "drive needs integer type");
                    assert!(lines.len() <= bits, "more lines than register bits");
                }
                Handler::Actuator {
                    action: Actuation::Pulse(_),
                    ..
                } => {
                    assert!(descriptor.ty.is_integer(), "pulse needs integer type");
                    assert!(!descriptor.is_array(), "pulse register must be scalar");
                }
                Handler::Input(InputSource::Constant) | Handler::Config(_) => {}
            }

            offsets[i] = total_bytes;
            total_bytes += descriptor.size_bytes();
            i += 1;
        }

        Self {
            base,
            descriptors,
            handlers,
            offsets,
            total_bytes,
        }
    }

    /// Lowest register address
    pub const fn min_address(&self) -> u8 {
        self.base
    }

    /// Highest register address
    pub const fn max_address(&self) -> u8 {
        self.base + (N - 1) as u8
    }

    /// Number of registers
    pub const fn len(&self) -> usize {
        N
    }

    /// Always false; maps hold at least one register
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Total store size: sum of every register's byte size
    pub const fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Index of an address, if it lies in `[min, max]`
    pub const fn index_of(&self, address: u8) -> Option<usize> {
        match address.checked_sub(self.base) {
            Some(index) if (index as usize) < N => Some(index as usize),
            _ => None,
        }
    }

    /// Address of a register index
    pub const fn address_of(&self, index: usize) -> u8 {
        self.base + index as u8
    }

    /// Descriptor at an index
    pub fn descriptor(&self, index: usize) -> &RegisterDescriptor {
        &self.descriptors[index]
    }

    /// Handler at an index
    pub fn handler(&self, index: usize) -> &Handler {
        &self.handlers[index]
    }

    /// Byte range of a register inside the store
    pub fn span(&self, index: usize) -> Range<usize> {
        let start = self.offsets[index];
        start..start + self.descriptors[index].size_bytes()
    }
}
