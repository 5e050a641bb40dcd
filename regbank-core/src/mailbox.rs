//! Interrupt mailbox
//!
//! The only state interrupt routines may touch. Routines bump counters,
//! raise per-register event flags and latch sampled bytes; register
//! handlers read or reset that state later under a short critical
//! section. Nothing here calls back into the dispatch path.
//!
//! Counters and event flags are `portable-atomic` so the increment is a
//! single read-modify-write even on cores without atomic CAS.

use core::cell::RefCell;

use critical_section::Mutex;
use portable_atomic::{AtomicU32, Ordering};

use crate::handler::{CounterId, LatchSlot};

/// Number of interrupt-fed counters
pub const MAX_COUNTERS: usize = 8;

/// Size of the latch buffer shared by all latched inputs
pub const MAX_LATCH_BYTES: usize = 64;

/// Number of event flags (one per register index)
pub const MAX_EVENT_FLAGS: usize = 32;

#[allow(clippy::declare_interior_mutable_const)]
const ZERO: AtomicU32 = AtomicU32::new(0);

/// Shared state between interrupt routines and register handlers
pub struct Mailbox {
    counters: [AtomicU32; MAX_COUNTERS],
    events: AtomicU32,
    latch: Mutex<RefCell<[u8; MAX_LATCH_BYTES]>>,
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailbox {
    /// Create an empty mailbox, usable as a `static`
    pub const fn new() -> Self {
        Self {
            counters: [ZERO; MAX_COUNTERS],
            events: AtomicU32::new(0),
            latch: Mutex::new(RefCell::new([0; MAX_LATCH_BYTES])),
        }
    }

    // Interrupt side

    /// Add one to a counter
    pub fn increment(&self, counter: CounterId) {
        if let Some(c) = self.counters.get(counter.index()) {
            c.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Flag a register (by index) as having new contents to report
    pub fn raise(&self, index: usize) {
        if index < MAX_EVENT_FLAGS {
            self.events.fetch_or(1 << index, Ordering::Relaxed);
        }
    }

    /// Store sampled bytes into a latch slot
    ///
    /// Bytes beyond the slot are dropped; a short sample leaves the tail of
    /// the slot untouched.
    pub fn latch(&self, slot: LatchSlot, data: &[u8]) {
        critical_section::with(|cs| {
            let mut buffer = self.latch.borrow_ref_mut(cs);
            if let Some(dst) = buffer.get_mut(slot.offset as usize..slot.end()) {
                let n = data.len().min(dst.len());
                dst[..n].copy_from_slice(&data[..n]);
            }
        });
    }

    // Handler side

    /// Current value of a counter
    pub fn count(&self, counter: CounterId) -> u32 {
        critical_section::with(|_| {
            self.counters
                .get(counter.index())
                .map_or(0, |c| c.load(Ordering::Relaxed))
        })
    }

    /// Reset a counter to zero
    pub fn reset(&self, counter: CounterId) {
        critical_section::with(|_| {
            if let Some(c) = self.counters.get(counter.index()) {
                c.store(0, Ordering::Relaxed);
            }
        });
    }

    /// Copy a latch slot into `out`
    pub fn read_latch(&self, slot: LatchSlot, out: &mut [u8]) {
        critical_section::with(|cs| {
            let buffer = self.latch.borrow_ref(cs);
            if let Some(src) = buffer.get(slot.offset as usize..slot.end()) {
                let n = src.len().min(out.len());
                out[..n].copy_from_slice(&src[..n]);
            }
        });
    }

    /// Drain the event flags, returning the bits that were set
    pub fn take_events(&self) -> u32 {
        self.events.swap(0, Ordering::Relaxed)
    }

    /// Reset counters, flags and latches
    pub fn clear(&self) {
        critical_section::with(|cs| {
            for counter in &self.counters {
                counter.store(0, Ordering::Relaxed);
            }
            self.events.store(0, Ordering::Relaxed);
            self.latch.borrow_ref_mut(cs).fill(0);
        });
    }
}
