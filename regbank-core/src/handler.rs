//! Register handlers
//!
//! Every register is bound to exactly one [`Handler`], a tagged variant
//! selecting one of four behavioral shapes. The variant fixes both the
//! read contract (when hardware is sampled) and the write contract (what
//! is validated, stored and driven), so the dispatch table is a closed
//! set of behaviors parameterized by pins, masks and mailbox slots.
//!
//! | Shape      | Read                              | Write                              |
//! |------------|-----------------------------------|------------------------------------|
//! | `Input`    | sample pins / latch into storage  | rejected                           |
//! | `Config`   | storage is authoritative          | validate, store                    |
//! | `Actuator` | last commanded value              | validate, store, drive pins        |
//! | `Counter`  | snapshot mailbox counter          | reset to zero if resettable        |

use core::fmt;

use regbank_hal::{OutputLine, PinId};

use crate::mask::{BitMask, GroupMask};
use crate::types::RegisterType;

/// Index of an interrupt-fed counter in the mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CounterId(pub u8);

impl CounterId {
    /// Counter index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Byte range of the mailbox latch buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LatchSlot {
    /// First byte
    pub offset: u16,
    /// Length in bytes
    pub len: u16,
}

impl LatchSlot {
    /// Create a latch slot
    pub const fn new(offset: u16, len: u16) -> Self {
        Self { offset, len }
    }

    /// One past the last byte
    pub const fn end(self) -> usize {
        self.offset as usize + self.len as usize
    }
}

/// Where a pass-through input register gets its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Bit `i` of the value mirrors the level of `pins[i]`
    Pins(&'static [PinId]),
    /// Copy of a mailbox latch filled from interrupt context
    Latch(LatchSlot),
    /// Loaded once at initialization, never changes
    Constant,
}

/// Payload check applied before anything is stored
#[derive(Clone, Copy)]
pub enum Validation {
    /// Any value of the right size
    Any,
    /// Every element sets only bits inside the mask
    Mask(BitMask),
    /// Every element is one of the group's values
    OneOf(GroupMask),
    /// Every element lies in `[min, max]`
    Range { min: i64, max: i64 },
    /// Register-specific rule over the whole payload
    Custom(fn(&[u8]) -> bool),
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validation::Any => f.write_str("Any"),
            Validation::Mask(mask) => f.debug_tuple("Mask").field(mask).finish(),
            Validation::OneOf(group) => f.debug_tuple("OneOf").field(group).finish(),
            Validation::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            Validation::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl Validation {
    /// Check a payload whose length already matches the register
    pub fn accepts(&self, ty: RegisterType, payload: &[u8]) -> bool {
        let mut elements = payload.chunks_exact(ty.width());
        match self {
            Validation::Any => true,
            Validation::Mask(mask) => {
                ty.is_integer() && elements.all(|e| mask.allows(ty.bits(e)))
            }
            Validation::OneOf(group) => {
                ty.is_integer() && elements.all(|e| group.contains(ty.bits(e)))
            }
            Validation::Range { min, max } => elements.all(|e| match ty.integer(e) {
                Some(value) => (i128::from(*min)..=i128::from(*max)).contains(&value),
                None => ty
                    .float(e)
                    .is_some_and(|value| value >= *min as f32 && value <= *max as f32),
            }),
            Validation::Custom(rule) => rule(payload),
        }
    }
}

/// Hardware effect of an actuator write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    /// Bit `i` of the value drives `lines[i]` active or inactive
    Drive(&'static [OutputLine]),
    /// The value is a pulse width in milliseconds; the line goes active
    /// and reverts when the pulse timer expires
    Pulse(OutputLine),
}

/// Behavior bound to one register
#[derive(Debug, Clone, Copy)]
pub enum Handler {
    /// Pass-through input, read-only from the bus
    Input(InputSource),
    /// Configuration stored verbatim after validation
    Config(Validation),
    /// Commanded output
    Actuator {
        validation: Validation,
        action: Actuation,
    },
    /// Interrupt-fed counter
    Counter { counter: CounterId, resettable: bool },
}

impl Handler {
    /// Check whether a bus write can ever succeed
    pub const fn accepts_writes(&self) -> bool {
        match self {
            Handler::Input(_) => false,
            Handler::Config(_) | Handler::Actuator { .. } => true,
            Handler::Counter { resettable, .. } => *resettable,
        }
    }
}
