//! Bit masks and group masks
//!
//! A bit mask names the bits of a register that carry meaning. A group
//! mask names a bit field whose value must be one of a fixed set, like an
//! enum packed into a register.

/// Named set of meaningful bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitMask {
    /// Mask name, e.g. `MSK_DO_PORT`
    pub name: &'static str,
    /// Meaningful bits
    pub bits: u64,
}

impl BitMask {
    /// Create a bit mask
    pub const fn new(name: &'static str, bits: u64) -> Self {
        Self { name, bits }
    }

    /// Check that `value` sets no bits outside the mask
    pub const fn allows(&self, value: u64) -> bool {
        value & !self.bits == 0
    }
}

/// Bit field restricted to an enumerated set of values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GroupMask {
    /// Field mask
    pub field: BitMask,
    /// Allowed field values, already shifted into position
    pub values: &'static [u64],
}

impl GroupMask {
    /// Create a group mask
    pub const fn new(field: BitMask, values: &'static [u64]) -> Self {
        Self { field, values }
    }

    /// Check that `value` lies in the field and is one of the allowed values
    pub fn contains(&self, value: u64) -> bool {
        self.field.allows(value) && self.values.contains(&value)
    }
}
