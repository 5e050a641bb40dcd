//! Register descriptors

use core::ops::BitOr;

use crate::types::RegisterType;

/// Operations a register supports on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Access(u8);

impl Access {
    /// Register may be read
    pub const READ: Access = Access(0x1);
    /// Register may be written
    pub const WRITE: Access = Access(0x2);
    /// Device may report the register unprompted
    pub const EVENT: Access = Access(0x4);

    /// Combine two access sets
    pub const fn union(self, other: Access) -> Access {
        Access(self.0 | other.0)
    }

    /// Check whether every flag of `other` is set
    pub const fn contains(self, other: Access) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw flag bits
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Access {
    type Output = Access;

    fn bitor(self, rhs: Access) -> Access {
        self.union(rhs)
    }
}

/// Static description of one register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterDescriptor {
    /// Bus address
    pub address: u8,
    /// Register name, e.g. `REG_DIGITAL_INPUTS`
    pub name: &'static str,
    /// Element type
    pub ty: RegisterType,
    /// Number of elements (1 for scalars)
    pub count: u16,
    /// Bus access flags
    pub access: Access,
}

impl RegisterDescriptor {
    /// Describe an array register
    pub const fn new(
        address: u8,
        name: &'static str,
        ty: RegisterType,
        count: u16,
        access: Access,
    ) -> Self {
        Self {
            address,
            name,
            ty,
            count,
            access,
        }
    }

    /// Describe a scalar register
    pub const fn scalar(address: u8, name: &'static str, ty: RegisterType, access: Access) -> Self {
        Self::new(address, name, ty, 1, access)
    }

    /// Storage size: `count * width(ty)`
    pub const fn size_bytes(&self) -> usize {
        self.count as usize * self.ty.width()
    }

    /// Check whether the register holds more than one element
    pub const fn is_array(&self) -> bool {
        self.count > 1
    }
}
