//! Device identity

use regbank_core::config::{DeviceIdentity, Version};

use crate::registers::VERSION_LEN;

pub const WHO_AM_I: u16 = 0;

pub const MAJOR_HW_VERSION: u8 = 1;
pub const MINOR_HW_VERSION: u8 = 0;
pub const MAJOR_FW_VERSION: u8 = 0;
pub const MINOR_FW_VERSION: u8 = 1;
pub const ASSEMBLY_VERSION: u8 = 0;

/// Identity reported by the version register
pub const IDENTITY: DeviceIdentity = DeviceIdentity {
    who_am_i: WHO_AM_I,
    hardware: Version::new(MAJOR_HW_VERSION, MINOR_HW_VERSION),
    firmware: Version::new(MAJOR_FW_VERSION, MINOR_FW_VERSION),
    assembly: ASSEMBLY_VERSION,
};

/// Contents of the version register, zero padded
pub const fn version_register(identity: &DeviceIdentity) -> [u8; VERSION_LEN] {
    let bytes = identity.to_bytes();
    let mut out = [0u8; VERSION_LEN];
    let mut i = 0;
    while i < bytes.len() {
        out[i] = bytes[i];
        i += 1;
    }
    out
}
