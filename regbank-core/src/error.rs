//! Error types
//!
//! Dispatch errors are recoverable and returned to the protocol engine as
//! values; layout and initialization errors are fatal at boot.

use core::fmt;

use regbank_hal::PinError;

/// Register dispatch errors
///
/// None of these mutate the register bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterError {
    /// Address outside `[ADD_MIN, ADD_MAX]`
    InvalidAddress(u8),
    /// Payload length differs from the register's byte size
    SizeMismatch {
        /// Declared `element_count * width`
        expected: usize,
        /// Length received
        actual: usize,
    },
    /// Handler refused the payload (read-only register or invalid value)
    Rejected,
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::InvalidAddress(address) => write!(f, "invalid address {}", address),
            RegisterError::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {} bytes, got {}", expected, actual)
            }
            RegisterError::Rejected => f.write_str("rejected by handler"),
        }
    }
}

/// Register map does not fit the storage it was given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// Sum of register sizes differs from the arena size
    SizeMismatch {
        /// Bytes required by the descriptors
        required: usize,
        /// Bytes provided by the store
        provided: usize,
    },
    /// More registers than event flags
    TooManyRegisters(usize),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::SizeMismatch { required, provided } => write!(
                f,
                "register map needs {} bytes, store has {}",
                required, provided
            ),
            LayoutError::TooManyRegisters(count) => write!(f, "{} registers exceed limit", count),
        }
    }
}

/// Application initialization failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// Pin map does not match the hardware
    Pin(PinError),
    /// Register map does not match the store
    Layout(LayoutError),
    /// A register default could not be loaded
    Default(RegisterError),
}

impl From<PinError> for InitError {
    fn from(err: PinError) -> Self {
        InitError::Pin(err)
    }
}

impl From<LayoutError> for InitError {
    fn from(err: LayoutError) -> Self {
        InitError::Layout(err)
    }
}

impl From<RegisterError> for InitError {
    fn from(err: RegisterError) -> Self {
        InitError::Default(err)
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::Pin(err) => write!(f, "pin configuration failed: {}", err),
            InitError::Layout(err) => write!(f, "register layout invalid: {}", err),
            InitError::Default(err) => write!(f, "register default failed: {}", err),
        }
    }
}
