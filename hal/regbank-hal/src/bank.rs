//! Pin bank abstraction
//!
//! A [`PinBank`] owns every GPIO the register handlers may touch. All
//! single-pin operations are atomic with respect to other pins: setting
//! one pin never rewrites its neighbours on the same port.

use core::fmt;

use crate::gpio::{
    InputBuffer, InterruptLine, InterruptPriority, OutputLine, OutputMode, PinId, Port, PullMode,
    Sense,
};

/// Pin configuration errors
///
/// These indicate a mismatch between the pin map and the hardware and are
/// fatal during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin does not exist on the target
    InvalidPin(PinId),
    /// Interrupt mask selects no pins
    EmptyMask(Port),
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::InvalidPin(pin) => write!(f, "invalid pin {:?}{}", pin.port, pin.pin),
            PinError::EmptyMask(port) => write!(f, "empty interrupt mask on port {:?}", port),
        }
    }
}

/// Hardware IO bank
///
/// Configuration calls are made once at initialization. `read` must
/// sample the electrical state at the instant of the call, never a cached
/// copy.
pub trait PinBank {
    /// Configure a pin as input
    fn configure_input(&mut self, pin: PinId, pull: PullMode, sense: Sense)
        -> Result<(), PinError>;

    /// Configure a pin as output
    fn configure_output(
        &mut self,
        pin: PinId,
        mode: OutputMode,
        input_buffer: InputBuffer,
    ) -> Result<(), PinError>;

    /// Drive the pin high
    fn set(&mut self, pin: PinId);

    /// Drive the pin low
    fn clear(&mut self, pin: PinId);

    /// Invert the driven level
    fn toggle(&mut self, pin: PinId);

    /// Sample the pin level
    fn read(&self, pin: PinId) -> bool;

    /// Arm a port interrupt for the pins selected by `mask`
    ///
    /// The interrupt fires according to each pin's configured [`Sense`].
    /// With `invert` set the pins' logic is inverted before sensing.
    fn register_edge_interrupt(
        &mut self,
        port: Port,
        line: InterruptLine,
        priority: InterruptPriority,
        mask: u8,
        invert: bool,
    ) -> Result<(), PinError>;

    /// Drive the pin to a specific level
    fn write(&mut self, pin: PinId, high: bool) {
        if high {
            self.set(pin);
        } else {
            self.clear(pin);
        }
    }

    /// Drive a logical output line active or inactive
    fn drive(&mut self, line: OutputLine, active: bool) {
        self.write(line.pin, line.level_for(active));
    }
}
