//! Hardware configuration types
//!
//! Build-time tables describing the device identity and its pins. The
//! device crate declares them as `const` arrays and hands them to
//! [`configure_pins`] once at boot.

use regbank_hal::{
    InputBuffer, InterruptLine, InterruptPriority, OutputLine, OutputMode, PinBank, PinError,
    PinId, PullMode, Sense,
};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Major/minor version pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    /// Create a version
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

/// Device identity reported through the version register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DeviceIdentity {
    /// Device type identifier
    pub who_am_i: u16,
    /// Hardware revision
    pub hardware: Version,
    /// Firmware release
    pub firmware: Version,
    /// Board assembly variant
    pub assembly: u8,
}

impl DeviceIdentity {
    /// Length of [`DeviceIdentity::to_bytes`]
    pub const ENCODED_LEN: usize = 7;

    /// Wire layout: who_am_i (LE), hw major, hw minor, fw major, fw minor, assembly
    pub const fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let who = self.who_am_i.to_le_bytes();
        [
            who[0],
            who[1],
            self.hardware.major,
            self.hardware.minor,
            self.firmware.major,
            self.firmware.minor,
            self.assembly,
        ]
    }
}

/// Port interrupt settings for an input pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct InterruptConfig {
    /// Port interrupt vector
    pub line: InterruptLine,
    /// Priority level
    pub priority: InterruptPriority,
    /// Invert pin logic before sensing
    pub invert: bool,
}

/// Input pin configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct InputPinConfig {
    /// Pin name, e.g. `POKE0_IR`
    pub name: &'static str,
    /// Physical pin
    pub pin: PinId,
    /// Pull configuration
    pub pull: PullMode,
    /// Sense configuration
    pub sense: Sense,
    /// Interrupt, if the pin feeds the mailbox
    pub interrupt: Option<InterruptConfig>,
}

impl InputPinConfig {
    /// Create an input with no interrupt
    pub const fn new(name: &'static str, pin: PinId, pull: PullMode, sense: Sense) -> Self {
        Self {
            name,
            pin,
            pull,
            sense,
            interrupt: None,
        }
    }

    /// Arm a non-inverted port interrupt for this input
    pub const fn with_interrupt(mut self, line: InterruptLine, priority: InterruptPriority) -> Self {
        self.interrupt = Some(InterruptConfig {
            line,
            priority,
            invert: false,
        });
        self
    }
}

/// Output pin configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct OutputPinConfig {
    /// Pin name, e.g. `DO0`
    pub name: &'static str,
    /// Physical pin
    pub pin: PinId,
    /// Wiring configuration
    pub mode: OutputMode,
    /// Keep the input buffer so the level can be read back
    pub allow_read: bool,
    /// Logical state at boot
    pub initial_active: bool,
    /// Pin is active-low
    pub inverted: bool,
}

impl OutputPinConfig {
    /// Create a digital output, readable, initially inactive
    pub const fn digital(name: &'static str, pin: PinId) -> Self {
        Self {
            name,
            pin,
            mode: OutputMode::Digital,
            allow_read: true,
            initial_active: false,
            inverted: false,
        }
    }

    /// Disable the input buffer
    pub const fn write_only(mut self) -> Self {
        self.allow_read = false;
        self
    }

    /// Make the output active-low
    pub const fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    /// Logical output line for this pin
    pub const fn line(&self) -> OutputLine {
        OutputLine {
            pin: self.pin,
            inverted: self.inverted,
        }
    }

    /// Input buffer setting derived from `allow_read`
    pub const fn input_buffer(&self) -> InputBuffer {
        if self.allow_read {
            InputBuffer::Enabled
        } else {
            InputBuffer::Disabled
        }
    }
}

/// Configure every pin and arm the port interrupts
///
/// Inputs sharing a port and interrupt line are armed with one combined
/// mask. Outputs are driven to their initial state right after being
/// configured. Any error means the pin map does not match the hardware.
pub fn configure_pins<B: PinBank>(
    bank: &mut B,
    inputs: &[InputPinConfig],
    outputs: &[OutputPinConfig],
) -> Result<(), PinError> {
    for input in inputs {
        bank.configure_input(input.pin, input.pull, input.sense)?;
    }

    for input in inputs {
        let Some(irq) = input.interrupt else {
            continue;
        };
        let mask = inputs
            .iter()
            .filter(|other| {
                other.pin.port == input.pin.port
                    && other.interrupt.is_some_and(|o| o.line == irq.line)
            })
            .fold(0u8, |mask, other| mask | other.pin.mask());
        bank.register_edge_interrupt(input.pin.port, irq.line, irq.priority, mask, irq.invert)?;
    }

    for output in outputs {
        bank.configure_output(output.pin, output.mode, output.input_buffer())?;
        bank.drive(output.line(), output.initial_active);
    }

    info!(
        "configured {} inputs, {} outputs",
        inputs.len(),
        outputs.len()
    );
    Ok(())
}
