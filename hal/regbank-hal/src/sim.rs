//! Host-side pin bank simulation
//!
//! Models every port as eight pins with a configured mode and an
//! electrical level. Outputs only move when configured as outputs, inputs
//! are moved by the test through [`SimPinBank::drive_input`], which also
//! reports which armed port interrupt (if any) the transition fires.

use crate::bank::{PinBank, PinError};
use crate::gpio::{
    ArmedInterrupt, InputBuffer, InterruptLine, InterruptPriority, OutputMode, PinId, Port,
    PullMode, Sense, PINS_PER_PORT,
};

const PINS: usize = PINS_PER_PORT as usize;

/// Configured mode of a simulated pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimPinMode {
    #[default]
    Unconfigured,
    Input {
        pull: PullMode,
        sense: Sense,
    },
    Output {
        mode: OutputMode,
        input_buffer: InputBuffer,
    },
}

/// Simulated pin bank
#[derive(Debug, Clone)]
pub struct SimPinBank {
    modes: [[SimPinMode; PINS]; Port::COUNT],
    levels: [u8; Port::COUNT],
    transitions: [[u32; PINS]; Port::COUNT],
    interrupts: [[Option<ArmedInterrupt>; 2]; Port::COUNT],
}

impl Default for SimPinBank {
    fn default() -> Self {
        Self::new()
    }
}

impl SimPinBank {
    /// Create a bank with every pin unconfigured and low
    pub const fn new() -> Self {
        Self {
            modes: [[SimPinMode::Unconfigured; PINS]; Port::COUNT],
            levels: [0; Port::COUNT],
            transitions: [[0; PINS]; Port::COUNT],
            interrupts: [[None; 2]; Port::COUNT],
        }
    }

    /// Port and bit of a pin; `None` for pins that do not exist
    fn slot(pin: PinId) -> Option<(usize, usize)> {
        pin.is_valid()
            .then(|| (pin.port.index(), usize::from(pin.pin)))
    }

    fn check(pin: PinId) -> Result<(usize, usize), PinError> {
        Self::slot(pin).ok_or(PinError::InvalidPin(pin))
    }

    fn level(&self, pin: PinId) -> bool {
        pin.is_valid() && self.levels[pin.port.index()] & pin.mask() != 0
    }

    fn apply(&mut self, pin: PinId, high: bool) {
        let Some((port, bit)) = Self::slot(pin) else {
            return;
        };
        if self.level(pin) != high {
            self.levels[port] ^= pin.mask();
            self.transitions[port][bit] += 1;
        }
    }

    fn is_output(&self, pin: PinId) -> bool {
        matches!(self.mode(pin), SimPinMode::Output { .. })
    }

    /// Configured mode of a pin; pins that do not exist are unconfigured
    pub fn mode(&self, pin: PinId) -> SimPinMode {
        Self::slot(pin).map_or(SimPinMode::Unconfigured, |(port, bit)| self.modes[port][bit])
    }

    /// Electrical level, regardless of input buffer state
    pub fn electrical_level(&self, pin: PinId) -> bool {
        self.level(pin)
    }

    /// Number of level changes the pin has seen
    pub fn transitions(&self, pin: PinId) -> u32 {
        Self::slot(pin).map_or(0, |(port, bit)| self.transitions[port][bit])
    }

    /// Interrupt armed on a port line
    pub fn interrupt(&self, port: Port, line: InterruptLine) -> Option<ArmedInterrupt> {
        self.interrupts[port.index()][line.index()]
    }

    /// Drive an input pin from outside the chip
    ///
    /// Returns the interrupt line the transition fires, if any.
    pub fn drive_input(&mut self, pin: PinId, high: bool) -> Option<InterruptLine> {
        let (port, bit) = Self::slot(pin)?;
        let SimPinMode::Input { sense, .. } = self.modes[port][bit] else {
            return None;
        };

        let was = self.level(pin);
        self.apply(pin, high);

        [InterruptLine::Int0, InterruptLine::Int1]
            .into_iter()
            .find(|line| match self.interrupts[port][line.index()] {
                Some(armed) if armed.watches(pin) => {
                    sense.fires(was != armed.invert, high != armed.invert)
                }
                _ => false,
            })
    }
}

impl PinBank for SimPinBank {
    fn configure_input(
        &mut self,
        pin: PinId,
        pull: PullMode,
        sense: Sense,
    ) -> Result<(), PinError> {
        let (port, bit) = Self::check(pin)?;
        self.modes[port][bit] = SimPinMode::Input { pull, sense };
        match pull {
            PullMode::PullUp => self.apply(pin, true),
            PullMode::PullDown => self.apply(pin, false),
            PullMode::TriState | PullMode::BusHolder => {}
        }
        Ok(())
    }

    fn configure_output(
        &mut self,
        pin: PinId,
        mode: OutputMode,
        input_buffer: InputBuffer,
    ) -> Result<(), PinError> {
        let (port, bit) = Self::check(pin)?;
        self.modes[port][bit] = SimPinMode::Output { mode, input_buffer };
        Ok(())
    }

    fn set(&mut self, pin: PinId) {
        if self.is_output(pin) {
            self.apply(pin, true);
        }
    }

    fn clear(&mut self, pin: PinId) {
        if self.is_output(pin) {
            self.apply(pin, false);
        }
    }

    fn toggle(&mut self, pin: PinId) {
        if self.is_output(pin) {
            let level = self.level(pin);
            self.apply(pin, !level);
        }
    }

    fn read(&self, pin: PinId) -> bool {
        match self.mode(pin) {
            SimPinMode::Output {
                input_buffer: InputBuffer::Disabled,
                ..
            } => false,
            _ => self.level(pin),
        }
    }

    fn register_edge_interrupt(
        &mut self,
        port: Port,
        line: InterruptLine,
        priority: InterruptPriority,
        mask: u8,
        invert: bool,
    ) -> Result<(), PinError> {
        if mask == 0 {
            return Err(PinError::EmptyMask(port));
        }
        self.interrupts[port.index()][line.index()] = Some(ArmedInterrupt {
            priority,
            mask,
            invert,
        });
        Ok(())
    }
}
