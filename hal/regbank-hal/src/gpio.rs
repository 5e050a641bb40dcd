//! GPIO pin abstractions
//!
//! Pin identifiers, pin configuration enums and single-pin traits.
//! Pins are addressed as a port plus a bit position inside that port,
//! which is how the register handlers map register bits onto pins.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of pins in one IO port
pub const PINS_PER_PORT: u8 = 8;

/// IO port identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    H,
    J,
    K,
    Q,
    R,
}

impl Port {
    /// Number of ports
    pub const COUNT: usize = 11;

    /// All ports in index order
    pub const ALL: [Port; Port::COUNT] = [
        Port::A,
        Port::B,
        Port::C,
        Port::D,
        Port::E,
        Port::F,
        Port::H,
        Port::J,
        Port::K,
        Port::Q,
        Port::R,
    ];

    /// Dense index of this port, suitable for table lookups
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A single pin: port plus bit position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinId {
    /// Port the pin lives on
    pub port: Port,
    /// Bit position inside the port (0-7)
    pub pin: u8,
}

impl PinId {
    /// Create a pin identifier
    pub const fn new(port: Port, pin: u8) -> Self {
        Self { port, pin }
    }

    /// Check whether the pin exists on the port
    pub const fn is_valid(self) -> bool {
        self.pin < PINS_PER_PORT
    }

    /// Port bitmask selecting this pin
    pub const fn mask(self) -> u8 {
        1 << (self.pin % PINS_PER_PORT)
    }
}

/// Input pull configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PullMode {
    /// Internal pull-up
    PullUp,
    /// Internal pull-down
    PullDown,
    /// High impedance
    #[default]
    TriState,
    /// Bus-holder latch keeps the last driven level
    BusHolder,
}

/// Input sense configuration, i.e. what the pin's interrupt reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Sense {
    /// Either edge
    #[default]
    BothEdges,
    /// Low-to-high transition
    Rising,
    /// High-to-low transition
    Falling,
    /// Logic low level
    LowLevel,
}

impl Sense {
    /// Check whether a transition from `was` to `now` triggers this sense mode
    pub const fn fires(self, was: bool, now: bool) -> bool {
        match self {
            Sense::BothEdges => was != now,
            Sense::Rising => !was && now,
            Sense::Falling => was && !now,
            Sense::LowLevel => !now,
        }
    }
}

/// Output wiring configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutputMode {
    /// Totem-pole, driven to either rail
    #[default]
    Digital,
    /// Wired-OR
    WiredOr,
    /// Wired-AND
    WiredAnd,
    /// Wired-OR with pull-down
    WiredOrPull,
    /// Wired-AND with pull-up
    WiredAndPull,
}

/// Whether an output keeps its input buffer (so its level can be read back)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InputBuffer {
    #[default]
    Enabled,
    Disabled,
}

/// Interrupt priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InterruptPriority {
    /// Interrupt disabled
    Off,
    #[default]
    Low,
    Medium,
    High,
}

/// Port interrupt vector (each port has two)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InterruptLine {
    #[default]
    Int0,
    Int1,
}

impl InterruptLine {
    /// Dense index of the line
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// GPIO interrupt condition a chip waits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    RisingEdge,
    FallingEdge,
    AnyEdge,
    Low,
    High,
}

impl Sense {
    /// Electrical condition that fires this sense mode
    ///
    /// An inverted pin swaps the edges and the level.
    pub const fn trigger(self, invert: bool) -> Trigger {
        match (self, invert) {
            (Sense::BothEdges, _) => Trigger::AnyEdge,
            (Sense::Rising, false) | (Sense::Falling, true) => Trigger::RisingEdge,
            (Sense::Falling, false) | (Sense::Rising, true) => Trigger::FallingEdge,
            (Sense::LowLevel, false) => Trigger::Low,
            (Sense::LowLevel, true) => Trigger::High,
        }
    }
}

/// Port interrupt armed through [`PinBank::register_edge_interrupt`]
///
/// [`PinBank::register_edge_interrupt`]: crate::PinBank::register_edge_interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArmedInterrupt {
    pub priority: InterruptPriority,
    pub mask: u8,
    pub invert: bool,
}

impl ArmedInterrupt {
    /// Check whether the interrupt is enabled and its mask selects `pin`
    pub const fn watches(&self, pin: PinId) -> bool {
        !matches!(self.priority, InterruptPriority::Off) && self.mask & pin.mask() != 0
    }
}

/// First of a port's two interrupt lines that watches `pin`
pub fn watching_line(
    lines: &[Option<ArmedInterrupt>; 2],
    pin: PinId,
) -> Option<(InterruptLine, ArmedInterrupt)> {
    [InterruptLine::Int0, InterruptLine::Int1]
        .into_iter()
        .find_map(|line| match lines[line.index()] {
            Some(armed) if armed.watches(pin) => Some((line, armed)),
            _ => None,
        })
}

/// Logical output: a pin plus its polarity
///
/// Register handlers think in "active"/"inactive"; the line maps that onto
/// an electrical level. An inverted line is active-low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutputLine {
    /// Physical pin
    pub pin: PinId,
    /// Pin is active-low
    pub inverted: bool,
}

impl OutputLine {
    /// Active-high line
    pub const fn new(pin: PinId) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Active-low line
    pub const fn inverted(pin: PinId) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }

    /// Electrical level corresponding to a logical state
    pub const fn level_for(self, active: bool) -> bool {
        active != self.inverted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_validity() {
        assert!(PinId::new(Port::D, 7).is_valid());
        assert!(!PinId::new(Port::D, 8).is_valid());
        assert_eq!(PinId::new(Port::C, 5).mask(), 0b0010_0000);
    }

    #[test]
    fn test_sense_modes() {
        assert!(Sense::BothEdges.fires(false, true));
        assert!(Sense::BothEdges.fires(true, false));
        assert!(!Sense::BothEdges.fires(true, true));
        assert!(Sense::Rising.fires(false, true));
        assert!(!Sense::Rising.fires(true, false));
        assert!(Sense::Falling.fires(true, false));
        assert!(Sense::LowLevel.fires(false, false));
        assert!(!Sense::LowLevel.fires(false, true));
    }

    #[test]
    fn test_inverted_sense_swaps_trigger() {
        assert_eq!(Sense::Rising.trigger(false), Trigger::RisingEdge);
        assert_eq!(Sense::Rising.trigger(true), Trigger::FallingEdge);
        assert_eq!(Sense::Falling.trigger(true), Trigger::RisingEdge);
        assert_eq!(Sense::BothEdges.trigger(true), Trigger::AnyEdge);
        assert_eq!(Sense::LowLevel.trigger(false), Trigger::Low);
        assert_eq!(Sense::LowLevel.trigger(true), Trigger::High);
    }

    #[test]
    fn test_watching_line() {
        let pin = PinId::new(Port::D, 4);
        let armed = |priority, mask| {
            Some(ArmedInterrupt {
                priority,
                mask,
                invert: false,
            })
        };

        assert_eq!(watching_line(&[None, None], pin), None);
        // A disabled line never watches, even with the pin in its mask
        let lines = [armed(InterruptPriority::Off, pin.mask()), None];
        assert_eq!(watching_line(&lines, pin), None);

        let lines = [
            armed(InterruptPriority::Low, 0b0000_0001),
            armed(InterruptPriority::High, pin.mask()),
        ];
        let (line, found) = watching_line(&lines, pin).unwrap();
        assert_eq!(line, InterruptLine::Int1);
        assert_eq!(found.priority, InterruptPriority::High);

        let lines = [
            armed(InterruptPriority::Low, 0xFF),
            armed(InterruptPriority::High, pin.mask()),
        ];
        assert_eq!(watching_line(&lines, pin).unwrap().0, InterruptLine::Int0);
    }

    #[test]
    fn test_output_line_polarity() {
        let pin = PinId::new(Port::B, 6);
        assert!(OutputLine::new(pin).level_for(true));
        assert!(!OutputLine::inverted(pin).level_for(true));
        assert!(OutputLine::inverted(pin).level_for(false));
    }

    #[test]
    fn test_port_indices_are_dense() {
        for (i, port) in Port::ALL.iter().enumerate() {
            assert_eq!(port.index(), i);
        }
    }
}
