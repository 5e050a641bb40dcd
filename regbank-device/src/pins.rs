//! Pin map
//!
//! Every pin the poke controller touches, with its boot configuration.
//! Three nose-poke ports each carry an infrared beam input, a spare DIO
//! input, a LED and a valve.

use regbank_core::config::{InputPinConfig, OutputPinConfig};
use regbank_hal::{InterruptLine, InterruptPriority, OutputLine, PinId, Port, PullMode, Sense};

// Inputs
pub const POKE0_IR: PinId = PinId::new(Port::D, 4);
pub const POKE0_IO: PinId = PinId::new(Port::D, 5);
pub const POKE1_IR: PinId = PinId::new(Port::E, 4);
pub const POKE1_IO: PinId = PinId::new(Port::E, 5);
pub const POKE2_IR: PinId = PinId::new(Port::F, 4);
pub const POKE2_IO: PinId = PinId::new(Port::F, 5);
pub const ADC1_AVAILABLE: PinId = PinId::new(Port::J, 0);
pub const DI3: PinId = PinId::new(Port::H, 0);

// Outputs
pub const DO3: PinId = PinId::new(Port::C, 0);
pub const DO2: PinId = PinId::new(Port::D, 0);
pub const DO1: PinId = PinId::new(Port::E, 0);
pub const DO0: PinId = PinId::new(Port::F, 0);
pub const LED0: PinId = PinId::new(Port::B, 6);
pub const LED1: PinId = PinId::new(Port::B, 5);
pub const RGBS: PinId = PinId::new(Port::C, 5);
pub const POKE0_LED: PinId = PinId::new(Port::D, 6);
pub const POKE0_VALVE: PinId = PinId::new(Port::D, 7);
pub const POKE1_LED: PinId = PinId::new(Port::E, 6);
pub const POKE1_VALVE: PinId = PinId::new(Port::E, 7);
pub const POKE2_LED: PinId = PinId::new(Port::F, 6);
pub const POKE2_VALVE: PinId = PinId::new(Port::F, 7);

/// Port interrupt line shared by all beam inputs
pub const INPUT_IRQ_LINE: InterruptLine = InterruptLine::Int0;

/// Input pins, in configuration order
pub const INPUTS: [InputPinConfig; 8] = [
    InputPinConfig::new("POKE0_IR", POKE0_IR, PullMode::PullUp, Sense::BothEdges)
        .with_interrupt(INPUT_IRQ_LINE, InterruptPriority::Low),
    InputPinConfig::new("POKE0_IO", POKE0_IO, PullMode::PullUp, Sense::BothEdges),
    InputPinConfig::new("POKE1_IR", POKE1_IR, PullMode::PullUp, Sense::BothEdges)
        .with_interrupt(INPUT_IRQ_LINE, InterruptPriority::Low),
    InputPinConfig::new("POKE1_IO", POKE1_IO, PullMode::PullUp, Sense::BothEdges),
    InputPinConfig::new("POKE2_IR", POKE2_IR, PullMode::PullUp, Sense::BothEdges)
        .with_interrupt(INPUT_IRQ_LINE, InterruptPriority::Low),
    InputPinConfig::new("POKE2_IO", POKE2_IO, PullMode::PullUp, Sense::BothEdges),
    InputPinConfig::new(
        "ADC1_AVAILABLE",
        ADC1_AVAILABLE,
        PullMode::PullDown,
        Sense::BothEdges,
    ),
    InputPinConfig::new("DI3", DI3, PullMode::TriState, Sense::BothEdges)
        .with_interrupt(INPUT_IRQ_LINE, InterruptPriority::Low),
];

/// Output pins, in configuration order; all start cleared
pub const OUTPUTS: [OutputPinConfig; 13] = [
    OutputPinConfig::digital("DO3", DO3),
    OutputPinConfig::digital("DO2", DO2),
    OutputPinConfig::digital("DO1", DO1),
    OutputPinConfig::digital("DO0", DO0),
    OutputPinConfig::digital("LED0", LED0),
    OutputPinConfig::digital("LED1", LED1),
    // One-wire LED chain, never read back
    OutputPinConfig::digital("RGBS", RGBS).write_only(),
    OutputPinConfig::digital("POKE0_LED", POKE0_LED),
    OutputPinConfig::digital("POKE0_VALVE", POKE0_VALVE),
    OutputPinConfig::digital("POKE1_LED", POKE1_LED),
    OutputPinConfig::digital("POKE1_VALVE", POKE1_VALVE),
    OutputPinConfig::digital("POKE2_LED", POKE2_LED),
    OutputPinConfig::digital("POKE2_VALVE", POKE2_VALVE),
];

/// Pins mirrored by the digital inputs register, bit 0 first
pub const DIGITAL_INPUT_PINS: &[PinId] = &[POKE0_IR, POKE1_IR, POKE2_IR, DI3];

/// Lines driven by the DIO port register, bit 0 first
pub const DIO_PORT_LINES: &[OutputLine] = &[
    OutputLine::new(DO0),
    OutputLine::new(DO1),
    OutputLine::new(DO2),
    OutputLine::new(DO3),
];
