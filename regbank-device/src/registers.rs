//! Register map
//!
//! Addresses, masks and the handler bound to each register. The layout is
//! part of the wire contract: offsets, sizes and the total bank size must
//! not change within a firmware version.

use regbank_core::handler::{Actuation, CounterId, Handler, InputSource, LatchSlot, Validation};
use regbank_core::mask::{BitMask, GroupMask};
use regbank_core::{Access, RegisterDescriptor, RegisterMap, RegisterType};
use regbank_hal::OutputLine;

use crate::pins::{DIGITAL_INPUT_PINS, DIO_PORT_LINES, DO0, POKE0_VALVE};

// Register addresses
pub const ADD_REG_DIGITAL_INPUTS: u8 = 32;
pub const ADD_REG_ANALOG_DATA: u8 = 33;
pub const ADD_REG_COMPLEX_CONFIGURATION: u8 = 34;
pub const ADD_REG_VERSION: u8 = 35;
pub const ADD_REG_CUSTOM_PAYLOAD: u8 = 36;
pub const ADD_REG_CUSTOM_RAW_PAYLOAD: u8 = 37;
pub const ADD_REG_CUSTOM_MEMBER_CONVERTER: u8 = 38;
pub const ADD_REG_BITMASK_SPLITTER: u8 = 39;
pub const ADD_REG_COUNTER0: u8 = 40;
pub const ADD_REG_PORT_DIO_SET: u8 = 41;
pub const ADD_REG_PULSE_DO_PORT0: u8 = 42;
pub const ADD_REG_PULSE_DO0: u8 = 43;

// Memory limits
pub const APP_REGS_ADD_MIN: u8 = 0x20;
pub const APP_REGS_ADD_MAX: u8 = 0x2B;
pub const APP_NBYTES_OF_REG_BANK: usize = 111;

/// Number of registers
pub const APP_NREGS: usize = (APP_REGS_ADD_MAX - APP_REGS_ADD_MIN + 1) as usize;

// Register bits
pub const MSK_PWM_PORT_SEL: BitMask = BitMask::new("MSK_PWM_PORT_SEL", 0x07);
pub const GM_PWM_PORT_PWM0: u64 = 0x01;
pub const GM_PWM_PORT_PWM1: u64 = 0x02;
pub const GM_PWM_PORT_PWM2: u64 = 0x04;
pub const GM_PWM_PORT: GroupMask = GroupMask::new(
    MSK_PWM_PORT_SEL,
    &[GM_PWM_PORT_PWM0, GM_PWM_PORT_PWM1, GM_PWM_PORT_PWM2],
);
pub const MSK_DO_PORT: BitMask = BitMask::new("MSK_DO_PORT", 0x0F);

/// Mailbox latch holding the latest analog frame
pub const ANALOG_LATCH: LatchSlot = LatchSlot::new(0, 24);

/// Counter fed by POKE0_IR edges
pub const COUNTER0: CounterId = CounterId(0);

/// Length of the version register
pub const VERSION_LEN: usize = 32;

/// Byte 0 selects the PWM port; the rest is opaque
fn complex_configuration_valid(payload: &[u8]) -> bool {
    payload
        .first()
        .is_some_and(|&port| GM_PWM_PORT.contains(u64::from(port)))
}

const RW: Access = Access::READ.union(Access::WRITE);
const RE: Access = Access::READ.union(Access::EVENT);

const MAP: RegisterMap<APP_NREGS> = RegisterMap::new(
    [
        RegisterDescriptor::scalar(ADD_REG_DIGITAL_INPUTS, "REG_DIGITAL_INPUTS", RegisterType::U8, RE),
        RegisterDescriptor::new(ADD_REG_ANALOG_DATA, "REG_ANALOG_DATA", RegisterType::Float, 6, RE),
        RegisterDescriptor::new(
            ADD_REG_COMPLEX_CONFIGURATION,
            "REG_COMPLEX_CONFIGURATION",
            RegisterType::U8,
            17,
            RW,
        ),
        RegisterDescriptor::new(
            ADD_REG_VERSION,
            "REG_VERSION",
            RegisterType::U8,
            VERSION_LEN as u16,
            Access::READ,
        ),
        RegisterDescriptor::new(ADD_REG_CUSTOM_PAYLOAD, "REG_CUSTOM_PAYLOAD", RegisterType::U32, 3, RW),
        RegisterDescriptor::new(
            ADD_REG_CUSTOM_RAW_PAYLOAD,
            "REG_CUSTOM_RAW_PAYLOAD",
            RegisterType::U32,
            3,
            RW,
        ),
        RegisterDescriptor::new(
            ADD_REG_CUSTOM_MEMBER_CONVERTER,
            "REG_CUSTOM_MEMBER_CONVERTER",
            RegisterType::U8,
            3,
            RW,
        ),
        RegisterDescriptor::scalar(ADD_REG_BITMASK_SPLITTER, "REG_BITMASK_SPLITTER", RegisterType::U8, RW),
        RegisterDescriptor::scalar(ADD_REG_COUNTER0, "REG_COUNTER0", RegisterType::I32, RW),
        RegisterDescriptor::scalar(ADD_REG_PORT_DIO_SET, "REG_PORT_DIO_SET", RegisterType::U8, RW),
        RegisterDescriptor::scalar(ADD_REG_PULSE_DO_PORT0, "REG_PULSE_DO_PORT0", RegisterType::U16, RW),
        RegisterDescriptor::scalar(ADD_REG_PULSE_DO0, "REG_PULSE_DO0", RegisterType::U16, RW),
    ],
    [
        Handler::Input(InputSource::Pins(DIGITAL_INPUT_PINS)),
        Handler::Input(InputSource::Latch(ANALOG_LATCH)),
        Handler::Config(Validation::Custom(complex_configuration_valid)),
        Handler::Input(InputSource::Constant),
        Handler::Config(Validation::Any),
        Handler::Config(Validation::Any),
        Handler::Config(Validation::Any),
        Handler::Config(Validation::Any),
        Handler::Counter {
            counter: COUNTER0,
            resettable: true,
        },
        Handler::Actuator {
            validation: Validation::Mask(MSK_DO_PORT),
            action: Actuation::Drive(DIO_PORT_LINES),
        },
        Handler::Actuator {
            validation: Validation::Range {
                min: 1,
                max: u16::MAX as i64,
            },
            action: Actuation::Pulse(OutputLine::new(POKE0_VALVE)),
        },
        Handler::Actuator {
            validation: Validation::Range {
                min: 1,
                max: u16::MAX as i64,
            },
            action: Actuation::Pulse(OutputLine::new(DO0)),
        },
    ],
);

const _: () = {
    assert!(MAP.min_address() == APP_REGS_ADD_MIN);
    assert!(MAP.max_address() == APP_REGS_ADD_MAX);
    assert!(MAP.total_bytes() == APP_NBYTES_OF_REG_BANK);
};

/// The device's register map
pub static REGISTER_MAP: RegisterMap<APP_NREGS> = MAP;
