//! Application initialization and interrupt routines
//!
//! [`initialize`] runs once at boot, before the protocol engine accepts
//! frames. The `on_*` routines run in interrupt context and only touch the
//! [`Mailbox`].

use regbank_core::config::configure_pins;
use regbank_core::types::encode;
use regbank_core::{InitError, Mailbox, RegisterBank};
use regbank_hal::{InterruptLine, PinBank, PinError, Port};

use crate::config::{version_register, IDENTITY};
use crate::pins::{INPUTS, INPUT_IRQ_LINE, OUTPUTS};
use crate::registers::{
    ADD_REG_ANALOG_DATA, ADD_REG_COMPLEX_CONFIGURATION, ADD_REG_DIGITAL_INPUTS, ADD_REG_VERSION,
    ANALOG_LATCH, APP_NBYTES_OF_REG_BANK, APP_NREGS, APP_REGS_ADD_MIN, COUNTER0,
    GM_PWM_PORT_PWM0, REGISTER_MAP,
};

/// The device's register bank over a concrete pin bank
pub type Device<'a, B> = RegisterBank<'a, B, APP_NREGS, APP_NBYTES_OF_REG_BANK>;

/// Number of channels in an analog frame
pub const ANALOG_CHANNELS: usize = 6;

const DIGITAL_INPUTS_EVENT: usize = (ADD_REG_DIGITAL_INPUTS - APP_REGS_ADD_MIN) as usize;
const ANALOG_DATA_EVENT: usize = (ADD_REG_ANALOG_DATA - APP_REGS_ADD_MIN) as usize;

/// Complex configuration at boot: PWM0 selected, everything else zero
const DEFAULT_COMPLEX_CONFIGURATION: [u8; 17] = {
    let mut bytes = [0u8; 17];
    bytes[0] = GM_PWM_PORT_PWM0 as u8;
    bytes
};

/// Configure every pin and drive outputs to their boot state
pub fn init_ios<B: PinBank>(pins: &mut B) -> Result<(), PinError> {
    configure_pins(pins, &INPUTS, &OUTPUTS)
}

/// Bring up the device
///
/// Configures the pins, clears the mailbox, binds the register map and
/// loads register defaults. Any error means the firmware does not match
/// the board and must not proceed.
pub fn initialize<B: PinBank>(mut pins: B, mailbox: &Mailbox) -> Result<Device<'_, B>, InitError> {
    init_ios(&mut pins).inspect_err(|err| warn!("pin configuration failed: {}", err))?;
    mailbox.clear();

    let version = version_register(&IDENTITY);
    let device = RegisterBank::with_defaults(
        &REGISTER_MAP,
        pins,
        mailbox,
        &[
            (ADD_REG_VERSION, &version[..]),
            (ADD_REG_COMPLEX_CONFIGURATION, &DEFAULT_COMPLEX_CONFIGURATION[..]),
        ],
    )?;

    info!(
        "device {} hw {}.{} fw {}.{} ready",
        IDENTITY.who_am_i,
        IDENTITY.hardware.major,
        IDENTITY.hardware.minor,
        IDENTITY.firmware.major,
        IDENTITY.firmware.minor
    );
    Ok(device)
}

/// Port interrupt routine
///
/// POKE0_IR edges (port D) also advance COUNTER0. Every beam and DI3 edge
/// flags the digital inputs register for reporting.
pub fn on_port_interrupt(mailbox: &Mailbox, port: Port, line: InterruptLine) {
    if line != INPUT_IRQ_LINE {
        return;
    }
    match port {
        Port::D => {
            mailbox.increment(COUNTER0);
            mailbox.raise(DIGITAL_INPUTS_EVENT);
        }
        Port::E | Port::F | Port::H => mailbox.raise(DIGITAL_INPUTS_EVENT),
        _ => {}
    }
}

/// ADC conversion-complete routine: latch the frame and flag it
pub fn on_analog_frame(mailbox: &Mailbox, frame: &[f32; ANALOG_CHANNELS]) {
    let mut bytes = [0u8; ANALOG_CHANNELS * 4];
    if encode(frame, &mut bytes).is_some() {
        mailbox.latch(ANALOG_LATCH, &bytes);
        mailbox.raise(ANALOG_DATA_EVENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pins::*;
    use crate::registers::*;
    use proptest::prelude::*;
    use regbank_core::types::decode;
    use regbank_core::RegisterError;
    use regbank_hal::sim::SimPinBank;
    use regbank_hal::PinId;

    fn device(mailbox: &Mailbox) -> Device<'_, SimPinBank> {
        initialize(SimPinBank::new(), mailbox).unwrap()
    }

    /// Move an input and run the interrupt routine it fires, if any
    fn edge(device: &mut Device<'_, SimPinBank>, mailbox: &Mailbox, pin: PinId, high: bool) {
        if let Some(line) = device.pins_mut().drive_input(pin, high) {
            on_port_interrupt(mailbox, pin.port, line);
        }
    }

    #[test]
    fn test_bitmask_splitter_roundtrip() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        device
            .write(ADD_REG_BITMASK_SPLITTER, &[0b0000_0101])
            .unwrap();
        assert_eq!(device.read(ADD_REG_BITMASK_SPLITTER).unwrap(), &[0b0000_0101]);
    }

    #[test]
    fn test_complex_configuration_short_payload() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        let before = *device.as_bytes();
        assert_eq!(
            device.write(ADD_REG_COMPLEX_CONFIGURATION, &[7]),
            Err(RegisterError::SizeMismatch {
                expected: 17,
                actual: 1
            })
        );
        assert_eq!(device.as_bytes(), &before);
    }

    #[test]
    fn test_complex_configuration_roundtrip() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        assert_eq!(
            device.read(ADD_REG_COMPLEX_CONFIGURATION).unwrap(),
            &DEFAULT_COMPLEX_CONFIGURATION
        );

        let mut payload = [0u8; 17];
        for (i, b) in payload.iter_mut().enumerate() {
            *b = i as u8;
        }
        payload[0] = GM_PWM_PORT_PWM2 as u8;
        device
            .write(ADD_REG_COMPLEX_CONFIGURATION, &payload)
            .unwrap();
        assert_eq!(device.read(ADD_REG_COMPLEX_CONFIGURATION).unwrap(), &payload);

        payload[0] = 3;
        assert_eq!(
            device.write(ADD_REG_COMPLEX_CONFIGURATION, &payload),
            Err(RegisterError::Rejected)
        );
        assert_eq!(
            device.read(ADD_REG_COMPLEX_CONFIGURATION).unwrap()[0],
            GM_PWM_PORT_PWM2 as u8
        );
    }

    #[test]
    fn test_below_min_is_invalid() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        assert_eq!(
            device.read(ADD_REG_DIGITAL_INPUTS - 1).err(),
            Some(RegisterError::InvalidAddress(0x1F))
        );
        assert_eq!(
            device.write(APP_REGS_ADD_MAX + 1, &[0]),
            Err(RegisterError::InvalidAddress(0x2C))
        );
    }

    #[test]
    fn test_version_preloaded_and_read_only() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        let version = version_register(&IDENTITY);
        assert_eq!(device.read(ADD_REG_VERSION).unwrap(), &version);
        assert_eq!(
            device.write(ADD_REG_VERSION, &[0xFF; VERSION_LEN]),
            Err(RegisterError::Rejected)
        );
        assert_eq!(device.read(ADD_REG_VERSION).unwrap(), &version);
    }

    #[test]
    fn test_digital_inputs_follow_pins() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        // Beams are pulled up, DI3 floats low
        assert_eq!(device.read(ADD_REG_DIGITAL_INPUTS).unwrap(), &[0b0111]);

        edge(&mut device, &mailbox, POKE1_IR, false);
        edge(&mut device, &mailbox, DI3, true);
        assert_eq!(device.read(ADD_REG_DIGITAL_INPUTS).unwrap(), &[0b1101]);

        assert_eq!(
            device.write(ADD_REG_DIGITAL_INPUTS, &[0]),
            Err(RegisterError::Rejected)
        );
        assert_eq!(device.read(ADD_REG_DIGITAL_INPUTS).unwrap(), &[0b1101]);
    }

    #[test]
    fn test_counter_counts_poke0_edges() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        for _ in 0..3 {
            edge(&mut device, &mailbox, POKE0_IR, false);
            edge(&mut device, &mailbox, POKE0_IR, true);
        }
        // Spare DIO input is not armed
        edge(&mut device, &mailbox, POKE0_IO, false);

        let view = device.read(ADD_REG_COUNTER0).unwrap();
        assert_eq!(decode::<i32>(view, 0), Some(6));

        assert_eq!(
            device.write(ADD_REG_COUNTER0, &1i32.to_le_bytes()),
            Err(RegisterError::Rejected)
        );
        device.write(ADD_REG_COUNTER0, &[0; 4]).unwrap();
        assert_eq!(device.read(ADD_REG_COUNTER0).unwrap(), &[0; 4]);
    }

    #[test]
    fn test_dio_port_drives_each_pin_once() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        device.write(ADD_REG_PORT_DIO_SET, &[0b1001]).unwrap();

        let pins = device.pins();
        assert!(pins.read(DO0));
        assert!(!pins.read(DO1));
        assert!(!pins.read(DO2));
        assert!(pins.read(DO3));
        assert_eq!(pins.transitions(DO0), 1);
        assert_eq!(pins.transitions(DO3), 1);
        assert_eq!(pins.transitions(DO1), 0);
        assert_eq!(device.read(ADD_REG_PORT_DIO_SET).unwrap(), &[0b1001]);

        // Same value again: no extra edges
        device.write(ADD_REG_PORT_DIO_SET, &[0b1001]).unwrap();
        assert_eq!(device.pins().transitions(DO0), 1);

        assert_eq!(
            device.write(ADD_REG_PORT_DIO_SET, &[0x10]),
            Err(RegisterError::Rejected)
        );
        assert!(device.pins().read(DO0));
    }

    #[test]
    fn test_valve_pulse() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        device
            .write(ADD_REG_PULSE_DO_PORT0, &50u16.to_le_bytes())
            .unwrap();
        assert!(device.pins().read(POKE0_VALVE));

        device.tick(49);
        assert!(device.pins().read(POKE0_VALVE));
        device.tick(1);
        assert!(!device.pins().read(POKE0_VALVE));
        assert_eq!(device.pins().transitions(POKE0_VALVE), 2);

        assert_eq!(
            device.write(ADD_REG_PULSE_DO0, &[0, 0]),
            Err(RegisterError::Rejected)
        );
        assert!(!device.pins().read(DO0));
    }

    #[test]
    fn test_pulse_rearm_extends() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        device.write(ADD_REG_PULSE_DO0, &10u16.to_le_bytes()).unwrap();
        device.tick(8);
        device.write(ADD_REG_PULSE_DO0, &10u16.to_le_bytes()).unwrap();
        device.tick(8);
        assert!(device.pins().read(DO0));
        device.tick(2);
        assert!(!device.pins().read(DO0));
    }

    #[test]
    fn test_dio_write_overrides_armed_pulse() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        device.write(ADD_REG_PULSE_DO0, &10u16.to_le_bytes()).unwrap();
        assert!(device.pulses().remaining(DO0).is_some());

        device.write(ADD_REG_PORT_DIO_SET, &[0b0001]).unwrap();
        assert!(device.pulses().remaining(DO0).is_none());

        device.tick(10);
        assert_eq!(device.read(ADD_REG_PORT_DIO_SET).unwrap(), &[0b0001]);
        assert!(device.pins().read(DO0));
    }

    #[test]
    fn test_analog_frame_latched() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        on_analog_frame(&mailbox, &[0.5, 1.0, 1.5, 2.0, 2.5, 3.0]);

        assert_eq!(device.take_events().as_slice(), &[ADD_REG_ANALOG_DATA]);
        let view = device.read(ADD_REG_ANALOG_DATA).unwrap();
        assert_eq!(decode::<f32>(view, 0), Some(0.5));
        assert_eq!(decode::<f32>(view, 5), Some(3.0));
        assert_eq!(
            device.write(ADD_REG_ANALOG_DATA, &[0; 24]),
            Err(RegisterError::Rejected)
        );
    }

    #[test]
    fn test_input_edges_raise_events() {
        let mailbox = Mailbox::new();
        let mut device = device(&mailbox);
        assert!(device.take_events().is_empty());

        edge(&mut device, &mailbox, POKE2_IR, false);
        edge(&mut device, &mailbox, POKE1_IR, false);
        assert_eq!(device.take_events().as_slice(), &[ADD_REG_DIGITAL_INPUTS]);

        // Not armed
        edge(&mut device, &mailbox, ADC1_AVAILABLE, true);
        assert!(device.take_events().is_empty());
    }

    #[test]
    fn test_initialize_boot_state() {
        let mailbox = Mailbox::new();
        mailbox.increment(COUNTER0);
        let device = device(&mailbox);
        assert_eq!(mailbox.count(COUNTER0), 0);
        for output in &OUTPUTS {
            assert!(!device.pins().electrical_level(output.pin), "{}", output.name);
        }
        assert!(device.pulses().is_empty());
    }

    proptest! {
        #[test]
        fn prop_outside_range_rejected(address in any::<u8>(), len in 0usize..8) {
            prop_assume!(!(APP_REGS_ADD_MIN..=APP_REGS_ADD_MAX).contains(&address));
            let mailbox = Mailbox::new();
            let mut device = device(&mailbox);
            let before = *device.as_bytes();
            let payload = [0xA5u8; 8];

            prop_assert_eq!(
                device.write(address, &payload[..len]),
                Err(RegisterError::InvalidAddress(address))
            );
            prop_assert_eq!(device.read(address).err(), Some(RegisterError::InvalidAddress(address)));
            prop_assert_eq!(device.as_bytes(), &before);
        }

        #[test]
        fn prop_wrong_size_never_mutates(offset in 0usize..APP_NREGS, len in 0usize..40) {
            let address = APP_REGS_ADD_MIN + offset as u8;
            let expected = REGISTER_MAP.descriptor(offset).size_bytes();
            prop_assume!(len != expected);
            let mailbox = Mailbox::new();
            let mut device = device(&mailbox);
            let before = *device.as_bytes();
            let payload = [0x01u8; 40];

            prop_assert_eq!(
                device.write(address, &payload[..len]),
                Err(RegisterError::SizeMismatch { expected, actual: len })
            );
            prop_assert_eq!(device.as_bytes(), &before);
        }
    }
}
