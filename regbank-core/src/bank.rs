//! Register bank controller
//!
//! [`RegisterBank`] owns the store, the pin bank and the pulse timers and
//! is the only entry point for the protocol engine. Every request runs to
//! completion in task context; interrupt routines reach it only through
//! the [`Mailbox`].
//!
//! Check order on write: address, then payload size, then the handler's
//! own validation. A failed check never touches the store or the pins.

use heapless::Vec;
use regbank_hal::PinBank;

use crate::error::{InitError, LayoutError, RegisterError};
use crate::handler::{Actuation, Handler, InputSource, Validation};
use crate::mailbox::{Mailbox, MAX_EVENT_FLAGS};
use crate::map::RegisterMap;
use crate::pulse::PulseTimers;
use crate::register::{Access, RegisterDescriptor};
use crate::store::RegisterStore;
use crate::types::RegisterType;

/// Register bank: map, storage, pins and pulse timers
pub struct RegisterBank<'a, B: PinBank, const N: usize, const BYTES: usize> {
    map: &'a RegisterMap<N>,
    store: RegisterStore<BYTES>,
    pins: B,
    mailbox: &'a Mailbox,
    pulses: PulseTimers,
}

impl<'a, B: PinBank, const N: usize, const BYTES: usize> RegisterBank<'a, B, N, BYTES> {
    /// Bind a register map to a zeroed store
    ///
    /// `pins` must already be configured. Fails when the map's layout does
    /// not match the store size.
    pub fn new(map: &'a RegisterMap<N>, pins: B, mailbox: &'a Mailbox) -> Result<Self, LayoutError> {
        if N > MAX_EVENT_FLAGS {
            return Err(LayoutError::TooManyRegisters(N));
        }
        if map.total_bytes() != BYTES {
            return Err(LayoutError::SizeMismatch {
                required: map.total_bytes(),
                provided: BYTES,
            });
        }

        info!(
            "register bank {}..={}, {} bytes",
            map.min_address(),
            map.max_address(),
            BYTES
        );
        Ok(Self {
            map,
            store: RegisterStore::new(),
            pins,
            mailbox,
            pulses: PulseTimers::new(),
        })
    }

    /// Bind a register map and load initial register contents
    ///
    /// `defaults` are `(address, bytes)` pairs copied into the store
    /// without running the registers' handlers, for constants and
    /// configuration defaults. This is the only path that writes storage
    /// outside [`RegisterBank::write`].
    pub fn with_defaults(
        map: &'a RegisterMap<N>,
        pins: B,
        mailbox: &'a Mailbox,
        defaults: &[(u8, &[u8])],
    ) -> Result<Self, InitError> {
        let mut bank = Self::new(map, pins, mailbox)?;
        for &(address, bytes) in defaults {
            bank.load_default(address, bytes)?;
        }
        Ok(bank)
    }

    fn locate(&self, address: u8) -> Result<usize, RegisterError> {
        self.map
            .index_of(address)
            .ok_or(RegisterError::InvalidAddress(address))
    }

    fn check_size(descriptor: &RegisterDescriptor, payload: &[u8]) -> Result<(), RegisterError> {
        let expected = descriptor.size_bytes();
        if payload.len() == expected {
            Ok(())
        } else {
            Err(RegisterError::SizeMismatch {
                expected,
                actual: payload.len(),
            })
        }
    }

    /// Read a register
    ///
    /// Inputs and counters are sampled into storage first, so the view
    /// reflects the hardware at the instant of the call.
    pub fn read(&mut self, address: u8) -> Result<&[u8], RegisterError> {
        let index = self.locate(address)?;
        self.refresh(index);
        Ok(self.store.slot(self.map.span(index)))
    }

    fn refresh(&mut self, index: usize) {
        let map = self.map;
        let ty = map.descriptor(index).ty;
        let slot = self.store.slot_mut(map.span(index));

        match *map.handler(index) {
            Handler::Input(InputSource::Pins(pins)) => {
                let value = pins
                    .iter()
                    .enumerate()
                    .filter(|&(_, &pin)| self.pins.read(pin))
                    .fold(0u64, |acc, (bit, _)| acc | (1 << bit));
                ty.encode_bits(value, slot);
            }
            Handler::Input(InputSource::Latch(latch)) => self.mailbox.read_latch(latch, slot),
            Handler::Counter { counter, .. } => {
                ty.encode_bits(u64::from(self.mailbox.count(counter)), slot);
            }
            Handler::Input(InputSource::Constant)
            | Handler::Config(_)
            | Handler::Actuator { .. } => {}
        }
    }

    /// Write a register
    ///
    /// On success the payload is stored and, for actuators, the pins are
    /// driven before returning. Any error leaves the bank untouched.
    pub fn write(&mut self, address: u8, payload: &[u8]) -> Result<(), RegisterError> {
        let index = self.locate(address)?;
        let map = self.map;
        let descriptor = map.descriptor(index);
        Self::check_size(descriptor, payload)?;

        let result = match *map.handler(index) {
            Handler::Input(_) => Err(RegisterError::Rejected),
            Handler::Config(validation) => self.configure(index, descriptor.ty, validation, payload),
            Handler::Actuator { validation, action } => {
                self.actuate(index, descriptor.ty, validation, action, payload)
            }
            Handler::Counter {
                counter,
                resettable,
            } => {
                if resettable && payload.iter().all(|&b| b == 0) {
                    self.mailbox.reset(counter);
                    self.store.slot_mut(map.span(index)).fill(0);
                    Ok(())
                } else {
                    Err(RegisterError::Rejected)
                }
            }
        };

        if let Err(err) = result {
            debug!("write to {} ({}) failed: {}", address, descriptor.name, err);
        }
        result
    }

    fn configure(
        &mut self,
        index: usize,
        ty: RegisterType,
        validation: Validation,
        payload: &[u8],
    ) -> Result<(), RegisterError> {
        if !validation.accepts(ty, payload) {
            return Err(RegisterError::Rejected);
        }
        self.store
            .slot_mut(self.map.span(index))
            .copy_from_slice(payload);
        Ok(())
    }

    fn actuate(
        &mut self,
        index: usize,
        ty: RegisterType,
        validation: Validation,
        action: Actuation,
        payload: &[u8],
    ) -> Result<(), RegisterError> {
        if !validation.accepts(ty, payload) {
            return Err(RegisterError::Rejected);
        }

        match action {
            Actuation::Drive(lines) => {
                self.configure(index, ty, Validation::Any, payload)?;
                let value = ty.bits(payload);
                for (bit, &line) in lines.iter().enumerate() {
                    if self.pulses.cancel(line.pin) {
                        debug!("pulse on {} overridden", line.pin);
                    }
                    self.pins.drive(line, value & (1 << bit) != 0);
                }
            }
            Actuation::Pulse(line) => {
                let duration_ms = ty
                    .integer(payload)
                    .and_then(|ms| u32::try_from(ms).ok())
                    .filter(|&ms| ms > 0)
                    .ok_or(RegisterError::Rejected)?;
                if !self.pulses.can_arm(line) {
                    warn!("no pulse timer free for {}", line.pin);
                    return Err(RegisterError::Rejected);
                }
                self.configure(index, ty, Validation::Any, payload)?;
                self.pulses.arm(line, duration_ms);
                self.pins.drive(line, true);
            }
        }
        Ok(())
    }

    /// Advance the pulse timers and release expired lines
    ///
    /// Called from the periodic tick, never from interrupt context.
    pub fn tick(&mut self, elapsed_ms: u32) {
        for line in self.pulses.advance(elapsed_ms) {
            debug!("pulse on {} expired", line.pin);
            self.pins.drive(line, false);
        }
    }

    /// Drain raised event flags
    ///
    /// Returns the addresses of event-capable registers flagged since the
    /// last call, in address order. Flags on registers without
    /// [`Access::EVENT`] are dropped.
    pub fn take_events(&mut self) -> Vec<u8, MAX_EVENT_FLAGS> {
        let flags = self.mailbox.take_events();
        let mut events = Vec::new();
        for index in 0..N {
            if flags & (1 << index) == 0 {
                continue;
            }
            if self.map.descriptor(index).access.contains(Access::EVENT) {
                // At most N <= MAX_EVENT_FLAGS entries
                let _ = events.push(self.map.address_of(index));
            }
        }
        events
    }

    fn load_default(&mut self, address: u8, bytes: &[u8]) -> Result<(), RegisterError> {
        let index = self.locate(address)?;
        Self::check_size(self.map.descriptor(index), bytes)?;
        self.store
            .slot_mut(self.map.span(index))
            .copy_from_slice(bytes);
        Ok(())
    }

    /// Raw view of the store without sampling any hardware
    pub fn read_span(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.store.get(offset..offset.checked_add(len)?)
    }

    /// The whole store, as last refreshed
    pub fn as_bytes(&self) -> &[u8; BYTES] {
        self.store.as_bytes()
    }

    /// Descriptor of a register
    pub fn descriptor(&self, address: u8) -> Result<&'a RegisterDescriptor, RegisterError> {
        let map = self.map;
        let index = self.locate(address)?;
        Ok(map.descriptor(index))
    }

    /// Register map in use
    pub fn map(&self) -> &'a RegisterMap<N> {
        self.map
    }

    /// Mailbox shared with interrupt routines
    pub fn mailbox(&self) -> &'a Mailbox {
        self.mailbox
    }

    /// Pin bank
    pub fn pins(&self) -> &B {
        &self.pins
    }

    /// Pin bank, mutably
    pub fn pins_mut(&mut self) -> &mut B {
        &mut self.pins
    }

    /// Armed pulse timers
    pub fn pulses(&self) -> &PulseTimers {
        &self.pulses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{CounterId, LatchSlot};
    use crate::mask::{BitMask, GroupMask};
    use proptest::prelude::*;
    use regbank_hal::sim::SimPinBank;
    use regbank_hal::{InputBuffer, OutputLine, OutputMode, PinId, Port, PullMode, Sense};

    const IN0: PinId = PinId::new(Port::D, 4);
    const IN1: PinId = PinId::new(Port::D, 5);
    const OUT0: PinId = PinId::new(Port::C, 0);
    const OUT1: PinId = PinId::new(Port::C, 1);
    const VALVE: PinId = PinId::new(Port::E, 7);

    const INPUT_PINS: &[PinId] = &[IN0, IN1];
    const DRIVE_LINES: &[OutputLine] = &[OutputLine::new(OUT0), OutputLine::new(OUT1)];
    const MSK_OUT: BitMask = BitMask::new("MSK_OUT", 0x03);
    const GM_MODE: GroupMask = GroupMask::new(BitMask::new("MSK_MODE", 0x07), &[1, 2, 4]);

    const RW: Access = Access::READ.union(Access::WRITE);
    const RE: Access = Access::READ.union(Access::EVENT);

    static MAP: RegisterMap<7> = RegisterMap::new(
        [
            RegisterDescriptor::scalar(0x20, "INPUTS", RegisterType::U8, RE),
            RegisterDescriptor::new(0x21, "ANALOG", RegisterType::Float, 2, RE),
            RegisterDescriptor::new(0x22, "MODE", RegisterType::U8, 3, RW),
            RegisterDescriptor::new(0x23, "VERSION", RegisterType::U8, 4, Access::READ),
            RegisterDescriptor::scalar(0x24, "COUNT", RegisterType::I32, RW),
            RegisterDescriptor::scalar(0x25, "OUTPUTS", RegisterType::U8, RW),
            RegisterDescriptor::scalar(0x26, "PULSE", RegisterType::U16, RW),
        ],
        [
            Handler::Input(InputSource::Pins(INPUT_PINS)),
            Handler::Input(InputSource::Latch(LatchSlot::new(0, 8))),
            Handler::Config(Validation::OneOf(GM_MODE)),
            Handler::Input(InputSource::Constant),
            Handler::Counter {
                counter: CounterId(0),
                resettable: true,
            },
            Handler::Actuator {
                validation: Validation::Mask(MSK_OUT),
                action: Actuation::Drive(DRIVE_LINES),
            },
            Handler::Actuator {
                validation: Validation::Range { min: 1, max: 60_000 },
                action: Actuation::Pulse(OutputLine::inverted(VALVE)),
            },
        ],
    );

    const BYTES: usize = 1 + 8 + 3 + 4 + 4 + 1 + 2;

    type TestBank<'a> = RegisterBank<'a, SimPinBank, 7, BYTES>;

    fn pins() -> SimPinBank {
        let mut pins = SimPinBank::new();
        for pin in [IN0, IN1] {
            pins.configure_input(pin, PullMode::PullDown, Sense::BothEdges)
                .unwrap();
        }
        for pin in [OUT0, OUT1, VALVE] {
            pins.configure_output(pin, OutputMode::Digital, InputBuffer::Enabled)
                .unwrap();
        }
        pins.set(VALVE);
        pins
    }

    fn bank(mailbox: &Mailbox) -> TestBank<'_> {
        RegisterBank::new(&MAP, pins(), mailbox).unwrap()
    }

    #[test]
    fn test_layout_mismatch() {
        let mailbox = Mailbox::new();
        let result = RegisterBank::<_, 7, 4>::new(&MAP, pins(), &mailbox);
        assert!(matches!(
            result,
            Err(LayoutError::SizeMismatch {
                required: BYTES,
                provided: 4
            })
        ));
    }

    #[test]
    fn test_pin_input_sampled_on_read() {
        let mailbox = Mailbox::new();
        let mut bank = bank(&mailbox);
        assert_eq!(bank.read(0x20).unwrap(), &[0b00]);

        bank.pins_mut().drive_input(IN1, true);
        assert_eq!(bank.read(0x20).unwrap(), &[0b10]);

        bank.pins_mut().drive_input(IN0, true);
        bank.pins_mut().drive_input(IN1, false);
        assert_eq!(bank.read(0x20).unwrap(), &[0b01]);
    }

    #[test]
    fn test_input_rejects_writes() {
        let mailbox = Mailbox::new();
        let mut bank = bank(&mailbox);
        assert_eq!(bank.write(0x20, &[1]), Err(RegisterError::Rejected));
        assert_eq!(bank.write(0x23, &[1, 2, 3, 4]), Err(RegisterError::Rejected));
    }

    #[test]
    fn test_latch_read() {
        let mailbox = Mailbox::new();
        let mut bank = bank(&mailbox);
        let mut sample = [0u8; 8];
        sample[..4].copy_from_slice(&1.5f32.to_le_bytes());
        sample[4..].copy_from_slice(&(-2.0f32).to_le_bytes());
        mailbox.latch(LatchSlot::new(0, 8), &sample);

        let view = bank.read(0x21).unwrap();
        assert_eq!(crate::types::decode::<f32>(view, 0), Some(1.5));
        assert_eq!(crate::types::decode::<f32>(view, 1), Some(-2.0));
    }

    #[test]
    fn test_config_validated_then_stored() {
        let mailbox = Mailbox::new();
        let mut bank = bank(&mailbox);
        bank.write(0x22, &[1, 2, 4]).unwrap();
        assert_eq!(bank.read(0x22).unwrap(), &[1, 2, 4]);

        assert_eq!(bank.write(0x22, &[1, 3, 4]), Err(RegisterError::Rejected));
        assert_eq!(bank.read(0x22).unwrap(), &[1, 2, 4]);
    }

    #[test]
    fn test_size_checked_before_handler() {
        let mailbox = Mailbox::new();
        let mut bank = bank(&mailbox);
        // Read-only register still reports the size error first
        assert_eq!(
            bank.write(0x20, &[1, 2]),
            Err(RegisterError::SizeMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_counter_snapshot_and_reset() {
        let mailbox = Mailbox::new();
        let mut bank = bank(&mailbox);
        for _ in 0..3 {
            mailbox.increment(CounterId(0));
        }
        assert_eq!(bank.read(0x24).unwrap(), &3i32.to_le_bytes());

        assert_eq!(
            bank.write(0x24, &5i32.to_le_bytes()),
            Err(RegisterError::Rejected)
        );
        bank.write(0x24, &[0; 4]).unwrap();
        assert_eq!(bank.read(0x24).unwrap(), &[0; 4]);
        assert_eq!(mailbox.count(CounterId(0)), 0);
    }

    #[test]
    fn test_drive_outputs() {
        let mailbox = Mailbox::new();
        let mut bank = bank(&mailbox);
        bank.write(0x25, &[0b10]).unwrap();
        assert!(!bank.pins().read(OUT0));
        assert!(bank.pins().read(OUT1));
        assert_eq!(bank.pins().transitions(OUT1), 1);
        assert_eq!(bank.pins().transitions(OUT0), 0);
        assert_eq!(bank.read(0x25).unwrap(), &[0b10]);

        // Bit outside the mask
        assert_eq!(bank.write(0x25, &[0b100]), Err(RegisterError::Rejected));
        assert!(bank.pins().read(OUT1));
        assert_eq!(bank.read(0x25).unwrap(), &[0b10]);
    }

    #[test]
    fn test_pulse_lifecycle() {
        let mailbox = Mailbox::new();
        let mut bank = bank(&mailbox);
        // Inverted line idles high
        assert!(bank.pins().read(VALVE));

        bank.write(0x26, &10u16.to_le_bytes()).unwrap();
        assert!(!bank.pins().read(VALVE));
        assert_eq!(bank.pulses().remaining(VALVE), Some(10));

        bank.tick(9);
        assert!(!bank.pins().read(VALVE));
        bank.tick(1);
        assert!(bank.pins().read(VALVE));
        assert!(bank.pulses().is_empty());
    }

    #[test]
    fn test_zero_pulse_rejected() {
        let mailbox = Mailbox::new();
        let mut bank = bank(&mailbox);
        assert_eq!(bank.write(0x26, &[0, 0]), Err(RegisterError::Rejected));
        assert!(bank.pins().read(VALVE));
        assert!(bank.pulses().is_empty());
    }

    #[test]
    fn test_events_filtered_by_access() {
        let mailbox = Mailbox::new();
        let mut bank = bank(&mailbox);
        mailbox.raise(1);
        mailbox.raise(0);
        // VERSION is not event capable
        mailbox.raise(3);
        assert_eq!(bank.take_events().as_slice(), &[0x20, 0x21]);
        assert!(bank.take_events().is_empty());
    }

    #[test]
    fn test_defaults_loaded_at_construction() {
        let mailbox = Mailbox::new();
        let const_bytes: &[u8] = &[1, 0, 0, 1];
        let mut bank =
            TestBank::with_defaults(&MAP, pins(), &mailbox, &[(0x23, const_bytes)]).unwrap();
        assert_eq!(bank.read(0x23).unwrap(), &[1, 0, 0, 1]);
        assert_eq!(bank.read_span(12, 4), Some(&[1, 0, 0, 1][..]));
        assert_eq!(bank.read_span(BYTES - 1, 2), None);
        assert_eq!(bank.descriptor(0x26).unwrap().name, "PULSE");

        let short: &[u8] = &[1];
        assert!(matches!(
            TestBank::with_defaults(&MAP, pins(), &mailbox, &[(0x23, short)]),
            Err(InitError::Default(RegisterError::SizeMismatch {
                expected: 4,
                actual: 1
            }))
        ));
        assert!(matches!(
            TestBank::with_defaults(&MAP, pins(), &mailbox, &[(0x40, short)]),
            Err(InitError::Default(RegisterError::InvalidAddress(0x40)))
        ));
    }

    proptest! {
        #[test]
        fn prop_out_of_range_address(address in any::<u8>()) {
            prop_assume!(!(0x20..=0x26).contains(&address));
            let mailbox = Mailbox::new();
            let mut bank = bank(&mailbox);
            prop_assert_eq!(bank.read(address).err(), Some(RegisterError::InvalidAddress(address)));
            prop_assert_eq!(bank.write(address, &[0]), Err(RegisterError::InvalidAddress(address)));
        }

        #[test]
        fn prop_wrong_length_leaves_store(len in 0usize..16) {
            prop_assume!(len != 3);
            let mailbox = Mailbox::new();
            let mut bank = bank(&mailbox);
            bank.write(0x22, &[2, 2, 2]).unwrap();
            let payload = [1u8; 16];
            prop_assert_eq!(
                bank.write(0x22, &payload[..len]),
                Err(RegisterError::SizeMismatch { expected: 3, actual: len })
            );
            prop_assert_eq!(bank.read(0x22).unwrap(), &[2, 2, 2]);
        }
    }
}
