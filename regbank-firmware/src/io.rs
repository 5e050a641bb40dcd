//! RP2040 pin bank
//!
//! Maps the board's logical port pins onto RP2040 GPIOs and implements
//! [`PinBank`] over `embassy_rp` flex pins. The RP2040 has a single GPIO
//! interrupt rather than per-port vectors; armed port interrupts are
//! served by [`Rp2040PinBank::wait_for_edge`], which waits on the GPIO
//! edge interrupt of every armed input and reports the port and line of
//! the first one that fires.

use core::future::pending;

use defmt::*;
use embassy_futures::select::select_array;
use embassy_rp::gpio::{AnyPin, Flex, Pull};
use embassy_rp::Peri;
use regbank_device::pins::{
    ADC1_AVAILABLE, DI3, DO0, DO1, DO2, DO3, LED0, LED1, POKE0_IO, POKE0_IR, POKE0_LED,
    POKE0_VALVE, POKE1_IO, POKE1_IR, POKE1_LED, POKE1_VALVE, POKE2_IO, POKE2_IR, POKE2_LED,
    POKE2_VALVE, RGBS,
};
use regbank_hal::{
    watching_line, ArmedInterrupt, InputBuffer, InterruptLine, InterruptPriority, OutputMode,
    PinBank, PinError, PinId, Port, PullMode, Sense, Trigger,
};

/// Number of board pins wired to GPIOs
pub const BOARD_PIN_COUNT: usize = 21;

/// Board wiring: entry `n` is the pin on GPIO `n`
pub const BOARD_PINS: [PinId; BOARD_PIN_COUNT] = [
    POKE0_IR,
    POKE0_IO,
    POKE0_LED,
    POKE0_VALVE,
    POKE1_IR,
    POKE1_IO,
    POKE1_LED,
    POKE1_VALVE,
    POKE2_IR,
    POKE2_IO,
    POKE2_LED,
    POKE2_VALVE,
    DO0,
    DO1,
    DO2,
    DO3,
    DI3,
    ADC1_AVAILABLE,
    LED0,
    LED1,
    RGBS,
];

/// Take the GPIOs listed in [`BOARD_PINS`], in order
#[macro_export]
macro_rules! board_gpios {
    ($p:expr) => {
        [
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_0),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_1),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_2),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_3),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_4),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_5),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_6),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_7),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_8),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_9),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_10),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_11),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_12),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_13),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_14),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_15),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_16),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_17),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_18),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_19),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_20),
        ]
    };
}

/// Pin direction and wiring as configured
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Unconfigured,
    Input { sense: Sense },
    Output { mode: OutputMode, input_buffer: InputBuffer },
}

type Interrupts = [[Option<ArmedInterrupt>; 2]; Port::COUNT];

/// Wait on the pin's GPIO interrupt for a trigger condition
async fn wait_for(flex: &mut Flex<'static>, trigger: Trigger) {
    match trigger {
        Trigger::RisingEdge => flex.wait_for_rising_edge().await,
        Trigger::FallingEdge => flex.wait_for_falling_edge().await,
        Trigger::AnyEdge => flex.wait_for_any_edge().await,
        Trigger::Low => flex.wait_for_low().await,
        Trigger::High => flex.wait_for_high().await,
    }
}

struct Slot {
    id: PinId,
    flex: Flex<'static>,
    mode: Mode,
    /// Level the output was last told to take
    commanded: bool,
}

impl Slot {
    /// Resolve when an armed interrupt fires on this pin; never for
    /// outputs and unarmed inputs
    async fn watch(&mut self, interrupts: &Interrupts) -> (Port, InterruptLine) {
        let Mode::Input { sense } = self.mode else {
            return pending().await;
        };
        let lines = &interrupts[self.id.port.index()];
        let Some((line, armed)) = watching_line(lines, self.id) else {
            return pending().await;
        };
        wait_for(&mut self.flex, sense.trigger(armed.invert)).await;
        (self.id.port, line)
    }

    /// Put the commanded level on the pad
    ///
    /// Wired modes only drive their dominant level and float otherwise.
    fn apply(&mut self, high: bool) {
        self.commanded = high;
        let Mode::Output { mode, .. } = self.mode else {
            return;
        };
        match mode {
            OutputMode::Digital => self.flex.set_level(high.into()),
            OutputMode::WiredAnd | OutputMode::WiredAndPull => {
                self.flex.set_low();
                if high {
                    self.flex.set_as_input();
                } else {
                    self.flex.set_as_output();
                }
            }
            OutputMode::WiredOr | OutputMode::WiredOrPull => {
                self.flex.set_high();
                if high {
                    self.flex.set_as_output();
                } else {
                    self.flex.set_as_input();
                }
            }
        }
    }
}

/// RP2040 implementation of [`PinBank`]
pub struct Rp2040PinBank {
    slots: [Slot; BOARD_PIN_COUNT],
    interrupts: Interrupts,
}

impl Rp2040PinBank {
    /// Wrap the board GPIOs; `gpios[n]` must be GPIO `n`
    pub fn new(gpios: [Peri<'static, AnyPin>; BOARD_PIN_COUNT]) -> Self {
        let mut gpio = 0;
        let slots = gpios.map(|pin| {
            let slot = Slot {
                id: BOARD_PINS[gpio],
                flex: Flex::new(pin),
                mode: Mode::Unconfigured,
                commanded: false,
            };
            gpio += 1;
            slot
        });
        Self {
            slots,
            interrupts: [[None; 2]; Port::COUNT],
        }
    }

    fn slot(&self, pin: PinId) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.id == pin)
    }

    fn slot_mut(&mut self, pin: PinId) -> Result<&mut Slot, PinError> {
        self.slots
            .iter_mut()
            .find(|slot| slot.id == pin)
            .ok_or(PinError::InvalidPin(pin))
    }

    /// Wait for the next armed port interrupt
    ///
    /// Every armed input waits on its own GPIO interrupt; the first to fire
    /// resolves with its port and line. Dropping the future disarms the
    /// GPIO interrupts until the next call.
    pub async fn wait_for_edge(&mut self) -> (Port, InterruptLine) {
        let interrupts = &self.interrupts;
        let watches = self.slots.each_mut().map(|slot| slot.watch(interrupts));
        select_array(watches).await.0
    }
}

impl PinBank for Rp2040PinBank {
    fn configure_input(
        &mut self,
        pin: PinId,
        pull: PullMode,
        sense: Sense,
    ) -> Result<(), PinError> {
        let slot = self.slot_mut(pin)?;
        slot.flex.set_as_input();
        slot.flex.set_pull(match pull {
            PullMode::PullUp => Pull::Up,
            PullMode::PullDown => Pull::Down,
            // The pad keeper is not exposed; float instead
            PullMode::TriState | PullMode::BusHolder => Pull::None,
        });
        slot.mode = Mode::Input { sense };
        Ok(())
    }

    fn configure_output(
        &mut self,
        pin: PinId,
        mode: OutputMode,
        input_buffer: InputBuffer,
    ) -> Result<(), PinError> {
        let slot = self.slot_mut(pin)?;
        slot.flex.set_pull(match mode {
            OutputMode::WiredAndPull => Pull::Up,
            OutputMode::WiredOrPull => Pull::Down,
            _ => Pull::None,
        });
        slot.mode = Mode::Output { mode, input_buffer };
        if mode == OutputMode::Digital {
            slot.flex.set_as_output();
        }
        slot.apply(false);
        Ok(())
    }

    fn set(&mut self, pin: PinId) {
        if let Ok(slot) = self.slot_mut(pin) {
            slot.apply(true);
        }
    }

    fn clear(&mut self, pin: PinId) {
        if let Ok(slot) = self.slot_mut(pin) {
            slot.apply(false);
        }
    }

    fn toggle(&mut self, pin: PinId) {
        if let Ok(slot) = self.slot_mut(pin) {
            let level = slot.commanded;
            slot.apply(!level);
        }
    }

    fn read(&self, pin: PinId) -> bool {
        match self.slot(pin) {
            Some(Slot {
                mode:
                    Mode::Output {
                        input_buffer: InputBuffer::Disabled,
                        ..
                    },
                ..
            }) => false,
            Some(slot) => slot.flex.is_high(),
            None => false,
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
        for bit in 0..8 {
            let pin = PinId::new(port, bit);
            if mask & pin.mask() != 0 && self.slot(pin).is_none() {
                return Err(PinError::InvalidPin(pin));
            }
        }
        self.interrupts[port.index()][line.index()] = Some(ArmedInterrupt {
            priority,
            mask,
            invert,
        });
        debug!("port {} {} armed, mask {}", port, line, mask);
        Ok(())
    }
}
