//! Poke controller firmware
//!
//! Boots the three-port poke controller on an RP2040 board: configures
//! the pins, binds the register map and starts the register and analog
//! tasks. The protocol engine talks to the register task through
//! [`channels::REQUESTS`] and [`channels::REPLIES`].

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Pull;
use {defmt_rtt as _, panic_probe as _};

use crate::channels::MAILBOX;
use crate::io::Rp2040PinBank;

mod channels;
mod io;
mod tasks;

bind_interrupts!(struct Irqs {
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Poke controller firmware starting...");

    let p = embassy_rp::init(Default::default());

    let pins = Rp2040PinBank::new(board_gpios!(p));
    let device = match regbank_device::initialize(pins, &MAILBOX) {
        Ok(device) => device,
        // Firmware does not match the board; nothing is safe to drive
        Err(err) => panic!("initialization failed: {}", err),
    };

    let adc = Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default());
    let inputs = [
        Channel::new_pin(p.PIN_26, Pull::None),
        Channel::new_pin(p.PIN_27, Pull::None),
        Channel::new_pin(p.PIN_28, Pull::None),
        Channel::new_pin(p.PIN_29, Pull::None),
    ];
    let temperature = Channel::new_temp_sensor(p.ADC_TEMP_SENSOR);

    spawner.spawn(tasks::register_task(device)).unwrap();
    spawner
        .spawn(tasks::analog_task(adc, inputs, temperature))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
