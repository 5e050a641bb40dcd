//! Three-port nose-poke controller
//!
//! A concrete device built on `regbank-core`: the pin map, the register
//! map at `0x20..=0x2B`, boot-time initialization and the interrupt
//! routines feeding the mailbox. Board support (the firmware crate)
//! provides the [`regbank_hal::PinBank`] and calls [`app::initialize`].

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod app;
pub mod config;
pub mod pins;
pub mod registers;

pub use app::{initialize, on_analog_frame, on_port_interrupt, Device};
