//! Register Bank Hardware Abstraction Layer
//!
//! This crate defines the IO abstraction the register handlers drive:
//! pin identifiers, pin configuration, and the [`PinBank`] trait that
//! chip-specific code implements. The register core only ever touches
//! hardware through this trait, so the same handlers run on the target
//! and against the host simulation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  regbank-core (register handlers)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  regbank-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │   firmware    │       │  sim (host)   │
//! │   (RP2040)    │       │               │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`bank::PinBank`] - Pin configuration, set/clear/toggle/read, edge interrupts

#![no_std]
#![deny(unsafe_code)]

pub mod bank;
pub mod gpio;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use bank::{PinBank, PinError};
pub use gpio::{
    watching_line, ArmedInterrupt, InputBuffer, InterruptLine, InterruptPriority, OutputLine,
    OutputMode, PinId, Port, PullMode, Sense, Trigger, PINS_PER_PORT,
};
