//! Board-agnostic register bank core for instrument firmware
//!
//! This crate contains everything between the protocol engine and the
//! IO layer that does not depend on a specific board:
//!
//! - Register element types and the packed little-endian store
//! - Register descriptors, bit masks and group masks
//! - The handler dispatch table and its const-validated register map
//! - The interrupt mailbox and software pulse timers
//! - The [`RegisterBank`] controller serving reads and writes
//! - Pin and identity configuration types

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod bank;
pub mod config;
pub mod error;
pub mod handler;
pub mod mailbox;
pub mod map;
pub mod mask;
pub mod pulse;
pub mod register;
pub mod store;
pub mod types;

pub use bank::RegisterBank;
pub use error::{InitError, LayoutError, RegisterError};
pub use handler::{Actuation, CounterId, Handler, InputSource, LatchSlot, Validation};
pub use mailbox::Mailbox;
pub use map::RegisterMap;
pub use register::{Access, RegisterDescriptor};
pub use types::RegisterType;
