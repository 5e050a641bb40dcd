//! Inter-task communication
//!
//! The register task owns the device. Everything else reaches it through
//! these statics: the protocol engine through the request/reply pair, the
//! analog task through the mailbox.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

use regbank_core::{Mailbox, RegisterError};

/// Largest register payload (the version register)
pub const MAX_PAYLOAD: usize = 32;

/// Channel capacity for register requests
const REQUEST_CHANNEL_SIZE: usize = 4;

/// Channel capacity for event reports
const REPORT_CHANNEL_SIZE: usize = 8;

/// Register bytes as carried over the channels
pub type Payload = Vec<u8, MAX_PAYLOAD>;

/// Decoded frame from the protocol engine
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    Read { address: u8 },
    Write { address: u8, payload: Payload },
}

impl Request {
    pub fn address(&self) -> u8 {
        match self {
            Request::Read { address } | Request::Write { address, .. } => *address,
        }
    }
}

/// Result of one request, in request order
///
/// A successful write answers with the register's contents after the
/// write, so the reply frame can echo them.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    pub address: u8,
    pub result: Result<Payload, RegisterError>,
}

/// Unsolicited report of a register flagged by an interrupt routine
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Report {
    pub address: u8,
    pub payload: Payload,
}

/// Interrupt-context state shared with the register task
pub static MAILBOX: Mailbox = Mailbox::new();

/// Requests from the protocol engine
pub static REQUESTS: Channel<CriticalSectionRawMutex, Request, REQUEST_CHANNEL_SIZE> =
    Channel::new();

/// Replies to the protocol engine
pub static REPLIES: Channel<CriticalSectionRawMutex, Reply, REQUEST_CHANNEL_SIZE> =
    Channel::new();

/// Event reports to the protocol engine
pub static REPORTS: Channel<CriticalSectionRawMutex, Report, REPORT_CHANNEL_SIZE> =
    Channel::new();
