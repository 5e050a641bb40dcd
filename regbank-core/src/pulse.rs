//! Software pulse timers
//!
//! A pulsed actuator write drives its line active and arms a timer here.
//! The periodic tick advances every timer and hands back the lines whose
//! pulse ran out so the caller can release them, without any further
//! dispatch call.

use heapless::Vec;
use regbank_hal::{OutputLine, PinId};

/// Maximum simultaneously armed pulses
pub const MAX_PULSES: usize = 8;

/// A pulse in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActivePulse {
    /// Line held active
    pub line: OutputLine,
    /// Time left before the line is released
    pub remaining_ms: u32,
}

/// Armed pulse timers, at most one per pin
#[derive(Debug, Default)]
pub struct PulseTimers {
    active: Vec<ActivePulse, MAX_PULSES>,
}

impl PulseTimers {
    /// Create with no pulses armed
    pub const fn new() -> Self {
        Self { active: Vec::new() }
    }

    /// Check whether `arm` would succeed for this line
    pub fn can_arm(&self, line: OutputLine) -> bool {
        !self.active.is_full() || self.active.iter().any(|p| p.line.pin == line.pin)
    }

    /// Arm a pulse, re-arming if the pin already has one
    ///
    /// Returns false when every timer is busy.
    pub fn arm(&mut self, line: OutputLine, duration_ms: u32) -> bool {
        if let Some(pulse) = self.active.iter_mut().find(|p| p.line.pin == line.pin) {
            pulse.line = line;
            pulse.remaining_ms = duration_ms;
            return true;
        }
        self.active
            .push(ActivePulse {
                line,
                remaining_ms: duration_ms,
            })
            .is_ok()
    }

    /// Drop a pin's pulse without releasing the line
    pub fn cancel(&mut self, pin: PinId) -> bool {
        let before = self.active.len();
        self.active.retain(|p| p.line.pin != pin);
        self.active.len() != before
    }

    /// Advance all timers, returning the lines whose pulse expired
    pub fn advance(&mut self, elapsed_ms: u32) -> Vec<OutputLine, MAX_PULSES> {
        let mut expired = Vec::new();
        self.active.retain_mut(|pulse| {
            if pulse.remaining_ms <= elapsed_ms {
                // Capacity matches, cannot fail
                let _ = expired.push(pulse.line);
                false
            } else {
                pulse.remaining_ms -= elapsed_ms;
                true
            }
        });
        expired
    }

    /// Time left on a pin's pulse
    pub fn remaining(&self, pin: PinId) -> Option<u32> {
        self.active
            .iter()
            .find(|p| p.line.pin == pin)
            .map(|p| p.remaining_ms)
    }

    /// Number of armed pulses
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Check whether no pulse is armed
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
