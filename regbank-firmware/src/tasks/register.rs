//! Register task
//!
//! Owns the device. Serves protocol requests in arrival order, runs the
//! port interrupt routine for every armed input edge and, on every tick,
//! advances pulse timers and forwards flagged registers as reports.
//!
//! Nothing in the loop awaits the protocol engine: replies and reports go
//! out with `try_send`, so a slow consumer cannot delay pulse timeouts.

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_futures::yield_now;
use embassy_sync::channel::TrySendError;
use embassy_time::{Duration, Ticker};

use regbank_core::RegisterError;
use regbank_device::{on_port_interrupt, Device};

use crate::channels::{Payload, Reply, Report, Request, REPLIES, REPORTS, REQUESTS};
use crate::io::Rp2040PinBank;

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u32 = 1;

/// Copy a register view into a channel payload
fn payload(view: &[u8]) -> Result<Payload, RegisterError> {
    Payload::from_slice(view).map_err(|_| RegisterError::Rejected)
}

fn serve(device: &mut Device<'static, Rp2040PinBank>, request: Request) -> Reply {
    let address = request.address();
    let result = match request {
        Request::Read { address } => device.read(address).and_then(payload),
        Request::Write { address, payload: bytes } => match device.write(address, &bytes) {
            Ok(()) => device.read(address).and_then(payload),
            Err(err) => Err(err),
        },
    };
    Reply { address, result }
}

fn on_tick(device: &mut Device<'static, Rp2040PinBank>) {
    device.tick(TICK_INTERVAL_MS);

    for address in device.take_events() {
        let Ok(view) = device.read(address).and_then(payload) else {
            continue;
        };
        let report = Report {
            address,
            payload: view,
        };
        if REPORTS.try_send(report).is_err() {
            warn!("report queue full, dropped register {}", address);
        }
    }
}

#[embassy_executor::task]
pub async fn register_task(mut device: Device<'static, Rp2040PinBank>) {
    info!("Register task started");

    let mailbox = device.mailbox();
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS as u64));

    loop {
        let event = select3(
            REQUESTS.receive(),
            ticker.next(),
            device.pins_mut().wait_for_edge(),
        )
        .await;

        match event {
            Either3::First(request) => {
                let reply = serve(&mut device, request);
                if let Err(err) = &reply.result {
                    debug!("register {}: {}", reply.address, err);
                }
                if let Err(TrySendError::Full(reply)) = REPLIES.try_send(reply) {
                    warn!("reply queue full, dropped reply for register {}", reply.address);
                }
            }
            Either3::Second(()) => on_tick(&mut device),
            Either3::Third((port, line)) => {
                on_port_interrupt(mailbox, port, line);
                // A held level keeps firing; let the other tasks run
                yield_now().await;
            }
        }
    }
}
