//! Analog sampling task
//!
//! Samples the four ADC inputs and the die temperature sensor and latches
//! each frame into the mailbox through the analog frame routine.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_time::{Duration, Ticker};

use regbank_device::app::ANALOG_CHANNELS;
use regbank_device::on_analog_frame;

use crate::channels::MAILBOX;

/// Sample period in milliseconds
pub const SAMPLE_INTERVAL_MS: u64 = 10;

/// ADC reference voltage
const VREF: f32 = 3.3;

/// Full-scale reading of the 12-bit ADC
const ADC_MAX: f32 = 4096.0;

/// Convert a raw reading to volts
fn to_volts(raw: u16) -> f32 {
    f32::from(raw) * VREF / ADC_MAX
}

/// Convert a temperature sensor reading to degrees Celsius
///
/// RP2040 datasheet, section 4.9.5: 0.706 V at 27 C, -1.721 mV/C.
fn to_celsius(raw: u16) -> f32 {
    27.0 - (to_volts(raw) - 0.706) / 0.001721
}

/// Analog task
///
/// Frame layout: inputs 0..=3 in volts, die temperature in Celsius, and
/// one unused channel reported as zero. A failed conversion drops the
/// whole frame so the latch never mixes samples from different periods.
#[embassy_executor::task]
pub async fn analog_task(
    mut adc: Adc<'static, Async>,
    mut inputs: [Channel<'static>; 4],
    mut temperature: Channel<'static>,
) {
    info!("Analog task started");

    let mut ticker = Ticker::every(Duration::from_millis(SAMPLE_INTERVAL_MS));

    'sample: loop {
        ticker.next().await;

        let mut frame = [0.0f32; ANALOG_CHANNELS];
        for (value, channel) in frame.iter_mut().zip(inputs.iter_mut()) {
            match adc.read(channel).await {
                Ok(raw) => *value = to_volts(raw),
                Err(_) => {
                    warn!("ADC conversion failed");
                    continue 'sample;
                }
            }
        }
        match adc.read(&mut temperature).await {
            Ok(raw) => frame[4] = to_celsius(raw),
            Err(_) => {
                warn!("Temperature conversion failed");
                continue;
            }
        }

        on_analog_frame(&MAILBOX, &frame);
    }
}
