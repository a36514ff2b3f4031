//! Probe sampling task
//!
//! Owns the sensor. Takes a reading every report interval and runs the
//! console commands that need the probe between readings.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Delay, Duration, Ticker};

use phsense_core::console::{error_reply, Command};
use phsense_core::measurement::ReportText;
use phsense_core::{PhSensor, PinId, ReportSink};
use phsense_drivers::sensor::AnalogPhProbe;

use crate::adc::ProbeAdc;
use crate::channels::{COMMAND_CHANNEL, RESPONSE_CHANNEL};

/// Sensor as wired on the board: RP2040 ADC, blocking delay, text buffer sink
pub type ProbeSensor =
    PhSensor<'static, CriticalSectionRawMutex, AnalogPhProbe<ProbeAdc, Delay>, ReportText>;

/// Sampler task - periodic readings plus forwarded console commands
#[embassy_executor::task]
pub async fn sampler_task(mut sensor: ProbeSensor, pin: PinId, report_interval_ms: u32) {
    info!("Sampler task started (pin {}, every {} ms)", pin.raw(), report_interval_ms);

    let mut ticker = Ticker::every(Duration::from_millis(report_interval_ms.max(1) as u64));

    loop {
        match select(ticker.next(), COMMAND_CHANNEL.receive()).await {
            Either::First(()) => sample(&mut sensor, pin),
            Either::Second(command) => {
                run_command(&mut sensor, pin, &command);
                let reply = core::mem::take(sensor.sink_mut());
                RESPONSE_CHANNEL.send(reply).await;
            }
        }
    }
}

/// Take one reading and log it
fn sample(sensor: &mut ProbeSensor, pin: PinId) {
    match sensor.sample(pin) {
        Ok((reading, status)) => {
            info!(
                "pH {} ({} V, {})",
                reading.ph,
                reading.voltage,
                reading.level().label()
            );
            if !status.health.is_ok() {
                warn!("Probe health: {}", status.message());
            }
        }
        Err(e) => warn!("Probe read failed: {:?}", e),
    }
}

fn run_command(sensor: &mut ProbeSensor, pin: PinId, command: &Command) {
    debug!("Console command: {:?}", command);

    if let Err(e) = sensor.execute(pin, command) {
        warn!("Command failed: {:?}", e);
        sensor.sink_mut().write_report(&error_reply(&e));
    }
}
