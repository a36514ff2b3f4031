//! phsense - Analog pH Sensor Firmware
//!
//! Main firmware binary for RP2040-based boards with an analog pH probe
//! front end on one of the ADC pins. A sampling task logs a reading every
//! report interval; a serial console on UART0 takes calibration commands.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcPeripheralConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Pull;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use phsense_core::measurement::ReportText;
use phsense_core::{parse_config, CalibrationEngine, CalibrationStore, PhSensor, PinId, SensorConfig};
use phsense_drivers::sensor::AnalogPhProbe;

use crate::adc::{AdcInput, ProbeAdc};

mod adc;
mod channels;
mod tasks;

/// Embedded probe configuration (compiled into firmware)
/// Edit probe.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../probe.toml");

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Calibration shared by the sampler and console tasks
static CALIBRATION: StaticCell<CalibrationStore<CriticalSectionRawMutex>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("phsense firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    // Calibration from probe.toml is both the starting point and the reset target
    let store: &'static CalibrationStore<CriticalSectionRawMutex> =
        CALIBRATION.init(CalibrationStore::new(config.calibration));
    let (slope, intercept) = store.coefficients();
    info!("Calibration: slope={} intercept={}", slope, intercept);

    // Serial console on UART0 (GPIO0 TX, GPIO1 RX), 115200 baud default
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized for console");

    // Probe ADC input
    let input = match AdcInput::from_gpio(config.probe.pin.raw()) {
        Some(input) => input,
        None => {
            warn!(
                "GPIO{} is not an ADC pin, using GPIO26",
                config.probe.pin.raw()
            );
            AdcInput::Adc0
        }
    };
    let channel = match input {
        AdcInput::Adc0 => Channel::new_pin(p.PIN_26, Pull::None),
        AdcInput::Adc1 => Channel::new_pin(p.PIN_27, Pull::None),
        AdcInput::Adc2 => Channel::new_pin(p.PIN_28, Pull::None),
        AdcInput::Adc3 => Channel::new_pin(p.PIN_29, Pull::None),
    };
    let adc = Adc::new_blocking(p.ADC, AdcPeripheralConfig::default());

    let probe = AnalogPhProbe::new(ProbeAdc::new(adc, channel, input), Delay, config.adc);
    let sensor = PhSensor::new(store, probe, ReportText::new(), &config);
    let pin = PinId(input.gpio());

    info!("ADC initialized on GPIO{}", input.gpio());

    spawner.spawn(unwrap!(tasks::sampler_task(
        sensor,
        pin,
        config.probe.report_interval_ms,
    )));
    spawner.spawn(unwrap!(tasks::console_task(
        rx,
        tx,
        CalibrationEngine::new(store),
        config.buffers,
    )));

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded probe.toml
///
/// Falls back to built-in defaults if the embedded file is broken.
fn load_config() -> SensorConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using default configuration");
            SensorConfig::default()
        }
    }
}
