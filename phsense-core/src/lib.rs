//! Board-agnostic calibration and measurement engine for analog pH probes
//!
//! This crate contains all logic that does not depend on a specific
//! board or ADC:
//!
//! - Collaborator traits (voltage sampler, text report sink)
//! - Calibration store and the offset / two-point / three-point procedures
//! - Voltage to pH conversion and reading aggregation
//! - Sensor health monitoring and pH level classification
//! - Configuration types and a small TOML-subset parser
//! - Serial console command parsing
//! - The [`PhSensor`] facade tying it all together
//!
//! # Data flow
//!
//! ```text
//! VoltageSampler ──► PhConverter ──► ReadingAggregator / SensorHealthMonitor / classify
//!                        ▲
//!                        │ reads
//!               CalibrationStore ◄── writes ── CalibrationEngine
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

// Must come first so the logging macros are visible to the other modules
mod fmt;

pub mod calibration;
pub mod config;
pub mod console;
pub mod measurement;
pub mod safety;
pub mod sensor;
pub mod traits;

pub use calibration::{
    CalibrationEngine, CalibrationError, CalibrationPoint, CalibrationSnapshot, CalibrationState,
    CalibrationStore,
};
pub use config::{parse_config, BufferSet, SensorConfig};
pub use measurement::{classify, PhConverter, PhLevel, Reading, ReadingAggregator};
pub use safety::{SensorHealth, SensorHealthMonitor, StatusReport};
pub use sensor::{PhError, PhSensor};
pub use traits::{PinId, ReportSink, SamplerError, VoltageSampler};
