//! Sensor health monitoring
//!
//! Gates readings on the probe voltage staying inside the ADC's usable band.

pub mod health;

pub use health::{HealthFault, SensorHealth, SensorHealthMonitor, StatusReport};
