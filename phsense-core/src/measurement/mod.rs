//! Measurement
//!
//! Voltage to pH conversion, reading snapshots and level classification.

pub mod converter;
pub mod level;
pub mod reading;

pub use converter::PhConverter;
pub use level::{classify, PhLevel, NEUTRAL_PH};
pub use reading::{
    format_readings, Decimal, Reading, ReadingAggregator, ReportText, REPORT_CAPACITY,
};
