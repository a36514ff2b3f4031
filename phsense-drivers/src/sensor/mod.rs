//! Sensor drivers

mod analog_ph;

pub use analog_ph::{AdcReader, AnalogPhProbe};
