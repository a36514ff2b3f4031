//! Voltage sampler trait

use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque analog input handle
///
/// Wraps the raw hardware identifier (e.g. GPIO number). Only the
/// [`VoltageSampler`] implementation knows how to resolve it to an ADC
/// channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId(pub u8);

impl PinId {
    /// Raw hardware identifier
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl From<u8> for PinId {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

/// Errors that can occur while sampling the probe voltage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SamplerError {
    /// Pin is not an analog input on this board
    InvalidPin,
    /// ADC conversion failed
    ConversionError,
    /// Sampler has not been set up yet
    NotReady,
}

impl fmt::Display for SamplerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplerError::InvalidPin => f.write_str("pin is not an analog input"),
            SamplerError::ConversionError => f.write_str("ADC conversion failed"),
            SamplerError::NotReady => f.write_str("sampler not initialized"),
        }
    }
}

/// Trait for reading the probe voltage
///
/// Implementations own the ADC and know the board's reference voltage.
/// A read is a short blocking call bounded by the ADC conversion time.
///
/// Any `FnMut(PinId) -> Result<f64, SamplerError>` is a sampler, which
/// keeps tests free of hardware.
pub trait VoltageSampler {
    /// Read the voltage on `pin`, in volts
    fn read_voltage(&mut self, pin: PinId) -> Result<f64, SamplerError>;
}

impl<F> VoltageSampler for F
where
    F: FnMut(PinId) -> Result<f64, SamplerError>,
{
    fn read_voltage(&mut self, pin: PinId) -> Result<f64, SamplerError> {
        self(pin)
    }
}
