//! RP2040 ADC adapter
//!
//! RP2040 has a single ADC with 5 channels:
//! - ADC0: GPIO26
//! - ADC1: GPIO27
//! - ADC2: GPIO28
//! - ADC3: GPIO29
//! - ADC4: Internal temperature sensor

use embassy_rp::adc::{Adc, Blocking, Channel};

use phsense_core::traits::{PinId, SamplerError};
use phsense_drivers::sensor::AdcReader;

/// ADC input identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcInput {
    /// ADC0 on GPIO26
    Adc0,
    /// ADC1 on GPIO27
    Adc1,
    /// ADC2 on GPIO28
    Adc2,
    /// ADC3 on GPIO29
    Adc3,
}

impl AdcInput {
    /// GPIO pin for this input
    pub fn gpio(self) -> u8 {
        match self {
            AdcInput::Adc0 => 26,
            AdcInput::Adc1 => 27,
            AdcInput::Adc2 => 28,
            AdcInput::Adc3 => 29,
        }
    }

    /// ADC input wired to a GPIO pin, if any
    pub fn from_gpio(gpio: u8) -> Option<Self> {
        match gpio {
            26 => Some(AdcInput::Adc0),
            27 => Some(AdcInput::Adc1),
            28 => Some(AdcInput::Adc2),
            29 => Some(AdcInput::Adc3),
            _ => None,
        }
    }
}

/// Blocking ADC bound to the probe's input
pub struct ProbeAdc {
    adc: Adc<'static, Blocking>,
    channel: Channel<'static>,
    input: AdcInput,
}

impl ProbeAdc {
    pub fn new(adc: Adc<'static, Blocking>, channel: Channel<'static>, input: AdcInput) -> Self {
        Self {
            adc,
            channel,
            input,
        }
    }
}

impl AdcReader for ProbeAdc {
    fn read(&mut self, pin: PinId) -> Result<u16, SamplerError> {
        if AdcInput::from_gpio(pin.raw()) != Some(self.input) {
            return Err(SamplerError::InvalidPin);
        }
        self.adc
            .blocking_read(&mut self.channel)
            .map_err(|_| SamplerError::ConversionError)
    }
}
