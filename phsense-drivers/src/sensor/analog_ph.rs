//! Analog pH probe front end
//!
//! The probe amplifier presents a voltage on an ADC-capable pin. Each
//! voltage reading averages several conversions spaced a few milliseconds
//! apart to smooth out amplifier noise.

use embedded_hal::delay::DelayNs;
use phsense_core::config::AdcConfig;
use phsense_core::traits::{PinId, SamplerError, VoltageSampler};

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    /// Read a raw conversion (12-bit, 0-4095) from `pin`
    fn read(&mut self, pin: PinId) -> Result<u16, SamplerError>;
}

impl<T: AdcReader + ?Sized> AdcReader for &mut T {
    fn read(&mut self, pin: PinId) -> Result<u16, SamplerError> {
        T::read(self, pin)
    }
}

/// Averaging voltage sampler over an [`AdcReader`]
pub struct AnalogPhProbe<ADC, D> {
    adc: ADC,
    delay: D,
    config: AdcConfig,
}

impl<ADC, D> AnalogPhProbe<ADC, D> {
    /// Create a probe sampler
    ///
    /// # Arguments
    /// - `adc`: ADC used for conversions
    /// - `delay`: blocking delay between conversions
    /// - `config`: scaling and averaging parameters
    pub fn new(adc: ADC, delay: D, config: AdcConfig) -> Self {
        Self { adc, delay, config }
    }

    /// Scaling and averaging parameters
    pub fn config(&self) -> &AdcConfig {
        &self.config
    }

    /// Release the ADC and delay
    pub fn release(self) -> (ADC, D) {
        (self.adc, self.delay)
    }
}

impl<ADC: AdcReader, D: DelayNs> AnalogPhProbe<ADC, D> {
    /// Mean raw count over `sample_count` conversions
    ///
    /// A sample count of zero is treated as one. The first failed
    /// conversion aborts the reading.
    pub fn read_average_counts(&mut self, pin: PinId) -> Result<f64, SamplerError> {
        let samples = self.config.sample_count.max(1);
        let mut total: u32 = 0;

        for i in 0..samples {
            if i > 0 {
                self.delay.delay_ms(self.config.sample_interval_ms);
            }
            let counts = self.adc.read(pin)?;
            if counts > self.config.adc_max {
                return Err(SamplerError::ConversionError);
            }
            total += counts as u32;
        }

        Ok(total as f64 / samples as f64)
    }
}

impl<ADC: AdcReader, D: DelayNs> VoltageSampler for AnalogPhProbe<ADC, D> {
    fn read_voltage(&mut self, pin: PinId) -> Result<f64, SamplerError> {
        let counts = self.read_average_counts(pin)?;
        Ok(self.config.counts_to_volts(counts))
    }
}
