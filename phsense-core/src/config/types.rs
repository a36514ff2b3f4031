//! Configuration type definitions

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationPoint, CalibrationState};
use crate::traits::PinId;

/// Default analog input (GPIO26 / ADC0 on RP2040)
pub const DEFAULT_PROBE_PIN: u8 = 26;

/// Probe wiring and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProbeConfig {
    /// Analog input the probe is wired to
    pub pin: PinId,
    /// Interval between periodic readings (ms)
    pub report_interval_ms: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            pin: PinId(DEFAULT_PROBE_PIN),
            report_interval_ms: 1000,
        }
    }
}

/// ADC scaling and sample averaging
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcConfig {
    /// ADC reference voltage (V)
    pub vref_v: f64,
    /// Full-scale ADC count (4095 for 12-bit)
    pub adc_max: u16,
    /// Conversions averaged per voltage reading
    pub sample_count: u8,
    /// Delay between conversions (ms)
    pub sample_interval_ms: u32,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            vref_v: 3.3,
            adc_max: 4095,
            sample_count: 10,
            sample_interval_ms: 10,
        }
    }
}

impl AdcConfig {
    /// Convert an (averaged) ADC count to volts
    #[inline]
    pub fn counts_to_volts(&self, counts: f64) -> f64 {
        counts * self.vref_v / self.adc_max as f64
    }
}

/// Valid analog operating band of the probe
///
/// The bounds depend on the host's ADC reference; a reading is healthy when
/// `low_v < voltage < high_v`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HealthThresholds {
    /// Noise floor above ground (V)
    pub low_v: f64,
    /// Just below the positive rail (V)
    pub high_v: f64,
}

impl Default for HealthThresholds {
    /// Band for a 3.3 V reference
    fn default() -> Self {
        Self {
            low_v: 0.05,
            high_v: 3.25,
        }
    }
}

/// One of the three calibration buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferSlot {
    Low,
    Mid,
    High,
}

impl BufferSlot {
    /// Lowercase name used on the console
    pub const fn label(self) -> &'static str {
        match self {
            BufferSlot::Low => "low",
            BufferSlot::Mid => "mid",
            BufferSlot::High => "high",
        }
    }
}

/// Reference pH of the low, mid and high calibration buffers
///
/// Two-point calibration uses `low` and `mid`; three-point uses all three.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferSet {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl BufferSet {
    /// Common hobby buffer kit
    pub const STANDARD: Self = Self {
        low: 4.0,
        mid: 7.0,
        high: 9.0,
    };

    /// NIST-traceable buffers
    pub const NIST: Self = Self {
        low: 4.01,
        mid: 6.86,
        high: 9.18,
    };

    /// Every buffer pH lies in 0..=14 and no two are equal
    pub fn is_valid(&self) -> bool {
        let phs = [self.low, self.mid, self.high];
        phs.iter().all(|ph| (0.0..=14.0).contains(ph))
            && self.low != self.mid
            && self.low != self.high
            && self.mid != self.high
    }

    /// pH of the buffer in `slot`
    pub const fn ph(&self, slot: BufferSlot) -> f64 {
        match slot {
            BufferSlot::Low => self.low,
            BufferSlot::Mid => self.mid,
            BufferSlot::High => self.high,
        }
    }

    /// Pair voltages read in the low and mid buffers with their pH
    pub fn two_point(&self, v_low: f64, v_mid: f64) -> (CalibrationPoint, CalibrationPoint) {
        (
            CalibrationPoint::new(v_low, self.low),
            CalibrationPoint::new(v_mid, self.mid),
        )
    }

    /// Pair voltages read in all three buffers with their pH
    pub fn three_point(&self, v_low: f64, v_mid: f64, v_high: f64) -> [CalibrationPoint; 3] {
        [
            CalibrationPoint::new(v_low, self.low),
            CalibrationPoint::new(v_mid, self.mid),
            CalibrationPoint::new(v_high, self.high),
        ]
    }
}

impl Default for BufferSet {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Complete sensor configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    /// Probe wiring
    pub probe: ProbeConfig,
    /// ADC scaling
    pub adc: AdcConfig,
    /// Health band
    pub health: HealthThresholds,
    /// Calibration buffers
    pub buffers: BufferSet,
    /// Calibration used at boot and on reset
    pub calibration: CalibrationState,
}
