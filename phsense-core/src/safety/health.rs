//! Sensor health monitor implementation
//!
//! A healthy probe sits strictly between the rail's noise floor and full
//! positive rail. Outside that band the probe is disconnected, shorted, or
//! the ADC is saturated.

use core::fmt;

use crate::config::HealthThresholds;

/// Message for a healthy probe
pub const MSG_NOMINAL: &str = "sensor reading nominal";

/// Message for a probe outside the operating band
pub const MSG_OUT_OF_RANGE: &str = "sensor reading out of expected range — check wiring";

/// Why a reading was classified unhealthy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HealthFault {
    /// At or below the low threshold (open probe or short to ground)
    BelowRange,
    /// At or above the high threshold (ADC saturated)
    AboveRange,
    /// Voltage is NaN or infinite
    NotANumber,
}

/// Health of a single voltage reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorHealth {
    /// Reading inside the operating band
    Nominal,
    /// Reading outside the operating band
    Fault(HealthFault),
}

impl SensorHealth {
    /// True when nominal
    pub const fn is_ok(self) -> bool {
        matches!(self, SensorHealth::Nominal)
    }

    /// Diagnostic code, if unhealthy
    pub const fn fault(self) -> Option<HealthFault> {
        match self {
            SensorHealth::Nominal => None,
            SensorHealth::Fault(fault) => Some(fault),
        }
    }
}

/// Health check result with its diagnostic message
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    /// Classification of the reading
    pub health: SensorHealth,
    /// Voltage that was checked
    pub voltage: f64,
}

impl StatusReport {
    /// Human-readable status line
    pub const fn message(&self) -> &'static str {
        if self.health.is_ok() {
            MSG_NOMINAL
        } else {
            MSG_OUT_OF_RANGE
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Classifies probe voltages against configured rail thresholds
#[derive(Debug, Clone, Copy)]
pub struct SensorHealthMonitor {
    thresholds: HealthThresholds,
}

impl Default for SensorHealthMonitor {
    fn default() -> Self {
        Self::new(HealthThresholds::default())
    }
}

impl SensorHealthMonitor {
    /// Create a monitor for the given band
    pub const fn new(thresholds: HealthThresholds) -> Self {
        Self { thresholds }
    }

    /// Configured band
    pub const fn thresholds(&self) -> HealthThresholds {
        self.thresholds
    }

    /// Classify a voltage
    pub fn check(&self, voltage: f64) -> SensorHealth {
        if !voltage.is_finite() {
            return SensorHealth::Fault(HealthFault::NotANumber);
        }
        if voltage <= self.thresholds.low_v {
            return SensorHealth::Fault(HealthFault::BelowRange);
        }
        if voltage >= self.thresholds.high_v {
            return SensorHealth::Fault(HealthFault::AboveRange);
        }
        SensorHealth::Nominal
    }

    /// True when `low < voltage < high`
    pub fn is_sensor_ok(&self, voltage: f64) -> bool {
        self.check(voltage).is_ok()
    }

    /// Check and attach the diagnostic message
    pub fn check_sensor_status(&self, voltage: f64) -> StatusReport {
        let health = self.check(voltage);
        if let SensorHealth::Fault(fault) = health {
            warn!("probe voltage {} out of range: {}", voltage, fault);
        }
        StatusReport { health, voltage }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> SensorHealthMonitor {
        SensorHealthMonitor::new(HealthThresholds {
            low_v: 0.1,
            high_v: 3.2,
        })
    }

    #[test]
    fn test_inside_band_is_ok() {
        let m = monitor();
        assert!(m.is_sensor_ok(0.1001));
        assert!(m.is_sensor_ok(2.0));
        assert!(m.is_sensor_ok(3.1999));
    }

    #[test]
    fn test_boundaries_are_faults() {
        let m = monitor();
        assert!(!m.is_sensor_ok(0.1));
        assert!(!m.is_sensor_ok(3.2));
        assert_eq!(m.check(0.1), SensorHealth::Fault(HealthFault::BelowRange));
        assert_eq!(m.check(3.2), SensorHealth::Fault(HealthFault::AboveRange));
    }

    #[test]
    fn test_beyond_rails() {
        let m = monitor();
        assert_eq!(m.check(0.0).fault(), Some(HealthFault::BelowRange));
        assert_eq!(m.check(-1.0).fault(), Some(HealthFault::BelowRange));
        assert_eq!(m.check(3.3).fault(), Some(HealthFault::AboveRange));
    }

    #[test]
    fn test_nan_is_fault() {
        let m = monitor();
        assert_eq!(
            m.check(f64::NAN),
            SensorHealth::Fault(HealthFault::NotANumber)
        );
        assert!(!m.is_sensor_ok(f64::INFINITY));
    }

    #[test]
    fn test_status_messages() {
        let m = monitor();
        assert_eq!(m.check_sensor_status(1.5).message(), "sensor reading nominal");
        assert_eq!(
            m.check_sensor_status(3.3).message(),
            "sensor reading out of expected range — check wiring"
        );
    }
}
