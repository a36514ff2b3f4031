//! Reading snapshots and the text report

use core::fmt::{self, Write};

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::level::{classify, PhLevel};
use crate::calibration::CalibrationStore;

/// Capacity of a rendered report
pub const REPORT_CAPACITY: usize = 384;

/// Rendered report text
pub type ReportText = heapless::String<REPORT_CAPACITY>;

const RULE: &str = "==================================================";

/// Magnitude from which [`Decimal`] switches to exponent notation
const EXPONENT_THRESHOLD: f64 = 1e9;

/// Number shown with a fixed count of decimals
///
/// Values at or past [`EXPONENT_THRESHOLD`] in magnitude use exponent
/// notation with the same precision, so the width stays bounded for any
/// finite value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decimal {
    value: f64,
    precision: usize,
}

impl Decimal {
    pub const fn new(value: f64, precision: usize) -> Self {
        Self { value, precision }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.abs() >= EXPONENT_THRESHOLD && self.value.is_finite() {
            write!(f, "{:.*e}", self.precision, self.value)
        } else {
            write!(f, "{:.*}", self.precision, self.value)
        }
    }
}

/// Point-in-time measurement
///
/// `ph` was computed from `voltage` with exactly the `slope` and
/// `intercept` reported alongside it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Probe voltage (V)
    pub voltage: f64,
    /// pH computed from `voltage`
    pub ph: f64,
    /// Slope in effect for this reading
    pub slope: f64,
    /// Intercept in effect for this reading
    pub intercept: f64,
}

impl Reading {
    /// Qualitative category of this reading
    pub fn level(&self) -> PhLevel {
        classify(self.ph)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(f, "pH Sensor Readings")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Voltage:          {} V", Decimal::new(self.voltage, 3))?;
        writeln!(f, "pH:               {}", Decimal::new(self.ph, 2))?;
        writeln!(f, "Slope (m):        {}", Decimal::new(self.slope, 4))?;
        writeln!(f, "Intercept (c):    {}", Decimal::new(self.intercept, 4))?;
        write!(f, "{}", RULE)
    }
}

/// Builds [`Reading`]s from one consistent calibration snapshot
pub struct ReadingAggregator<'a, M: RawMutex> {
    store: &'a CalibrationStore<M>,
}

impl<'a, M: RawMutex> ReadingAggregator<'a, M> {
    /// Create an aggregator reading from `store`
    pub const fn new(store: &'a CalibrationStore<M>) -> Self {
        Self { store }
    }

    /// Compose a reading for `voltage`
    ///
    /// The store is read once; pH and the reported coefficients come from
    /// that same snapshot even if a calibration lands concurrently.
    pub fn read_all(&self, voltage: f64) -> Reading {
        let cal = self.store.get();
        Reading {
            voltage,
            ph: cal.ph_at(voltage),
            slope: cal.slope(),
            intercept: cal.intercept(),
        }
    }
}

/// Render the multi-line report for `reading`
///
/// Pure formatting; showing the text is up to the caller.
pub fn format_readings(reading: &Reading) -> ReportText {
    let mut text = ReportText::new();
    if write!(text, "{}", reading).is_err() {
        debug!("reading report truncated at {} bytes", text.len());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationEngine;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_read_all_matches_calibration() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        CalibrationEngine::new(&store)
            .set_calibration(-6.0, 19.0)
            .unwrap();

        let reading = ReadingAggregator::new(&store).read_all(2.5);
        assert_eq!(
            reading,
            Reading {
                voltage: 2.5,
                ph: 4.0,
                slope: -6.0,
                intercept: 19.0,
            }
        );
        assert_eq!(reading.level(), PhLevel::Acid);
    }

    #[test]
    fn test_reading_is_a_snapshot() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let engine = CalibrationEngine::new(&store);
        engine.set_calibration(-6.0, 19.0).unwrap();

        let reading = ReadingAggregator::new(&store).read_all(2.0);
        engine.set_calibration(-5.0, 20.0).unwrap();

        // Still internally consistent with the calibration at call time
        assert_eq!(reading.ph, reading.slope * reading.voltage + reading.intercept);
        assert_eq!(reading.ph, 7.0);
    }

    #[test]
    fn test_format_readings() {
        let reading = Reading {
            voltage: 2.0,
            ph: 7.0,
            slope: -6.0,
            intercept: 19.0,
        };
        let text = format_readings(&reading);

        assert!(text.starts_with(RULE));
        assert!(text.contains("pH Sensor Readings"));
        assert!(text.contains("Voltage:          2.000 V"));
        assert!(text.contains("pH:               7.00"));
        assert!(text.contains("Slope (m):        -6.0000"));
        assert!(text.contains("Intercept (c):    19.0000"));
        assert!(text.ends_with(RULE));
        assert_eq!(text.lines().count(), 8);
    }

    #[test]
    fn test_format_rounds_like_display() {
        let reading = Reading {
            voltage: 1.23456,
            ph: 4.6789,
            slope: -6.123456,
            intercept: 25.85,
        };
        let text = format_readings(&reading);
        assert!(text.contains("1.235 V"));
        assert!(text.contains("4.68"));
        assert!(text.contains("-6.1235"));
        assert!(text.contains("25.8500"));
    }

    #[test]
    fn test_decimal_switches_to_exponent() {
        let mut text: heapless::String<32> = heapless::String::new();
        write!(text, "{}", Decimal::new(-6.8, 4)).unwrap();
        assert_eq!(text.as_str(), "-6.8000");

        text.clear();
        write!(text, "{}", Decimal::new(1e80, 4)).unwrap();
        assert_eq!(text.as_str(), "1.0000e80");

        text.clear();
        write!(text, "{}", Decimal::new(-2.5e12, 2)).unwrap();
        assert_eq!(text.as_str(), "-2.50e12");
    }

    #[test]
    fn test_huge_coefficients_keep_full_report() {
        let reading = Reading {
            voltage: 2.0,
            ph: 2e80,
            slope: 1e80,
            intercept: -1e300,
        };
        let text = format_readings(&reading);

        assert_eq!(text.lines().count(), 8);
        assert!(text.contains("pH:               2.00e80"));
        assert!(text.contains("Slope (m):        1.0000e80"));
        assert!(text.contains("Intercept (c):    -1.0000e300"));
        assert!(text.ends_with(RULE));
    }
}
