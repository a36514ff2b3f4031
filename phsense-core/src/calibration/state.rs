//! Calibration data types
//!
//! The probe is modelled as a straight line: `pH = slope * voltage + intercept`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Nominal slope of the two-buffer datasheet solution (pH per volt)
pub const DEFAULT_SLOPE: f64 = -6.80;

/// Nominal intercept of the two-buffer datasheet solution (pH)
pub const DEFAULT_INTERCEPT: f64 = 25.85;

/// Errors raised when deriving or storing a calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Equation would make the probe unresponsive (zero slope) or is not finite
    InvalidCalibration,
    /// Inputs do not determine a unique line (e.g. identical voltages)
    DegenerateCalibration,
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::InvalidCalibration => {
                f.write_str("invalid calibration: slope must be non-zero and finite")
            }
            CalibrationError::DegenerateCalibration => {
                f.write_str("degenerate calibration: voltages must be distinct")
            }
        }
    }
}

/// Coefficients of the linear pH equation
///
/// Fields are private so every instance satisfies `slope != 0` and both
/// coefficients are finite. Serialized as a `(slope, intercept)` pair and
/// validated again on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(f64, f64)")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationState {
    slope: f64,
    intercept: f64,
}

impl CalibrationState {
    /// Datasheet default used until the probe is calibrated
    pub const DATASHEET_DEFAULT: Self = Self {
        slope: DEFAULT_SLOPE,
        intercept: DEFAULT_INTERCEPT,
    };

    /// Create a validated calibration
    pub fn new(slope: f64, intercept: f64) -> Result<Self, CalibrationError> {
        if slope == 0.0 || !slope.is_finite() || !intercept.is_finite() {
            return Err(CalibrationError::InvalidCalibration);
        }
        Ok(Self { slope, intercept })
    }

    /// Slope (pH per volt)
    pub const fn slope(&self) -> f64 {
        self.slope
    }

    /// Intercept (pH at 0 V)
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }

    /// `(slope, intercept)` pair
    pub const fn coefficients(&self) -> (f64, f64) {
        (self.slope, self.intercept)
    }

    /// Apply the equation to a voltage
    ///
    /// The result is not clamped to [0, 14].
    #[inline]
    pub fn ph_at(&self, voltage: f64) -> f64 {
        self.slope * voltage + self.intercept
    }

    /// Same slope, intercept shifted by `delta`
    pub fn shifted(&self, delta: f64) -> Result<Self, CalibrationError> {
        Self::new(self.slope, self.intercept + delta)
    }
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::DATASHEET_DEFAULT
    }
}

impl TryFrom<(f64, f64)> for CalibrationState {
    type Error = CalibrationError;

    fn try_from((slope, intercept): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(slope, intercept)
    }
}

impl From<CalibrationState> for (f64, f64) {
    fn from(state: CalibrationState) -> Self {
        state.coefficients()
    }
}

/// One reference measurement: probe voltage while sitting in a buffer of known pH
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationPoint {
    /// Measured probe voltage (V)
    pub voltage: f64,
    /// pH of the buffer solution
    pub reference_ph: f64,
}

impl CalibrationPoint {
    /// Create a calibration point
    pub const fn new(voltage: f64, reference_ph: f64) -> Self {
        Self {
            voltage,
            reference_ph,
        }
    }
}
