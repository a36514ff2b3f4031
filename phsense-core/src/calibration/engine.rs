//! Calibration procedures
//!
//! Three strategies, trading precision for operator effort:
//!
//! - **Offset**: one reference reading, shifts the intercept only. Corrects
//!   a constant bias, not gain drift.
//! - **Two-point**: exact line through two buffers. Corrects bias and gain.
//! - **Three-point**: least-squares line through three buffers, averaging
//!   out buffer-reading noise.
//!
//! Reference pH values are always inputs, so both the 4.0/7.0/9.0 and the
//! 4.01/6.86/9.18 buffer conventions go through the same code.

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::state::{CalibrationError, CalibrationPoint, CalibrationState};
use super::store::CalibrationStore;

/// Exact line through two reference points
///
/// `slope = (ph_high - ph_low) / (v_high - v_low)`,
/// `intercept = ph_low - slope * v_low`.
pub fn fit_two_point(
    low: CalibrationPoint,
    high: CalibrationPoint,
) -> Result<CalibrationState, CalibrationError> {
    if high.voltage == low.voltage {
        return Err(CalibrationError::DegenerateCalibration);
    }

    let slope = (high.reference_ph - low.reference_ph) / (high.voltage - low.voltage);
    let intercept = low.reference_ph - slope * low.voltage;

    CalibrationState::new(slope, intercept)
}

/// Ordinary least-squares line through `points`
///
/// Minimizes squared pH residuals:
/// `slope = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)`, `intercept = (Σy − slope·Σx) / n`
/// with `x` the voltages and `y` the reference pH values.
///
/// Fails with `DegenerateCalibration` for fewer than two points or when all
/// voltages are equal.
pub fn fit_least_squares(points: &[CalibrationPoint]) -> Result<CalibrationState, CalibrationError> {
    let first = match points {
        [first, _, ..] => first.voltage,
        _ => return Err(CalibrationError::DegenerateCalibration),
    };

    // Rounding can leave a tiny non-zero denominator for equal voltages
    if points.iter().all(|p| p.voltage == first) {
        return Err(CalibrationError::DegenerateCalibration);
    }

    let n = points.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xx, mut sum_xy) = (0.0, 0.0, 0.0, 0.0);
    for p in points {
        sum_x += p.voltage;
        sum_y += p.reference_ph;
        sum_xx += p.voltage * p.voltage;
        sum_xy += p.voltage * p.reference_ph;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return Err(CalibrationError::DegenerateCalibration);
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    CalibrationState::new(slope, intercept)
}

/// Writes new calibrations into a [`CalibrationStore`]
///
/// Every entry point validates before writing; on error the store keeps
/// the previous calibration.
pub struct CalibrationEngine<'a, M: RawMutex> {
    store: &'a CalibrationStore<M>,
}

impl<M: RawMutex> Clone for CalibrationEngine<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex> Copy for CalibrationEngine<'_, M> {}

impl<'a, M: RawMutex> CalibrationEngine<'a, M> {
    /// Create an engine writing to `store`
    pub const fn new(store: &'a CalibrationStore<M>) -> Self {
        Self { store }
    }

    /// Store this engine writes to
    pub fn store(&self) -> &'a CalibrationStore<M> {
        self.store
    }

    /// Override both coefficients directly
    pub fn set_calibration(
        &self,
        slope: f64,
        intercept: f64,
    ) -> Result<CalibrationState, CalibrationError> {
        let next = CalibrationState::new(slope, intercept).inspect_err(|_| {
            warn!("rejected calibration: slope={}, intercept={}", slope, intercept);
        })?;
        self.store.replace(next);
        info!("calibration set: slope={}, intercept={}", slope, intercept);
        Ok(next)
    }

    /// Shift the intercept so a reading of `measured_ph` becomes `actual_ph`
    ///
    /// `actual_ph` comes from an independent reference instrument. The slope
    /// is left unchanged.
    pub fn calibrate_offset(
        &self,
        measured_ph: f64,
        actual_ph: f64,
    ) -> Result<CalibrationState, CalibrationError> {
        let delta = actual_ph - measured_ph;
        let next = self.store.update(|current| current.shifted(delta))?;
        info!(
            "offset calibration: delta={}, intercept={}",
            delta,
            next.intercept()
        );
        Ok(next)
    }

    /// Two-point calibration through the `low` and `high` buffers
    pub fn calibrate_two_point(
        &self,
        low: CalibrationPoint,
        high: CalibrationPoint,
    ) -> Result<CalibrationState, CalibrationError> {
        let next = fit_two_point(low, high).inspect_err(|e| {
            warn!("two-point calibration failed: {}", e);
        })?;
        self.store.replace(next);
        info!(
            "two-point calibration: slope={}, intercept={}",
            next.slope(),
            next.intercept()
        );
        Ok(next)
    }

    /// Three-point least-squares calibration
    ///
    /// The three voltages must be pairwise distinct: a repeated voltage
    /// means the probe was read twice in the same buffer.
    pub fn calibrate_three_point(
        &self,
        points: [CalibrationPoint; 3],
    ) -> Result<CalibrationState, CalibrationError> {
        let [a, b, c] = points;
        if a.voltage == b.voltage || b.voltage == c.voltage || a.voltage == c.voltage {
            warn!("three-point calibration failed: repeated voltage");
            return Err(CalibrationError::DegenerateCalibration);
        }

        let next = fit_least_squares(&points).inspect_err(|e| {
            warn!("three-point calibration failed: {}", e);
        })?;
        self.store.replace(next);
        info!(
            "three-point calibration: slope={}, intercept={}",
            next.slope(),
            next.intercept()
        );
        Ok(next)
    }

    /// Restore the store's initial calibration
    pub fn reset_calibration(&self) -> CalibrationState {
        let state = self.store.reset();
        info!("calibration reset to default");
        state
    }
}
