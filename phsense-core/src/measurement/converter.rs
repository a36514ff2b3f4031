//! Voltage to pH conversion

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::calibration::CalibrationStore;

/// Applies the stored calibration to probe voltages
///
/// The store is read on every call, so a calibration written between two
/// conversions takes effect immediately.
pub struct PhConverter<'a, M: RawMutex> {
    store: &'a CalibrationStore<M>,
}

impl<'a, M: RawMutex> PhConverter<'a, M> {
    /// Create a converter reading from `store`
    pub const fn new(store: &'a CalibrationStore<M>) -> Self {
        Self { store }
    }

    /// `slope * voltage + intercept`
    ///
    /// Output is not clamped: a bad calibration can produce values
    /// outside [0, 14].
    pub fn ph_from_voltage(&self, voltage: f64) -> f64 {
        self.store.get().ph_at(voltage)
    }
}
