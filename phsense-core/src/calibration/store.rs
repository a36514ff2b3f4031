//! Calibration store
//!
//! Single source of truth for the active `(slope, intercept)` pair.
//!
//! The pair lives in a `Cell` behind an embassy-sync blocking mutex, so a
//! reader always copies out a complete pair and a writer always replaces
//! both coefficients in one step. The lock is held only for the copy.
//!
//! With `CriticalSectionRawMutex` the store can be a `static` shared
//! between the sampling task and a console task.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::state::{CalibrationError, CalibrationState};

/// Shared, atomically-replaced calibration
pub struct CalibrationStore<M: RawMutex> {
    state: Mutex<M, Cell<CalibrationState>>,
    default: CalibrationState,
}

impl<M: RawMutex> CalibrationStore<M> {
    /// Create a store starting from `initial`, which is also the reset value
    pub const fn new(initial: CalibrationState) -> Self {
        Self {
            state: Mutex::new(Cell::new(initial)),
            default: initial,
        }
    }

    /// Create a store holding the datasheet default
    pub const fn with_datasheet_default() -> Self {
        Self::new(CalibrationState::DATASHEET_DEFAULT)
    }

    /// Snapshot of the active calibration
    pub fn get(&self) -> CalibrationState {
        self.state.lock(|cell| cell.get())
    }

    /// Active `(slope, intercept)` pair
    pub fn coefficients(&self) -> (f64, f64) {
        self.get().coefficients()
    }

    /// Replace both coefficients
    ///
    /// Fails with `InvalidCalibration` if `slope == 0` (or either value is
    /// not finite); the previous calibration then stays active.
    pub fn set(&self, slope: f64, intercept: f64) -> Result<(), CalibrationError> {
        let next = CalibrationState::new(slope, intercept)?;
        self.replace(next);
        Ok(())
    }

    pub(crate) fn replace(&self, next: CalibrationState) {
        self.state.lock(|cell| cell.set(next));
    }

    /// Read-modify-write under a single lock acquisition
    ///
    /// Nothing is written if `f` fails.
    pub(crate) fn update<F>(&self, f: F) -> Result<CalibrationState, CalibrationError>
    where
        F: FnOnce(CalibrationState) -> Result<CalibrationState, CalibrationError>,
    {
        self.state.lock(|cell| {
            let next = f(cell.get())?;
            cell.set(next);
            Ok(next)
        })
    }

    pub(crate) fn reset(&self) -> CalibrationState {
        self.replace(self.default);
        self.default
    }
}

impl<M: RawMutex> Default for CalibrationStore<M> {
    fn default() -> Self {
        Self::with_datasheet_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};

    #[test]
    fn test_starts_with_default() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        assert_eq!(store.get(), CalibrationState::DATASHEET_DEFAULT);
    }

    #[test]
    fn test_set_replaces_both_fields() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        store.set(-5.70, 21.34).unwrap();
        assert_eq!(store.coefficients(), (-5.70, 21.34));
    }

    #[test]
    fn test_set_zero_slope_keeps_previous() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        store.set(-6.0, 19.0).unwrap();

        assert_eq!(
            store.set(0.0, 3.0),
            Err(CalibrationError::InvalidCalibration)
        );
        assert_eq!(store.coefficients(), (-6.0, 19.0));
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let before = store.get();
        let result = store.update(|_| Err(CalibrationError::DegenerateCalibration));
        assert_eq!(result, Err(CalibrationError::DegenerateCalibration));
        assert_eq!(store.get(), before);
    }

    #[test]
    fn test_reset_restores_initial() {
        let initial = CalibrationState::new(-5.5, 22.0).unwrap();
        let store = CalibrationStore::<NoopRawMutex>::new(initial);
        store.set(-6.0, 19.0).unwrap();
        assert_eq!(store.reset(), initial);
        assert_eq!(store.get(), initial);
    }

    static SHARED: CalibrationStore<CriticalSectionRawMutex> =
        CalibrationStore::with_datasheet_default();

    #[test]
    fn test_concurrent_readers_never_see_torn_pairs() {
        use std::thread;

        // Writers alternate between two valid pairs; any mix of the two
        // would show up as a pair that is neither.
        let a = (-6.0, 19.0);
        let b = (-5.0, 17.5);
        SHARED.set(a.0, a.1).unwrap();

        let writer = thread::spawn(move || {
            for i in 0..2000 {
                let (s, c) = if i % 2 == 0 { b } else { a };
                SHARED.set(s, c).unwrap();
            }
        });

        for _ in 0..2000 {
            let pair = SHARED.coefficients();
            assert!(pair == a || pair == b, "torn read: {:?}", pair);
        }

        writer.join().unwrap();
    }
}
