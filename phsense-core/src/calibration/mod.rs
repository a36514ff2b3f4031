//! Calibration
//!
//! Holds the linear pH equation and the procedures that derive it from
//! reference buffer measurements.

pub mod engine;
pub mod snapshot;
pub mod state;
pub mod store;

pub use engine::{fit_least_squares, fit_two_point, CalibrationEngine};
pub use snapshot::{CalibrationSnapshot, SnapshotError};
pub use state::{
    CalibrationError, CalibrationPoint, CalibrationState, DEFAULT_INTERCEPT, DEFAULT_SLOPE,
};
pub use store::CalibrationStore;
