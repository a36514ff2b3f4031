//! Calibration snapshots
//!
//! The engine never persists calibration itself. Callers that want a
//! calibration to survive a restart take a snapshot of the store, write
//! the encoded bytes wherever they like (flash, EEPROM, host file), and
//! restore it through [`CalibrationEngine::set_calibration`] on boot.
//!
//! [`CalibrationEngine::set_calibration`]: super::CalibrationEngine::set_calibration

use core::fmt;

use serde::{Deserialize, Serialize};

use super::state::CalibrationState;

/// Magic number to identify a calibration snapshot
pub const SNAPSHOT_MAGIC: u32 = 0x5048_4341; // "PHCA"

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u8 = 1;

/// Upper bound of an encoded snapshot
pub const MAX_SNAPSHOT_SIZE: usize = 32;

/// Snapshot encoding / decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SnapshotError {
    /// Output buffer too small
    Serialize,
    /// Bytes are not a postcard-encoded snapshot
    Deserialize,
    /// Wrong magic or version, or coefficients that fail validation
    InvalidFormat,
    /// CRC check failed
    CrcMismatch,
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Serialize => f.write_str("snapshot buffer too small"),
            SnapshotError::Deserialize => f.write_str("malformed snapshot"),
            SnapshotError::InvalidFormat => f.write_str("unsupported snapshot format"),
            SnapshotError::CrcMismatch => f.write_str("snapshot CRC mismatch"),
        }
    }
}

/// Serializable copy of a calibration with a validation header
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationSnapshot {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Slope (pH per volt)
    pub slope: f64,
    /// Intercept (pH)
    pub intercept: f64,
    /// CRC32 over magic..intercept
    pub crc: u32,
}

impl CalibrationSnapshot {
    /// Capture a calibration
    pub fn capture(state: CalibrationState) -> Self {
        let mut snapshot = Self {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
            slope: state.slope(),
            intercept: state.intercept(),
            crc: 0,
        };
        snapshot.crc = snapshot.calculate_crc();
        snapshot
    }

    /// Check magic and version
    pub fn is_valid(&self) -> bool {
        self.magic == SNAPSHOT_MAGIC && self.version == SNAPSHOT_VERSION
    }

    /// CRC32 over every field except `crc`
    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFF_FFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, &self.slope.to_le_bytes());
        crc = crc32_update(crc, &self.intercept.to_le_bytes());
        !crc
    }

    /// Verify the stored CRC
    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }

    /// Validated calibration carried by this snapshot
    pub fn restore(&self) -> Result<CalibrationState, SnapshotError> {
        if !self.is_valid() {
            return Err(SnapshotError::InvalidFormat);
        }
        if !self.verify_crc() {
            return Err(SnapshotError::CrcMismatch);
        }
        CalibrationState::new(self.slope, self.intercept).map_err(|_| SnapshotError::InvalidFormat)
    }

    /// Encode into `buf` with postcard, returning the used prefix
    pub fn encode<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], SnapshotError> {
        postcard::to_slice(self, buf).map_err(|_| SnapshotError::Serialize)
    }

    /// Decode and validate a snapshot
    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = postcard::from_bytes(bytes).map_err(|_| SnapshotError::Deserialize)?;
        snapshot.restore()?;
        Ok(snapshot)
    }
}

/// Simple CRC32 update function (IEEE 802.3 polynomial)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
