//! Configuration
//!
//! Probe, ADC, health and buffer settings, parsed from a small TOML subset.

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ParseError};
pub use types::*;
