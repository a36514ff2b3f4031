//! Simple TOML parser for probe configuration
//!
//! Minimal parser for the subset of TOML the probe configuration uses. It
//! does NOT support the full TOML spec.
//!
//! Supported features:
//! - `[probe]`, `[adc]`, `[health]`, `[buffers]`, `[calibration]` headers
//! - Key = value pairs (numbers, quoted strings)
//! - Comments (# ...)
//!
//! Example:
//! ```toml
//! [probe]
//! pin = 26
//! report_interval_ms = 1000
//!
//! [adc]
//! vref = 3.3
//! adc_max = 4095
//! sample_count = 10
//! sample_interval_ms = 10
//!
//! [health]
//! low_v = 0.05
//! high_v = 3.25
//!
//! [buffers]
//! preset = "nist"   # or "standard"; individual keys override
//!
//! [calibration]
//! slope = -6.80
//! intercept = 25.85
//! ```

use core::fmt;

use super::types::{BufferSet, SensorConfig};
use crate::calibration::CalibrationState;
use crate::traits::PinId;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Unknown key, or a line that is not `key = value`
    InvalidKey,
    /// Value has the wrong type or is out of range
    InvalidValue,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidSection => f.write_str("invalid section header"),
            ParseError::InvalidKey => f.write_str("invalid key"),
            ParseError::InvalidValue => f.write_str("invalid value"),
        }
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Probe,
    Adc,
    Health,
    Buffers,
    Calibration,
}

/// Parse TOML configuration into SensorConfig
///
/// Keys that are absent keep their [`Default`] value.
pub fn parse_config(input: &str) -> Result<SensorConfig, ParseError> {
    let mut config = SensorConfig::default();
    let mut section = Section::Root;

    // Validated together once every key has been seen
    let (mut slope, mut intercept) = config.calibration.coefficients();

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = strip_comment(line);
            if !header.ends_with(']') {
                return Err(ParseError::InvalidSection);
            }
            section = parse_section_header(&header[1..header.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidKey)?;

        match section {
            Section::Root => return Err(ParseError::InvalidKey),
            Section::Probe => match key {
                "pin" => config.probe.pin = PinId(parse_num(value)?),
                "report_interval_ms" => config.probe.report_interval_ms = parse_num(value)?,
                _ => return Err(ParseError::InvalidKey),
            },
            Section::Adc => match key {
                "vref" => config.adc.vref_v = parse_positive(value)?,
                "adc_max" => {
                    config.adc.adc_max = parse_num(value)?;
                    if config.adc.adc_max == 0 {
                        return Err(ParseError::InvalidValue);
                    }
                }
                "sample_count" => {
                    config.adc.sample_count = parse_num(value)?;
                    if config.adc.sample_count == 0 {
                        return Err(ParseError::InvalidValue);
                    }
                }
                "sample_interval_ms" => config.adc.sample_interval_ms = parse_num(value)?,
                _ => return Err(ParseError::InvalidKey),
            },
            Section::Health => match key {
                "low_v" => config.health.low_v = parse_float(value)?,
                "high_v" => config.health.high_v = parse_float(value)?,
                _ => return Err(ParseError::InvalidKey),
            },
            Section::Buffers => match key {
                "preset" => config.buffers = parse_preset(value)?,
                "low" => config.buffers.low = parse_float(value)?,
                "mid" => config.buffers.mid = parse_float(value)?,
                "high" => config.buffers.high = parse_float(value)?,
                _ => return Err(ParseError::InvalidKey),
            },
            Section::Calibration => match key {
                "slope" => slope = parse_float(value)?,
                "intercept" => intercept = parse_float(value)?,
                _ => return Err(ParseError::InvalidKey),
            },
        }
    }

    if config.health.low_v >= config.health.high_v || !config.buffers.is_valid() {
        return Err(ParseError::InvalidValue);
    }

    config.calibration =
        CalibrationState::new(slope, intercept).map_err(|_| ParseError::InvalidValue)?;

    Ok(config)
}

/// Parse section header like "adc" or "calibration"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "probe" => Ok(Section::Probe),
        "adc" => Ok(Section::Adc),
        "health" => Ok(Section::Health),
        "buffers" => Ok(Section::Buffers),
        "calibration" => Ok(Section::Calibration),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Drop a trailing comment that is not inside a string
fn strip_comment(text: &str) -> &str {
    match text.find('#') {
        Some(hash_pos) if text[..hash_pos].matches('"').count() % 2 == 0 => {
            text[..hash_pos].trim()
        }
        _ => text,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = strip_comment(line[eq_pos + 1..].trim());

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a quoted string value
fn parse_string(value: &str) -> Result<&str, ParseError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else {
        Err(ParseError::InvalidValue)
    }
}

/// Parse an integer value
fn parse_num<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a finite float value
fn parse_float(value: &str) -> Result<f64, ParseError> {
    let v: f64 = parse_num(value)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ParseError::InvalidValue)
    }
}

fn parse_positive(value: &str) -> Result<f64, ParseError> {
    let v = parse_float(value)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(ParseError::InvalidValue)
    }
}

/// Parse buffer preset name
fn parse_preset(value: &str) -> Result<BufferSet, ParseError> {
    match parse_string(value)? {
        "standard" => Ok(BufferSet::STANDARD),
        "nist" => Ok(BufferSet::NIST),
        _ => Err(ParseError::InvalidValue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdcConfig, HealthThresholds};
    use std::format;

    const FULL: &str = r#"
# Probe on the second ADC input
[probe]
pin = 27
report_interval_ms = 500

[adc]
vref = 5.0
adc_max = 1023   # Arduino-style 10-bit
sample_count = 4
sample_interval_ms = 20

[health]
low_v = 0.1
high_v = 4.9

[buffers]
preset = "nist"

[calibration]
slope = -5.70
intercept = 21.34
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL).unwrap();

        assert_eq!(config.probe.pin, PinId(27));
        assert_eq!(config.probe.report_interval_ms, 500);
        assert_eq!(
            config.adc,
            AdcConfig {
                vref_v: 5.0,
                adc_max: 1023,
                sample_count: 4,
                sample_interval_ms: 20,
            }
        );
        assert_eq!(
            config.health,
            HealthThresholds {
                low_v: 0.1,
                high_v: 4.9,
            }
        );
        assert_eq!(config.buffers, BufferSet::NIST);
        assert_eq!(config.calibration.coefficients(), (-5.70, 21.34));
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(parse_config("").unwrap(), SensorConfig::default());
        assert_eq!(
            parse_config("# nothing here\n\n").unwrap(),
            SensorConfig::default()
        );
    }

    #[test]
    fn test_preset_then_override() {
        let config = parse_config("[buffers]\npreset = \"standard\"\nhigh = 10.0\n").unwrap();
        assert_eq!(config.buffers.low, 4.0);
        assert_eq!(config.buffers.mid, 7.0);
        assert_eq!(config.buffers.high, 10.0);
    }

    #[test]
    fn test_unknown_section() {
        assert_eq!(
            parse_config("[heater]\nmax_temp = 55\n"),
            Err(ParseError::InvalidSection)
        );
        assert_eq!(parse_config("[adc\n"), Err(ParseError::InvalidSection));
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(
            parse_config("[adc]\nbits = 12\n"),
            Err(ParseError::InvalidKey)
        );
        assert_eq!(parse_config("pin = 26\n"), Err(ParseError::InvalidKey));
        assert_eq!(parse_config("[adc]\nvref\n"), Err(ParseError::InvalidKey));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            parse_config("[adc]\nvref = three\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[adc]\nsample_count = 0\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[probe]\npin = 300\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[buffers]\npreset = \"acidic\"\n"),
            Err(ParseError::InvalidValue)
        );
    }

    #[test]
    fn test_preset_must_be_quoted_lowercase() {
        for value in ["nist", "NIST", "\"NIST\"", "\"Standard\"", "standard"] {
            let input = format!("[buffers]\npreset = {}\n", value);
            assert_eq!(
                parse_config(&input),
                Err(ParseError::InvalidValue),
                "{}",
                value
            );
        }
    }

    #[test]
    fn test_duplicate_buffer_ph_rejected() {
        assert_eq!(
            parse_config("[buffers]\nlow = 7.0\nmid = 7.0\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[buffers]\npreset = \"nist\"\nhigh = 4.01\n"),
            Err(ParseError::InvalidValue)
        );
    }

    #[test]
    fn test_buffer_ph_out_of_range_rejected() {
        assert_eq!(
            parse_config("[buffers]\nhigh = 14.5\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[buffers]\nlow = -1.0\n"),
            Err(ParseError::InvalidValue)
        );
    }

    #[test]
    fn test_zero_slope_rejected() {
        assert_eq!(
            parse_config("[calibration]\nslope = 0.0\n"),
            Err(ParseError::InvalidValue)
        );
    }

    #[test]
    fn test_inverted_health_band_rejected() {
        assert_eq!(
            parse_config("[health]\nlow_v = 3.0\nhigh_v = 1.0\n"),
            Err(ParseError::InvalidValue)
        );
    }

    #[test]
    fn test_section_header_comment() {
        let config = parse_config("[probe] # analog input\npin = 28\n").unwrap();
        assert_eq!(config.probe.pin, PinId(28));
    }
}
