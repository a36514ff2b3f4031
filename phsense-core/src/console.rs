//! Serial console commands
//!
//! Line-oriented commands let an operator calibrate the probe from a
//! terminal while the main loop keeps sampling:
//!
//! ```text
//! read                       full reading report
//! status                     sensor health
//! level                      acid / neutral / base
//! cal                        show slope and intercept
//! set <slope> <intercept>    direct override
//! offset <measured> <actual> shift intercept
//! capture <low|mid|high>     sample the probe sitting in a buffer
//! two [<v_low> <v_mid>]      two-point calibration
//! three [<v_low> <v_mid> <v_high>]
//! reset                      restore default calibration
//! help
//! ```
//!
//! Buffer pH values come from the configured [`BufferSet`], so the
//! operator only types the voltages read in each buffer. Without
//! arguments `two` and `three` use the voltages from earlier `capture`
//! commands.

use core::fmt::{self, Write};

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::calibration::{CalibrationEngine, CalibrationError, CalibrationState};
use crate::config::{BufferSet, BufferSlot};
use crate::measurement::Decimal;

/// Maximum console line length
pub const MAX_LINE_LEN: usize = 64;

/// Capacity of a one-line console reply
pub const REPLY_CAPACITY: usize = 96;

/// One-line console reply
pub type Reply = heapless::String<REPLY_CAPACITY>;

/// Sent in place of a reply that does not fit in [`REPLY_CAPACITY`]
pub const MSG_REPLY_TRUNCATED: &str = "error: reply truncated";

/// Console usage text
pub const HELP: &str = "commands: read | status | level | cal | set <slope> <intercept> | \
offset <measured> <actual> | capture <low|mid|high> | two [<v_low> <v_mid>] | \
three [<v_low> <v_mid> <v_high>] | reset | help";

/// Command parse errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Blank line
    Empty,
    /// First word is not a known command
    UnknownCommand,
    /// Fewer arguments than the command takes
    MissingArgument,
    /// Argument is not a finite number
    InvalidNumber,
    /// Argument is not one of `low`, `mid`, `high`
    InvalidBuffer,
    /// More arguments than the command takes
    TooManyArguments,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => f.write_str("empty command"),
            CommandError::UnknownCommand => f.write_str("unknown command (try 'help')"),
            CommandError::MissingArgument => f.write_str("missing argument"),
            CommandError::InvalidNumber => f.write_str("invalid number"),
            CommandError::InvalidBuffer => f.write_str("buffer must be low, mid or high"),
            CommandError::TooManyArguments => f.write_str("too many arguments"),
        }
    }
}

/// Parsed console command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Read,
    Status,
    Level,
    ShowCalibration,
    Set { slope: f64, intercept: f64 },
    Offset { measured_ph: f64, actual_ph: f64 },
    Capture(BufferSlot),
    TwoPoint { v_low: f64, v_mid: f64 },
    ThreePoint { v_low: f64, v_mid: f64, v_high: f64 },
    /// Two-point calibration from captured low and mid voltages
    TwoPointCaptured,
    /// Three-point calibration from all captured voltages
    ThreePointCaptured,
    Reset,
    Help,
}

impl Command {
    /// Parse one console line
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace().peekable();
        let name = words.next().ok_or(CommandError::Empty)?;

        let command = match name {
            "read" => Command::Read,
            "status" => Command::Status,
            "level" => Command::Level,
            "cal" => Command::ShowCalibration,
            "reset" => Command::Reset,
            "help" | "?" => Command::Help,
            "set" => Command::Set {
                slope: next_number(&mut words)?,
                intercept: next_number(&mut words)?,
            },
            "offset" => Command::Offset {
                measured_ph: next_number(&mut words)?,
                actual_ph: next_number(&mut words)?,
            },
            "capture" => Command::Capture(next_slot(&mut words)?),
            "two" if words.peek().is_none() => Command::TwoPointCaptured,
            "two" => Command::TwoPoint {
                v_low: next_number(&mut words)?,
                v_mid: next_number(&mut words)?,
            },
            "three" if words.peek().is_none() => Command::ThreePointCaptured,
            "three" => Command::ThreePoint {
                v_low: next_number(&mut words)?,
                v_mid: next_number(&mut words)?,
                v_high: next_number(&mut words)?,
            },
            _ => return Err(CommandError::UnknownCommand),
        };

        if words.next().is_some() {
            return Err(CommandError::TooManyArguments);
        }

        Ok(command)
    }

    /// True for commands that write the calibration store from their
    /// arguments alone
    ///
    /// The captured variants also calibrate, but need the voltages held
    /// by the sensor, so they are not included.
    pub const fn is_calibration(&self) -> bool {
        matches!(
            self,
            Command::Set { .. }
                | Command::Offset { .. }
                | Command::TwoPoint { .. }
                | Command::ThreePoint { .. }
                | Command::Reset
        )
    }

    /// Run a calibration command against `engine`
    ///
    /// Returns the new calibration, or `None` if this command does not
    /// calibrate from its arguments.
    pub fn apply_calibration<M: RawMutex>(
        &self,
        engine: &CalibrationEngine<'_, M>,
        buffers: &BufferSet,
    ) -> Result<Option<CalibrationState>, CalibrationError> {
        let state = match *self {
            Command::Set { slope, intercept } => engine.set_calibration(slope, intercept)?,
            Command::Offset {
                measured_ph,
                actual_ph,
            } => engine.calibrate_offset(measured_ph, actual_ph)?,
            Command::TwoPoint { v_low, v_mid } => {
                let (low, mid) = buffers.two_point(v_low, v_mid);
                engine.calibrate_two_point(low, mid)?
            }
            Command::ThreePoint {
                v_low,
                v_mid,
                v_high,
            } => engine.calibrate_three_point(buffers.three_point(v_low, v_mid, v_high))?,
            Command::Reset => engine.reset_calibration(),
            _ => return Ok(None),
        };
        Ok(Some(state))
    }
}

/// Render a one-line reply
///
/// A reply that does not fit is replaced by [`MSG_REPLY_TRUNCATED`]
/// instead of being sent half-written.
pub fn format_reply(args: fmt::Arguments<'_>) -> Reply {
    let mut reply = Reply::new();
    if reply.write_fmt(args).is_err() {
        reply.clear();
        let _ = reply.push_str(MSG_REPLY_TRUNCATED);
    }
    reply
}

/// Reply to a successful calibration
pub fn calibration_updated(state: &CalibrationState) -> Reply {
    format_reply(format_args!(
        "calibration updated: slope={} intercept={}",
        Decimal::new(state.slope(), 4),
        Decimal::new(state.intercept(), 4)
    ))
}

/// Reply to `cal`
pub fn calibration_summary(slope: f64, intercept: f64) -> Reply {
    format_reply(format_args!(
        "slope={} intercept={}",
        Decimal::new(slope, 4),
        Decimal::new(intercept, 4)
    ))
}

/// Reply to a failed command
pub fn error_reply(error: &dyn fmt::Display) -> Reply {
    format_reply(format_args!("error: {}", error))
}

fn next_number<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<f64, CommandError> {
    let word = words.next().ok_or(CommandError::MissingArgument)?;
    match word.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(CommandError::InvalidNumber),
    }
}

fn next_slot<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<BufferSlot, CommandError> {
    match words.next().ok_or(CommandError::MissingArgument)? {
        "low" => Ok(BufferSlot::Low),
        "mid" => Ok(BufferSlot::Mid),
        "high" => Ok(BufferSlot::High),
        _ => Err(CommandError::InvalidBuffer),
    }
}
