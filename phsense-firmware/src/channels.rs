//! Inter-task communication channels
//!
//! The console task forwards commands that need a probe reading to the
//! sampling task and waits for the rendered reply.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use phsense_core::console::Command;
use phsense_core::measurement::ReportText;

/// Pending console commands for the sampling task
const COMMAND_CHANNEL_SIZE: usize = 4;

/// Commands from the console that must run against the probe
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Rendered output for each forwarded command, in order
pub static RESPONSE_CHANNEL: Channel<CriticalSectionRawMutex, ReportText, 1> = Channel::new();
