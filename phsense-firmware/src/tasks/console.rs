//! Serial console task
//!
//! Reads command lines from UART0. Calibration commands are applied here,
//! directly on the shared store, so they take effect on the sampler's next
//! reading. Commands that need the probe are forwarded to the sampler task.

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx, Error as UartError};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_io_async::{Read, Write};

use phsense_core::config::BufferSet;
use phsense_core::console::{
    calibration_summary, calibration_updated, error_reply, Command, HELP, MAX_LINE_LEN,
    MSG_REPLY_TRUNCATED,
};
use phsense_core::measurement::ReportText;
use phsense_core::CalibrationEngine;

use crate::channels::{COMMAND_CHANNEL, RESPONSE_CHANNEL};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

/// Console task - line editor and command dispatch
#[embassy_executor::task]
pub async fn console_task(
    mut rx: BufferedUartRx,
    mut tx: BufferedUartTx,
    engine: CalibrationEngine<'static, CriticalSectionRawMutex>,
    buffers: BufferSet,
) {
    info!("Console task started");

    write_text(&mut tx, HELP).await;

    let mut line: heapless::String<MAX_LINE_LEN> = heapless::String::new();
    let mut overflow = false;
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                continue;
            }
        };

        for &byte in &buf[..n] {
            match byte {
                b'\r' | b'\n' => {
                    if overflow {
                        write_text(&mut tx, "error: line too long").await;
                    } else if !line.trim().is_empty() {
                        let reply = handle_line(&engine, &buffers, &line).await;
                        write_text(&mut tx, &reply).await;
                    }
                    line.clear();
                    overflow = false;
                }
                _ if overflow || !byte.is_ascii() => {}
                _ => {
                    if line.push(byte as char).is_err() {
                        overflow = true;
                    }
                }
            }
        }
    }
}

/// Parse and run one command line, returning the text to send back
async fn handle_line(
    engine: &CalibrationEngine<'static, CriticalSectionRawMutex>,
    buffers: &BufferSet,
    line: &str,
) -> ReportText {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(e) => return report(&error_reply(&e)),
    };

    match command {
        Command::Help => report(HELP),
        Command::ShowCalibration => {
            let (slope, intercept) = engine.store().coefficients();
            report(&calibration_summary(slope, intercept))
        }
        _ if command.is_calibration() => match command.apply_calibration(engine, buffers) {
            Ok(Some(state)) => report(&calibration_updated(&state)),
            Ok(None) => ReportText::new(),
            Err(e) => {
                warn!("Calibration rejected: {:?}", e);
                report(&error_reply(&e))
            }
        },
        _ => {
            COMMAND_CHANNEL.send(command).await;
            RESPONSE_CHANNEL.receive().await
        }
    }
}

fn report(text: &str) -> ReportText {
    let mut out = ReportText::new();
    if out.push_str(text).is_err() {
        out.clear();
        let _ = out.push_str(MSG_REPLY_TRUNCATED);
    }
    out
}

/// Send text to the terminal with CRLF line endings
async fn write_text(tx: &mut BufferedUartTx, text: &str) {
    for line in text.lines() {
        if let Err(e) = write_line(tx, line).await {
            warn!("UART write error: {:?}", e);
            return;
        }
    }
}

async fn write_line(tx: &mut BufferedUartTx, line: &str) -> Result<(), UartError> {
    tx.write_all(line.as_bytes()).await?;
    tx.write_all(b"\r\n").await
}
