//! pH sensor facade
//!
//! [`PhSensor`] is the public surface of the engine: it binds a voltage
//! sampler, a report sink and a shared calibration store, and exposes the
//! read / calibrate / check operations by pin.

use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::calibration::{CalibrationEngine, CalibrationError, CalibrationState, CalibrationStore};
use crate::config::{BufferSet, BufferSlot, SensorConfig};
use crate::console::{calibration_summary, calibration_updated, format_reply, Command, HELP};
use crate::measurement::{
    classify, format_readings, Decimal, PhConverter, PhLevel, Reading, ReadingAggregator,
};
use crate::safety::{SensorHealthMonitor, StatusReport};
use crate::traits::{PinId, ReportSink, SamplerError, VoltageSampler};

/// Errors surfaced by [`PhSensor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhError {
    /// Sampler unavailable or pin invalid
    Hardware(SamplerError),
    /// Attempted to store a zero-slope or non-finite equation
    InvalidCalibration,
    /// Calibration inputs do not determine a unique line
    DegenerateCalibration,
    /// Calibration from captured voltages before this buffer was captured
    NotCaptured(BufferSlot),
}

impl From<SamplerError> for PhError {
    fn from(e: SamplerError) -> Self {
        PhError::Hardware(e)
    }
}

impl From<CalibrationError> for PhError {
    fn from(e: CalibrationError) -> Self {
        match e {
            CalibrationError::InvalidCalibration => PhError::InvalidCalibration,
            CalibrationError::DegenerateCalibration => PhError::DegenerateCalibration,
        }
    }
}

impl fmt::Display for PhError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhError::Hardware(e) => write!(f, "hardware error: {}", e),
            PhError::InvalidCalibration => CalibrationError::InvalidCalibration.fmt(f),
            PhError::DegenerateCalibration => CalibrationError::DegenerateCalibration.fmt(f),
            PhError::NotCaptured(slot) => write!(
                f,
                "no {} buffer voltage captured (use 'capture {}')",
                slot.label(),
                slot.label()
            ),
        }
    }
}

/// Analog pH sensor
///
/// Every conversion reads the shared [`CalibrationStore`], so calibrations
/// written by another task (through its own [`CalibrationEngine`]) apply
/// to the next reading.
pub struct PhSensor<'a, M: RawMutex, S, W> {
    store: &'a CalibrationStore<M>,
    sampler: S,
    sink: W,
    monitor: SensorHealthMonitor,
    buffers: BufferSet,
    /// Voltages from `capture`, indexed by [`BufferSlot`]
    captured: [Option<f64>; 3],
}

impl<'a, M, S, W> PhSensor<'a, M, S, W>
where
    M: RawMutex,
    S: VoltageSampler,
    W: ReportSink,
{
    /// Create a sensor
    ///
    /// Health thresholds and buffer pH values come from `config`. The
    /// store's calibration is left as is.
    pub fn new(store: &'a CalibrationStore<M>, sampler: S, sink: W, config: &SensorConfig) -> Self {
        Self {
            store,
            sampler,
            sink,
            monitor: SensorHealthMonitor::new(config.health),
            buffers: config.buffers,
            captured: [None; 3],
        }
    }

    /// Engine writing to this sensor's store
    pub fn engine(&self) -> CalibrationEngine<'a, M> {
        CalibrationEngine::new(self.store)
    }

    /// Report sink
    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Mutable report sink
    pub fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Probe voltage on `pin`
    pub fn get_voltage(&mut self, pin: PinId) -> Result<f64, PhError> {
        self.sampler.read_voltage(pin).map_err(|e| {
            warn!("sampling pin {} failed: {}", pin, e);
            PhError::Hardware(e)
        })
    }

    /// pH on `pin` under the calibration in effect now
    pub fn get_ph_value(&mut self, pin: PinId) -> Result<f64, PhError> {
        let voltage = self.get_voltage(pin)?;
        Ok(PhConverter::new(self.store).ph_from_voltage(voltage))
    }

    /// Override slope and intercept
    pub fn set_calibration(&self, slope: f64, intercept: f64) -> Result<(), PhError> {
        self.engine().set_calibration(slope, intercept)?;
        Ok(())
    }

    /// Two-point calibration from voltages read in the low and mid buffers
    pub fn calibrate_two_point(&self, pin: PinId, v_low: f64, v_mid: f64) -> Result<(), PhError> {
        debug!("two-point calibration on pin {}", pin);
        let (low, mid) = self.buffers.two_point(v_low, v_mid);
        self.engine().calibrate_two_point(low, mid)?;
        Ok(())
    }

    /// Three-point calibration from voltages read in all three buffers
    pub fn calibrate_three_point(
        &self,
        pin: PinId,
        v_low: f64,
        v_mid: f64,
        v_high: f64,
    ) -> Result<(), PhError> {
        debug!("three-point calibration on pin {}", pin);
        self.engine()
            .calibrate_three_point(self.buffers.three_point(v_low, v_mid, v_high))?;
        Ok(())
    }

    /// Offset calibration against a reference instrument
    pub fn calibrate_offset(
        &self,
        pin: PinId,
        measured_ph: f64,
        actual_ph: f64,
    ) -> Result<(), PhError> {
        debug!("offset calibration on pin {}", pin);
        self.engine().calibrate_offset(measured_ph, actual_ph)?;
        Ok(())
    }

    /// Restore the store's default calibration
    pub fn reset_calibration(&self) -> CalibrationState {
        self.engine().reset_calibration()
    }

    /// Active `(slope, intercept)`
    pub fn get_calibration(&self) -> (f64, f64) {
        self.store.coefficients()
    }

    /// Sample the probe while it sits in a buffer
    ///
    /// Use the returned voltage as a calibration input. A voltage outside
    /// the health band is returned anyway but logged.
    pub fn capture_buffer_voltage(&mut self, pin: PinId) -> Result<f64, PhError> {
        let voltage = self.get_voltage(pin)?;
        if !self.monitor.is_sensor_ok(voltage) {
            warn!("buffer voltage {} outside health band", voltage);
        }
        info!("captured buffer voltage {} on pin {}", voltage, pin);
        Ok(voltage)
    }

    /// Sample the probe in the `slot` buffer and keep the voltage for a
    /// later captured calibration
    pub fn capture_buffer(&mut self, pin: PinId, slot: BufferSlot) -> Result<f64, PhError> {
        let voltage = self.capture_buffer_voltage(pin)?;
        self.captured[slot as usize] = Some(voltage);
        Ok(voltage)
    }

    /// Voltage kept by [`capture_buffer`](Self::capture_buffer) for `slot`
    pub fn captured_voltage(&self, slot: BufferSlot) -> Option<f64> {
        self.captured[slot as usize]
    }

    fn require_captured(&self, slot: BufferSlot) -> Result<f64, PhError> {
        self.captured_voltage(slot).ok_or(PhError::NotCaptured(slot))
    }

    /// Two-point calibration from the captured low and mid voltages
    pub fn calibrate_captured_two_point(&self, pin: PinId) -> Result<CalibrationState, PhError> {
        let v_low = self.require_captured(BufferSlot::Low)?;
        let v_mid = self.require_captured(BufferSlot::Mid)?;
        self.calibrate_two_point(pin, v_low, v_mid)?;
        Ok(self.store.get())
    }

    /// Three-point calibration from all captured voltages
    pub fn calibrate_captured_three_point(&self, pin: PinId) -> Result<CalibrationState, PhError> {
        let v_low = self.require_captured(BufferSlot::Low)?;
        let v_mid = self.require_captured(BufferSlot::Mid)?;
        let v_high = self.require_captured(BufferSlot::High)?;
        self.calibrate_three_point(pin, v_low, v_mid, v_high)?;
        Ok(self.store.get())
    }

    /// Reading and health status from a single probe sample
    ///
    /// Logs a warning when the voltage is out of range.
    pub fn sample(&mut self, pin: PinId) -> Result<(Reading, StatusReport), PhError> {
        let voltage = self.get_voltage(pin)?;
        let reading = ReadingAggregator::new(self.store).read_all(voltage);
        Ok((reading, self.monitor.check_sensor_status(voltage)))
    }

    /// Voltage, pH and coefficients from one calibration snapshot
    pub fn read_all_values(&mut self, pin: PinId) -> Result<Reading, PhError> {
        let voltage = self.get_voltage(pin)?;
        Ok(ReadingAggregator::new(self.store).read_all(voltage))
    }

    /// Take a reading and write its report to the sink
    pub fn print_readings(&mut self, pin: PinId) -> Result<(), PhError> {
        let reading = self.read_all_values(pin)?;
        self.sink.write_report(&format_readings(&reading));
        Ok(())
    }

    /// True when the probe voltage is inside the health band
    pub fn is_sensor_ok(&mut self, pin: PinId) -> Result<bool, PhError> {
        let voltage = self.get_voltage(pin)?;
        Ok(self.monitor.is_sensor_ok(voltage))
    }

    /// Check health and write the status message to the sink
    pub fn check_sensor(&mut self, pin: PinId) -> Result<StatusReport, PhError> {
        let voltage = self.get_voltage(pin)?;
        let report = self.monitor.check_sensor_status(voltage);
        self.sink.write_report(report.message());
        Ok(report)
    }

    /// Acid / neutral / base for the current reading
    pub fn classify(&mut self, pin: PinId) -> Result<PhLevel, PhError> {
        Ok(classify(self.get_ph_value(pin)?))
    }

    /// Run a console command, writing its output to the sink
    pub fn execute(&mut self, pin: PinId, command: &Command) -> Result<(), PhError> {
        let reply = match *command {
            Command::Read => return self.print_readings(pin),
            Command::Status => return self.check_sensor(pin).map(|_| ()),
            Command::Help => {
                self.sink.write_report(HELP);
                return Ok(());
            }
            Command::Level => {
                let ph = self.get_ph_value(pin)?;
                format_reply(format_args!("pH {}: {}", Decimal::new(ph, 2), classify(ph)))
            }
            Command::ShowCalibration => {
                let (slope, intercept) = self.get_calibration();
                calibration_summary(slope, intercept)
            }
            Command::Capture(slot) => {
                let voltage = self.capture_buffer(pin, slot)?;
                format_reply(format_args!(
                    "captured {} buffer (pH {}): {} V",
                    slot.label(),
                    Decimal::new(self.buffers.ph(slot), 2),
                    Decimal::new(voltage, 4)
                ))
            }
            Command::TwoPointCaptured => {
                calibration_updated(&self.calibrate_captured_two_point(pin)?)
            }
            Command::ThreePointCaptured => {
                calibration_updated(&self.calibrate_captured_three_point(pin)?)
            }
            _ => match command.apply_calibration(&self.engine(), &self.buffers)? {
                Some(state) => calibration_updated(&state),
                None => return Ok(()),
            },
        };

        self.sink.write_report(&reply);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HealthThresholds;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    const PROBE: PinId = PinId(26);

    type Sink = heapless::String<1024>;

    fn config() -> SensorConfig {
        SensorConfig {
            health: HealthThresholds {
                low_v: 0.05,
                high_v: 3.25,
            },
            ..SensorConfig::default()
        }
    }

    /// Sampler with a fixed voltage on the probe pin only
    fn fixed(voltage: f64) -> impl FnMut(PinId) -> Result<f64, SamplerError> {
        move |pin| {
            if pin == PROBE {
                Ok(voltage)
            } else {
                Err(SamplerError::InvalidPin)
            }
        }
    }

    #[test]
    fn test_get_ph_value() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let mut sensor = PhSensor::new(&store, fixed(2.0), Sink::new(), &config());
        sensor.set_calibration(-6.0, 19.0).unwrap();

        assert_eq!(sensor.get_voltage(PROBE), Ok(2.0));
        assert_eq!(sensor.get_ph_value(PROBE), Ok(7.0));
        assert_eq!(sensor.classify(PROBE), Ok(PhLevel::Neutral));
    }

    #[test]
    fn test_sampler_failure_is_hardware_error() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let mut sensor = PhSensor::new(&store, fixed(2.0), Sink::new(), &config());

        let bad = PinId(3);
        assert_eq!(
            sensor.get_ph_value(bad),
            Err(PhError::Hardware(SamplerError::InvalidPin))
        );
        assert!(sensor.read_all_values(bad).is_err());
        assert!(sensor.is_sensor_ok(bad).is_err());
        assert!(sensor.check_sensor(bad).is_err());
        assert!(sensor.print_readings(bad).is_err());
        assert!(sensor.sink().is_empty());
    }

    #[test]
    fn test_two_point_round_trip() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let sensor = PhSensor::new(&store, fixed(2.0), Sink::new(), &config());

        sensor.calibrate_two_point(PROBE, 2.5, 2.0).unwrap();
        assert_eq!(sensor.get_calibration(), (-6.0, 19.0));
    }

    #[test]
    fn test_calibration_errors_leave_store() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let sensor = PhSensor::new(&store, fixed(2.0), Sink::new(), &config());
        sensor.set_calibration(-6.0, 19.0).unwrap();

        assert_eq!(
            sensor.set_calibration(0.0, 1.0),
            Err(PhError::InvalidCalibration)
        );
        assert_eq!(
            sensor.calibrate_two_point(PROBE, 2.0, 2.0),
            Err(PhError::DegenerateCalibration)
        );
        assert_eq!(
            sensor.calibrate_three_point(PROBE, 2.5, 2.5, 1.6),
            Err(PhError::DegenerateCalibration)
        );
        assert_eq!(sensor.get_calibration(), (-6.0, 19.0));
    }

    #[test]
    fn test_offset_and_reset() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let sensor = PhSensor::new(&store, fixed(2.0), Sink::new(), &config());
        sensor.set_calibration(-6.0, 19.0).unwrap();

        sensor.calibrate_offset(PROBE, 6.5, 7.0).unwrap();
        assert_eq!(sensor.get_calibration(), (-6.0, 19.5));

        sensor.reset_calibration();
        assert_eq!(
            sensor.get_calibration(),
            CalibrationState::DATASHEET_DEFAULT.coefficients()
        );
    }

    #[test]
    fn test_nist_three_point() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let config = SensorConfig {
            buffers: BufferSet::NIST,
            ..config()
        };
        let sensor = PhSensor::new(&store, fixed(2.0), Sink::new(), &config);

        sensor.calibrate_three_point(PROBE, 2.53, 2.05, 1.62).unwrap();
        let (slope, _) = sensor.get_calibration();
        assert!(slope < -5.0 && slope > -7.0);
    }

    #[test]
    fn test_read_all_values_consistent() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let mut sensor = PhSensor::new(&store, fixed(1.75), Sink::new(), &config());
        sensor.set_calibration(-6.0, 19.0).unwrap();

        let reading = sensor.read_all_values(PROBE).unwrap();
        assert_eq!(reading.voltage, 1.75);
        assert_eq!(reading.ph, 8.5);
        assert_eq!((reading.slope, reading.intercept), (-6.0, 19.0));
    }

    #[test]
    fn test_print_readings_writes_report() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let mut sensor = PhSensor::new(&store, fixed(2.0), Sink::new(), &config());
        sensor.set_calibration(-6.0, 19.0).unwrap();

        sensor.print_readings(PROBE).unwrap();
        assert!(sensor.sink().contains("pH:               7.00"));
    }

    #[test]
    fn test_health_checks() {
        let store = CalibrationStore::<NoopRawMutex>::default();

        let mut healthy = PhSensor::new(&store, fixed(1.5), Sink::new(), &config());
        assert_eq!(healthy.is_sensor_ok(PROBE), Ok(true));
        let report = healthy.check_sensor(PROBE).unwrap();
        assert!(report.health.is_ok());
        assert_eq!(healthy.sink().as_str(), "sensor reading nominal\n");

        let mut saturated = PhSensor::new(&store, fixed(3.3), Sink::new(), &config());
        assert_eq!(saturated.is_sensor_ok(PROBE), Ok(false));
        saturated.check_sensor(PROBE).unwrap();
        assert!(saturated.sink().contains("check wiring"));

        let mut rail = PhSensor::new(&store, fixed(0.05), Sink::new(), &config());
        assert_eq!(rail.is_sensor_ok(PROBE), Ok(false));
    }

    #[test]
    fn test_capture_buffer_voltage() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let mut sensor = PhSensor::new(&store, fixed(2.48), Sink::new(), &config());
        assert_eq!(sensor.capture_buffer_voltage(PROBE), Ok(2.48));
    }

    #[test]
    fn test_execute_console_session() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let mut sensor = PhSensor::new(&store, fixed(2.0), Sink::new(), &config());

        for line in ["two 2.5 2.0", "cal", "level", "offset 7.0 7.5", "cal"] {
            let command = Command::parse(line).unwrap();
            sensor.execute(PROBE, &command).unwrap();
        }

        let out = sensor.sink().as_str();
        assert!(out.contains("calibration updated: slope=-6.0000 intercept=19.0000"));
        assert!(out.contains("slope=-6.0000 intercept=19.0000"));
        assert!(out.contains("pH 7.00: neutral"));
        assert!(out.contains("slope=-6.0000 intercept=19.5000"));
    }

    #[test]
    fn test_execute_degenerate_reports_error() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let mut sensor = PhSensor::new(&store, fixed(2.0), Sink::new(), &config());

        let command = Command::parse("two 2.0 2.0").unwrap();
        assert_eq!(
            sensor.execute(PROBE, &command),
            Err(PhError::DegenerateCalibration)
        );
        assert!(sensor.sink().is_empty());
    }

    #[test]
    fn test_execute_reply_keeps_huge_slope() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let mut sensor = PhSensor::new(&store, fixed(2.0), Sink::new(), &config());

        let command = Command::parse("set 1e80 1").unwrap();
        sensor.execute(PROBE, &command).unwrap();
        sensor.execute(PROBE, &Command::ShowCalibration).unwrap();

        assert_eq!(store.coefficients(), (1e80, 1.0));
        assert_eq!(
            sensor.sink().as_str(),
            "calibration updated: slope=1.0000e80 intercept=1.0000\n\
             slope=1.0000e80 intercept=1.0000\n"
        );
    }

    #[test]
    fn test_capture_then_calibrate() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let mut voltages = [2.5, 2.0, 1.5].into_iter();
        let sampler = move |_pin: PinId| voltages.next().ok_or(SamplerError::NotReady);
        let mut sensor = PhSensor::new(&store, sampler, Sink::new(), &config());

        for line in ["capture low", "capture mid", "two"] {
            let command = Command::parse(line).unwrap();
            sensor.execute(PROBE, &command).unwrap();
        }
        assert_eq!(sensor.captured_voltage(BufferSlot::Low), Some(2.5));
        assert_eq!(sensor.captured_voltage(BufferSlot::Mid), Some(2.0));
        assert_eq!(store.coefficients(), (-6.0, 19.0));

        let out = sensor.sink().as_str();
        assert!(out.contains("captured low buffer (pH 4.00): 2.5000 V"));
        assert!(out.contains("captured mid buffer (pH 7.00): 2.0000 V"));
        assert!(out.contains("calibration updated: slope=-6.0000 intercept=19.0000"));

        assert_eq!(
            sensor.calibrate_captured_three_point(PROBE),
            Err(PhError::NotCaptured(BufferSlot::High))
        );
        sensor.capture_buffer(PROBE, BufferSlot::High).unwrap();
        let state = sensor.calibrate_captured_three_point(PROBE).unwrap();
        assert!(state.slope() < 0.0);
    }

    #[test]
    fn test_captured_calibration_needs_captures() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let mut sensor = PhSensor::new(&store, fixed(2.0), Sink::new(), &config());

        assert_eq!(
            sensor.execute(PROBE, &Command::TwoPointCaptured),
            Err(PhError::NotCaptured(BufferSlot::Low))
        );
        assert_eq!(store.get(), CalibrationState::DATASHEET_DEFAULT);
        assert!(sensor.sink().is_empty());
    }

    #[test]
    fn test_sample_reads_once() {
        let store = CalibrationStore::<NoopRawMutex>::default();
        let mut calls = 0;
        let sampler = |_pin: PinId| {
            calls += 1;
            Ok::<f64, SamplerError>(3.3)
        };
        let mut sensor = PhSensor::new(&store, sampler, Sink::new(), &config());
        sensor.set_calibration(-6.0, 19.0).unwrap();

        let (reading, status) = sensor.sample(PROBE).unwrap();
        assert_eq!(reading.voltage, 3.3);
        assert!(!status.health.is_ok());
        assert_eq!(status.voltage, 3.3);
        drop(sensor);
        assert_eq!(calls, 1);
    }
}
