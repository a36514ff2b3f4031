//! Text report output trait

/// Destination for human-readable reports
///
/// The engine only renders text; displaying it (serial console, RTT log,
/// display) is the sink's job.
pub trait ReportSink {
    /// Emit one rendered report
    fn write_report(&mut self, text: &str);
}

impl<W: ReportSink + ?Sized> ReportSink for &mut W {
    fn write_report(&mut self, text: &str) {
        (**self).write_report(text)
    }
}

/// Buffers reports in a fixed-capacity string
///
/// Text that does not fit is dropped, so callers should size the buffer
/// for the largest report they expect.
impl<const N: usize> ReportSink for heapless::String<N> {
    fn write_report(&mut self, text: &str) {
        for c in text.chars() {
            if self.push(c).is_err() {
                break;
            }
        }
        let _ = self.push('\n');
    }
}
