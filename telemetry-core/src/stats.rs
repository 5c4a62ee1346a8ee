//! Link health counters.

use crate::source::TelemetryError;

/// Running counters kept by the pipeline.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LinkStats {
    pub ticks: u64,
    pub records_pushed: u64,
    /// Ticks that produced nothing, including ticks whose only message was dropped.
    pub idle_ticks: u64,
    pub malformed_frames: u64,
    pub malformed_records: u64,
    pub sensor_faults: u64,
    /// Single-value bench messages seen on the link.
    pub raw_values: u64,
}

impl LinkStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            records_pushed: 0,
            idle_ticks: 0,
            malformed_frames: 0,
            malformed_records: 0,
            sensor_faults: 0,
            raw_values: 0,
        }
    }

    /// Counts a swallowed error. Transport loss is not counted; it ends the session.
    pub fn record_error(&mut self, err: &TelemetryError) {
        match err {
            TelemetryError::MalformedFrame(_) => self.malformed_frames += 1,
            TelemetryError::MalformedRecord(_) => self.malformed_records += 1,
            TelemetryError::SensorUnavailable(_) => self.sensor_faults += 1,
            TelemetryError::TransportLost => {}
        }
    }

    /// Total messages discarded for any reason.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.malformed_frames + self.malformed_records + self.sensor_faults
    }
}
