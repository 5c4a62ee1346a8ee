//! Telemetry sources and the error taxonomy they report.
//!
//! A pipeline polls exactly one [`TelemetrySource`] per tick. Live sources pull
//! decoded frames from a [`FrameSource`], the simulated source samples the
//! flight model, and [`SensorSource`] wraps a local [`SensorDriver`].

use core::fmt;

use crate::config::SourceMode;
use crate::fields::{MalformedRecord, Message, parse_frame};
use crate::framing::{FrameDecoder, FrameError, FrameResult};
use crate::record::Reading;
use crate::simulation::{SimulationEngine, SimulationPhase};
use crate::wire::FormatSelection;

/// Failures reported by a sensor driver.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SensorError {
    /// The device did not answer.
    NotResponding,
    /// The device answered with a value outside its range.
    InvalidReading,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::NotResponding => f.write_str("sensor not responding"),
            SensorError::InvalidReading => f.write_str("sensor returned an invalid reading"),
        }
    }
}

impl core::error::Error for SensorError {}

/// Physical sensor access, polled once per producer tick.
pub trait SensorDriver {
    /// Reads pressure, altitude and temperature.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError`] when the device cannot deliver a reading.
    fn read(&mut self) -> Result<Reading, SensorError>;
}

/// The link is closed or unreachable. Terminal for the session.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TransportLost;

impl fmt::Display for TransportLost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("transport lost")
    }
}

impl core::error::Error for TransportLost {}

/// Non-blocking access to decoded frames.
pub trait FrameSource {
    /// Returns the next frame result if one is ready.
    ///
    /// # Errors
    ///
    /// Returns [`TransportLost`] once the link can no longer deliver bytes.
    fn try_read_frame(&mut self) -> Result<Option<FrameResult>, TransportLost>;
}

/// Frame source over any byte iterator; exhaustion means the link closed.
#[derive(Debug)]
pub struct DecodingSource<I> {
    bytes: I,
    decoder: FrameDecoder,
}

impl<I: Iterator<Item = u8>> DecodingSource<I> {
    #[must_use]
    pub const fn new(bytes: I) -> Self {
        Self {
            bytes,
            decoder: FrameDecoder::new(),
        }
    }
}

impl<I: Iterator<Item = u8>> FrameSource for DecodingSource<I> {
    fn try_read_frame(&mut self) -> Result<Option<FrameResult>, TransportLost> {
        for byte in self.bytes.by_ref() {
            if let Some(result) = self.decoder.push_byte(byte) {
                return Ok(Some(result));
            }
        }
        self.decoder.reset();
        Err(TransportLost)
    }
}

/// Everything a source poll can fail with.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TelemetryError {
    MalformedFrame(FrameError),
    MalformedRecord(MalformedRecord),
    SensorUnavailable(SensorError),
    TransportLost,
}

impl TelemetryError {
    /// Per-frame errors leave the link usable; the next frame may be fine.
    #[must_use]
    pub const fn is_per_frame(&self) -> bool {
        matches!(
            self,
            TelemetryError::MalformedFrame(_) | TelemetryError::MalformedRecord(_)
        )
    }
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::MalformedFrame(err) => write!(f, "malformed frame: {err}"),
            TelemetryError::MalformedRecord(err) => write!(f, "malformed record: {err}"),
            TelemetryError::SensorUnavailable(err) => write!(f, "sensor unavailable: {err}"),
            TelemetryError::TransportLost => f.write_str("transport lost"),
        }
    }
}

impl core::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            TelemetryError::MalformedFrame(err) => Some(err),
            TelemetryError::MalformedRecord(err) => Some(err),
            TelemetryError::SensorUnavailable(err) => Some(err),
            TelemetryError::TransportLost => None,
        }
    }
}

impl From<FrameError> for TelemetryError {
    fn from(err: FrameError) -> Self {
        TelemetryError::MalformedFrame(err)
    }
}

impl From<MalformedRecord> for TelemetryError {
    fn from(err: MalformedRecord) -> Self {
        TelemetryError::MalformedRecord(err)
    }
}

impl From<SensorError> for TelemetryError {
    fn from(err: SensorError) -> Self {
        TelemetryError::SensorUnavailable(err)
    }
}

impl From<TransportLost> for TelemetryError {
    fn from(_: TransportLost) -> Self {
        TelemetryError::TransportLost
    }
}

/// Something the pipeline can poll for a message.
pub trait TelemetrySource {
    fn mode(&self) -> SourceMode;

    /// Polls for one message at pipeline time `now` (seconds).
    ///
    /// `Ok(None)` means nothing is ready this time.
    ///
    /// # Errors
    ///
    /// Returns the [`TelemetryError`] that suppressed this poll's message.
    fn poll(&mut self, now: f32) -> Result<Option<Message>, TelemetryError>;

    /// Flight phase, for sources that know it.
    fn phase(&self) -> Option<SimulationPhase> {
        None
    }
}

/// Frames from a radio link, parsed with a fixed or automatic format.
#[derive(Debug)]
pub struct LiveSource<F> {
    frames: F,
    format: FormatSelection,
}

impl<F: FrameSource> LiveSource<F> {
    #[must_use]
    pub const fn new(frames: F, format: FormatSelection) -> Self {
        Self { frames, format }
    }

    #[must_use]
    pub const fn format(&self) -> FormatSelection {
        self.format
    }

    pub fn frames_mut(&mut self) -> &mut F {
        &mut self.frames
    }
}

impl<F: FrameSource> TelemetrySource for LiveSource<F> {
    fn mode(&self) -> SourceMode {
        SourceMode::Live
    }

    fn poll(&mut self, _now: f32) -> Result<Option<Message>, TelemetryError> {
        let Some(frame) = self.frames.try_read_frame()? else {
            return Ok(None);
        };
        let message = parse_frame(&frame?, self.format)?;
        Ok(Some(message))
    }
}

/// Flight simulation sampled at pipeline time.
#[derive(Clone, Debug, Default)]
pub struct SimulatedSource {
    engine: SimulationEngine,
}

impl SimulatedSource {
    #[must_use]
    pub const fn new(engine: SimulationEngine) -> Self {
        Self { engine }
    }

    #[must_use]
    pub const fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SimulationEngine {
        &mut self.engine
    }
}

impl TelemetrySource for SimulatedSource {
    fn mode(&self) -> SourceMode {
        SourceMode::Simulated
    }

    fn poll(&mut self, now: f32) -> Result<Option<Message>, TelemetryError> {
        Ok(Some(Message::Reading(self.engine.sample(now).reading)))
    }

    fn phase(&self) -> Option<SimulationPhase> {
        Some(self.engine.phase())
    }
}

/// A sensor wired directly to the station.
#[derive(Debug)]
pub struct SensorSource<D> {
    driver: D,
}

impl<D: SensorDriver> SensorSource<D> {
    #[must_use]
    pub const fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

impl<D: SensorDriver> TelemetrySource for SensorSource<D> {
    fn mode(&self) -> SourceMode {
        SourceMode::Live
    }

    fn poll(&mut self, _now: f32) -> Result<Option<Message>, TelemetryError> {
        let reading = self.driver.read()?;
        if !reading.is_finite() {
            return Err(SensorError::InvalidReading.into());
        }
        Ok(Some(Message::Reading(reading)))
    }
}
