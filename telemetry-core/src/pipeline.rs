//! Per-tick ingestion: poll the active source, stamp and push one record.

use crate::fields::Message;
use crate::record::{SequenceIndex, TelemetryRecord};
use crate::source::{TelemetryError, TelemetrySource, TransportLost};
use crate::stats::LinkStats;
use crate::window::RollingWindow;

/// Frames a live tick may inspect while looking for a valid record.
pub const MAX_FRAMES_PER_TICK: usize = 16;

/// What a tick did.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TickOutcome {
    Pushed(TelemetryRecord),
    /// Nothing was ready.
    Idle,
    /// The only candidate this tick was discarded.
    Dropped(TelemetryError),
}

/// Drives one [`TelemetrySource`] and numbers the records it yields.
#[derive(Debug)]
pub struct Pipeline<S> {
    source: S,
    next_sequence: SequenceIndex,
    stats: LinkStats,
}

impl<S: TelemetrySource> Pipeline<S> {
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self {
            source,
            next_sequence: 0,
            stats: LinkStats::new(),
        }
    }

    #[must_use]
    pub const fn stats(&self) -> &LinkStats {
        &self.stats
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Produces at most one record for pipeline time `now` without storing it.
    ///
    /// Per-frame errors are counted and the next frame is tried, up to
    /// [`MAX_FRAMES_PER_TICK`]. A sensor fault ends the tick.
    ///
    /// # Errors
    ///
    /// Returns [`TransportLost`] when the source's link is gone.
    pub fn produce(&mut self, now: f32) -> Result<TickOutcome, TransportLost> {
        self.stats.ticks += 1;
        let mut last_error = None;

        for _ in 0..MAX_FRAMES_PER_TICK {
            match self.source.poll(now) {
                Ok(Some(Message::Reading(reading))) => {
                    let record = TelemetryRecord::from_reading(reading, self.next_sequence, now);
                    self.next_sequence += 1;
                    return Ok(TickOutcome::Pushed(record));
                }
                Ok(Some(Message::Raw(value))) => {
                    self.stats.raw_values += 1;
                    tracing::debug!(value, "pipeline: raw bench value");
                }
                Ok(None) => break,
                Err(TelemetryError::TransportLost) => {
                    tracing::warn!(at = now, "pipeline: transport lost");
                    return Err(TransportLost);
                }
                Err(err) => {
                    tracing::debug!(%err, "pipeline: dropping message");
                    self.stats.record_error(&err);
                    let per_frame = err.is_per_frame();
                    last_error = Some(err);
                    if !per_frame {
                        break;
                    }
                }
            }
        }

        self.stats.idle_ticks += 1;
        Ok(last_error.map_or(TickOutcome::Idle, TickOutcome::Dropped))
    }

    /// Produces and pushes at most one record into `window`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportLost`] when the source's link is gone.
    pub fn tick(
        &mut self,
        now: f32,
        window: &mut RollingWindow,
    ) -> Result<TickOutcome, TransportLost> {
        let outcome = self.produce(now)?;
        if let TickOutcome::Pushed(record) = outcome
            && window.push(record).is_ok()
        {
            self.record_stored();
        }
        Ok(outcome)
    }

    /// Counts a produced record that the caller stored.
    pub fn record_stored(&mut self) {
        self.stats.records_pushed += 1;
    }
}
