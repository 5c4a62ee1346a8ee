//! Cadence scheduler driving the ingestion pipeline.
//!
//! Each tick polls the active source once, pushes at most one record into the
//! shared window and then hands exactly one [`Tick`] to the display callback.
//! Record timestamps are scheduled tick times, not wall-clock reads, so a
//! simulated session is reproducible however late the thread wakes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use telemetry_core::pipeline::{Pipeline, TickOutcome};
use telemetry_core::simulation::SimulationPhase;
use telemetry_core::source::TelemetrySource;
use telemetry_core::stats::LinkStats;
use telemetry_core::window::WindowSnapshot;

use crate::error::StationError;
use crate::shared::SharedWindow;

/// What the display receives once per tick.
#[derive(Clone, Debug)]
pub struct Tick {
    /// Pipeline time of the tick in seconds.
    pub now: f32,
    pub outcome: TickOutcome,
    pub snapshot: WindowSnapshot,
    pub stats: LinkStats,
    pub phase: Option<SimulationPhase>,
}

/// Optional bounds on a session.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RunLimit {
    pub ticks: Option<u64>,
    pub duration: Option<Duration>,
}

impl RunLimit {
    fn reached(&self, ticks: u64, elapsed: Duration) -> bool {
        self.ticks.is_some_and(|limit| ticks >= limit)
            || self.duration.is_some_and(|limit| elapsed >= limit)
    }
}

/// Why a session ended without losing the link.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SessionEnd {
    Stopped,
    LimitReached,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SessionSummary {
    pub ticks: u64,
    pub stats: LinkStats,
    pub end: SessionEnd,
}

pub struct Station<S> {
    pipeline: Pipeline<S>,
    window: SharedWindow,
    cadence: Duration,
    stop: Arc<AtomicBool>,
}

impl<S: TelemetrySource> Station<S> {
    #[must_use]
    pub fn new(source: S, window: SharedWindow, cadence: Duration) -> Self {
        Self {
            pipeline: Pipeline::new(source),
            window,
            cadence,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that ends [`Station::run`] before its next tick when set.
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    #[must_use]
    pub fn stats(&self) -> &LinkStats {
        self.pipeline.stats()
    }

    /// Ticks until stopped, out of budget, or the link is lost.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::TransportLost`] when the source's link closes.
    pub fn run(
        &mut self,
        limit: RunLimit,
        mut on_tick: impl FnMut(&Tick),
    ) -> Result<SessionSummary, StationError> {
        let started = Instant::now();
        let mut deadline = started;
        let mut index = 0u64;

        tracing::info!(
            mode = %self.pipeline.source().mode(),
            cadence = ?self.cadence,
            "station: session started"
        );

        let end = loop {
            if self.stop.load(Ordering::Relaxed) {
                break SessionEnd::Stopped;
            }
            if limit.reached(index, started.elapsed()) {
                break SessionEnd::LimitReached;
            }

            let now = self.scheduled_time(index);
            let outcome = match self.pipeline.produce(now) {
                Ok(outcome) => outcome,
                Err(lost) => {
                    tracing::warn!(
                        ticks = index,
                        pushed = self.stats().records_pushed,
                        "station: link lost, ending session"
                    );
                    return Err(lost.into());
                }
            };

            if let TickOutcome::Pushed(record) = outcome
                && self.window.push(record).is_ok()
            {
                self.pipeline.record_stored();
            }

            let tick = Tick {
                now,
                outcome,
                snapshot: self.window.snapshot(),
                stats: *self.pipeline.stats(),
                phase: self.pipeline.source().phase(),
            };
            on_tick(&tick);
            index += 1;

            deadline += self.cadence;
            let now = Instant::now();
            if let Some(wait) = deadline.checked_duration_since(now) {
                thread::sleep(wait);
            } else {
                tracing::debug!(tick = index, "station: tick overran its cadence");
                deadline = now;
            }
        };

        let stats = *self.pipeline.stats();
        tracing::info!(
            ticks = index,
            pushed = stats.records_pushed,
            dropped = stats.dropped(),
            ?end,
            "station: session ended"
        );
        Ok(SessionSummary {
            ticks: index,
            stats,
            end,
        })
    }

    fn scheduled_time(&self, index: u64) -> f32 {
        let ticks = u32::try_from(index).unwrap_or(u32::MAX);
        self.cadence.saturating_mul(ticks).as_secs_f32()
    }
}
