//! Bounded FIFO of recent records with lifetime metrics.
//!
//! The window keeps the last `capacity` records for rendering. Apogee and the
//! start time describe everything ever pushed, so evicting a record never
//! changes them; only [`RollingWindow::clear`] does.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use crate::config::DEFAULT_CAPACITY;
use crate::record::{SequenceIndex, TelemetryRecord};

/// Why a push was refused.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PushError {
    /// The sequence index does not follow the latest record.
    OutOfOrder {
        latest: SequenceIndex,
        got: SequenceIndex,
    },
}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::OutOfOrder { latest, got } => {
                write!(f, "record {got} does not follow record {latest}")
            }
        }
    }
}

impl core::error::Error for PushError {}

#[derive(Clone, Debug)]
pub struct RollingWindow {
    records: VecDeque<TelemetryRecord>,
    capacity: usize,
    max_altitude_seen: Option<f32>,
    start_time: Option<f32>,
    /// Highest index ever accepted; survives `clear`.
    last_sequence: Option<SequenceIndex>,
    total_pushed: u64,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RollingWindow {
    /// Creates an empty window. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            max_altitude_seen: None,
            start_time: None,
            last_sequence: None,
            total_pushed: 0,
        }
    }

    /// Appends a record, evicting the oldest one when full.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::OutOfOrder`] and leaves the window untouched when
    /// the record does not advance the sequence. Indices are never reused,
    /// not even after [`RollingWindow::clear`].
    pub fn push(&mut self, record: TelemetryRecord) -> Result<(), PushError> {
        if let Some(latest) = self.last_sequence
            && record.sequence_index <= latest
        {
            tracing::warn!(
                latest,
                got = record.sequence_index,
                "window: refusing out-of-order record"
            );
            return Err(PushError::OutOfOrder {
                latest,
                got: record.sequence_index,
            });
        }

        if self.records.len() == self.capacity {
            self.records.pop_front();
        }

        self.max_altitude_seen = Some(
            self.max_altitude_seen
                .map_or(record.altitude, |seen| seen.max(record.altitude)),
        );
        self.start_time.get_or_insert(record.timestamp);
        self.last_sequence = Some(record.sequence_index);
        self.total_pushed += 1;
        self.records.push_back(record);
        Ok(())
    }

    /// Empties the window and forgets apogee and start time.
    pub fn clear(&mut self) {
        self.records.clear();
        self.max_altitude_seen = None;
        self.start_time = None;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.records.back()
    }

    /// Highest altitude ever pushed since creation or the last clear.
    #[must_use]
    pub const fn apogee(&self) -> Option<f32> {
        self.max_altitude_seen
    }

    #[must_use]
    pub const fn start_time(&self) -> Option<f32> {
        self.start_time
    }

    /// Seconds between the first record ever pushed and the latest one.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        match (self.start_time, self.latest()) {
            (Some(start), Some(latest)) => latest.timestamp - start,
            _ => 0.0,
        }
    }

    /// Records oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TelemetryRecord> + '_ {
        self.records.iter()
    }

    /// Point-in-time copy for readers that must not hold the window.
    #[must_use]
    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            records: self.records.iter().copied().collect(),
            apogee: self.max_altitude_seen,
            elapsed: self.elapsed(),
            capacity: self.capacity,
            total_pushed: self.total_pushed,
        }
    }
}

/// Immutable copy of a [`RollingWindow`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WindowSnapshot {
    /// Oldest first.
    pub records: Vec<TelemetryRecord>,
    pub apogee: Option<f32>,
    pub elapsed: f32,
    pub capacity: usize,
    /// Pushes over the window's lifetime; not reset by `clear`.
    pub total_pushed: u64,
}

impl WindowSnapshot {
    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.records.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Vertical speed in m/s between the two newest records.
    ///
    /// `None` until two records with distinct timestamps are held.
    #[must_use]
    pub fn vertical_speed(&self) -> Option<f32> {
        let [.., previous, latest] = self.records.as_slice() else {
            return None;
        };
        let dt = latest.timestamp - previous.timestamp;
        (dt > 0.0).then(|| (latest.altitude - previous.altitude) / dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Reading;

    fn record(seq: SequenceIndex, altitude: f32) -> TelemetryRecord {
        #[allow(clippy::cast_precision_loss)]
        let timestamp = seq as f32 * 0.1;
        TelemetryRecord::from_reading(Reading::new(0.0, altitude, 15.0), seq, timestamp)
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut window = RollingWindow::new(3);
        for seq in 0..4 {
            window.push(record(seq, 1.0)).unwrap();
        }

        assert_eq!(window.len(), 3);
        let kept: Vec<_> = window.iter().map(|r| r.sequence_index).collect();
        assert_eq!(kept, [1, 2, 3]);
    }

    #[test]
    fn apogee_survives_eviction() {
        let mut window = RollingWindow::new(2);
        window.push(record(0, 500.0)).unwrap();
        window.push(record(1, 100.0)).unwrap();
        window.push(record(2, 50.0)).unwrap();

        assert!(window.iter().all(|r| r.altitude < 500.0));
        assert_eq!(window.apogee(), Some(500.0));
    }

    #[test]
    fn out_of_order_push_is_refused() {
        let mut window = RollingWindow::new(4);
        window.push(record(5, 1.0)).unwrap();

        assert_eq!(
            window.push(record(5, 9.0)),
            Err(PushError::OutOfOrder { latest: 5, got: 5 })
        );
        assert_eq!(window.len(), 1);
        assert_eq!(window.apogee(), Some(1.0));
    }

    #[test]
    fn elapsed_measures_from_first_record_ever() {
        let mut window = RollingWindow::new(1);
        window.push(record(0, 0.0)).unwrap();
        window.push(record(20, 0.0)).unwrap();

        assert_eq!(window.start_time(), Some(0.0));
        assert!((window.elapsed() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn clear_resets_metrics_but_not_lifetime_count() {
        let mut window = RollingWindow::new(4);
        window.push(record(0, 10.0)).unwrap();
        window.clear();

        assert!(window.is_empty());
        assert_eq!(window.apogee(), None);
        assert_eq!(window.start_time(), None);
        assert_eq!(window.snapshot().total_pushed, 1);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut window = RollingWindow::new(0);
        window.push(record(0, 1.0)).unwrap();
        window.push(record(1, 2.0)).unwrap();
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.latest().map(|r| r.sequence_index), Some(1));
    }

    #[test]
    fn snapshot_is_detached_from_the_window() {
        let mut window = RollingWindow::new(4);
        window.push(record(0, 3.0)).unwrap();
        let snapshot = window.snapshot();
        window.push(record(1, 7.0)).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.apogee, Some(3.0));
        assert_eq!(snapshot.capacity, 4);
        assert_eq!(snapshot.vertical_speed(), None);
    }

    #[test]
    fn cleared_window_still_refuses_used_indices() {
        let mut window = RollingWindow::new(4);
        window.push(record(5, 1.0)).unwrap();
        window.clear();

        assert_eq!(
            window.push(record(0, 2.0)),
            Err(PushError::OutOfOrder { latest: 5, got: 0 })
        );
        assert!(window.is_empty());
        window.push(record(6, 2.0)).unwrap();
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn vertical_speed_uses_the_two_newest_records() {
        let mut window = RollingWindow::new(3);
        for (seq, altitude) in [(0, 0.0), (1, 10.0), (2, 30.0)] {
            window.push(record(seq, altitude)).unwrap();
        }

        let speed = window.snapshot().vertical_speed().unwrap();
        assert!((speed - 200.0).abs() < 1e-2);
    }

    #[test]
    fn push_error_names_both_indices() {
        let err = PushError::OutOfOrder { latest: 5, got: 0 };
        assert_eq!(
            alloc::format!("{err}"),
            "record 0 does not follow record 5"
        );
    }
}
