//! Rolling window shared between the scheduler and its readers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use telemetry_core::record::TelemetryRecord;
use telemetry_core::window::{PushError, RollingWindow, WindowSnapshot};

/// Cloneable handle to one [`RollingWindow`].
///
/// Every method holds the lock only for the push or the copy. A poisoned lock
/// is recovered because the window is consistent after every completed push.
#[derive(Clone, Debug)]
pub struct SharedWindow {
    inner: Arc<Mutex<RollingWindow>>,
}

impl SharedWindow {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RollingWindow::new(capacity))),
        }
    }

    pub fn push(&self, record: TelemetryRecord) -> Result<(), PushError> {
        self.lock().push(record)
    }

    #[must_use]
    pub fn snapshot(&self) -> WindowSnapshot {
        self.lock().snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, RollingWindow> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
