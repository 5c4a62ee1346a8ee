//! Pipeline configuration.

use core::fmt;
use core::time::Duration;

use crate::wire::FormatSelection;

/// Records retained by the rolling window.
pub const DEFAULT_CAPACITY: usize = 100;

/// Interval between ingestion ticks.
pub const DEFAULT_CADENCE: Duration = Duration::from_millis(100);

/// Where records come from. Exactly one source is active per pipeline.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SourceMode {
    /// Frames decoded from a radio link.
    Live,
    /// Deterministic flight simulation.
    #[default]
    Simulated,
}

impl SourceMode {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            SourceMode::Live => "live",
            SourceMode::Simulated => "simulated",
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PipelineConfig {
    pub capacity: usize,
    pub cadence: Duration,
    pub mode: SourceMode,
    pub format: FormatSelection,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            cadence: DEFAULT_CADENCE,
            mode: SourceMode::default(),
            format: FormatSelection::default(),
        }
    }
}

impl PipelineConfig {
    /// Checks the values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero capacity or a zero cadence.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.cadence.is_zero() {
            return Err(ConfigError::ZeroCadence);
        }
        Ok(())
    }

    /// Cadence as fractional seconds, the unit of record timestamps.
    #[must_use]
    pub fn cadence_secs(&self) -> f32 {
        self.cadence.as_secs_f32()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    ZeroCapacity,
    ZeroCadence,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCapacity => f.write_str("window capacity must be at least 1"),
            ConfigError::ZeroCadence => f.write_str("tick cadence must be non-zero"),
        }
    }
}

impl core::error::Error for ConfigError {}
