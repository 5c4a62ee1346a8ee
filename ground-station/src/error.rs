//! Errors that end a ground-station session.

use telemetry_core::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StationError {
    #[error("cannot open serial port {port}: {source}")]
    OpenPort {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("live mode needs a port (use `-` for stdin)")]
    MissingPort,

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("telemetry link lost")]
    TransportLost,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<telemetry_core::source::TransportLost> for StationError {
    fn from(_: telemetry_core::source::TransportLost) -> Self {
        StationError::TransportLost
    }
}
