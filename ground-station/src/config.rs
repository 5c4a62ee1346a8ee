//! Command-line options shared by the subcommands.

use std::time::Duration;

use clap::{Args, ValueEnum};
use telemetry_core::config::{PipelineConfig, SourceMode};
use telemetry_core::simulation::{DEFAULT_FLIGHT_PROFILE, Jitter, SimulationEngine};
use telemetry_core::wire::{DEFAULT_BAUD, FormatSelection, WireFormat};

use crate::error::StationError;

/// Port name that reads the link from stdin instead of a serial device.
pub const STDIN_PORT: &str = "-";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ModeArg {
    Live,
    Simulated,
}

impl From<ModeArg> for SourceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Live => SourceMode::Live,
            ModeArg::Simulated => SourceMode::Simulated,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum FormatArg {
    /// Pick the variant from the exact field count.
    Auto,
    /// pressure,altitude,temperature,latitude,longitude
    Full,
    /// altitude,pressure,temperature
    Compact,
    /// single raw value
    Raw,
}

impl From<FormatArg> for FormatSelection {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Auto => FormatSelection::Auto,
            FormatArg::Full => FormatSelection::Fixed(WireFormat::Full),
            FormatArg::Compact => FormatSelection::Fixed(WireFormat::Compact),
            FormatArg::Raw => FormatSelection::Fixed(WireFormat::Raw),
        }
    }
}

/// Serial link selection.
#[derive(Args, Clone, Debug)]
pub struct LinkArgs {
    /// Serial device, or `-` for stdin
    #[arg(short, long)]
    pub port: Option<String>,

    /// Line rate of the radio modem
    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,
}

/// Options of the `monitor` subcommand.
#[derive(Args, Clone, Debug)]
pub struct MonitorArgs {
    /// Record source; defaults to live when a port is given
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    #[command(flatten)]
    pub link: LinkArgs,

    /// Wire field layout of the transmitter
    #[arg(short, long, value_enum, default_value_t = FormatArg::Auto)]
    pub format: FormatArg,

    /// Records kept in the rolling window
    #[arg(short, long, default_value_t = telemetry_core::config::DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// Tick period in milliseconds
    #[arg(long, default_value_t = 100)]
    pub cadence_ms: u64,

    /// Add bounded noise to simulated readings
    #[arg(long)]
    pub jitter: bool,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<f32>,

    /// Seconds the simulated vehicle waits on the pad before launching
    #[arg(long)]
    pub hold: Option<f32>,
}

impl MonitorArgs {
    #[must_use]
    pub fn source_mode(&self) -> SourceMode {
        match (self.mode, &self.link.port) {
            (Some(mode), _) => mode.into(),
            (None, Some(_)) => SourceMode::Live,
            (None, None) => SourceMode::Simulated,
        }
    }

    /// Builds and validates the pipeline configuration.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, StationError> {
        let config = PipelineConfig {
            capacity: self.capacity,
            cadence: Duration::from_millis(self.cadence_ms),
            mode: self.source_mode(),
            format: self.format.into(),
        };
        config.validate()?;
        if config.mode == SourceMode::Live && self.link.port.is_none() {
            return Err(StationError::MissingPort);
        }
        Ok(config)
    }

    #[must_use]
    pub fn jitter(&self) -> Option<Jitter> {
        self.jitter.then_some(Jitter::DEMO)
    }

    /// Simulation engine for the simulated mode, on the pad when a hold is set.
    #[must_use]
    pub fn simulation_engine(&self) -> SimulationEngine {
        let engine = match self.hold.filter(|secs| secs.is_finite() && *secs > 0.0) {
            Some(hold) => SimulationEngine::on_pad(DEFAULT_FLIGHT_PROFILE).with_launch_at(hold),
            None => SimulationEngine::new(DEFAULT_FLIGHT_PROFILE),
        };
        match self.jitter() {
            Some(jitter) => engine.with_jitter(jitter),
            None => engine,
        }
    }

    /// Run limit, ignoring non-positive or non-finite values.
    #[must_use]
    pub fn run_limit(&self) -> Option<Duration> {
        self.duration
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f32)
    }
}

/// Options of the `relay` subcommand.
#[derive(Args, Clone, Debug)]
pub struct RelayArgs {
    #[command(flatten)]
    pub link: LinkArgs,

    /// Wire field layout of the transmitter
    #[arg(short, long, value_enum, default_value_t = FormatArg::Auto)]
    pub format: FormatArg,
}

/// Options of the `transmit` subcommand.
#[derive(Args, Clone, Debug)]
pub struct TransmitArgs {
    #[command(flatten)]
    pub link: LinkArgs,

    /// Field layout to send
    #[arg(short, long, value_enum, default_value_t = TransmitFormat::Compact)]
    pub format: TransmitFormat,

    /// Milliseconds between frames; 0 sends as fast as possible
    #[arg(long, default_value_t = 100)]
    pub cadence_ms: u64,

    /// Add bounded noise to the readings
    #[arg(long)]
    pub jitter: bool,

    /// Frames to send; by default the whole flight until landing
    #[arg(short = 'n', long)]
    pub frames: Option<u64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum TransmitFormat {
    Full,
    Compact,
    Raw,
}

impl From<TransmitFormat> for WireFormat {
    fn from(format: TransmitFormat) -> Self {
        match format {
            TransmitFormat::Full => WireFormat::Full,
            TransmitFormat::Compact => WireFormat::Compact,
            TransmitFormat::Raw => WireFormat::Raw,
        }
    }
}

impl LinkArgs {
    /// The configured port, falling back to the standard streams.
    #[must_use]
    pub fn port_or_stdio(&self) -> &str {
        self.port.as_deref().unwrap_or(STDIN_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        monitor: MonitorArgs,
    }

    fn parse(args: &[&str]) -> MonitorArgs {
        let argv = std::iter::once("monitor").chain(args.iter().copied());
        Harness::try_parse_from(argv).expect("arguments parse").monitor
    }

    #[test]
    fn defaults_select_simulation() {
        let args = parse(&[]);
        let config = args.pipeline_config().expect("defaults are valid");

        assert_eq!(config.mode, SourceMode::Simulated);
        assert_eq!(config.capacity, 100);
        assert_eq!(config.cadence, Duration::from_millis(100));
        assert_eq!(args.link.baud, 9_600);
        assert_eq!(args.jitter(), None);
    }

    #[test]
    fn port_implies_live_mode() {
        let args = parse(&["--port", "/dev/ttyUSB0", "--format", "compact"]);
        let config = args.pipeline_config().expect("port is set");

        assert_eq!(config.mode, SourceMode::Live);
        assert_eq!(config.format, FormatSelection::Fixed(WireFormat::Compact));
    }

    #[test]
    fn live_mode_without_port_is_rejected() {
        let args = parse(&["--mode", "live"]);
        assert!(matches!(
            args.pipeline_config(),
            Err(StationError::MissingPort)
        ));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let args = parse(&["--capacity", "0"]);
        assert!(matches!(
            args.pipeline_config(),
            Err(StationError::Config(_))
        ));
    }

    #[test]
    fn run_limit_ignores_nonsense() {
        assert_eq!(parse(&["--duration", "0"]).run_limit(), None);
        assert_eq!(
            parse(&["--duration", "2.5"]).run_limit(),
            Some(Duration::from_millis(2_500))
        );
    }

    #[test]
    fn hold_starts_the_simulation_on_the_pad() {
        use telemetry_core::simulation::SimulationPhase;

        let mut engine = parse(&["--hold", "3"]).simulation_engine();
        assert_eq!(engine.sample(0.0).phase, SimulationPhase::Pad);
        assert_eq!(engine.sample(3.0).phase, SimulationPhase::Boost);

        let mut immediate = parse(&[]).simulation_engine();
        assert_eq!(immediate.sample(0.0).phase, SimulationPhase::Boost);
    }
}
