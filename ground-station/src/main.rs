//! Ground station for the rocket telemetry radio link.
//!
//! `monitor` renders a live or simulated flight, `relay` turns a noisy link
//! into canonical CSV lines, and `transmit` plays the vehicle side on a bench.

mod config;
mod display;
mod error;
mod relay;
mod shared;
mod station;
mod transmit;
mod transport;

use std::io;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use telemetry_core::config::{DEFAULT_CADENCE, SourceMode};
use telemetry_core::simulation::{
    DEFAULT_FLIGHT_PROFILE, Jitter, SimulatedSensor, SimulationEngine,
};
use telemetry_core::source::{LiveSource, SimulatedSource, TelemetrySource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{MonitorArgs, RelayArgs, TransmitArgs};
use crate::display::Dashboard;
use crate::error::StationError;
use crate::shared::SharedWindow;
use crate::station::{RunLimit, SessionSummary, Station, Tick};

/// Ticks waiting for the terminal; later ticks are skipped while it is full.
const RENDER_QUEUE_DEPTH: usize = 1;

#[derive(Parser)]
#[command(name = "ground-station", version)]
#[command(about = "Receive, decode and display rocket telemetry")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Verbose logging (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,

    /// Without a subcommand the dashboard runs with these options
    #[command(flatten)]
    monitor: MonitorArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Live dashboard fed by the radio link or the flight simulation
    Monitor(MonitorArgs),
    /// Decode a link and print one canonical line per record
    Relay(RelayArgs),
    /// Send simulated telemetry frames like the vehicle would
    Transmit(TransmitArgs),
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let result = match cli.command {
        Some(Command::Monitor(args)) => monitor(&args),
        Some(Command::Relay(args)) => relay(&args),
        Some(Command::Transmit(args)) => transmit(&args),
        None => monitor(&cli.monitor),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        let code = match err.downcast_ref::<StationError>() {
            Some(StationError::MissingPort | StationError::Config(_)) => 2,
            Some(StationError::OpenPort { .. }) => 3,
            Some(StationError::TransportLost) => 4,
            _ => 1,
        };
        process::exit(code);
    }
}

fn monitor(args: &MonitorArgs) -> Result<()> {
    let config = args.pipeline_config()?;
    let window = SharedWindow::new(config.capacity);
    let limit = RunLimit {
        ticks: None,
        duration: args.run_limit(),
    };
    let (ticks, rendered) = mpsc::sync_channel(RENDER_QUEUE_DEPTH);

    let (scheduler, reader_stop) = match config.mode {
        SourceMode::Simulated => {
            let source = SimulatedSource::new(args.simulation_engine());
            let station = Station::new(source, window.clone(), config.cadence);
            (spawn_station(station, limit, ticks)?, None)
        }
        SourceMode::Live => {
            let reader = transport::open_reader(args.link.port_or_stdio(), args.link.baud)?;
            let stop = Arc::new(AtomicBool::new(false));
            let (frames, _reader) =
                transport::spawn_reader(reader, transport::FRAME_QUEUE_DEPTH, Arc::clone(&stop))?;
            let source = LiveSource::new(frames, config.format);
            let station = Station::new(source, window.clone(), config.cadence);
            (spawn_station(station, limit, ticks)?, Some(stop))
        }
    };

    let mut dashboard = Dashboard::new(io::stdout().lock(), DEFAULT_FLIGHT_PROFILE.max_pressure);
    for tick in rendered {
        dashboard.render(&tick)?;
    }
    dashboard.finish()?;

    // The reader may be blocked in a read; it exits on its next timeout.
    if let Some(stop) = reader_stop {
        stop.store(true, Ordering::Relaxed);
    }

    let summary = scheduler
        .join()
        .map_err(|_| anyhow!("scheduler thread panicked"))??;
    let snapshot = window.snapshot();
    tracing::info!(
        ticks = summary.ticks,
        pushed = summary.stats.records_pushed,
        idle = summary.stats.idle_ticks,
        apogee = snapshot.apogee,
        end = ?summary.end,
        "monitor: done"
    );
    Ok(())
}

fn spawn_station<S>(
    mut station: Station<S>,
    limit: RunLimit,
    ticks: SyncSender<Tick>,
) -> io::Result<JoinHandle<Result<SessionSummary, StationError>>>
where
    S: TelemetrySource + Send + 'static,
{
    thread::Builder::new()
        .name("scheduler".into())
        .spawn(move || {
            let stop = station.stop_handle();
            station.run(limit, |tick| {
                // The renderer went away; finish the session quietly.
                if !forward(&ticks, tick) {
                    stop.store(true, Ordering::Relaxed);
                }
            })
        })
}

/// Hands a tick to the renderer without blocking the scheduler.
///
/// A tick is skipped while the renderer is still busy with an earlier one.
/// Returns `false` once the renderer is gone.
fn forward(ticks: &SyncSender<Tick>, tick: &Tick) -> bool {
    match ticks.try_send(tick.clone()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::trace!(at = tick.now, "monitor: render busy, tick skipped");
            true
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

fn relay(args: &RelayArgs) -> Result<()> {
    let port = args.link.port_or_stdio();
    let input = transport::open_reader(port, args.link.baud)?;
    let stats = relay::relay(input, io::stdout().lock(), args.format.into())
        .with_context(|| format!("relaying from {port}"))?;

    tracing::info!(
        records = stats.records_pushed,
        malformed_frames = stats.malformed_frames,
        malformed_records = stats.malformed_records,
        raw = stats.raw_values,
        "relay: end of stream"
    );
    Ok(())
}

fn transmit(args: &TransmitArgs) -> Result<()> {
    let port = args.link.port_or_stdio();
    let out = transport::open_writer(port, args.link.baud)?;

    let cadence = Duration::from_millis(args.cadence_ms);
    let step = if cadence.is_zero() {
        DEFAULT_CADENCE
    } else {
        cadence
    };
    let mut engine = SimulationEngine::new(DEFAULT_FLIGHT_PROFILE);
    if args.jitter {
        engine = engine.with_jitter(Jitter::DEMO);
    }
    let mut sensor = SimulatedSensor::new(engine, step.as_secs_f32());

    let sent = transmit::transmit(out, &mut sensor, args.format.into(), cadence, args.frames)
        .with_context(|| format!("transmitting to {port}"))?;
    tracing::info!(sent, "transmit: done");
    Ok(())
}
