//! Bench transmitter: framed simulated readings for exercising a receiver.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use telemetry_core::simulation::{SimulatedSensor, SimulationPhase};
use telemetry_core::source::SensorDriver;
use telemetry_core::wire::{WireFormat, encode_frame};

/// Writes one frame per cadence until `frames` are sent or the flight lands.
///
/// A zero cadence sends as fast as the writer accepts.
pub fn transmit<W: Write>(
    mut out: W,
    sensor: &mut SimulatedSensor,
    format: WireFormat,
    cadence: Duration,
    frames: Option<u64>,
) -> io::Result<u64> {
    let mut sent = 0u64;

    while frames.is_none_or(|limit| sent < limit) {
        let reading = match sensor.read() {
            Ok(reading) => reading,
            Err(err) => {
                tracing::warn!(%err, "transmit: sensor read failed");
                continue;
            }
        };

        match encode_frame(&reading, format) {
            Ok(frame) => {
                out.write_all(frame.as_bytes())?;
                out.write_all(b"\n")?;
                out.flush()?;
                sent += 1;
            }
            Err(err) => tracing::warn!(%err, "transmit: reading does not fit a frame"),
        }

        if frames.is_none() && sensor.phase() == SimulationPhase::Landed {
            tracing::info!(sent, "transmit: flight landed");
            break;
        }
        if !cadence.is_zero() {
            thread::sleep(cadence);
        }
    }

    Ok(sent)
}
