//! Decodes a link and re-emits every valid record as a canonical line.

use std::io::{self, Read, Write};

use telemetry_core::fields::{Message, parse_frame};
use telemetry_core::framing::{FrameDecoder, MAX_FRAME_LEN};
use telemetry_core::source::TelemetryError;
use telemetry_core::stats::LinkStats;
use telemetry_core::wire::FormatSelection;

/// Copies `input` to `output` until end of stream, one line per record.
///
/// Malformed frames and records are counted and skipped. Read timeouts from a
/// serial port only mean the link is quiet.
pub fn relay<R: Read, W: Write>(
    mut input: R,
    mut output: W,
    format: FormatSelection,
) -> io::Result<LinkStats> {
    let mut decoder = FrameDecoder::<MAX_FRAME_LEN>::new();
    let mut stats = LinkStats::new();
    let mut chunk = [0u8; 512];

    loop {
        let count = match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                ) =>
            {
                continue;
            }
            Err(err) => return Err(err),
        };

        for result in decoder.decode(&chunk[..count]) {
            let parsed = result
                .map_err(TelemetryError::from)
                .and_then(|frame| parse_frame(&frame, format).map_err(TelemetryError::from));
            match parsed {
                Ok(Message::Reading(reading)) => {
                    writeln!(output, "{}", reading.canonical())?;
                    stats.records_pushed += 1;
                }
                Ok(Message::Raw(_)) => stats.raw_values += 1,
                Err(err) => {
                    tracing::debug!(%err, "relay: skipping frame");
                    stats.record_error(&err);
                }
            }
        }
        output.flush()?;
    }

    decoder.reset();
    Ok(stats)
}
