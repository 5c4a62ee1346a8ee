//! Single-line terminal dashboard redrawn once per tick.

use std::fmt::Write as _;
use std::io::{self, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::terminal::{Clear, ClearType};
use telemetry_core::pipeline::TickOutcome;
use telemetry_core::status::StatusLights;

use crate::station::Tick;

pub struct Dashboard<W> {
    out: W,
    max_pressure: f32,
}

impl<W: Write> Dashboard<W> {
    pub const fn new(out: W, max_pressure: f32) -> Self {
        Self { out, max_pressure }
    }

    pub fn render(&mut self, tick: &Tick) -> io::Result<()> {
        let lights = StatusLights::evaluate(
            tick.snapshot.latest().map(|record| record.pressure),
            tick.phase,
            self.max_pressure,
        );

        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(summary_line(tick)),
            Print("  "),
        )?;
        for (label, on) in [
            ("READY", lights.system_ready),
            ("PSI", lights.pressure_ok),
            ("GO", lights.launch_ready),
        ] {
            let styled = if on { label.green() } else { label.red() };
            queue!(self.out, PrintStyledContent(styled), Print(" "))?;
        }
        self.out.flush()
    }

    /// Moves past the dashboard line so later output starts clean.
    pub fn finish(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// Plain-text part of the dashboard line.
pub fn summary_line(tick: &Tick) -> String {
    let snapshot = &tick.snapshot;
    let mut line = String::new();

    if let Some(phase) = tick.phase {
        let _ = write!(line, "[{:<7}] ", phase.label());
    }
    match snapshot.latest() {
        Some(record) => {
            let _ = write!(
                line,
                "alt {:>8.1} m  psi {:>7.1}  temp {:>6.1} C",
                record.altitude, record.pressure, record.temperature
            );
        }
        None => line.push_str("waiting for telemetry"),
    }
    if let Some(speed) = snapshot.vertical_speed() {
        let _ = write!(line, "  vs {speed:+.1} m/s");
    }
    if let Some(apogee) = snapshot.apogee {
        let _ = write!(line, "  apogee {apogee:.1} m");
    }
    let _ = write!(
        line,
        "  t+{:.1}s  rx {} drop {}",
        snapshot.elapsed,
        tick.stats.records_pushed,
        tick.stats.dropped()
    );
    match tick.outcome {
        TickOutcome::Pushed(_) => {}
        TickOutcome::Idle => line.push_str("  (no data)"),
        TickOutcome::Dropped(_) => line.push_str("  (dropped)"),
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_core::record::{Reading, TelemetryRecord};
    use telemetry_core::simulation::SimulationPhase;
    use telemetry_core::stats::LinkStats;
    use telemetry_core::window::RollingWindow;

    fn tick(window: &RollingWindow, phase: Option<SimulationPhase>) -> Tick {
        let outcome = window
            .latest()
            .map_or(TickOutcome::Idle, |record| TickOutcome::Pushed(*record));
        Tick {
            now: window.latest().map_or(0.0, |record| record.timestamp),
            outcome,
            snapshot: window.snapshot(),
            stats: LinkStats {
                records_pushed: u64::try_from(window.len()).expect("small window"),
                ..LinkStats::new()
            },
            phase,
        }
    }

    #[test]
    fn empty_window_reports_waiting() {
        let window = RollingWindow::new(4);
        let line = summary_line(&tick(&window, None));
        assert!(line.starts_with("waiting for telemetry"));
        assert!(line.ends_with("(no data)"));
        assert!(!line.contains("apogee"));
    }

    #[test]
    fn line_shows_latest_values_and_apogee() {
        let mut window = RollingWindow::new(4);
        for (seq, altitude, at) in [(0, 120.0, 0.5), (1, 80.0, 1.0)] {
            let reading = Reading::new(950.0, altitude, 14.2);
            window
                .push(TelemetryRecord::from_reading(reading, seq, at))
                .expect("ordered");
        }

        let line = summary_line(&tick(&window, Some(SimulationPhase::Coast)));
        assert!(line.starts_with("[coast  ]"));
        assert!(line.contains("alt     80.0 m"));
        assert!(line.contains("psi   950.0"));
        assert!(line.contains("vs -80.0 m/s"));
        assert!(line.contains("apogee 120.0 m"));
        assert!(line.contains("rx 2 drop 0"));
        assert!(!line.contains("no data"));
    }

    #[test]
    fn mission_time_starts_at_the_first_record() {
        let mut window = RollingWindow::new(4);
        for (seq, at) in [(0, 12.0), (1, 14.5)] {
            window
                .push(TelemetryRecord::from_reading(
                    Reading::new(10.0, 0.0, 15.0),
                    seq,
                    at,
                ))
                .expect("ordered");
        }

        let line = summary_line(&tick(&window, None));
        assert!(line.contains("t+2.5s"), "{line}");
        assert!(!line.contains("t+14.5s"));
    }

    #[test]
    fn render_writes_one_line_without_newline() {
        let mut window = RollingWindow::new(2);
        window
            .push(TelemetryRecord::from_reading(Reading::new(1.0, 2.0, 3.0), 0, 0.0))
            .expect("ordered");

        let mut dashboard = Dashboard::new(Vec::new(), 1_000.0);
        dashboard.render(&tick(&window, None)).expect("writes to memory");
        let Dashboard { out, .. } = dashboard;
        let text = String::from_utf8(out).expect("utf-8");

        assert!(text.contains("alt"));
        assert!(text.contains("READY"));
        assert!(!text.contains('\n'));
    }
}
