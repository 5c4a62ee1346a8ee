//! Dashboard indicator lights derived from the latest telemetry.

use crate::simulation::SimulationPhase;

/// Fraction of rated pressure below which the tank reads as healthy.
pub const PRESSURE_OK_RATIO: f32 = 0.8;
/// Fraction of rated pressure below which the pad is safe to arm.
pub const LAUNCH_SAFE_RATIO: f32 = 0.1;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct StatusLights {
    /// Nothing is in flight.
    pub system_ready: bool,
    /// Latest pressure is under 80 % of the rating.
    pub pressure_ok: bool,
    /// Ready and pressure is under 10 % of the rating.
    pub launch_ready: bool,
}

impl StatusLights {
    /// Evaluates the lights.
    ///
    /// `pressure` is the latest reading (none yet counts as zero) and `phase`
    /// the flight phase when known. Live links carry no phase and count as
    /// grounded.
    #[must_use]
    pub fn evaluate(
        pressure: Option<f32>,
        phase: Option<SimulationPhase>,
        max_pressure: f32,
    ) -> Self {
        let pressure = pressure.unwrap_or(0.0);
        let system_ready = !phase.is_some_and(SimulationPhase::is_in_flight);
        Self {
            system_ready,
            pressure_ok: pressure < max_pressure * PRESSURE_OK_RATIO,
            launch_ready: system_ready && pressure < max_pressure * LAUNCH_SAFE_RATIO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_pad_is_ready_to_launch() {
        let lights = StatusLights::evaluate(None, None, 1_000.0);
        assert_eq!(
            lights,
            StatusLights {
                system_ready: true,
                pressure_ok: true,
                launch_ready: true
            }
        );
    }

    #[test]
    fn boost_pressure_trips_the_lights() {
        let lights = StatusLights::evaluate(Some(950.0), Some(SimulationPhase::Boost), 1_000.0);
        assert!(!lights.system_ready);
        assert!(!lights.pressure_ok);
        assert!(!lights.launch_ready);
    }

    #[test]
    fn idle_pad_pressure_is_go() {
        let lights = StatusLights::evaluate(Some(42.0), Some(SimulationPhase::Pad), 1_000.0);
        assert!(lights.system_ready);
        assert!(lights.launch_ready);
    }

    #[test]
    fn residual_pressure_blocks_launch_after_landing() {
        let lights = StatusLights::evaluate(Some(150.0), Some(SimulationPhase::Landed), 1_000.0);
        assert!(lights.system_ready);
        assert!(lights.pressure_ok);
        assert!(!lights.launch_ready);
    }
}
