//! Deterministic flight simulation used when no live link is attached.
//!
//! Every quantity is a closed-form function of flight time, so two runs fed
//! the same sample times produce identical telemetry. The phase machine is
//! time-triggered: boost and coast end at fixed offsets from launch, and
//! descent ends once altitude reaches the landing threshold. Optional jitter
//! is derived from a hash of the sample time and stays bounded.
//!
//! An engine may also start on the pad, where it idles at low tank pressure
//! until [`SimulationEngine::launch`] or a scheduled launch time. Aborting a
//! flight returns it to the pad.

use core::fmt;

use crate::record::Reading;
use crate::source::{SensorDriver, SensorError};

/// Temperature drop per meter of altitude (ISA troposphere).
pub const ISA_LAPSE_RATE: f32 = 0.0065;

/// Flight phases reported by the simulation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SimulationPhase {
    /// Waiting on the pad before launch.
    Pad,
    Boost,
    Coast,
    Descent,
    Landed,
}

impl SimulationPhase {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            SimulationPhase::Pad => "pad",
            SimulationPhase::Boost => "boost",
            SimulationPhase::Coast => "coast",
            SimulationPhase::Descent => "descent",
            SimulationPhase::Landed => "landed",
        }
    }

    /// Returns `true` between launch and landing.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        !matches!(self, SimulationPhase::Pad | SimulationPhase::Landed)
    }
}

impl fmt::Display for SimulationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shape of the simulated flight.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlightProfile {
    /// Seconds of powered flight.
    pub boost_duration: f32,
    /// Seconds of unpowered ascent after burnout.
    pub coast_duration: f32,
    /// Upward acceleration during boost (m/s²).
    pub boost_acceleration: f32,
    /// Deceleration during coast (m/s²).
    pub coast_deceleration: f32,
    /// Descent rate under the recovery system (m/s).
    pub descent_rate: f32,
    /// Altitude at or below which the vehicle counts as landed (m).
    pub landing_threshold: f32,
    /// Chamber pressure at ignition (PSI).
    pub ignition_pressure: f32,
    /// Pressure rise during boost (PSI/s).
    pub pressure_ramp: f32,
    /// Pressure bleed-down after burnout (PSI/s).
    pub pressure_decay: f32,
    /// Rated maximum pressure; the boost ramp saturates here (PSI).
    pub max_pressure: f32,
    /// Temperature at ground level (°C).
    pub ground_temperature: f32,
    /// Upper bound of tank pressure while waiting on the pad (PSI).
    pub pad_pressure: f32,
}

/// Default profile: 5 s boost, 10 s coast, apogee 2812.5 m, touchdown near 37.5 s.
pub const DEFAULT_FLIGHT_PROFILE: FlightProfile = FlightProfile {
    boost_duration: 5.0,
    coast_duration: 10.0,
    boost_acceleration: 100.0,
    coast_deceleration: 80.0,
    descent_rate: 100.0,
    landing_threshold: 1.0,
    ignition_pressure: 200.0,
    pressure_ramp: 150.0,
    pressure_decay: 100.0,
    max_pressure: 1_000.0,
    ground_temperature: 15.0,
    pad_pressure: 50.0,
};

impl Default for FlightProfile {
    fn default() -> Self {
        DEFAULT_FLIGHT_PROFILE
    }
}

impl FlightProfile {
    /// Flight time at which coast begins.
    #[must_use]
    pub fn coast_start(&self) -> f32 {
        self.boost_duration
    }

    /// Flight time at which descent begins.
    #[must_use]
    pub fn descent_start(&self) -> f32 {
        self.boost_duration + self.coast_duration
    }

    /// Flight time at which altitude reaches the landing threshold.
    #[must_use]
    pub fn landing_time(&self) -> f32 {
        let drop = (self.coast_altitude(self.coast_duration) - self.landing_threshold).max(0.0);
        self.descent_start() + drop / self.descent_rate
    }

    /// Phase for a flight time. Phase boundaries belong to the later phase.
    #[must_use]
    pub fn phase_at(&self, flight_time: f32) -> SimulationPhase {
        if flight_time < self.coast_start() {
            SimulationPhase::Boost
        } else if flight_time < self.descent_start() {
            SimulationPhase::Coast
        } else if self.altitude_at(flight_time) > self.landing_threshold {
            SimulationPhase::Descent
        } else {
            SimulationPhase::Landed
        }
    }

    /// Phase entry time, relative to launch. The pad precedes launch and
    /// reports zero.
    #[must_use]
    pub fn phase_start(&self, phase: SimulationPhase) -> f32 {
        match phase {
            SimulationPhase::Pad | SimulationPhase::Boost => 0.0,
            SimulationPhase::Coast => self.coast_start(),
            SimulationPhase::Descent => self.descent_start(),
            SimulationPhase::Landed => self.landing_time(),
        }
    }

    /// Altitude in meters.
    #[must_use]
    pub fn altitude_at(&self, flight_time: f32) -> f32 {
        let t = flight_time.max(0.0);
        if t < self.coast_start() {
            0.5 * self.boost_acceleration * t * t
        } else if t < self.descent_start() {
            self.coast_altitude(t - self.coast_start())
        } else {
            let fallen = self.descent_rate * (t - self.descent_start());
            (self.coast_altitude(self.coast_duration) - fallen).max(0.0)
        }
    }

    /// Chamber pressure in PSI.
    #[must_use]
    pub fn pressure_at(&self, flight_time: f32) -> f32 {
        let t = flight_time.max(0.0);
        if t < self.coast_start() {
            self.boost_pressure(t)
        } else if t < self.descent_start() {
            let since_burnout = t - self.coast_start();
            (self.boost_pressure(self.boost_duration) - self.pressure_decay * since_burnout)
                .max(0.0)
        } else {
            0.0
        }
    }

    /// Air temperature at an altitude.
    #[must_use]
    pub fn temperature_at(&self, altitude: f32) -> f32 {
        self.ground_temperature - ISA_LAPSE_RATE * altitude
    }

    fn boost_pressure(&self, t: f32) -> f32 {
        (self.ignition_pressure + self.pressure_ramp * t).min(self.max_pressure)
    }

    /// Altitude `since_burnout` seconds into coast; continuous with boost.
    fn coast_altitude(&self, since_burnout: f32) -> f32 {
        let burnout_altitude =
            0.5 * self.boost_acceleration * self.boost_duration * self.boost_duration;
        let burnout_velocity = self.boost_acceleration * self.boost_duration;
        let altitude = burnout_altitude + burnout_velocity * since_burnout
            - 0.5 * self.coast_deceleration * since_burnout * since_burnout;
        altitude.max(0.0)
    }
}

/// Bounded noise amplitudes layered over the deterministic profile.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Jitter {
    pub pressure: f32,
    pub altitude: f32,
    pub temperature: f32,
}

impl Jitter {
    /// Small, realistic defaults for dashboard demos.
    pub const DEMO: Self = Self {
        pressure: 5.0,
        altitude: 2.0,
        temperature: 0.2,
    };

    fn apply(&self, flight_time: f32, reading: Reading) -> Reading {
        let key = u64::from(flight_time.to_bits());
        Reading::new(
            (reading.pressure + self.pressure * unit_noise(key, 1)).max(0.0),
            (reading.altitude + self.altitude * unit_noise(key, 2)).max(0.0),
            reading.temperature + self.temperature * unit_noise(key, 3),
        )
    }
}

/// Maps `(key, channel)` to a value in `[-1, 1]` with a splitmix64 finalizer.
fn unit_noise(key: u64, channel: u64) -> f32 {
    let mut z = key ^ channel.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;

    let bits = u16::try_from(z >> 48).unwrap_or(u16::MAX);
    f32::from(bits) / f32::from(u16::MAX) * 2.0 - 1.0
}

/// One simulated sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimulatedSample {
    pub phase: SimulationPhase,
    /// Seconds since launch (or the last reset); zero on the pad.
    pub flight_time: f32,
    pub reading: Reading,
}

/// Phase machine producing synthetic telemetry.
#[derive(Clone, Debug)]
pub struct SimulationEngine {
    profile: FlightProfile,
    jitter: Option<Jitter>,
    launched_at: Option<f32>,
    scheduled_launch: Option<f32>,
    phase: SimulationPhase,
    phase_entered_at: f32,
}

impl SimulationEngine {
    /// Creates an engine launching at pipeline time zero.
    #[must_use]
    pub const fn new(profile: FlightProfile) -> Self {
        Self {
            profile,
            jitter: None,
            launched_at: Some(0.0),
            scheduled_launch: None,
            phase: SimulationPhase::Boost,
            phase_entered_at: 0.0,
        }
    }

    /// Creates an engine waiting on the pad.
    #[must_use]
    pub const fn on_pad(profile: FlightProfile) -> Self {
        Self {
            profile,
            jitter: None,
            launched_at: None,
            scheduled_launch: None,
            phase: SimulationPhase::Pad,
            phase_entered_at: 0.0,
        }
    }

    /// Launches automatically once a sample reaches pipeline time `at`.
    #[must_use]
    pub const fn with_launch_at(mut self, at: f32) -> Self {
        self.scheduled_launch = Some(at);
        self
    }

    #[must_use]
    pub const fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = Some(jitter);
        self
    }

    #[must_use]
    pub const fn profile(&self) -> &FlightProfile {
        &self.profile
    }

    /// Phase observed by the last sample.
    #[must_use]
    pub const fn phase(&self) -> SimulationPhase {
        self.phase
    }

    /// Pipeline time at which the current phase began.
    #[must_use]
    pub const fn phase_entered_at(&self) -> f32 {
        self.phase_entered_at
    }

    /// Pipeline time of the current launch, if launched.
    #[must_use]
    pub const fn launched_at(&self) -> Option<f32> {
        self.launched_at
    }

    /// Leaves the pad at pipeline time `now`.
    ///
    /// Returns `false` and changes nothing unless the engine is on the pad.
    pub fn launch(&mut self, now: f32) -> bool {
        if self.phase != SimulationPhase::Pad {
            tracing::warn!(phase = self.phase.label(), "simulation: launch ignored");
            return false;
        }
        tracing::info!(at = now, "simulation: launch");
        self.launched_at = Some(now);
        self.scheduled_launch = None;
        self.phase = SimulationPhase::Boost;
        self.phase_entered_at = now;
        true
    }

    /// Cuts a flight short and returns to the pad at pipeline time `now`.
    ///
    /// Returns `false` and changes nothing unless the vehicle is in flight.
    pub fn abort(&mut self, now: f32) -> bool {
        if !self.phase.is_in_flight() {
            return false;
        }
        tracing::warn!(from = self.phase.label(), at = now, "simulation: launch aborted");
        self.launched_at = None;
        self.scheduled_launch = None;
        self.phase = SimulationPhase::Pad;
        self.phase_entered_at = now;
        true
    }

    /// Re-enters boost with launch at pipeline time `now`.
    pub fn reset(&mut self, now: f32) {
        tracing::info!(from = self.phase.label(), at = now, "simulation: reset to boost");
        self.launched_at = Some(now);
        self.scheduled_launch = None;
        self.phase = SimulationPhase::Boost;
        self.phase_entered_at = now;
    }

    /// Samples the flight at pipeline time `now`.
    pub fn sample(&mut self, now: f32) -> SimulatedSample {
        if self.phase == SimulationPhase::Pad
            && let Some(at) = self.scheduled_launch
            && now >= at
        {
            self.launch(at);
        }
        let Some(launched_at) = self.launched_at else {
            return self.pad_sample(now);
        };

        let flight_time = (now - launched_at).max(0.0);
        let phase = if self.phase == SimulationPhase::Landed {
            SimulationPhase::Landed
        } else {
            self.profile.phase_at(flight_time)
        };

        if phase != self.phase {
            self.phase_entered_at = launched_at + self.profile.phase_start(phase);
            tracing::info!(
                from = self.phase.label(),
                to = phase.label(),
                at = self.phase_entered_at,
                "simulation: phase transition"
            );
            self.phase = phase;
        }

        let reading = if phase == SimulationPhase::Landed {
            Reading::new(0.0, 0.0, self.profile.ground_temperature)
        } else {
            let altitude = self.profile.altitude_at(flight_time);
            let nominal = Reading::new(
                self.profile.pressure_at(flight_time),
                altitude,
                self.profile.temperature_at(altitude),
            );
            match self.jitter {
                Some(jitter) => jitter.apply(flight_time, nominal),
                None => nominal,
            }
        };

        SimulatedSample {
            phase,
            flight_time,
            reading,
        }
    }

    /// Idle pad telemetry: bounded tank pressure at ground level.
    fn pad_sample(&self, now: f32) -> SimulatedSample {
        let level = (unit_noise(u64::from(now.to_bits()), 4) + 1.0) * 0.5;
        SimulatedSample {
            phase: SimulationPhase::Pad,
            flight_time: 0.0,
            reading: Reading::new(
                self.profile.pad_pressure * level,
                0.0,
                self.profile.ground_temperature,
            ),
        }
    }

    /// Infinite sample stream starting at `start`, spaced `cadence` seconds apart.
    pub fn samples(&mut self, start: f32, cadence: f32) -> Samples<'_> {
        Samples {
            engine: self,
            next_at: start,
            cadence,
        }
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_FLIGHT_PROFILE)
    }
}

/// Iterator returned by [`SimulationEngine::samples`].
pub struct Samples<'a> {
    engine: &'a mut SimulationEngine,
    next_at: f32,
    cadence: f32,
}

impl Iterator for Samples<'_> {
    type Item = SimulatedSample;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.engine.sample(self.next_at);
        self.next_at += self.cadence;
        Some(sample)
    }
}

/// Sensor driver backed by the simulation, advancing its own clock per read.
///
/// Used by the bench transmitter in place of real hardware.
#[derive(Clone, Debug)]
pub struct SimulatedSensor {
    engine: SimulationEngine,
    clock: f32,
    step: f32,
}

impl SimulatedSensor {
    #[must_use]
    pub const fn new(engine: SimulationEngine, step: f32) -> Self {
        Self {
            engine,
            clock: 0.0,
            step,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> SimulationPhase {
        self.engine.phase()
    }
}

impl SensorDriver for SimulatedSensor {
    fn read(&mut self) -> Result<Reading, SensorError> {
        let sample = self.engine.sample(self.clock);
        self.clock += self.step;
        Ok(sample.reading)
    }
}
