//! Canonical telemetry types shared by every source.

use core::fmt;

/// Latitude/longitude pair carried by the full wire format.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GeoFix {
    pub latitude: f32,
    pub longitude: f32,
}

/// One complete measurement in canonical field order.
///
/// Produced by the field parser, the simulation engine or a sensor driver.
/// Sequence index and timestamp are assigned later, at ingestion.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Reading {
    /// Pressure in PSI.
    pub pressure: f32,
    /// Altitude in meters.
    pub altitude: f32,
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    pub position: Option<GeoFix>,
}

impl Reading {
    #[must_use]
    pub const fn new(pressure: f32, altitude: f32, temperature: f32) -> Self {
        Self {
            pressure,
            altitude,
            temperature,
            position: None,
        }
    }

    #[must_use]
    pub const fn with_position(mut self, position: GeoFix) -> Self {
        self.position = Some(position);
        self
    }

    /// Returns `true` when every measurement is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        let position_finite = self
            .position
            .is_none_or(|fix| fix.latitude.is_finite() && fix.longitude.is_finite());
        self.pressure.is_finite()
            && self.altitude.is_finite()
            && self.temperature.is_finite()
            && position_finite
    }

    /// Re-emission view: `pressure,altitude,temperature` with two decimals.
    #[must_use]
    pub const fn canonical(&self) -> CanonicalFields<'_> {
        CanonicalFields(self)
    }
}

/// Display adapter produced by [`Reading::canonical`].
pub struct CanonicalFields<'a>(&'a Reading);

impl fmt::Display for CanonicalFields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2},{:.2},{:.2}",
            self.0.pressure, self.0.altitude, self.0.temperature
        )
    }
}

/// Monotonic record identifier assigned at ingestion.
pub type SequenceIndex = u64;

/// Record stored in the rolling window.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TelemetryRecord {
    pub sequence_index: SequenceIndex,
    /// Seconds since pipeline start.
    pub timestamp: f32,
    pub pressure: f32,
    pub altitude: f32,
    pub temperature: f32,
    pub position: Option<GeoFix>,
}

impl TelemetryRecord {
    #[must_use]
    pub const fn from_reading(
        reading: Reading,
        sequence_index: SequenceIndex,
        timestamp: f32,
    ) -> Self {
        Self {
            sequence_index,
            timestamp,
            pressure: reading.pressure,
            altitude: reading.altitude,
            temperature: reading.temperature,
            position: reading.position,
        }
    }

    /// Measurements without the ingestion metadata.
    #[must_use]
    pub const fn reading(&self) -> Reading {
        Reading {
            pressure: self.pressure,
            altitude: self.altitude,
            temperature: self.temperature,
            position: self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn canonical_line_uses_two_decimals() {
        let reading = Reading::new(200.0, 100.0, 20.0);
        assert_eq!(format!("{}", reading.canonical()), "200.00,100.00,20.00");

        let negative = Reading::new(0.126, -3.0, -40.456);
        assert_eq!(format!("{}", negative.canonical()), "0.13,-3.00,-40.46");
    }

    #[test]
    fn record_keeps_reading_fields() {
        let fix = GeoFix {
            latitude: 32.99,
            longitude: -106.97,
        };
        let reading = Reading::new(950.0, 1250.0, 6.9).with_position(fix);
        let record = TelemetryRecord::from_reading(reading, 7, 5.0);

        assert_eq!(record.sequence_index, 7);
        assert_eq!(record.reading(), reading);
        assert_eq!(record.position, Some(fix));
    }

    #[test]
    fn non_finite_values_are_detected() {
        assert!(Reading::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Reading::new(f32::NAN, 2.0, 3.0).is_finite());
        let bad_fix = GeoFix {
            latitude: f32::INFINITY,
            longitude: 0.0,
        };
        assert!(!Reading::new(1.0, 2.0, 3.0).with_position(bad_fix).is_finite());
    }
}
