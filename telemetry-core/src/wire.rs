//! Wire protocol variants and the transmit-side encoder.
//!
//! Producers in the field disagree on field order and there is no version
//! byte on the wire. Each variant is therefore a tagged [`WireFormat`] with
//! its own reordering into canonical order (see `fields`), and the field
//! count of a message is the discriminator when the format is not pinned.

use core::fmt::{self, Write as _};

use heapless::String;

use crate::framing::{END_MARKER, MAX_FRAME_LEN, START_MARKER};
use crate::record::Reading;

/// Default serial line rate of the radio modems.
pub const DEFAULT_BAUD: u32 = 9_600;

/// Field separator inside a frame payload.
pub const FIELD_SEPARATOR: char = ',';

/// Encoded frame including both markers.
pub type WireFrame = String<{ MAX_FRAME_LEN + 2 }>;

/// Field layouts used by the transmitters in service.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WireFormat {
    /// `pressure,altitude,temperature,latitude,longitude`
    Full,
    /// `altitude,pressure,temperature`
    Compact,
    /// A single raw sensor value (bench/debug builds).
    Raw,
}

impl WireFormat {
    /// Number of leading fields the variant consumes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            WireFormat::Full => 5,
            WireFormat::Compact => 3,
            WireFormat::Raw => 1,
        }
    }

    /// Picks the variant implied by a field count, if any.
    ///
    /// Counts between two arities are a truncated message of the wider
    /// variant and select nothing.
    #[must_use]
    pub const fn from_field_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(WireFormat::Raw),
            3 => Some(WireFormat::Compact),
            5.. => Some(WireFormat::Full),
            _ => None,
        }
    }

    /// Narrowest variant holding at least `count` fields.
    #[must_use]
    pub const fn narrowest_covering(count: usize) -> Self {
        match count {
            0 | 1 => WireFormat::Raw,
            2 | 3 => WireFormat::Compact,
            _ => WireFormat::Full,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            WireFormat::Full => "full",
            WireFormat::Compact => "compact",
            WireFormat::Raw => "raw",
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the receiver decides which variant a message uses.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum FormatSelection {
    /// Discriminate on the exact field count of each message.
    #[default]
    Auto,
    /// Every message uses the given variant.
    Fixed(WireFormat),
}

impl FormatSelection {
    /// Resolves the variant for a message with `field_count` fields.
    #[must_use]
    pub const fn resolve(self, field_count: usize) -> Option<WireFormat> {
        match self {
            FormatSelection::Auto => WireFormat::from_field_count(field_count),
            FormatSelection::Fixed(format) => Some(format),
        }
    }
}

/// Encoding failures.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EncodeError {
    /// The formatted payload does not fit a single frame.
    TooLong,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::TooLong => write!(f, "payload exceeds {MAX_FRAME_LEN} byte frame cap"),
        }
    }
}

impl core::error::Error for EncodeError {}

/// Encodes a reading as a framed message in the given field order.
///
/// Readings without a position fix encode `0.000000` for both coordinates in
/// the full format. The raw format carries the pressure value.
///
/// # Errors
///
/// Returns [`EncodeError::TooLong`] when the payload would exceed the frame cap.
pub fn encode_frame(reading: &Reading, format: WireFormat) -> Result<WireFrame, EncodeError> {
    let mut frame = WireFrame::new();
    frame
        .push(char::from(START_MARKER))
        .map_err(|_| EncodeError::TooLong)?;

    let written = match format {
        WireFormat::Full => {
            let fix = reading.position.unwrap_or_default();
            write!(
                frame,
                "{:.2},{:.2},{:.2},{:.6},{:.6}",
                reading.pressure, reading.altitude, reading.temperature, fix.latitude, fix.longitude
            )
        }
        WireFormat::Compact => write!(
            frame,
            "{:.2},{:.2},{:.2}",
            reading.altitude, reading.pressure, reading.temperature
        ),
        WireFormat::Raw => write!(frame, "{:.2}", reading.pressure),
    };
    written.map_err(|_| EncodeError::TooLong)?;

    if frame.len() > MAX_FRAME_LEN + 1 {
        return Err(EncodeError::TooLong);
    }
    frame
        .push(char::from(END_MARKER))
        .map_err(|_| EncodeError::TooLong)?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::GeoFix;

    #[test]
    fn field_count_discriminates_variants() {
        assert_eq!(WireFormat::from_field_count(0), None);
        assert_eq!(WireFormat::from_field_count(1), Some(WireFormat::Raw));
        assert_eq!(WireFormat::from_field_count(3), Some(WireFormat::Compact));
        assert_eq!(WireFormat::from_field_count(5), Some(WireFormat::Full));
        assert_eq!(WireFormat::from_field_count(9), Some(WireFormat::Full));
    }

    #[test]
    fn counts_between_arities_select_nothing() {
        assert_eq!(WireFormat::from_field_count(2), None);
        assert_eq!(WireFormat::from_field_count(4), None);
        assert_eq!(WireFormat::narrowest_covering(0), WireFormat::Raw);
        assert_eq!(WireFormat::narrowest_covering(2), WireFormat::Compact);
        assert_eq!(WireFormat::narrowest_covering(4), WireFormat::Full);
    }

    #[test]
    fn fixed_selection_ignores_field_count() {
        let selection = FormatSelection::Fixed(WireFormat::Compact);
        assert_eq!(selection.resolve(5), Some(WireFormat::Compact));
        assert_eq!(FormatSelection::Auto.resolve(5), Some(WireFormat::Full));
    }

    #[test]
    fn compact_encoding_puts_altitude_first() {
        let reading = Reading::new(200.0, 100.0, 20.0);
        let frame = encode_frame(&reading, WireFormat::Compact).unwrap();
        assert_eq!(frame.as_str(), "<100.00,200.00,20.00>");
    }

    #[test]
    fn full_encoding_carries_position() {
        let reading = Reading::new(950.0, 1250.0, 6.88).with_position(GeoFix {
            latitude: 32.5,
            longitude: -106.25,
        });
        let frame = encode_frame(&reading, WireFormat::Full).unwrap();
        assert_eq!(
            frame.as_str(),
            "<950.00,1250.00,6.88,32.500000,-106.250000>"
        );
    }

    #[test]
    fn oversized_values_do_not_fit_a_frame() {
        let reading = Reading::new(f32::MAX, f32::MAX, f32::MAX);
        assert_eq!(
            encode_frame(&reading, WireFormat::Full),
            Err(EncodeError::TooLong)
        );
    }
}
