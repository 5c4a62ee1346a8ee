//! Field parser turning frame payloads into canonical readings.
//!
//! A payload is split on [`FIELD_SEPARATOR`], each field is trimmed and parsed
//! as a float with `winnow`, and the values are reordered from the selected
//! [`WireFormat`] into canonical order. No partial reading is ever produced:
//! a message either yields all fields of its variant or a [`MalformedRecord`].

use core::fmt;

use heapless::Vec;
use winnow::ascii::float;
use winnow::error::ContextError;
use winnow::prelude::*;

use crate::framing::RawFrame;
use crate::record::{GeoFix, Reading};
use crate::wire::{FIELD_SEPARATOR, FormatSelection, WireFormat};

/// Widest variant on the wire.
const MAX_ARITY: usize = 5;

/// Upper bound on the fields the parser keeps; extra fields are only counted.
pub const MAX_FIELDS: usize = 8;

/// Parsed message content.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Message {
    /// Full measurement in canonical order.
    Reading(Reading),
    /// Single raw value from a bench transmitter.
    Raw(f32),
}

/// Reasons a message cannot become a record.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MalformedRecord {
    /// Payload bytes are not valid UTF-8.
    NotText,
    /// Fewer fields than the variant requires.
    MissingFields { expected: usize, found: usize },
    /// A field is not a number.
    InvalidNumber { index: usize },
    /// A field parsed to NaN or infinity.
    NonFinite { index: usize },
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedRecord::NotText => f.write_str("payload is not text"),
            MalformedRecord::MissingFields { expected, found } => {
                write!(f, "expected {expected} fields, found {found}")
            }
            MalformedRecord::InvalidNumber { index } => {
                write!(f, "field {index} is not a number")
            }
            MalformedRecord::NonFinite { index } => write!(f, "field {index} is not finite"),
        }
    }
}

impl core::error::Error for MalformedRecord {}

/// Parses a decoded frame.
///
/// # Errors
///
/// Returns [`MalformedRecord`] when the payload is not text or does not hold a
/// complete message for the selected format.
pub fn parse_frame<const CAP: usize>(
    frame: &RawFrame<CAP>,
    selection: FormatSelection,
) -> Result<Message, MalformedRecord> {
    let text = frame.as_str().ok_or(MalformedRecord::NotText)?;
    parse_message(text, selection)
}

/// Parses a message payload (markers already stripped).
///
/// # Errors
///
/// Returns [`MalformedRecord`] for missing, non-numeric or non-finite fields.
pub fn parse_message(text: &str, selection: FormatSelection) -> Result<Message, MalformedRecord> {
    let (fields, count) = split_fields(text);

    let Some(format) = selection.resolve(count) else {
        return Err(MalformedRecord::MissingFields {
            expected: WireFormat::narrowest_covering(count).arity(),
            found: count,
        });
    };

    let arity = format.arity();
    if count < arity {
        return Err(MalformedRecord::MissingFields {
            expected: arity,
            found: count,
        });
    }

    let mut values = [0.0_f32; MAX_ARITY];
    for (index, (slot, field)) in values.iter_mut().zip(fields.iter()).take(arity).enumerate() {
        let value = parse_number(field).ok_or(MalformedRecord::InvalidNumber { index })?;
        if !value.is_finite() {
            return Err(MalformedRecord::NonFinite { index });
        }
        *slot = value;
    }

    Ok(match format {
        WireFormat::Full => Message::Reading(reorder_full(&values)),
        WireFormat::Compact => Message::Reading(reorder_compact(&values)),
        WireFormat::Raw => Message::Raw(values[0]),
    })
}

/// Splits and trims fields, returning the kept slices and the total count.
fn split_fields(text: &str) -> (Vec<&str, MAX_FIELDS>, usize) {
    let mut fields = Vec::new();
    if text.trim().is_empty() {
        return (fields, 0);
    }

    let mut count = 0usize;
    for field in text.split(FIELD_SEPARATOR) {
        count += 1;
        // Fields past MAX_FIELDS are never consumed by any variant.
        let _ = fields.push(field.trim());
    }
    (fields, count)
}

fn parse_number(field: &str) -> Option<f32> {
    float::<_, f32, ContextError>.parse(field).ok()
}

/// `pressure,altitude,temperature,latitude,longitude` is already canonical.
fn reorder_full(values: &[f32; MAX_ARITY]) -> Reading {
    let [pressure, altitude, temperature, latitude, longitude] = *values;
    Reading::new(pressure, altitude, temperature).with_position(GeoFix {
        latitude,
        longitude,
    })
}

/// `altitude,pressure,temperature` swaps the first two fields.
fn reorder_compact(values: &[f32; MAX_ARITY]) -> Reading {
    let [altitude, pressure, temperature, ..] = *values;
    Reading::new(pressure, altitude, temperature)
}
