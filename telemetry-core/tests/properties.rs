use proptest::prelude::*;

use telemetry_core::fields::{Message, parse_frame};
use telemetry_core::framing::{FrameDecoder, FrameError, MAX_FRAME_LEN};
use telemetry_core::record::{GeoFix, Reading, TelemetryRecord};
use telemetry_core::window::RollingWindow;
use telemetry_core::wire::{FormatSelection, WireFormat, encode_frame};

const SMALL_CAP: usize = 8;

fn marker_heavy_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![
            3 => Just(b'<'),
            3 => Just(b'>'),
            1 => Just(b','),
            8 => any::<u8>(),
        ],
        0..512,
    )
}

fn flight_readings() -> impl Strategy<Value = Reading> {
    (
        0.0f32..2_000.0,
        0.0f32..50_000.0,
        -80.0f32..60.0,
        -90.0f32..90.0,
        -180.0f32..180.0,
    )
        .prop_map(|(pressure, altitude, temperature, latitude, longitude)| {
            Reading::new(pressure, altitude, temperature).with_position(GeoFix {
                latitude,
                longitude,
            })
        })
}

/// Encodes, frames, decodes and parses one reading under automatic selection.
fn over_the_link(reading: &Reading, format: WireFormat) -> Reading {
    let frame = encode_frame(reading, format).expect("flight values fit a frame");
    let mut decoder = FrameDecoder::<MAX_FRAME_LEN>::new();
    let decoded: Vec<_> = decoder.decode(frame.as_bytes()).collect();
    assert_eq!(decoded.len(), 1);

    let payload = decoded[0].as_ref().expect("frame fits the cap");
    match parse_frame(payload, FormatSelection::Auto) {
        Ok(Message::Reading(parsed)) => parsed,
        other => panic!("unexpected parse result {other:?}"),
    }
}

proptest! {
    #[test]
    fn full_messages_parse_into_canonical_order(reading in flight_readings()) {
        let parsed = over_the_link(&reading, WireFormat::Full);

        prop_assert_eq!(parsed.canonical().to_string(), reading.canonical().to_string());
        let sent = reading.position.unwrap_or_default();
        let got = parsed.position.unwrap_or_default();
        prop_assert!((got.latitude - sent.latitude).abs() < 1e-4);
        prop_assert!((got.longitude - sent.longitude).abs() < 1e-4);
    }

    #[test]
    fn compact_messages_swap_into_canonical_order(reading in flight_readings()) {
        let parsed = over_the_link(&reading, WireFormat::Compact);

        prop_assert_eq!(parsed.canonical().to_string(), reading.canonical().to_string());
        prop_assert_eq!(parsed.position, None);
    }

    #[test]
    fn decoder_never_emits_more_than_the_cap(bytes in marker_heavy_bytes()) {
        let mut decoder = FrameDecoder::<SMALL_CAP>::new();
        for result in decoder.decode(&bytes) {
            match result {
                Ok(frame) => {
                    prop_assert!(frame.len() <= SMALL_CAP);
                    prop_assert!(!frame.as_bytes().contains(&b'<'));
                    prop_assert!(!frame.as_bytes().contains(&b'>'));
                }
                Err(FrameError::Overflow { capacity, dropped }) => {
                    prop_assert_eq!(capacity, SMALL_CAP);
                    prop_assert!(dropped > 0);
                }
            }
        }
    }

    #[test]
    fn chunking_does_not_change_decoded_frames(
        bytes in marker_heavy_bytes(),
        split in 0usize..512,
    ) {
        let split = split.min(bytes.len());

        let mut whole = FrameDecoder::<SMALL_CAP>::new();
        let expected: Vec<_> = whole.decode(&bytes).collect();

        let mut chunked = FrameDecoder::<SMALL_CAP>::new();
        let mut actual: Vec<_> = chunked.decode(&bytes[..split]).collect();
        actual.extend(chunked.decode(&bytes[split..]));

        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn apogee_is_monotone_and_equals_max_pushed(
        altitudes in prop::collection::vec(0.0f32..10_000.0, 1..300),
        capacity in 1usize..50,
    ) {
        let mut window = RollingWindow::new(capacity);
        let mut previous = None;

        for (seq, altitude) in (0u64..).zip(altitudes.iter().copied()) {
            let record = TelemetryRecord::from_reading(Reading::new(0.0, altitude, 15.0), seq, 0.0);
            prop_assert!(window.push(record).is_ok());

            let apogee = window.apogee();
            if let (Some(before), Some(now)) = (previous, apogee) {
                prop_assert!(now >= before);
            }
            previous = apogee;
            prop_assert!(window.len() <= capacity);
        }

        let max = altitudes.iter().copied().fold(f32::MIN, f32::max);
        prop_assert_eq!(window.apogee(), Some(max));
    }

    #[test]
    fn window_keeps_the_newest_records(pushes in 1u64..400, capacity in 1usize..120) {
        let mut window = RollingWindow::new(capacity);
        for seq in 0..pushes {
            let record = TelemetryRecord::from_reading(Reading::default(), seq, 0.0);
            prop_assert!(window.push(record).is_ok());
        }

        let kept: Vec<u64> = window.iter().map(|r| r.sequence_index).collect();
        let expected_len = usize::try_from(pushes).unwrap().min(capacity);
        prop_assert_eq!(kept.len(), expected_len);
        prop_assert_eq!(kept.last().copied(), Some(pushes - 1));
        prop_assert!(kept.windows(2).all(|pair| pair[0] + 1 == pair[1]));
    }
}

#[test]
fn one_past_capacity_evicts_the_oldest() {
    let mut window = RollingWindow::new(100);
    for seq in 0..=100 {
        let record = TelemetryRecord::from_reading(Reading::default(), seq, 0.0);
        window.push(record).expect("sequence is increasing");
    }

    assert_eq!(window.len(), 100);
    assert!(window.iter().all(|r| r.sequence_index != 0));
    assert_eq!(window.iter().next().map(|r| r.sequence_index), Some(1));
}
