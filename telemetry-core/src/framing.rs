//! Marker-delimited framing for the radio byte stream.
//!
//! The radio modem delivers an unframed byte stream with arbitrary noise
//! between messages. [`FrameDecoder`] owns its payload storage and turns that
//! stream into bounded [`RawFrame`]s one byte at a time. Every start marker
//! restarts capture, so a receiver that loses a trailing end marker recovers on
//! the next frame without any explicit reset.

use core::{fmt, mem};

use heapless::Vec;

/// Byte that opens a frame.
pub const START_MARKER: u8 = b'<';
/// Byte that closes a frame.
pub const END_MARKER: u8 = b'>';
/// Default payload cap for a single frame, in bytes.
pub const MAX_FRAME_LEN: usize = 64;

/// Result produced whenever the decoder sees an end marker.
pub type FrameResult<const CAP: usize = MAX_FRAME_LEN> = Result<RawFrame<CAP>, FrameError>;

/// Payload captured between a start and an end marker (markers excluded).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawFrame<const CAP: usize = MAX_FRAME_LEN> {
    payload: Vec<u8, CAP>,
}

impl<const CAP: usize> RawFrame<CAP> {
    /// Creates an empty frame.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            payload: Vec::new(),
        }
    }

    /// Builds a frame from a payload, returning `None` when it exceeds the cap.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        Vec::from_slice(bytes).ok().map(|payload| Self { payload })
    }

    /// Raw payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.payload.as_slice()
    }

    /// Payload as text, or `None` when the bytes are not valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Framing failures.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameError {
    /// The payload hit the length cap before the end marker arrived.
    Overflow { capacity: usize, dropped: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Overflow { capacity, dropped } => write!(
                f,
                "frame exceeded {capacity} byte cap ({dropped} bytes dropped)"
            ),
        }
    }
}

impl core::error::Error for FrameError {}

/// Decoder state between bytes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DecoderState {
    /// Waiting for a start marker; everything else is noise.
    #[default]
    Idle,
    /// Accumulating payload bytes until an end marker.
    Capturing,
}

/// Byte-at-a-time frame decoder with a fixed payload cap.
#[derive(Clone, Debug, Default)]
pub struct FrameDecoder<const CAP: usize = MAX_FRAME_LEN> {
    state: DecoderState,
    payload: Vec<u8, CAP>,
    dropped: usize,
}

impl<const CAP: usize> FrameDecoder<CAP> {
    /// Creates an idle decoder with empty payload storage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: DecoderState::Idle,
            payload: Vec::new(),
            dropped: 0,
        }
    }

    /// Current decoder state.
    #[must_use]
    pub const fn state(&self) -> DecoderState {
        self.state
    }

    /// Returns `true` while a frame is partially captured.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.state == DecoderState::Capturing
    }

    /// Feeds one byte, returning a result whenever a frame terminates.
    pub fn push_byte(&mut self, byte: u8) -> Option<FrameResult<CAP>> {
        match (self.state, byte) {
            (DecoderState::Capturing, START_MARKER) => {
                tracing::debug!(
                    discarded = self.payload.len() + self.dropped,
                    "framing: start marker mid-frame, resynchronising"
                );
                self.begin();
                None
            }
            (DecoderState::Idle, START_MARKER) => {
                self.begin();
                None
            }
            (DecoderState::Idle, _) => None,
            (DecoderState::Capturing, END_MARKER) => Some(self.finish()),
            (DecoderState::Capturing, other) => {
                if self.payload.push(other).is_err() {
                    self.dropped = self.dropped.saturating_add(1);
                }
                None
            }
        }
    }

    /// Decodes a chunk lazily. Partial frames carry over to the next chunk.
    pub fn decode<'d, 'b>(&'d mut self, bytes: &'b [u8]) -> Frames<'d, 'b, CAP> {
        Frames {
            decoder: self,
            bytes: bytes.iter(),
        }
    }

    /// Discards any partially captured frame without reporting an error.
    pub fn reset(&mut self) {
        if self.is_capturing() {
            tracing::debug!(
                pending = self.payload.len(),
                "framing: discarding partial frame"
            );
        }
        self.state = DecoderState::Idle;
        self.payload.clear();
        self.dropped = 0;
    }

    fn begin(&mut self) {
        self.state = DecoderState::Capturing;
        self.payload.clear();
        self.dropped = 0;
    }

    fn finish(&mut self) -> FrameResult<CAP> {
        self.state = DecoderState::Idle;
        let payload = mem::take(&mut self.payload);
        let dropped = mem::take(&mut self.dropped);

        if dropped > 0 {
            Err(FrameError::Overflow {
                capacity: CAP,
                dropped,
            })
        } else {
            Ok(RawFrame { payload })
        }
    }
}

/// Iterator returned by [`FrameDecoder::decode`].
pub struct Frames<'d, 'b, const CAP: usize> {
    decoder: &'d mut FrameDecoder<CAP>,
    bytes: core::slice::Iter<'b, u8>,
}

impl<const CAP: usize> Iterator for Frames<'_, '_, CAP> {
    type Item = FrameResult<CAP>;

    fn next(&mut self) -> Option<Self::Item> {
        for &byte in self.bytes.by_ref() {
            if let Some(result) = self.decoder.push_byte(byte) {
                return Some(result);
            }
        }
        None
    }
}
