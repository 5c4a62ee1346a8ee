//! Radio link plumbing: serial port access and the frame reader thread.
//!
//! The reader thread owns the [`FrameDecoder`] and forwards every frame result
//! over a bounded queue. The ingestion side polls that queue through
//! [`ChannelFrames`] and never blocks on the link.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use telemetry_core::framing::{FrameDecoder, FrameResult, MAX_FRAME_LEN};
use telemetry_core::source::{FrameSource, TransportLost};

use crate::config::STDIN_PORT;
use crate::error::StationError;

/// Serial read timeout; a timeout only means no bytes arrived yet.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Frames buffered between the reader thread and the ingestion loop.
pub const FRAME_QUEUE_DEPTH: usize = 32;

const READ_CHUNK: usize = 256;

/// Opens the link for reading: a serial device, or stdin for `-`.
pub fn open_reader(port: &str, baud: u32) -> Result<Box<dyn Read + Send>, StationError> {
    if port == STDIN_PORT {
        tracing::info!("link: reading frames from stdin");
        return Ok(Box::new(io::stdin()));
    }
    Ok(Box::new(open_serial(port, baud)?))
}

/// Opens the link for writing: a serial device, or stdout for `-`.
pub fn open_writer(port: &str, baud: u32) -> Result<Box<dyn Write + Send>, StationError> {
    if port == STDIN_PORT {
        return Ok(Box::new(io::stdout()));
    }
    Ok(Box::new(open_serial(port, baud)?))
}

fn open_serial(port: &str, baud: u32) -> Result<Box<dyn serialport::SerialPort>, StationError> {
    let serial = serialport::new(port, baud)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .timeout(READ_TIMEOUT)
        .open()
        .map_err(|source| StationError::OpenPort {
            port: port.to_owned(),
            source,
        })?;
    tracing::info!(port, baud, "link: serial port open");
    Ok(serial)
}

/// Receiving end of the reader thread.
#[derive(Debug)]
pub struct ChannelFrames {
    frames: Receiver<FrameResult>,
}

impl ChannelFrames {
    #[must_use]
    pub const fn new(frames: Receiver<FrameResult>) -> Self {
        Self { frames }
    }
}

impl FrameSource for ChannelFrames {
    fn try_read_frame(&mut self) -> Result<Option<FrameResult>, TransportLost> {
        match self.frames.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportLost),
        }
    }
}

/// Starts the reader thread. The channel closes when the link ends or `stop` is set.
pub fn spawn_reader<R>(
    reader: R,
    depth: usize,
    stop: Arc<AtomicBool>,
) -> io::Result<(ChannelFrames, JoinHandle<()>)>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(depth.max(1));
    let handle = thread::Builder::new()
        .name("link-reader".into())
        .spawn(move || read_frames(reader, &tx, &stop))?;
    Ok((ChannelFrames::new(rx), handle))
}

fn read_frames<R: Read>(mut reader: R, frames: &SyncSender<FrameResult>, stop: &AtomicBool) {
    let mut decoder = FrameDecoder::<MAX_FRAME_LEN>::new();
    let mut chunk = [0u8; READ_CHUNK];

    while !stop.load(Ordering::Relaxed) {
        let count = match reader.read(&mut chunk) {
            Ok(0) => {
                tracing::info!("link: end of stream");
                break;
            }
            Ok(count) => count,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(err) => {
                tracing::error!(%err, "link: read failed");
                break;
            }
        };

        for result in decoder.decode(&chunk[..count]) {
            match frames.try_send(result) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("link: frame queue full, dropping frame");
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    decoder.reset();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drain(frames: &mut ChannelFrames) -> (Vec<FrameResult>, bool) {
        let mut collected = Vec::new();
        loop {
            match frames.try_read_frame() {
                Ok(Some(frame)) => collected.push(frame),
                Ok(None) => return (collected, false),
                Err(TransportLost) => return (collected, true),
            }
        }
    }

    #[test]
    fn reader_forwards_frames_then_closes() {
        let stop = Arc::new(AtomicBool::new(false));
        let bytes = Cursor::new(b"<1,2,3>junk<4,5,6>\n<7,8".to_vec());
        let (mut frames, handle) = spawn_reader(bytes, 8, stop).expect("thread spawns");
        handle.join().expect("reader exits cleanly");

        let (collected, lost) = drain(&mut frames);
        assert!(lost, "end of stream must close the channel");

        let payloads: Vec<_> = collected
            .iter()
            .map(|frame| frame.as_ref().expect("fits").as_str().map(str::to_owned))
            .collect();
        assert_eq!(
            payloads,
            [Some("1,2,3".to_owned()), Some("4,5,6".to_owned())]
        );
    }

    #[test]
    fn full_queue_drops_frames() {
        let stop = Arc::new(AtomicBool::new(false));
        let bytes = Cursor::new(b"<1><2><3><4>".to_vec());
        let (mut frames, handle) = spawn_reader(bytes, 2, stop).expect("thread spawns");
        handle.join().expect("reader exits cleanly");

        let (collected, lost) = drain(&mut frames);
        assert!(lost);
        assert_eq!(collected.len(), 2);
    }

    struct Endless;

    impl Read for Endless {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            thread::sleep(Duration::from_millis(1));
            Err(io::ErrorKind::TimedOut.into())
        }
    }

    #[test]
    fn stop_flag_ends_a_quiet_link() {
        let stop = Arc::new(AtomicBool::new(false));
        let (mut frames, handle) =
            spawn_reader(Endless, 4, Arc::clone(&stop)).expect("thread spawns");

        assert_eq!(frames.try_read_frame(), Ok(None));
        stop.store(true, Ordering::Relaxed);
        handle.join().expect("reader exits cleanly");
        assert_eq!(frames.try_read_frame(), Err(TransportLost));
    }
}
