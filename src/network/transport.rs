//! Raw PCM streaming over a connected session
//!
//! The stream is nothing but back-to-back frames of little-endian `i16`
//! samples. Both ends must agree on the frame size; there is no header to
//! check it against.

use bytes::BytesMut;
use std::io::{ErrorKind, Read, Write};
use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

use crate::audio::buffer::SharedFrameQueue;
use crate::codec::{PcmDecoder, PcmEncoder, PcmStats};
use crate::config::NetworkConfig;
use crate::error::NetworkError;
use crate::network::session::{ChannelKind, NetworkSession, SessionListener};

/// Sleep between checks of an empty frame queue
const QUEUE_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Where the sender gets its frames
pub trait FrameSource {
    /// Fill `frame` with the next frame. Returns `false` once the source
    /// is finished.
    fn read_frame(&mut self, frame: &mut [i16]) -> bool;
}

/// Where the receiver puts its frames
pub trait FrameSink {
    fn write_frame(&mut self, frame: &[i16]);
}

impl FrameSource for SharedFrameQueue {
    fn read_frame(&mut self, frame: &mut [i16]) -> bool {
        loop {
            // Read the flag first: a closed queue gets no more pushes
            let closed = self.is_closed();
            if let Some(queued) = self.try_pop() {
                let n = frame.len().min(queued.len());
                frame[..n].copy_from_slice(&queued[..n]);
                self.recycle(queued);
                return true;
            }
            if closed {
                return false;
            }
            thread::sleep(QUEUE_POLL_INTERVAL);
        }
    }
}

impl FrameSink for SharedFrameQueue {
    fn write_frame(&mut self, frame: &[i16]) {
        if let Some(mut slot) = self.acquire() {
            let n = frame.len().min(slot.len());
            slot[..n].copy_from_slice(&frame[..n]);
            self.push(slot);
        }
    }
}

/// Writes frames to a byte stream
pub struct AudioSender<W: Write> {
    /// Connected stream, usually a [`NetworkSession`]
    writer: W,
    /// Packs samples and counts what was sent
    encoder: PcmEncoder,
    /// Samples per frame
    frame_size: usize,
    /// Encoded bytes of the frame being sent
    buf: BytesMut,
}

impl<W: Write> AudioSender<W> {
    pub fn new(writer: W, frame_size: usize) -> Self {
        Self {
            writer,
            encoder: PcmEncoder::new(frame_size),
            frame_size,
            buf: BytesMut::with_capacity(frame_size * 2),
        }
    }

    pub fn send_frame(&mut self, frame: &[i16]) -> Result<(), NetworkError> {
        self.encoder
            .encode(frame, &mut self.buf)
            .map_err(|e| NetworkError::SendFailed(e.to_string()))?;
        self.writer
            .write_all(&self.buf)
            .map_err(|e| NetworkError::SendFailed(e.to_string()))
    }

    /// Send frames until the source runs dry or the write fails
    pub fn run<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> Result<PcmStats, NetworkError> {
        let mut frame = vec![0i16; self.frame_size];
        while source.read_frame(&mut frame) {
            self.send_frame(&frame)?;
        }
        self.writer
            .flush()
            .map_err(|e| NetworkError::SendFailed(e.to_string()))?;
        Ok(self.stats())
    }

    pub fn stats(&self) -> PcmStats {
        self.encoder.stats()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Reads frames from a byte stream
pub struct AudioReceiver<R: Read> {
    /// Connected stream, usually a [`NetworkSession`]
    reader: R,
    /// Unpacks samples and counts what was received
    decoder: PcmDecoder,
    /// Exactly one frame of raw bytes
    buf: Vec<u8>,
    /// Last decoded frame, lent out by `read_frame`
    frame: Vec<i16>,
}

impl<R: Read> AudioReceiver<R> {
    pub fn new(reader: R, frame_size: usize) -> Self {
        let decoder = PcmDecoder::new(frame_size);
        Self {
            buf: vec![0; decoder.frame_bytes()],
            frame: vec![0; frame_size],
            reader,
            decoder,
        }
    }

    /// Read exactly one frame.
    ///
    /// `Ok(None)` means the peer closed the stream on a frame boundary.
    /// Closing in the middle of a frame is an error.
    pub fn read_frame(&mut self) -> Result<Option<&[i16]>, NetworkError> {
        let expected = self.buf.len();
        let mut got = 0;

        while got < expected {
            match self.reader.read(&mut self.buf[got..]) {
                Ok(0) if got == 0 => return Ok(None),
                Ok(0) => return Err(NetworkError::PartialFrame { got, expected }),
                Ok(n) => got += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(NetworkError::ReceiveFailed(e.to_string())),
            }
        }

        self.decoder
            .decode(&self.buf, &mut self.frame)
            .map_err(|e| NetworkError::ReceiveFailed(e.to_string()))?;
        Ok(Some(self.frame.as_slice()))
    }

    /// Hand frames to `sink` until the peer disconnects
    pub fn run<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> Result<PcmStats, NetworkError> {
        while let Some(frame) = self.read_frame()? {
            sink.write_frame(frame);
        }
        Ok(self.stats())
    }

    pub fn stats(&self) -> PcmStats {
        self.decoder.stats()
    }
}

/// Stream frames from `source` over `session` until either side stops.
///
/// The session is closed on return.
pub fn send_session<S: FrameSource + ?Sized>(
    session: NetworkSession,
    frame_size: usize,
    source: &mut S,
) -> Result<PcmStats, NetworkError> {
    let id = session.id();
    let peer = session.peer();
    tracing::info!("Audio session {} streaming to {}", id, peer);

    let mut sender = AudioSender::new(session, frame_size);
    let result = sender.run(source);
    let stats = sender.stats();
    sender.into_inner().shutdown();

    match &result {
        Ok(_) => tracing::info!(
            "Audio session {} finished: {} frames, {:.1} KB sent",
            id,
            stats.frames,
            stats.bytes as f64 / 1024.0
        ),
        Err(e) => tracing::error!(
            "Audio session {} to {} ended after {} frames: {}",
            id,
            peer,
            stats.frames,
            e
        ),
    }
    result
}

/// Connect to a receiver at `addr` and stream frames from `source`.
///
/// Meant to own its thread: a refused connection is logged and returned
/// without reading anything from `source`.
pub fn connect_and_send<S: FrameSource + ?Sized>(
    addr: SocketAddr,
    config: &NetworkConfig,
    frame_size: usize,
    source: &mut S,
) -> Result<PcmStats, NetworkError> {
    let session = NetworkSession::connect(addr, ChannelKind::Audio, config).map_err(|e| {
        tracing::error!("Audio stream unavailable: {}", e);
        e
    })?;
    send_session(session, frame_size, source)
}

/// Wait for one sender on `listener` and play its stream into `sink`.
///
/// Meant to own its thread; the listener stays open for the caller.
pub fn accept_and_receive<S: FrameSink + ?Sized>(
    listener: &SessionListener,
    frame_size: usize,
    sink: &mut S,
) -> Result<PcmStats, NetworkError> {
    let session = listener.accept().map_err(|e| {
        tracing::error!("Audio listener failed: {}", e);
        e
    })?;
    receive_session(session, frame_size, sink)
}

/// Receive frames from `session` into `sink` until the peer disconnects.
pub fn receive_session<S: FrameSink + ?Sized>(
    session: NetworkSession,
    frame_size: usize,
    sink: &mut S,
) -> Result<PcmStats, NetworkError> {
    let id = session.id();
    let peer = session.peer();
    tracing::info!("Audio session {} receiving from {}", id, peer);

    let mut receiver = AudioReceiver::new(session, frame_size);
    let result = receiver.run(sink);
    let stats = receiver.stats();

    match &result {
        Ok(_) => tracing::info!(
            "Audio session {} closed by peer: {} frames, {:.1} KB received",
            id,
            stats.frames,
            stats.bytes as f64 / 1024.0
        ),
        Err(e) => tracing::error!(
            "Audio session {} from {} ended after {} frames: {}",
            id,
            peer,
            stats.frames,
            e
        ),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::create_frame_queue;
    use std::io::Cursor;

    struct Collect(Vec<Vec<i16>>);

    impl FrameSink for Collect {
        fn write_frame(&mut self, frame: &[i16]) {
            self.0.push(frame.to_vec());
        }
    }

    #[test]
    fn test_sender_writes_raw_little_endian() {
        let mut sender = AudioSender::new(Vec::new(), 2);
        sender.send_frame(&[1, -2]).unwrap();
        assert_eq!(sender.into_inner(), vec![0x01, 0x00, 0xFE, 0xFF]);
    }

    #[test]
    fn test_receiver_clean_close_on_boundary() {
        let bytes = vec![0x01, 0x00, 0xFE, 0xFF, 0x00, 0x80, 0xFF, 0x7F];
        let mut receiver = AudioReceiver::new(Cursor::new(bytes), 2);
        let mut sink = Collect(Vec::new());

        let stats = receiver.run(&mut sink).unwrap();
        assert_eq!(sink.0, vec![vec![1, -2], vec![i16::MIN, i16::MAX]]);
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.bytes, 8);
    }

    #[test]
    fn test_receiver_partial_frame() {
        let mut receiver = AudioReceiver::new(Cursor::new(vec![0x01, 0x00, 0xFE]), 2);
        let err = receiver.read_frame().unwrap_err();
        assert!(matches!(err, NetworkError::PartialFrame { got: 3, expected: 4 }));
    }

    #[test]
    fn test_queue_source_drains_before_finishing() {
        let mut queue = create_frame_queue(4, 2);
        for value in [5, 6] {
            let mut slot = queue.acquire().unwrap();
            slot.fill(value);
            queue.push(slot);
        }
        queue.close();

        let mut frame = [0i16; 2];
        assert!(queue.read_frame(&mut frame));
        assert_eq!(frame, [5, 5]);
        assert!(queue.read_frame(&mut frame));
        assert_eq!(frame, [6, 6]);
        assert!(!queue.read_frame(&mut frame));
    }
}
