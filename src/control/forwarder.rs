//! Sender-side relay of the active effect to the receiver

use bytes::BytesMut;
use std::io::Write;
use std::thread;
use std::time::Duration;

use crate::effects::EffectSelector;
use crate::error::NetworkError;
use crate::protocol::ControlMessage;
use crate::state::SharedEffectHandle;

/// Polls the shared selection and sends it whenever it changes
pub struct ControlForwarder<W: Write> {
    writer: W,
    shared: SharedEffectHandle,
    interval: Duration,
    last_sent: Option<EffectSelector>,
    buf: BytesMut,
    messages_sent: u64,
}

impl<W: Write> ControlForwarder<W> {
    pub fn new(writer: W, shared: SharedEffectHandle, interval: Duration) -> Self {
        Self {
            writer,
            shared,
            interval,
            last_sent: None,
            buf: BytesMut::with_capacity(32),
            messages_sent: 0,
        }
    }

    /// Send the current selection if it differs from the last one sent.
    ///
    /// The first call always sends, so the peer starts in sync.
    pub fn poll_once(&mut self) -> Result<bool, NetworkError> {
        let current = self.shared.snapshot();
        if self.last_sent == Some(current) {
            return Ok(false);
        }

        self.buf.clear();
        ControlMessage::from_selector(current).encode(&mut self.buf);
        self.writer
            .write_all(&self.buf)
            .and_then(|_| self.writer.flush())
            .map_err(|e| NetworkError::SendFailed(e.to_string()))?;

        tracing::debug!("Forwarded effect: {}", current);
        self.last_sent = Some(current);
        self.messages_sent += 1;
        Ok(true)
    }

    /// Poll at the configured interval until a send fails
    pub fn run(&mut self) -> Result<(), NetworkError> {
        loop {
            self.poll_once()?;
            thread::sleep(self.interval);
        }
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_shared_state;

    #[test]
    fn test_sends_only_on_change() {
        let shared = create_shared_state();
        let mut forwarder =
            ControlForwarder::new(Vec::new(), shared.clone(), Duration::from_millis(1));

        assert!(forwarder.poll_once().unwrap());
        assert!(!forwarder.poll_once().unwrap());

        shared.publish(EffectSelector::Wobble(3.5));
        assert!(forwarder.poll_once().unwrap());
        assert!(!forwarder.poll_once().unwrap());

        shared.publish(EffectSelector::Robot);
        assert!(forwarder.poll_once().unwrap());

        assert_eq!(forwarder.messages_sent(), 3);
        assert_eq!(forwarder.into_inner(), b"none\0wobble 3.5\0robot\0".to_vec());
    }
}
