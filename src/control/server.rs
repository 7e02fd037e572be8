//! Receiving end of the control connection

use std::io::{ErrorKind, Read};
use std::sync::Arc;

use crate::config::NetworkConfig;
use crate::control::ControlChannel;
use crate::error::NetworkError;
use crate::network::session::SessionListener;
use crate::protocol::split_messages;

/// Applies messages arriving on control connections
pub struct ControlServer {
    channel: Arc<ControlChannel>,
    buffer_size: usize,
}

impl ControlServer {
    pub fn new(channel: Arc<ControlChannel>, config: &NetworkConfig) -> Self {
        Self {
            channel,
            buffer_size: config.control_buffer_size.max(1),
        }
    }

    /// Apply messages from one connection until the peer closes it.
    ///
    /// Each read is taken as a set of whole messages. Returns the number of
    /// messages applied.
    pub fn serve<R: Read>(&self, reader: &mut R) -> Result<u64, NetworkError> {
        let mut buf = vec![0u8; self.buffer_size];
        let mut applied = 0;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => return Ok(applied),
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(NetworkError::ReceiveFailed(e.to_string())),
            };

            for message in split_messages(&buf[..n]) {
                tracing::debug!("Control message: {:?}", message);
                if self.channel.apply(&message).is_some() {
                    applied += 1;
                }
            }
        }
    }

    /// Serve connections one at a time, forever.
    ///
    /// Only an accept failure ends the loop; a failed connection is logged
    /// and the next one is awaited.
    pub fn run(&self, listener: &SessionListener) -> Result<(), NetworkError> {
        loop {
            let mut session = listener.accept()?;
            let id = session.id();
            match self.serve(&mut session) {
                Ok(applied) => tracing::info!(
                    "Control session {} closed after {} messages",
                    id,
                    applied
                ),
                Err(e) => tracing::warn!("Control session {} ended: {}", id, e),
            }
        }
    }

    pub fn channel(&self) -> &Arc<ControlChannel> {
        &self.channel
    }
}
