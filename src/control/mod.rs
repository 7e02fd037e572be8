//! Effect-change requests from the console and the control connection
//!
//! Every request, wherever it comes from, goes through
//! [`ControlChannel::apply`], which decodes it and publishes the result to
//! the shared selection in one step.

pub mod console;
pub mod forwarder;
pub mod server;

pub use console::{run_console, PROMPT};
pub use forwarder::ControlForwarder;
pub use server::ControlServer;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::EffectConfig;
use crate::effects::EffectSelector;
use crate::protocol::ControlMessage;
use crate::state::SharedEffectHandle;

/// Applies control requests to the shared selection
pub struct ControlChannel {
    shared: SharedEffectHandle,
    default_wobble_rate: f32,
    applied: AtomicU64,
}

impl ControlChannel {
    pub fn new(shared: SharedEffectHandle, config: &EffectConfig) -> Self {
        Self {
            shared,
            default_wobble_rate: config.sanitized().wobble_rate,
            applied: AtomicU64::new(0),
        }
    }

    /// Decode one request and publish it.
    ///
    /// Blank input is ignored and returns `None`; anything else changes the
    /// selection, unrecognized names selecting [`EffectSelector::None`].
    pub fn apply(&self, text: &str) -> Option<EffectSelector> {
        let message = ControlMessage::parse(text)?;
        Some(self.apply_message(&message))
    }

    pub fn apply_message(&self, message: &ControlMessage) -> EffectSelector {
        let selector = self
            .shared
            .publish(message.to_selector(self.default_wobble_rate));
        self.applied.fetch_add(1, Ordering::Relaxed);
        tracing::info!("Effect changed to: {}", selector);
        selector
    }

    /// Currently published selection
    pub fn current(&self) -> EffectSelector {
        self.shared.snapshot()
    }

    pub fn shared(&self) -> &SharedEffectHandle {
        &self.shared
    }

    pub fn messages_applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }
}
