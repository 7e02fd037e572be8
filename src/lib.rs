//! # LAN Voice FX
//!
//! Real-time voice effects with raw PCM streaming and effect relay over LAN.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                                SENDER PC                                  │
//! │  ┌─────────────┐    ┌────────────────────────────────────────────────┐   │
//! │  │ Microphone  │───▶│ Capture callback (audio::capture)              │   │
//! │  └─────────────┘    │   FrameAssembler ─▶ FrameProcessor             │   │
//! │                     │     snapshot ◀── SharedEffectState (state)     │   │
//! │                     │     EffectEngine (effects) ─▶ FrameQueue       │   │
//! │                     └───────────────────────┬────────────────────────┘   │
//! │  ┌─────────────┐    ┌─────────────────┐     │                            │
//! │  │ Console     │───▶│ ControlChannel  │     ▼                            │
//! │  │ "Effect > " │    │  publish()      │  AudioSender (network)           │
//! │  └─────────────┘    └────────┬────────┘  raw i16 LE frames               │
//! │                              ▼                  │                         │
//! │                     ControlForwarder            │                         │
//! │                     "wobble 3.5\0"              │                         │
//! └──────────────────────────────┼──────────────────┼─────────────────────────┘
//!                                │ TCP :5556        │ TCP :5555
//!                                ▼                  ▼
//! ┌──────────────────────────────┼──────────────────┼─────────────────────────┐
//! │                              │   RECEIVER PC    │                         │
//! │                     ControlServer         AudioReceiver                   │
//! │                     (effect display)      read_exact(frame)               │
//! │                                                 │                         │
//! │                                                 ▼                         │
//! │                                   FrameQueue ─▶ AudioPlayback ─▶ Speaker  │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `vocoder` binary runs the same capture path but drains the frame queue
//! into local playback instead of a socket.

pub mod audio;
pub mod codec;
pub mod config;
pub mod control;
pub mod effects;
pub mod error;
pub mod network;
pub mod protocol;
pub mod state;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Default sample rate for capture, processing and playback
    pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

    /// Mono everywhere
    pub const CHANNELS: u16 = 1;

    /// Default frame length in samples
    pub const DEFAULT_FRAME_SIZE: usize = 512;

    /// Default TCP port for the raw audio stream
    pub const DEFAULT_AUDIO_PORT: u16 = 5555;

    /// Default TCP port for effect-change messages
    pub const DEFAULT_CONTROL_PORT: u16 = 5556;

    /// Bounded read buffer for one control message
    pub const CONTROL_BUFFER_SIZE: usize = 1024;

    /// How often the forwarder checks for an effect change
    pub const DEFAULT_CONTROL_POLL_MS: u64 = 1000;

    /// Frames held between the capture callback and its consumer
    pub const FRAME_QUEUE_CAPACITY: usize = 32;

    /// Circular buffer length used by the pitch shifter
    pub const PITCH_BUFFER_SIZE: usize = 4096;

    /// Safe pitch ratio range
    pub const MIN_PITCH_RATIO: f32 = 0.5;
    pub const MAX_PITCH_RATIO: f32 = 2.0;

    /// Default wobble (tremolo) rate in Hz
    pub const DEFAULT_WOBBLE_RATE: f32 = 5.0;
}

/// Install the `tracing` subscriber used by all binaries.
///
/// Reads the filter from `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
