//! Error types for the voice effects application
//!
//! The effect-processing path has no error type at all: out-of-range
//! parameters are clamped and unknown control tokens map to `None`.

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio subsystem errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Fatal at startup
    #[error("Device initialization failed: {0}")]
    DeviceInit(String),

    /// Raised by the device while streaming; recovered by rebuilding the stream
    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Raw PCM framing errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid frame size: {got} samples, expected {expected}")]
    InvalidFrameSize { got: usize, expected: usize },

    #[error("Invalid payload length: {0} bytes")]
    InvalidPayload(usize),
}

/// Network errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Socket bind failed: {0}")]
    BindFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Peer closed the connection in the middle of a frame
    #[error("Partial frame: got {got} of {expected} bytes")]
    PartialFrame { got: usize, expected: usize },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(e: cpal::BuildStreamError) -> Self {
        AudioError::DeviceInit(e.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(e: cpal::PlayStreamError) -> Self {
        AudioError::DeviceInit(e.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        AudioError::UnsupportedFormat(e.to_string())
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
