//! Raw PCM codec
//!
//! Converts between i16 device samples, normalized f32 processing samples
//! and the little-endian byte stream carried by the audio transport.

pub mod pcm;

pub use pcm::{normalize, quantize, PcmDecoder, PcmEncoder, PcmStats};
