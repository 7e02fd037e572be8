//! 16-bit little-endian mono PCM framing
//!
//! Frames go on the wire back to back with no header; both ends must agree
//! on the frame size out of band.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::CodecError;

const SCALE: f32 = 32768.0;

/// i16 sample to f32 in `[-1.0, 1.0)`
#[inline]
pub fn normalize(sample: i16) -> f32 {
    sample as f32 / SCALE
}

/// f32 sample back to i16, clipping to the 16-bit range.
///
/// `quantize(normalize(x)) == x` for every i16 `x`.
#[inline]
pub fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * SCALE)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

pub fn normalize_into(input: &[i16], output: &mut [f32]) {
    for (out, &sample) in output.iter_mut().zip(input) {
        *out = normalize(sample);
    }
}

pub fn quantize_into(input: &[f32], output: &mut [i16]) {
    for (out, &sample) in output.iter_mut().zip(input) {
        *out = quantize(sample);
    }
}

/// Packs fixed-size frames into bytes
pub struct PcmEncoder {
    frame_size: usize,
    frames_encoded: u64,
    bytes_produced: u64,
}

impl PcmEncoder {
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            frames_encoded: 0,
            bytes_produced: 0,
        }
    }

    /// Bytes produced per frame
    pub fn frame_bytes(&self) -> usize {
        self.frame_size * 2
    }

    /// Replace the contents of `buf` with one encoded frame.
    pub fn encode(&mut self, frame: &[i16], buf: &mut BytesMut) -> Result<(), CodecError> {
        if frame.len() != self.frame_size {
            return Err(CodecError::InvalidFrameSize {
                got: frame.len(),
                expected: self.frame_size,
            });
        }

        buf.clear();
        buf.reserve(self.frame_bytes());
        for &sample in frame {
            buf.put_i16_le(sample);
        }

        self.frames_encoded += 1;
        self.bytes_produced += buf.len() as u64;
        Ok(())
    }

    pub fn stats(&self) -> PcmStats {
        PcmStats {
            frames: self.frames_encoded,
            bytes: self.bytes_produced,
        }
    }
}

/// Unpacks bytes into fixed-size frames
pub struct PcmDecoder {
    frame_size: usize,
    frames_decoded: u64,
    bytes_consumed: u64,
}

impl PcmDecoder {
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            frames_decoded: 0,
            bytes_consumed: 0,
        }
    }

    pub fn frame_bytes(&self) -> usize {
        self.frame_size * 2
    }

    /// Decode exactly one frame from `data` into `frame`.
    pub fn decode(&mut self, mut data: &[u8], frame: &mut [i16]) -> Result<(), CodecError> {
        if data.len() != self.frame_bytes() {
            return Err(CodecError::InvalidPayload(data.len()));
        }
        if frame.len() != self.frame_size {
            return Err(CodecError::InvalidFrameSize {
                got: frame.len(),
                expected: self.frame_size,
            });
        }

        self.bytes_consumed += data.len() as u64;
        for sample in frame.iter_mut() {
            *sample = data.get_i16_le();
        }
        self.frames_decoded += 1;
        Ok(())
    }

    pub fn stats(&self) -> PcmStats {
        PcmStats {
            frames: self.frames_decoded,
            bytes: self.bytes_consumed,
        }
    }
}

/// Frame and byte counters for one direction of a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PcmStats {
    pub frames: u64,
    pub bytes: u64,
}
