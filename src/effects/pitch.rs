//! Circular-buffer pitch shifter
//!
//! Input is written one sample at a time into a ring; a fractional read
//! cursor walks the same ring at `ratio` samples per input sample and the
//! output is linearly interpolated between the two entries around it.
//! Ratios below 1 lower the pitch, above 1 raise it.

use super::Effect;
use crate::constants::{MAX_PITCH_RATIO, MIN_PITCH_RATIO, PITCH_BUFFER_SIZE};

pub struct PitchShifter {
    buffer: Vec<f32>,
    /// Next index to write
    write_pos: usize,
    /// Fractional read cursor, always in `[0, len)`
    read_pos: f32,
    ratio: f32,
}

impl PitchShifter {
    pub fn new() -> Self {
        Self::with_len(PITCH_BUFFER_SIZE)
    }

    /// Ring of `len` samples; `len` must be at least 8.
    pub fn with_len(len: usize) -> Self {
        let len = len.max(8);
        let mut shifter = Self {
            buffer: vec![0.0; len],
            write_pos: 0,
            read_pos: 0.0,
            ratio: 1.0,
        };
        shifter.resync();
        shifter
    }

    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio.clamp(MIN_PITCH_RATIO, MAX_PITCH_RATIO);
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn read_pos(&self) -> f32 {
        self.read_pos
    }

    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Samples between the read cursor and the next write
    fn lag(&self) -> f32 {
        (self.write_pos as f32 - self.read_pos).rem_euclid(self.buffer.len() as f32)
    }

    /// Park the read cursor a quarter ring behind the write cursor.
    fn resync(&mut self) {
        let len = self.buffer.len();
        let target = (self.write_pos + len - len / 4) % len;
        self.read_pos = target as f32;
    }
}

impl Default for PitchShifter {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for PitchShifter {
    fn process(&mut self, samples: &mut [f32]) {
        let len = self.buffer.len();
        let half = (len / 2) as f32;

        for sample in samples.iter_mut() {
            self.buffer[self.write_pos] = *sample;
            self.write_pos = (self.write_pos + 1) % len;

            // Both interpolation taps must already hold written samples
            let lag = self.lag();
            if lag < 2.0 || lag > half {
                self.resync();
            }

            let i0 = (self.read_pos as usize) % len;
            let i1 = (i0 + 1) % len;
            let frac = (self.read_pos - i0 as f32).clamp(0.0, 1.0);
            *sample = self.buffer[i0] * (1.0 - frac) + self.buffer[i1] * frac;

            self.read_pos += self.ratio;
            if self.read_pos >= len as f32 {
                self.read_pos -= len as f32;
            }
        }
    }

    fn name(&self) -> &'static str {
        "pitch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unity_ratio_is_a_pure_delay() {
        let mut shifter = PitchShifter::with_len(64);
        let delay = 64 / 4;
        let input: Vec<f32> = (0..200).map(|i| ((i % 17) as f32 / 17.0) - 0.5).collect();
        let mut output = input.clone();

        shifter.process(&mut output);

        // With ratio 1 the cursor stays a fixed distance behind the writer
        assert!(output[..delay].iter().all(|&s| s == 0.0));
        for i in delay..input.len() {
            assert_eq!(output[i], input[i - delay]);
        }
    }

    #[test]
    fn test_cursors_stay_in_range() {
        for &ratio in &[0.5, 0.6, 1.0, 1.4, 2.0] {
            let mut shifter = PitchShifter::with_len(256);
            shifter.set_ratio(ratio);
            let mut frame = vec![0.25; 97];
            for _ in 0..50 {
                shifter.process(&mut frame);
                assert!(shifter.read_pos() >= 0.0 && shifter.read_pos() < 256.0);
                assert!(shifter.write_pos() < 256);
            }
        }
    }

    #[test]
    fn test_cursor_resyncs_when_gap_leaves_window() {
        const LEN: usize = 64;
        let len = LEN as f32;

        for &ratio in &[0.5f32, 2.0] {
            let mut shifter = PitchShifter::with_len(LEN);
            shifter.set_ratio(ratio);
            let mut gap = (shifter.write_pos() as f32 - shifter.read_pos()).rem_euclid(len);
            let mut resyncs = 0;

            for i in 0..LEN * 8 {
                // Gap the next sample will see once it has been written
                let next_lag = (gap + 1.0).rem_euclid(len);
                let mut sample = [(i % 5) as f32 * 0.1];
                shifter.process(&mut sample);

                gap = (shifter.write_pos() as f32 - shifter.read_pos()).rem_euclid(len);
                // The cursor advanced by `ratio` after reading
                let read_lag = gap + ratio;
                assert!(
                    (2.0..=len / 2.0).contains(&read_lag),
                    "ratio {}: read {} samples behind the writer",
                    ratio,
                    read_lag
                );

                if next_lag < 2.0 || next_lag > len / 2.0 {
                    assert_eq!(read_lag, len / 4.0);
                    resyncs += 1;
                } else {
                    assert_eq!(read_lag, next_lag);
                }
            }

            assert!(resyncs >= 8, "ratio {}: only {} resyncs", ratio, resyncs);
        }
    }

    #[test]
    fn test_ratio_is_clamped() {
        let mut shifter = PitchShifter::new();
        shifter.set_ratio(15.0);
        assert_eq!(shifter.ratio(), MAX_PITCH_RATIO);
        shifter.set_ratio(0.0);
        assert_eq!(shifter.ratio(), MIN_PITCH_RATIO);
        assert_eq!(shifter.name(), "pitch");
    }

    #[test]
    fn test_output_bounded_by_input() {
        let mut shifter = PitchShifter::new();
        shifter.set_ratio(1.4);
        let mut frame: Vec<f32> = (0..512).map(|i| (i as f32 * 0.05).sin()).collect();
        for _ in 0..20 {
            shifter.process(&mut frame);
            assert!(frame.iter().all(|s| s.abs() <= 1.0));
        }
    }
}
