//! Multi-tap reverb over a single circular buffer

use super::Effect;

/// Tap delays in milliseconds
const TAP_DELAYS_MS: [f32; 5] = [23.0, 31.0, 41.0, 53.0, 67.0];
/// Per-tap gain; the sum times the maximum mix stays below 1
const TAP_GAINS: [f32; 5] = [0.30, 0.25, 0.20, 0.15, 0.10];

pub struct Reverb {
    buffer: Vec<f32>,
    pos: usize,
    taps: [usize; 5],
    mix: f32,
}

impl Reverb {
    pub fn new(sample_rate: u32, mix: f32) -> Self {
        let mut taps = [1usize; 5];
        for (tap, ms) in taps.iter_mut().zip(TAP_DELAYS_MS) {
            *tap = ((sample_rate as f32 * ms / 1000.0) as usize).max(1);
        }
        let len = taps.iter().copied().max().unwrap_or(1) + 1;

        Self {
            buffer: vec![0.0; len],
            pos: 0,
            taps,
            mix: mix.clamp(0.0, 0.6),
        }
    }

    /// Gain of the recirculating path
    pub fn loop_gain(&self) -> f32 {
        TAP_GAINS.iter().sum::<f32>() * self.mix
    }

    pub fn taps(&self) -> &[usize] {
        &self.taps
    }
}

impl Effect for Reverb {
    fn process(&mut self, samples: &mut [f32]) {
        let len = self.buffer.len();
        for sample in samples.iter_mut() {
            let input = *sample;
            let mut wet = 0.0;
            for (&delay, &gain) in self.taps.iter().zip(TAP_GAINS.iter()) {
                wet += self.buffer[(self.pos + len - delay) % len] * gain;
            }

            *sample = (1.0 - self.mix) * input + self.mix * wet;
            self.buffer[self.pos] = input + wet * self.mix;
            self.pos = (self.pos + 1) % len;
        }
    }

    fn name(&self) -> &'static str {
        "reverb"
    }
}
