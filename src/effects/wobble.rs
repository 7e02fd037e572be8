//! Wobble (tremolo): amplitude modulation by a slow sine

use std::f32::consts::TAU;

use super::{advance_phase, Effect, MAX_WOBBLE_RATE, MIN_WOBBLE_RATE};

pub struct Wobble {
    phase: f32,
    rate: f32,
    sample_rate: f32,
}

impl Wobble {
    pub fn new(sample_rate: u32, rate: f32) -> Self {
        Self {
            phase: 0.0,
            rate: rate.clamp(MIN_WOBBLE_RATE, MAX_WOBBLE_RATE),
            sample_rate: sample_rate.max(1) as f32,
        }
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.clamp(MIN_WOBBLE_RATE, MAX_WOBBLE_RATE);
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl Effect for Wobble {
    fn process(&mut self, samples: &mut [f32]) {
        let increment = TAU * self.rate / self.sample_rate;
        for sample in samples.iter_mut() {
            // 0.5 + 0.5·sin stays within [0, 1]
            let gain = 0.5 + 0.5 * self.phase.sin();
            *sample *= gain;
            self.phase = advance_phase(self.phase, increment);
        }
    }

    fn name(&self) -> &'static str {
        "wobble"
    }
}
