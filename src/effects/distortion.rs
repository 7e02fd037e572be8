//! Hard symmetric clipping at a fixed threshold

use super::Effect;

pub struct Distortion {
    threshold: f32,
}

impl Distortion {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.abs().clamp(0.05, 1.0),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Effect for Distortion {
    fn process(&mut self, samples: &mut [f32]) {
        let t = self.threshold;
        for sample in samples.iter_mut() {
            *sample = sample.clamp(-t, t);
        }
    }

    fn name(&self) -> &'static str {
        "distortion"
    }
}
