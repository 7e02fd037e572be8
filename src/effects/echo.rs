//! Single-tap feedback echo

use super::Effect;

pub struct Echo {
    /// Exactly one delay period long; the slot at `pos` is the oldest sample
    buffer: Vec<f32>,
    pos: usize,
    feedback: f32,
}

impl Echo {
    pub fn new(sample_rate: u32, delay_ms: f32, feedback: f32) -> Self {
        let delay_samples = ((sample_rate as f32 * delay_ms / 1000.0) as usize).max(1);
        Self {
            buffer: vec![0.0; delay_samples],
            pos: 0,
            feedback: feedback.clamp(0.0, 0.95),
        }
    }

    pub fn delay_samples(&self) -> usize {
        self.buffer.len()
    }
}

impl Effect for Echo {
    fn process(&mut self, samples: &mut [f32]) {
        let len = self.buffer.len();
        for sample in samples.iter_mut() {
            let input = *sample;
            let delayed = self.buffer[self.pos];
            *sample = input + delayed;
            self.buffer[self.pos] = input + delayed * self.feedback;
            self.pos = (self.pos + 1) % len;
        }
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}
