//! Robot voice: ring modulation against a square carrier
//!
//! `out = sign(sin(phase)) · |in|`, carrier fixed at a low frequency.

use std::f32::consts::TAU;

use super::{advance_phase, Effect};

pub struct Robot {
    phase: f32,
    increment: f32,
}

impl Robot {
    pub fn new(sample_rate: u32, carrier_hz: f32) -> Self {
        Self {
            phase: 0.0,
            increment: TAU * carrier_hz / sample_rate.max(1) as f32,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl Effect for Robot {
    fn process(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            let carrier = if self.phase.sin() >= 0.0 { 1.0 } else { -1.0 };
            *sample = carrier * sample.abs();
            self.phase = advance_phase(self.phase, self.increment);
        }
    }

    fn name(&self) -> &'static str {
        "robot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_preserved_sign_follows_carrier() {
        // 100 Hz at 1 kHz: 5 positive samples then 5 negative
        let mut robot = Robot::new(1000, 100.0);
        let mut frame = vec![-0.5; 10];
        robot.process(&mut frame);

        assert!(frame.iter().all(|s| (s.abs() - 0.5).abs() < 1e-6));
        assert!(frame[1] > 0.0);
        assert!(frame[7] < 0.0);
    }

    #[test]
    fn test_phase_stays_wrapped() {
        let mut robot = Robot::new(44_100, 80.0);
        let mut frame = vec![0.1; 512];
        for _ in 0..200 {
            robot.process(&mut frame);
            assert!((0.0..TAU).contains(&robot.phase()));
        }
        assert_eq!(robot.name(), "robot");
    }
}
