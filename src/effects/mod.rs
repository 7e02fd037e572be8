//! Real-time effect engine
//!
//! Each effect is a handler type that owns its continuous state (phase
//! accumulators, delay lines) and implements [`Effect`]. [`EffectEngine`]
//! holds one handler per variant and routes each frame to the handler the
//! current [`EffectSelector`] names. Handlers keep their state when the
//! selection moves away and back; nothing is reset on a switch.

pub mod distortion;
pub mod echo;
pub mod pitch;
pub mod reverb;
pub mod robot;
pub mod wobble;

pub use distortion::Distortion;
pub use echo::Echo;
pub use pitch::PitchShifter;
pub use reverb::Reverb;
pub use robot::Robot;
pub use wobble::Wobble;

use std::f32::consts::TAU;
use std::fmt;

use crate::config::EffectConfig;
use crate::constants::{MAX_PITCH_RATIO, MIN_PITCH_RATIO};

/// Wobble rate bounds in Hz
pub const MIN_WOBBLE_RATE: f32 = 0.1;
pub const MAX_WOBBLE_RATE: f32 = 40.0;

/// The active effect plus its numeric parameter
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EffectSelector {
    #[default]
    None,
    PitchDown,
    PitchUp,
    /// Custom pitch ratio
    Pitch(f32),
    /// Tremolo rate in Hz
    Wobble(f32),
    Robot,
    Echo,
    Reverb,
    Distortion,
}

impl EffectSelector {
    /// Command token naming this effect
    pub fn name(&self) -> &'static str {
        match self {
            EffectSelector::None => "none",
            EffectSelector::PitchDown => "low",
            EffectSelector::PitchUp => "high",
            EffectSelector::Pitch(_) => "pitch",
            EffectSelector::Wobble(_) => "wobble",
            EffectSelector::Robot => "robot",
            EffectSelector::Echo => "echo",
            EffectSelector::Reverb => "reverb",
            EffectSelector::Distortion => "distortion",
        }
    }

    pub fn parameter(&self) -> Option<f32> {
        match *self {
            EffectSelector::Pitch(ratio) => Some(ratio),
            EffectSelector::Wobble(rate) => Some(rate),
            _ => None,
        }
    }

    /// Same selection with its parameter pulled into the safe range.
    ///
    /// Non-finite parameters cannot be clamped meaningfully and fall back
    /// to `None`.
    pub fn clamped(self) -> Self {
        match self {
            EffectSelector::Pitch(ratio) if ratio.is_finite() => {
                EffectSelector::Pitch(ratio.clamp(MIN_PITCH_RATIO, MAX_PITCH_RATIO))
            }
            EffectSelector::Wobble(rate) if rate.is_finite() => {
                EffectSelector::Wobble(rate.clamp(MIN_WOBBLE_RATE, MAX_WOBBLE_RATE))
            }
            EffectSelector::Pitch(_) | EffectSelector::Wobble(_) => EffectSelector::None,
            other => other,
        }
    }
}

impl fmt::Display for EffectSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parameter() {
            Some(value) => write!(f, "{} {}", self.name(), value),
            None => f.write_str(self.name()),
        }
    }
}

/// A per-variant effect handler.
///
/// `process` works in place on normalized samples and must not allocate,
/// block or fail.
pub trait Effect: Send {
    fn process(&mut self, samples: &mut [f32]);

    fn name(&self) -> &'static str;
}

/// Advance a phase accumulator and wrap it into `[0, 2π)`.
#[inline]
pub(crate) fn advance_phase(phase: f32, increment: f32) -> f32 {
    let next = phase + increment;
    if next >= TAU || next < 0.0 {
        let wrapped = next.rem_euclid(TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs
        if wrapped >= TAU {
            0.0
        } else {
            wrapped
        }
    } else {
        next
    }
}

/// One handler per effect variant, each with its own continuous state.
pub struct EffectEngine {
    pitch: PitchShifter,
    wobble: Wobble,
    robot: Robot,
    echo: Echo,
    reverb: Reverb,
    distortion: Distortion,
    low_ratio: f32,
    high_ratio: f32,
}

impl EffectEngine {
    /// Allocate every handler's buffers up front; processing never allocates.
    pub fn new(config: &EffectConfig, sample_rate: u32) -> Self {
        let config = config.sanitized();
        Self {
            pitch: PitchShifter::new(),
            wobble: Wobble::new(sample_rate, config.wobble_rate),
            robot: Robot::new(sample_rate, config.robot_carrier_hz),
            echo: Echo::new(sample_rate, config.echo_delay_ms, config.echo_feedback),
            reverb: Reverb::new(sample_rate, config.reverb_mix),
            distortion: Distortion::new(config.distortion_threshold),
            low_ratio: config.low_ratio,
            high_ratio: config.high_ratio,
        }
    }

    /// Transform one frame in place with the given selection.
    pub fn process(&mut self, selector: EffectSelector, samples: &mut [f32]) {
        let handler: &mut dyn Effect = match selector.clamped() {
            EffectSelector::None => return,
            EffectSelector::PitchDown => {
                self.pitch.set_ratio(self.low_ratio);
                &mut self.pitch
            }
            EffectSelector::PitchUp => {
                self.pitch.set_ratio(self.high_ratio);
                &mut self.pitch
            }
            EffectSelector::Pitch(ratio) => {
                self.pitch.set_ratio(ratio);
                &mut self.pitch
            }
            EffectSelector::Wobble(rate) => {
                self.wobble.set_rate(rate);
                &mut self.wobble
            }
            EffectSelector::Robot => &mut self.robot,
            EffectSelector::Echo => &mut self.echo,
            EffectSelector::Reverb => &mut self.reverb,
            EffectSelector::Distortion => &mut self.distortion,
        };
        handler.process(samples);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> EffectEngine {
        EffectEngine::new(&EffectConfig::default(), 44_100)
    }

    #[test]
    fn test_none_leaves_frame_untouched() {
        let mut engine = engine();
        let input: Vec<f32> = (0..128).map(|i| (i as f32 / 64.0) - 1.0).collect();
        let mut frame = input.clone();

        engine.process(EffectSelector::None, &mut frame);
        assert_eq!(frame, input);
    }

    #[test]
    fn test_clamped_pitch_ratio() {
        assert_eq!(EffectSelector::Pitch(5.0).clamped(), EffectSelector::Pitch(2.0));
        assert_eq!(EffectSelector::Pitch(0.1).clamped(), EffectSelector::Pitch(0.5));
        assert_eq!(EffectSelector::Pitch(f32::NAN).clamped(), EffectSelector::None);
        assert_eq!(EffectSelector::Wobble(1000.0).clamped(), EffectSelector::Wobble(40.0));
    }

    #[test]
    fn test_display_includes_parameter() {
        assert_eq!(EffectSelector::Wobble(3.5).to_string(), "wobble 3.5");
        assert_eq!(EffectSelector::PitchDown.to_string(), "low");
    }

    #[test]
    fn test_advance_phase_wraps() {
        let phase = advance_phase(TAU - 0.01, 0.02);
        assert!((0.0..TAU).contains(&phase));
        assert!((phase - 0.01).abs() < 1e-4);

        let phase = advance_phase(0.0, -0.5);
        assert!((0.0..TAU).contains(&phase));
    }

    #[test]
    fn test_distortion_bounds_output() {
        let mut engine = engine();
        let mut frame = vec![0.9, -0.9, 0.2, -0.2];
        engine.process(EffectSelector::Distortion, &mut frame);
        assert_eq!(frame, vec![0.7, -0.7, 0.2, -0.2]);
    }
}
