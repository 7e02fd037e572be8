//! The real-time processing step between capture and output
//!
//! [`AudioBridge::on_input`] runs inside the device callback. It assembles
//! device samples into fixed-size frames and, for each one, snapshots the
//! shared selection, runs the effect engine and hands the quantized frame
//! to a [`FrameQueue`] drained by playback or the network sender.
//!
//! The selection is read once per frame, so every sample in a frame is
//! processed with the same effect and parameter.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::audio::buffer::{AudioFrame, FrameAssembler, SharedFrameQueue};
use crate::codec::pcm::quantize;
use crate::effects::{EffectEngine, EffectSelector};
use crate::state::SharedEffectHandle;

/// Lifecycle of a device stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BridgeState {
    /// Stream not opened yet
    Idle = 0,
    /// Callback firing
    Streaming = 1,
    /// Stream closed; no restart
    Stopped = 2,
}

impl BridgeState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => BridgeState::Idle,
            1 => BridgeState::Streaming,
            _ => BridgeState::Stopped,
        }
    }
}

/// Atomic cell holding a [`BridgeState`]
#[derive(Debug)]
pub struct BridgeStatus(AtomicU8);

impl BridgeStatus {
    pub fn new() -> Self {
        Self(AtomicU8::new(BridgeState::Idle as u8))
    }

    pub fn get(&self) -> BridgeState {
        BridgeState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: BridgeState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

impl Default for BridgeStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the currently selected effect to whole PCM frames.
///
/// Owns the effect engine and therefore all continuous effect state; it
/// must only ever be driven from the audio path.
pub struct FrameProcessor {
    engine: EffectEngine,
    shared: SharedEffectHandle,
    snapshot: EffectSelector,
    scratch: AudioFrame,
    frames_processed: u64,
}

impl FrameProcessor {
    pub fn new(engine: EffectEngine, shared: SharedEffectHandle, frame_size: usize) -> Self {
        let snapshot = shared.snapshot();
        Self {
            engine,
            shared,
            snapshot,
            scratch: AudioFrame::silent(frame_size),
            frames_processed: 0,
        }
    }

    /// Process one frame from `input` into `output`.
    pub fn process(&mut self, input: &[i16], output: &mut [i16]) {
        if let Some(selector) = self.shared.try_snapshot() {
            self.snapshot = selector;
        }

        self.scratch.load_pcm(input);
        self.engine.process(self.snapshot, self.scratch.samples_mut());
        self.scratch.store_pcm(output);
        self.frames_processed += 1;
    }

    /// Selection used for the most recent frame
    pub fn active(&self) -> EffectSelector {
        self.snapshot
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn frame_size(&self) -> usize {
        self.scratch.len()
    }
}

/// Capture-side bridge: device samples in, processed frames out
pub struct AudioBridge {
    assembler: FrameAssembler,
    processor: FrameProcessor,
    sink: SharedFrameQueue,
}

impl AudioBridge {
    pub fn new(processor: FrameProcessor, sink: SharedFrameQueue) -> Self {
        Self {
            assembler: FrameAssembler::new(processor.frame_size()),
            processor,
            sink,
        }
    }

    /// Feed one device callback worth of interleaved samples.
    ///
    /// Only the first channel is used.
    pub fn on_input(&mut self, data: &[f32], channels: usize) {
        let samples = data.iter().step_by(channels.max(1)).map(|&s| quantize(s));
        self.push_pcm(samples);
    }

    /// Feed native 16-bit samples
    pub fn push_pcm<I: IntoIterator<Item = i16>>(&mut self, samples: I) {
        let processor = &mut self.processor;
        let sink = &self.sink;
        self.assembler.push(samples, |input| {
            if let Some(mut output) = sink.acquire() {
                processor.process(input, &mut output);
                sink.push(output);
            }
        });
    }

    pub fn processor(&self) -> &FrameProcessor {
        &self.processor
    }

    pub fn sink(&self) -> &SharedFrameQueue {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::create_frame_queue;
    use crate::config::EffectConfig;
    use crate::state::create_shared_state;

    fn processor(frame_size: usize) -> (FrameProcessor, SharedEffectHandle) {
        let shared = create_shared_state();
        let engine = EffectEngine::new(&EffectConfig::default(), 44_100);
        (FrameProcessor::new(engine, shared.clone(), frame_size), shared)
    }

    #[test]
    fn test_none_is_bit_identical() {
        let (mut processor, _shared) = processor(6);
        let input = [i16::MIN, -300, -1, 0, 42, i16::MAX];
        let mut output = [0i16; 6];

        processor.process(&input, &mut output);
        assert_eq!(output, input);
    }

    #[test]
    fn test_switch_seen_at_next_frame() {
        let (mut processor, shared) = processor(4);
        let mut output = [0i16; 4];

        processor.process(&[1000; 4], &mut output);
        assert_eq!(processor.active(), EffectSelector::None);

        shared.publish(EffectSelector::Distortion);
        processor.process(&[30_000; 4], &mut output);
        assert_eq!(processor.active(), EffectSelector::Distortion);
        assert!(output.iter().all(|&s| s <= quantize(0.7)));
        assert_eq!(processor.frames_processed(), 2);
    }

    #[test]
    fn test_bridge_delivers_whole_frames_to_sink() {
        let (processor, _shared) = processor(4);
        let queue = create_frame_queue(8, 4);
        let mut bridge = AudioBridge::new(processor, queue.clone());

        // Stereo input: only the left channel is kept
        let data = [0.5, -0.9, 0.25, -0.9, 0.0, -0.9, -0.5, -0.9, 0.5, -0.9];
        bridge.on_input(&data, 2);

        let frame = queue.try_pop().unwrap();
        assert_eq!(frame, vec![16_384, 8_192, 0, -16_384]);
        assert!(queue.try_pop().is_none());
        assert_eq!(bridge.processor().frames_processed(), 1);
    }

    #[test]
    fn test_status_transitions() {
        let status = BridgeStatus::new();
        assert_eq!(status.get(), BridgeState::Idle);
        status.set(BridgeState::Streaming);
        assert_eq!(status.get(), BridgeState::Streaming);
        status.set(BridgeState::Stopped);
        assert_eq!(status.get(), BridgeState::Stopped);
    }
}
