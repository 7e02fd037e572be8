//! Playback of queued PCM frames on the output device

use cpal::traits::DeviceTrait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::audio::bridge::BridgeState;
use crate::audio::buffer::{PcmFrame, SharedFrameQueue};
use crate::audio::device::{output_device, stream_config};
use crate::audio::stream::StreamHandle;
use crate::codec::pcm::normalize;
use crate::config::AudioConfig;
use crate::error::AudioError;

/// Read position inside the frame currently being played
pub struct PlaybackCursor {
    queue: SharedFrameQueue,
    current: Option<PcmFrame>,
    pos: usize,
}

impl PlaybackCursor {
    pub fn new(queue: SharedFrameQueue) -> Self {
        Self {
            queue,
            current: None,
            pos: 0,
        }
    }

    /// Fill an interleaved output buffer, copying each mono sample to every
    /// channel. Runs out of queued frames into silence.
    ///
    /// Returns the number of output frames that had audio.
    pub fn fill(&mut self, data: &mut [f32], channels: usize) -> usize {
        let channels = channels.max(1);
        let mut played = 0;

        for out in data.chunks_mut(channels) {
            let sample = match self.next_sample() {
                Some(sample) => {
                    played += 1;
                    normalize(sample)
                }
                None => 0.0,
            };
            out.fill(sample);
        }
        if played * channels < data.len() {
            self.queue.record_underrun();
        }
        played
    }

    fn next_sample(&mut self) -> Option<i16> {
        loop {
            if let Some(frame) = &self.current {
                if self.pos < frame.len() {
                    let sample = frame[self.pos];
                    self.pos += 1;
                    return Some(sample);
                }
            }

            if let Some(done) = self.current.take() {
                self.queue.recycle(done);
            }
            self.current = Some(self.queue.try_pop()?);
            self.pos = 0;
        }
    }
}

/// Output stream draining a frame queue
pub struct AudioPlayback {
    /// Frames waiting to be played
    queue: SharedFrameQueue,
    /// Mono samples that carried audio rather than underrun silence
    samples_played: Arc<AtomicU64>,
    /// Stream thread handle, present while playing
    stream: Option<StreamHandle>,
    /// Output device name; `None` selects the host default
    device_name: Option<String>,
    sample_rate: u32,
}

impl AudioPlayback {
    pub fn new(config: &AudioConfig, queue: SharedFrameQueue) -> Self {
        Self {
            queue,
            samples_played: Arc::new(AtomicU64::new(0)),
            stream: None,
            device_name: config.output_device.clone(),
            sample_rate: config.sample_rate,
        }
    }

    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let queue = self.queue.clone();
        let samples_played = self.samples_played.clone();
        let device_name = self.device_name.clone();
        let sample_rate = self.sample_rate;

        let handle = StreamHandle::spawn("playback", move |error_tx| {
            let device = output_device(device_name.as_deref())?;
            let config = stream_config(&device, sample_rate, false)?;
            let channels = config.channels as usize;
            tracing::info!(
                "Playback device: {} ({} Hz, {} ch)",
                device.name().unwrap_or_else(|_| "Unknown".into()),
                sample_rate,
                channels
            );

            let mut cursor = PlaybackCursor::new(queue.clone());
            let samples_played = samples_played.clone();
            let stream = device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let played = cursor.fill(data, channels);
                    samples_played.fetch_add(played as u64, Ordering::Relaxed);
                },
                move |err| {
                    let _ = error_tx.try_send(AudioError::StreamError(err.to_string()));
                },
                None,
            )?;
            Ok(stream)
        })?;

        self.stream = Some(handle);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
    }

    pub fn state(&self) -> BridgeState {
        self.stream
            .as_ref()
            .map(|s| s.state())
            .unwrap_or(BridgeState::Idle)
    }

    pub fn samples_played(&self) -> u64 {
        self.samples_played.load(Ordering::Relaxed)
    }
}

impl Drop for AudioPlayback {
    fn drop(&mut self) {
        self.stop();
    }
}
