//! Audio capture from the input device
//!
//! The input callback drives an [`AudioBridge`], so effect processing runs
//! on the device's own real-time thread. The bridge sits behind a mutex
//! only so that a rebuilt stream can take it over; at most one callback is
//! live at a time, and the callback uses `try_lock`, so it never waits.

use cpal::traits::DeviceTrait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::audio::bridge::{AudioBridge, BridgeState};
use crate::audio::device::{input_device, stream_config};
use crate::audio::stream::StreamHandle;
use crate::config::AudioConfig;
use crate::error::AudioError;

/// Capture stream feeding an [`AudioBridge`]
pub struct AudioCapture {
    /// Frame assembly and effect processing, driven by the callback
    bridge: Arc<Mutex<AudioBridge>>,
    /// Mono samples delivered by the device
    samples_captured: Arc<AtomicU64>,
    /// Stream thread handle, present while capturing
    stream: Option<StreamHandle>,
    /// Input device name; `None` selects the host default
    device_name: Option<String>,
    /// Requested sample rate
    sample_rate: u32,
}

impl AudioCapture {
    pub fn new(config: &AudioConfig, bridge: AudioBridge) -> Self {
        Self {
            bridge: Arc::new(Mutex::new(bridge)),
            samples_captured: Arc::new(AtomicU64::new(0)),
            stream: None,
            device_name: config.input_device.clone(),
            sample_rate: config.sample_rate,
        }
    }

    /// Open the input device and start the callback.
    ///
    /// Failure here is fatal for the caller.
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let bridge = self.bridge.clone();
        let samples_captured = self.samples_captured.clone();
        let device_name = self.device_name.clone();
        let sample_rate = self.sample_rate;

        let handle = StreamHandle::spawn("capture", move |error_tx| {
            let device = input_device(device_name.as_deref())?;
            let config = stream_config(&device, sample_rate, true)?;
            let channels = config.channels as usize;
            tracing::info!(
                "Capture device: {} ({} Hz, {} ch)",
                device.name().unwrap_or_else(|_| "Unknown".into()),
                sample_rate,
                channels
            );

            let bridge = bridge.clone();
            let samples_captured = samples_captured.clone();
            let stream = device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Some(mut bridge) = bridge.try_lock() {
                        bridge.on_input(data, channels);
                    }
                    samples_captured.fetch_add((data.len() / channels) as u64, Ordering::Relaxed);
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

    /// Stop capturing and close the frame queue so its consumer can finish
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        self.bridge.lock().sink().close();
    }

    pub fn state(&self) -> BridgeState {
        self.stream
            .as_ref()
            .map(|s| s.state())
            .unwrap_or(BridgeState::Idle)
    }

    pub fn recoveries(&self) -> u64 {
        self.stream.as_ref().map(|s| s.recoveries()).unwrap_or(0)
    }

    /// Mono samples delivered by the device so far
    pub fn samples_captured(&self) -> u64 {
        self.samples_captured.load(Ordering::Relaxed)
    }

    pub fn frames_processed(&self) -> u64 {
        self.bridge.lock().processor().frames_processed()
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
