//! Device stream supervision
//!
//! `cpal::Stream` is not `Send` on every host, so each stream is built,
//! kept alive and torn down on its own thread. The thread reports the
//! startup result back to the caller, then waits on the stream's error
//! channel. A runtime stream error is recovered by rebuilding the stream
//! once; if that fails the stream moves to [`BridgeState::Stopped`].

use cpal::traits::StreamTrait;
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio::bridge::{BridgeState, BridgeStatus};
use crate::error::AudioError;

/// How often the supervisor checks its running flag
const SUPERVISE_INTERVAL: Duration = Duration::from_millis(50);

/// Handle to a stream running on its own thread
pub struct StreamHandle {
    name: String,
    running: Arc<AtomicBool>,
    status: Arc<BridgeStatus>,
    recoveries: Arc<AtomicU64>,
    thread_handle: Option<JoinHandle<()>>,
}

impl StreamHandle {
    /// Spawn the stream thread and wait until the stream is playing.
    ///
    /// `build` is called with a sender for runtime errors and must return a
    /// ready stream. A failure here is a device initialization error.
    pub fn spawn<F>(name: &str, mut build: F) -> Result<Self, AudioError>
    where
        F: FnMut(Sender<AudioError>) -> Result<cpal::Stream, AudioError> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let status = Arc::new(BridgeStatus::new());
        let recoveries = Arc::new(AtomicU64::new(0));
        let (startup_tx, startup_rx) = bounded::<Result<(), AudioError>>(1);

        let thread_running = running.clone();
        let thread_status = status.clone();
        let thread_recoveries = recoveries.clone();
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(format!("stream-{}", name))
            .spawn(move || {
                let (error_tx, error_rx) = bounded::<AudioError>(16);

                let mut stream = match start_stream(&mut build, error_tx.clone()) {
                    Ok(stream) => stream,
                    Err(e) => {
                        thread_status.set(BridgeState::Stopped);
                        let _ = startup_tx.send(Err(e));
                        return;
                    }
                };
                thread_status.set(BridgeState::Streaming);
                let _ = startup_tx.send(Ok(()));

                while thread_running.load(Ordering::Relaxed) {
                    match error_rx.recv_timeout(SUPERVISE_INTERVAL) {
                        Ok(err) => {
                            tracing::warn!("{} stream error: {}, re-preparing device", thread_name, err);
                            drop(stream);
                            // Errors queued by the old stream are stale now
                            while error_rx.try_recv().is_ok() {}

                            match start_stream(&mut build, error_tx.clone()) {
                                Ok(rebuilt) => {
                                    stream = rebuilt;
                                    thread_recoveries.fetch_add(1, Ordering::Relaxed);
                                    tracing::info!("{} stream recovered", thread_name);
                                }
                                Err(e) => {
                                    tracing::error!("{} stream could not be rebuilt: {}", thread_name, e);
                                    thread_status.set(BridgeState::Stopped);
                                    return;
                                }
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                drop(stream);
                thread_status.set(BridgeState::Stopped);
            })
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

        match startup_rx.recv() {
            Ok(Ok(())) => {
                tracing::info!("{} stream started", name);
                Ok(Self {
                    name: name.to_string(),
                    running,
                    status,
                    recoveries,
                    thread_handle: Some(handle),
                })
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(AudioError::DeviceInit(format!("{} stream thread exited", name)))
            }
        }
    }

    pub fn state(&self) -> BridgeState {
        self.status.get()
    }

    /// Times the stream was rebuilt after a runtime error
    pub fn recoveries(&self) -> u64 {
        self.recoveries.load(Ordering::Relaxed)
    }

    /// Close the stream and join its thread
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
            tracing::info!("{} stream stopped", self.name);
        }
        self.status.set(BridgeState::Stopped);
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn start_stream<F>(build: &mut F, error_tx: Sender<AudioError>) -> Result<cpal::Stream, AudioError>
where
    F: FnMut(Sender<AudioError>) -> Result<cpal::Stream, AudioError>,
{
    let stream = build(error_tx)?;
    stream.play()?;
    Ok(stream)
}
