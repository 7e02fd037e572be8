//! Local Voice Effects Monitor
//!
//! Microphone to speaker on one machine with the selected effect applied.
//! Effects are chosen at the console or by a peer on the control port.

use anyhow::{Context, Result};
use std::io;
use std::sync::Arc;
use std::thread;

use lan_voice_fx::{
    audio::{create_frame_queue, print_devices, AudioBridge, AudioCapture, AudioPlayback, FrameProcessor},
    config::AppConfig,
    control::{run_console, ControlChannel, ControlServer},
    effects::EffectEngine,
    network::{ChannelKind, SessionListener},
    state::create_shared_state,
};

fn main() -> Result<()> {
    lan_voice_fx::init_logging();
    tracing::info!("Starting LAN Voice FX monitor");

    let config = AppConfig::load()?;
    config.validate()?;
    print_devices();

    let shared = create_shared_state();
    let channel = Arc::new(ControlChannel::new(shared.clone(), &config.effects));
    let queue = create_frame_queue(config.audio.queue_capacity, config.audio.frame_size);

    let engine = EffectEngine::new(&config.effects, config.audio.sample_rate);
    let processor = FrameProcessor::new(engine, shared.clone(), config.audio.frame_size);
    let mut capture = AudioCapture::new(&config.audio, AudioBridge::new(processor, queue.clone()));
    let mut playback = AudioPlayback::new(&config.audio, queue.clone());

    capture.start().context("failed to start audio capture")?;
    playback.start().context("failed to start audio playback")?;
    tracing::info!(
        "Monitoring at {} Hz, {} samples/frame ({:.1}ms)",
        config.audio.sample_rate,
        config.audio.frame_size,
        config.audio.frame_duration_ms()
    );

    // Remote control is optional for the local monitor
    match SessionListener::bind(
        config.network.control_bind_addr()?,
        ChannelKind::Control,
        &config.network,
    ) {
        Ok(listener) => {
            let server = ControlServer::new(channel.clone(), &config.network);
            thread::Builder::new()
                .name("control-server".into())
                .spawn(move || {
                    if let Err(e) = server.run(&listener) {
                        tracing::error!("Control server stopped: {}", e);
                    }
                })?;
        }
        Err(e) => tracing::warn!("Remote control disabled: {}", e),
    }

    run_console(io::stdin().lock(), io::stdout(), &channel)?;

    capture.stop();
    playback.stop();

    let stats = queue.stats();
    tracing::info!(
        "Stats: {} frames processed, {} samples played, {} overflows, {} underruns, {} effect changes, {} contended reads",
        capture.frames_processed(),
        playback.samples_played(),
        stats.overflows,
        stats.underruns,
        channel.messages_applied(),
        shared.contended_reads()
    );
    Ok(())
}
