//! Voice Effects Receiver
//!
//! Accepts one raw PCM stream and plays it. Effect names relayed by the
//! sender are logged as they arrive, before, during and after the stream.
//!
//! Only an audio device or listener setup failure stops the process; the
//! end of the audio session does not.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::thread;

use lan_voice_fx::{
    audio::{create_frame_queue, print_devices, AudioPlayback},
    config::AppConfig,
    control::{ControlChannel, ControlServer},
    network::{accept_and_receive, ChannelKind, SessionListener},
    state::create_shared_state,
};

fn main() -> Result<()> {
    lan_voice_fx::init_logging();
    tracing::info!("Starting LAN Voice FX receiver");

    let config = AppConfig::load()?;
    config.validate()?;
    print_devices();

    let audio_listener = SessionListener::bind(
        config.network.audio_bind_addr()?,
        ChannelKind::Audio,
        &config.network,
    )?;
    let control_listener = SessionListener::bind(
        config.network.control_bind_addr()?,
        ChannelKind::Control,
        &config.network,
    )?;

    // Mirrors the sender's selection for display only
    let channel = Arc::new(ControlChannel::new(create_shared_state(), &config.effects));
    let server = ControlServer::new(channel.clone(), &config.network);
    let control = thread::Builder::new()
        .name("control-server".into())
        .spawn(move || {
            if let Err(e) = server.run(&control_listener) {
                tracing::error!("Control server stopped: {}", e);
            }
        })?;

    let queue = create_frame_queue(config.audio.queue_capacity, config.audio.frame_size);
    let mut playback = AudioPlayback::new(&config.audio, queue.clone());
    playback.start().context("failed to start audio playback")?;

    let audio = {
        let frame_size = config.audio.frame_size;
        let mut sink = queue.clone();
        thread::Builder::new()
            .name("audio-receiver".into())
            .spawn(move || accept_and_receive(&audio_listener, frame_size, &mut sink))?
    };

    // Session errors are logged where they happen
    if audio.join().is_err() {
        tracing::error!("Audio receiver thread panicked");
    }

    playback.stop();
    let stats = queue.stats();
    tracing::info!(
        "Stats: {} samples played, {} overflows, {} underruns, {} effect changes",
        playback.samples_played(),
        stats.overflows,
        stats.underruns,
        channel.messages_applied()
    );

    tracing::info!("Audio session over; still logging effect changes");
    if control.join().is_err() {
        tracing::error!("Control server thread panicked");
    }
    Ok(())
}
