//! Voice Effects Sender
//!
//! Captures the microphone, applies the selected effect and streams raw PCM
//! to a receiver over TCP. The active effect is relayed on the control port.
//!
//! Only an audio device failure stops the process. A receiver that is
//! missing or goes away ends the audio or relay thread; the console keeps
//! running.
//!
//! Usage: `sender [receiver-host]` (defaults to 127.0.0.1)

use anyhow::{Context, Result};
use std::io;
use std::thread;

use lan_voice_fx::{
    audio::{create_frame_queue, print_devices, AudioBridge, AudioCapture, FrameProcessor},
    config::AppConfig,
    control::{run_console, ControlChannel, ControlForwarder},
    effects::EffectEngine,
    network::{connect_and_send, ChannelKind, NetworkSession},
    state::create_shared_state,
};

fn main() -> Result<()> {
    lan_voice_fx::init_logging();
    tracing::info!("Starting LAN Voice FX sender");

    let config = AppConfig::load()?;
    config.validate()?;
    print_devices();

    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1".to_string());
    tracing::info!("Target receiver: {}", host);

    let shared = create_shared_state();
    let channel = ControlChannel::new(shared.clone(), &config.effects);
    let queue = create_frame_queue(config.audio.queue_capacity, config.audio.frame_size);

    let engine = EffectEngine::new(&config.effects, config.audio.sample_rate);
    let processor = FrameProcessor::new(engine, shared.clone(), config.audio.frame_size);
    let mut capture = AudioCapture::new(&config.audio, AudioBridge::new(processor, queue.clone()));
    capture.start().context("failed to start audio capture")?;

    let transport = {
        let network = config.network.clone();
        let host = host.clone();
        let frame_size = config.audio.frame_size;
        let mut source = queue.clone();
        thread::Builder::new()
            .name("audio-sender".into())
            .spawn(move || {
                let addr = network.audio_peer_addr(&host).map_err(|e| {
                    tracing::error!("Audio stream unavailable: {}", e);
                    e
                })?;
                connect_and_send(addr, &network, frame_size, &mut source)
            })?
    };

    {
        let network = config.network.clone();
        let shared = shared.clone();
        thread::Builder::new()
            .name("control-forwarder".into())
            .spawn(move || {
                let session = network
                    .control_peer_addr(&host)
                    .and_then(|addr| NetworkSession::connect(addr, ChannelKind::Control, &network));
                let session = match session {
                    Ok(session) => session,
                    Err(e) => {
                        tracing::warn!("Effect relay disabled: {}", e);
                        return;
                    }
                };

                let mut forwarder = ControlForwarder::new(session, shared, network.poll_interval());
                if let Err(e) = forwarder.run() {
                    tracing::error!("Control forwarder stopped: {}", e);
                }
            })?;
    }

    run_console(io::stdin().lock(), io::stdout(), &channel)?;

    // Closing the queue lets the transport drain and finish
    capture.stop();
    if transport.join().is_err() {
        tracing::error!("Audio sender thread panicked");
    }

    let stats = queue.stats();
    tracing::info!(
        "Stats: {} frames processed, {} overflows, {} effect changes, {} contended reads",
        capture.frames_processed(),
        stats.overflows,
        channel.messages_applied(),
        shared.contended_reads()
    );
    Ok(())
}
