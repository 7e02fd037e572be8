//! Loopback tests for the raw PCM audio stream

use std::thread;

use lan_voice_fx::audio::{create_frame_queue, AudioBridge, FrameProcessor};
use lan_voice_fx::config::{EffectConfig, NetworkConfig};
use lan_voice_fx::effects::EffectEngine;
use lan_voice_fx::error::NetworkError;
use lan_voice_fx::network::{
    accept_and_receive, connect_and_send, receive_session, send_session, AudioReceiver,
    ChannelKind, FrameSink, FrameSource, NetworkSession, SessionListener,
};
use lan_voice_fx::state::create_shared_state;

const FRAME_SIZE: usize = 64;

struct Collect(Vec<Vec<i16>>);

impl FrameSink for Collect {
    fn write_frame(&mut self, frame: &[i16]) {
        self.0.push(frame.to_vec());
    }
}

fn listener(kind: ChannelKind) -> SessionListener {
    let addr = "127.0.0.1:0".parse().unwrap();
    SessionListener::bind(addr, kind, &NetworkConfig::default()).unwrap()
}

fn test_frame(index: usize) -> Vec<i16> {
    (0..FRAME_SIZE)
        .map(|i| ((index * 977 + i * 131) % 65_536) as i32 - 32_768)
        .map(|v| v as i16)
        .collect()
}

#[test]
fn round_trip_with_no_effect_is_identical_and_ordered() {
    const FRAMES: usize = 50;

    let listener = listener(ChannelKind::Audio);
    let addr = listener.local_addr().unwrap();

    // Capture side: frames go through the bridge with no effect selected
    let shared = create_shared_state();
    let queue = create_frame_queue(FRAMES + 1, FRAME_SIZE);
    let engine = EffectEngine::new(&EffectConfig::default(), 44_100);
    let processor = FrameProcessor::new(engine, shared, FRAME_SIZE);
    let mut bridge = AudioBridge::new(processor, queue.clone());

    let sent: Vec<Vec<i16>> = (0..FRAMES).map(test_frame).collect();
    for frame in &sent {
        bridge.push_pcm(frame.iter().copied());
    }
    queue.close();

    let sender = thread::spawn(move || {
        let session =
            NetworkSession::connect(addr, ChannelKind::Audio, &NetworkConfig::default()).unwrap();
        let mut source = queue;
        send_session(session, FRAME_SIZE, &mut source)
    });

    let session = listener.accept().unwrap();
    let mut sink = Collect(Vec::new());
    let received = receive_session(session, FRAME_SIZE, &mut sink).unwrap();
    let sent_stats = sender.join().unwrap().unwrap();

    assert_eq!(sink.0, sent);
    assert_eq!(received.frames, FRAMES as u64);
    assert_eq!(sent_stats.frames, FRAMES as u64);
    assert_eq!(received.bytes, (FRAMES * FRAME_SIZE * 2) as u64);
}

#[test]
fn disconnect_mid_frame_ends_session() {
    use std::io::Write;

    let listener = listener(ChannelKind::Audio);
    let addr = listener.local_addr().unwrap();

    let writer = thread::spawn(move || {
        let mut session =
            NetworkSession::connect(addr, ChannelKind::Audio, &NetworkConfig::default()).unwrap();
        // One whole frame, then half of the next
        session.write_all(&vec![0u8; FRAME_SIZE * 2]).unwrap();
        session.write_all(&vec![0u8; FRAME_SIZE]).unwrap();
    });

    let session = listener.accept().unwrap();
    writer.join().unwrap();

    let mut receiver = AudioReceiver::new(session, FRAME_SIZE);
    let mut sink = Collect(Vec::new());
    let err = receiver.run(&mut sink).unwrap_err();

    assert_eq!(sink.0.len(), 1);
    assert!(matches!(
        err,
        NetworkError::PartialFrame { got, expected } if got == FRAME_SIZE && expected == FRAME_SIZE * 2
    ));
}

#[test]
fn receiver_gone_ends_sender() {
    let listener = listener(ChannelKind::Audio);
    let addr = listener.local_addr().unwrap();

    let acceptor = thread::spawn(move || {
        let session = listener.accept().unwrap();
        drop(session);
    });

    let session =
        NetworkSession::connect(addr, ChannelKind::Audio, &NetworkConfig::default()).unwrap();
    acceptor.join().unwrap();

    // Never closed: only a write failure can end the session
    let queue = create_frame_queue(4, FRAME_SIZE);
    let feeder = queue.clone();
    let producer = thread::spawn(move || {
        for _ in 0..2_000 {
            if let Some(mut slot) = feeder.acquire() {
                slot.fill(1);
                feeder.push(slot);
            }
            thread::sleep(std::time::Duration::from_millis(1));
        }
        feeder.close();
    });

    let mut source = queue;
    let result = send_session(session, FRAME_SIZE, &mut source);
    producer.join().unwrap();

    assert!(matches!(result, Err(NetworkError::SendFailed(_))));
}

#[test]
fn refused_connect_ends_only_the_calling_thread() {
    let addr = listener(ChannelKind::Audio).local_addr().unwrap();

    let mut queue = create_frame_queue(4, FRAME_SIZE);
    let mut slot = queue.acquire().unwrap();
    slot.fill(7);
    queue.push(slot);

    let worker = {
        let mut source = queue.clone();
        thread::spawn(move || {
            connect_and_send(addr, &NetworkConfig::default(), FRAME_SIZE, &mut source)
        })
    };
    let result = worker.join().unwrap();

    assert!(matches!(result, Err(NetworkError::ConnectionFailed(_))));
    // Nothing was taken from the queue
    assert_eq!(queue.len(), 1);
    let mut frame = [0i16; FRAME_SIZE];
    assert!(queue.read_frame(&mut frame));
    assert_eq!(frame, [7; FRAME_SIZE]);
}

#[test]
fn receiver_thread_finishes_and_listener_survives() {
    let listener = listener(ChannelKind::Audio);
    let addr = listener.local_addr().unwrap();

    let receiver = thread::spawn(move || {
        let mut sink = Collect(Vec::new());
        let stats = accept_and_receive(&listener, FRAME_SIZE, &mut sink);
        (stats, sink.0.len(), listener)
    });

    {
        use std::io::Write;
        let mut session =
            NetworkSession::connect(addr, ChannelKind::Audio, &NetworkConfig::default()).unwrap();
        session.write_all(&vec![0u8; FRAME_SIZE * 2 * 3]).unwrap();
    }

    let (stats, frames, listener) = receiver.join().unwrap();
    assert_eq!(stats.unwrap().frames, 3);
    assert_eq!(frames, 3);
    assert_eq!(listener.local_addr().unwrap(), addr);
}
