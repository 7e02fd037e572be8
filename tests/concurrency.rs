//! Selection changes racing the audio path

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use lan_voice_fx::audio::FrameProcessor;
use lan_voice_fx::config::EffectConfig;
use lan_voice_fx::effects::{EffectEngine, EffectSelector};
use lan_voice_fx::state::create_shared_state;

const FRAME_SIZE: usize = 256;

#[test]
fn toggling_never_tears_selection() {
    let shared = create_shared_state();
    let stop = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = [EffectSelector::Pitch(0.75), EffectSelector::Wobble(3.0)]
        .into_iter()
        .map(|selector| {
            let shared = shared.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    shared.publish(selector);
                    shared.publish(EffectSelector::Echo);
                }
            })
        })
        .collect();

    let engine = EffectEngine::new(&EffectConfig::default(), 44_100);
    let mut processor = FrameProcessor::new(engine, shared.clone(), FRAME_SIZE);
    let input: Vec<i16> = (0..FRAME_SIZE).map(|i| (i as i16 - 128) * 200).collect();
    let mut output = vec![0i16; FRAME_SIZE];

    for _ in 0..20_000 {
        processor.process(&input, &mut output);
        let active = processor.active();
        let consistent = match active {
            EffectSelector::None | EffectSelector::Echo => true,
            EffectSelector::Pitch(r) => r == 0.75,
            EffectSelector::Wobble(r) => r == 3.0,
            _ => false,
        };
        assert!(consistent, "torn selection: {:?}", active);
    }

    stop.store(true, Ordering::Relaxed);
    for writer in writers {
        writer.join().unwrap();
    }
    assert_eq!(processor.frames_processed(), 20_000);
}

#[test]
fn reads_agree_with_last_publish() {
    let shared = create_shared_state();
    let reader = {
        let shared = shared.clone();
        thread::spawn(move || {
            let mut seen = 0u32;
            for _ in 0..100_000 {
                if let Some(selector) = shared.try_snapshot() {
                    if let EffectSelector::Pitch(r) = selector {
                        assert!((0.5..=2.0).contains(&r));
                    }
                    seen += 1;
                }
            }
            seen
        })
    };

    for i in 0..10_000 {
        shared.publish(EffectSelector::Pitch(0.5 + (i % 16) as f32 / 10.0));
    }
    shared.publish(EffectSelector::Reverb);

    assert!(reader.join().unwrap() > 0);
    assert_eq!(shared.snapshot(), EffectSelector::Reverb);
    assert_eq!(shared.changes(), 10_001);
}
