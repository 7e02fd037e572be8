//! Effect Benchmarks
//!
//! Per-frame cost of each effect and of the full capture-side step.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lan_voice_fx::audio::FrameProcessor;
use lan_voice_fx::config::EffectConfig;
use lan_voice_fx::constants::{DEFAULT_FRAME_SIZE, DEFAULT_SAMPLE_RATE};
use lan_voice_fx::effects::{EffectEngine, EffectSelector};
use lan_voice_fx::state::create_shared_state;

fn sine_frame() -> Vec<f32> {
    (0..DEFAULT_FRAME_SIZE)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / DEFAULT_SAMPLE_RATE as f32).sin() * 0.5)
        .collect()
}

fn benchmark_effects(c: &mut Criterion) {
    let mut engine = EffectEngine::new(&EffectConfig::default(), DEFAULT_SAMPLE_RATE);
    let input = sine_frame();
    let mut frame = input.clone();

    for selector in [
        EffectSelector::None,
        EffectSelector::PitchDown,
        EffectSelector::PitchUp,
        EffectSelector::Wobble(5.0),
        EffectSelector::Robot,
        EffectSelector::Echo,
        EffectSelector::Reverb,
        EffectSelector::Distortion,
    ] {
        c.bench_function(&format!("{}_frame", selector.name()), |b| {
            b.iter(|| {
                frame.copy_from_slice(&input);
                engine.process(black_box(selector), black_box(&mut frame));
            })
        });
    }
}

fn benchmark_frame_processor(c: &mut Criterion) {
    let shared = create_shared_state();
    shared.publish(EffectSelector::Reverb);
    let engine = EffectEngine::new(&EffectConfig::default(), DEFAULT_SAMPLE_RATE);
    let mut processor = FrameProcessor::new(engine, shared, DEFAULT_FRAME_SIZE);

    let input: Vec<i16> = sine_frame().iter().map(|s| (s * 32_767.0) as i16).collect();
    let mut output = vec![0i16; DEFAULT_FRAME_SIZE];

    c.bench_function("processor_reverb_frame", |b| {
        b.iter(|| processor.process(black_box(&input), black_box(&mut output)))
    });
}

criterion_group!(benches, benchmark_effects, benchmark_frame_processor);
criterion_main!(benches);
