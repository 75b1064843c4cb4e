//! Benchmarks for the piano's real-time path.
//!
//! Run with: cargo bench
//!
//! The audio callback advances the timeline and renders the synth once per
//! block, so both must finish well inside the block deadline.
//!
//! Reference timing at 48kHz sample rate:
//!   - 128 samples = 2.67ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Benchmark groups:
//!   - timeline/*   Scheduler throughput and engine dispatch
//!   - render/*     ToneSynth rendering with a full chord held

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use saavy_piano::composer::{melody::MelodyPattern, moods};
use saavy_piano::keyboard::notes::{C4, E4, G4, B4, D5};
use saavy_piano::synth::{CaptureSynth, Synthesizer, ToneSynth};
use saavy_piano::timeline::Scheduler;
use saavy_piano::{Piano, PianoConfig};

/// Common buffer sizes used in audio applications.
const BLOCK_SIZES: &[usize] = &[128, 256, 512];
const SAMPLE_RATE: f32 = 48_000.0;

fn bench_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeline/scheduler");

    // A burst of playback-sized work: schedule 1000 timers, drain them all
    group.bench_function("schedule_drain_1000", |b| {
        b.iter(|| {
            let mut scheduler = Scheduler::new(SAMPLE_RATE);
            for i in 0..1_000u32 {
                scheduler.schedule_in(f64::from(i % 97) * 10.0, i);
            }
            let mut fired = 0;
            while let Some(due) = scheduler.pop_due(u64::MAX) {
                fired += black_box(due.event) & 1;
            }
            fired
        })
    });

    group.bench_function("cancel_half_of_1000", |b| {
        b.iter(|| {
            let mut scheduler = Scheduler::new(SAMPLE_RATE);
            let handles: Vec<_> = (0..1_000u32)
                .map(|i| scheduler.schedule_in(f64::from(i), i))
                .collect();
            for handle in handles.iter().step_by(2) {
                scheduler.cancel(*handle);
            }
            black_box(scheduler.pending())
        })
    });

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeline/engine");

    for &size in BLOCK_SIZES {
        // Composer and metronome both running: the busiest the timeline gets
        let config = PianoConfig::new(SAMPLE_RATE).with_seed(1);
        let Ok(mut piano) = Piano::new(CaptureSynth::new(), config) else {
            return;
        };
        piano.compose("storm");
        piano.start_metronome();

        group.bench_with_input(BenchmarkId::new("advance_busy", size), &size, |b, &size| {
            b.iter(|| {
                piano.advance(black_box(size as u64));
                piano.synth_mut().clear_calls();
                piano.drain_notifications();
            })
        });
    }

    group.bench_function("generate_melodies", |b| {
        let mut rng = StdRng::seed_from_u64(5);
        b.iter(|| {
            for mood in moods() {
                let melody = MelodyPattern::from_tag(mood.pattern).generate(mood.scale, &mut rng);
                black_box(melody);
            }
        })
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/tone");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Five-note chord held: the typical sustained load
        let mut synth = ToneSynth::new(SAMPLE_RATE);
        for note in [C4, E4, G4, B4, D5] {
            synth.start_voice(note.frequency(), 0.7);
        }

        group.bench_with_input(BenchmarkId::new("chord5", size), &size, |b, _| {
            b.iter(|| {
                synth.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scheduler, bench_engine, bench_render);
criterion_main!(benches);
