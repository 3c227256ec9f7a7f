//! Interpolation and keyframe-write throughput.
//!
//! ```text
//! cargo bench --bench interpolation_bench
//! ```

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use kinema::animation::interpolate;
use kinema::{ParameterRegistry, Timeline, TimelineSettings};

fn populated_timeline(keyframes_per_track: usize) -> Timeline {
    let registry = Arc::new(ParameterRegistry::cube_transform());
    let settings = TimelineSettings::default();
    let mut timeline = Timeline::new(Arc::clone(&registry), &settings);
    timeline.initialize();

    let step = settings.duration_ms / keyframes_per_track as f32;
    let names: Vec<String> = registry.names().map(str::to_string).collect();
    for (i, name) in names.iter().enumerate() {
        let param = registry.get(name).map(|p| (p.min, p.max));
        let Some((min, max)) = param else { continue };
        for k in 0..keyframes_per_track {
            let t = k as f32 * step;
            let phase = ((k + i) % 7) as f32 / 7.0;
            let _ = timeline.add_or_update_keyframe(name, t, min + (max - min) * phase);
        }
    }
    timeline
}

fn bench_interpolate(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolate");

    for &count in &[2usize, 16, 64] {
        let mut timeline = populated_timeline(count);
        let registry = Arc::clone(timeline.registry());

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            let mut time = 0.0_f32;
            b.iter(|| {
                time = (time + 16.7) % 5000.0;
                let Some(model) = timeline.model_mut() else {
                    return;
                };
                black_box(interpolate(model, &registry, black_box(time), true));
            });
        });
    }

    group.finish();
}

fn bench_keyframe_writes(c: &mut Criterion) {
    c.bench_function("add_or_update_keyframe (merge)", |b| {
        let mut timeline = populated_timeline(64);
        let mut value = 0.0_f32;
        b.iter(|| {
            value = (value + 0.37) % 5.0;
            let _ = black_box(timeline.add_or_update_keyframe("positionX", black_box(1250.0), value));
        });
    });
}

criterion_group!(benches, bench_interpolate, bench_keyframe_writes);
criterion_main!(benches);
