use bias_core::mocks::{ManualClock, MemStore, MockRig, RecordingReporter};
use bias_core::{BiasState, Interlocks, ModuleState, build_module, target_steps};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_target_steps(c: &mut Criterion) {
    c.bench_function("target_steps_sweep", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for pct in 0..=100u8 {
                acc += u32::from(target_steps(black_box(pct), black_box(1000)));
            }
            acc
        })
    });
}

fn bench_full_adjustment(c: &mut Criterion) {
    c.bench_function("adjust_200_steps", |b| {
        b.iter(|| {
            let rig = MockRig::new(200, 0);
            let store = MemStore::with_state(BiasState {
                step_range: 200,
                step_pos: 0,
                bias_actual: 30,
            });
            let mut module = build_module(
                rig.drive(),
                rig.switches(),
                store,
                Some(Box::new(ManualClock::new())),
            )
            .expect("build module");
            let mut reporter = RecordingReporter::new();
            module.sender().submit_adjustment(70);
            for _ in 0..500 {
                let state = module
                    .tick(Interlocks::default(), &mut reporter)
                    .expect("tick");
                if state == ModuleState::Idle && !module.has_pending() {
                    break;
                }
            }
            black_box(module.position())
        })
    });
}

criterion_group!(benches, bench_target_steps, bench_full_adjustment);
criterion_main!(benches);
