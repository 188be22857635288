use bias_core::mocks::{ManualClock, MemStore, MockRig, RecordingReporter};
use bias_core::{BiasState, BoxedModule, Interlocks, ModuleState};

#[test]
fn try_build_reports_each_missing_component() {
    let err = BoxedModule::builder().try_build().expect_err("no drive");
    assert!(format!("{err}").contains("missing stepper drive"));

    let rig = MockRig::new(100, 0);
    let err = BoxedModule::builder()
        .with_drive(rig.drive())
        .try_build()
        .expect_err("no switches");
    assert!(format!("{err}").contains("missing limit switches"));

    let err = BoxedModule::builder()
        .with_drive(rig.drive())
        .with_switches(rig.switches())
        .try_build()
        .expect_err("no store");
    assert!(format!("{err}").contains("missing bias store"));
}

#[test]
fn built_module_loads_state_and_runs() {
    let rig = MockRig::new(100, 20);
    let store = MemStore::with_state(BiasState {
        step_range: 100,
        step_pos: 20,
        bias_actual: 35,
    });
    let mut module = BoxedModule::builder()
        .with_drive(rig.drive())
        .with_switches(rig.switches())
        .with_store(store.clone())
        .with_clock(Box::new(ManualClock::new()))
        .build()
        .expect("build");
    assert_eq!(module.position().step_pos, 20);
    assert_eq!(module.readback().get(), 35);

    let mut reporter = RecordingReporter::new();
    assert!(module.sender().submit_adjustment(45));
    for _ in 0..200 {
        let state = module
            .tick(Interlocks::default(), &mut reporter)
            .expect("tick");
        if state == ModuleState::Idle && !module.has_pending() {
            break;
        }
    }
    assert_eq!(module.position().bias_actual, 45);
    assert_eq!(store.stored().map(|s| s.bias_actual), Some(45));
}
