use bias_core::mocks::{ManualClock, MemStore, MockDrive, MockRig, MockSwitches, RecordingReporter, ReportEvent};
use bias_core::{BiasModule, BiasState, Interlocks, ModuleState, build_module};

fn build(rig: &MockRig, store: MemStore) -> BiasModule<MockDrive, MockSwitches, MemStore> {
    build_module(
        rig.drive(),
        rig.switches(),
        store,
        Some(Box::new(ManualClock::new())),
    )
    .expect("build module")
}

fn service(
    module: &mut BiasModule<MockDrive, MockSwitches, MemStore>,
    reporter: &mut RecordingReporter,
    max_ticks: usize,
) {
    for _ in 0..max_ticks {
        let state = module
            .tick(Interlocks::default(), reporter)
            .expect("tick");
        if state == ModuleState::Idle && !module.has_pending() {
            return;
        }
    }
    panic!("module did not return to idle within {max_ticks} ticks");
}

#[test]
fn adjustment_wins_when_both_pending() {
    let rig = MockRig::new(100, 50);
    let store = MemStore::with_state(BiasState {
        step_range: 100,
        step_pos: 50,
        bias_actual: 50,
    });
    let mut module = build(&rig, store);
    let mut reporter = RecordingReporter::new();
    let sender = module.sender();

    sender.submit_calibration();
    assert!(sender.submit_adjustment(60));

    let state = module
        .tick(Interlocks::default(), &mut reporter)
        .expect("tick");
    assert_eq!(state, ModuleState::Adjusting, "adjustment is checked first");

    // The calibration request stays latched and is serviced afterwards.
    service(&mut module, &mut reporter, 2000);
    let events = reporter.events();
    let adj_at = events
        .iter()
        .position(|e| matches!(e, ReportEvent::AdjustmentSuccess(_)))
        .expect("adjustment ran");
    let cal_at = events
        .iter()
        .position(|e| matches!(e, ReportEvent::CalibrationSuccess))
        .expect("latched calibration ran after");
    assert!(adj_at < cal_at);
}

#[test]
fn second_adjustment_is_rejected_while_one_is_pending() {
    let rig = MockRig::new(100, 0);
    let store = MemStore::with_state(BiasState {
        step_range: 100,
        step_pos: 0,
        bias_actual: 30,
    });
    let mut module = build(&rig, store);
    let mut reporter = RecordingReporter::new();
    let sender = module.sender();

    assert!(sender.submit_adjustment(50));
    // Routed and started, still in progress.
    module.tick(Interlocks::default(), &mut reporter).expect("tick");
    module.tick(Interlocks::default(), &mut reporter).expect("tick");
    assert!(
        !sender.submit_adjustment(70),
        "slot is taken until the active run commits"
    );

    service(&mut module, &mut reporter, 200);
    assert_eq!(module.position().bias_actual, 50, "only the first request ran");

    assert!(sender.submit_adjustment(70), "slot frees after commit");
}

#[test]
fn calibration_rearm_is_a_single_run() {
    let rig = MockRig::new(50, 25);
    let store = MemStore::with_state(BiasState {
        step_range: 50,
        step_pos: 25,
        bias_actual: 50,
    });
    let mut module = build(&rig, store);
    let mut reporter = RecordingReporter::new();
    let sender = module.sender();

    sender.submit_calibration();
    sender.submit_calibration();
    service(&mut module, &mut reporter, 1000);

    let cal_count = reporter
        .events()
        .iter()
        .filter(|e| matches!(e, ReportEvent::CalibrationSuccess))
        .count();
    assert_eq!(cal_count, 1);
    assert!(!module.has_pending());
}

#[test]
fn idle_module_stays_idle() {
    let rig = MockRig::new(100, 50);
    let store = MemStore::with_state(BiasState {
        step_range: 100,
        step_pos: 50,
        bias_actual: 50,
    });
    let mut module = build(&rig, store.clone());
    let mut reporter = RecordingReporter::new();

    for _ in 0..5 {
        let state = module
            .tick(Interlocks::default(), &mut reporter)
            .expect("tick");
        assert_eq!(state, ModuleState::Idle);
    }
    assert_eq!(rig.steps_issued(), 0);
    assert_eq!(store.store_count(), 0);
    assert!(reporter.events().is_empty());
}
