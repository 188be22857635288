use bias_hardware::FileBiasStore;
use bias_traits::{BiasState, BiasStore};
use rstest::rstest;
use tempfile::tempdir;

#[test]
fn missing_file_loads_as_first_boot() {
    let dir = tempdir().unwrap();
    let mut store = FileBiasStore::new(dir.path().join("bias_state.toml"));
    assert_eq!(store.load().unwrap(), None);
}

#[rstest]
#[case(BiasState { step_range: 100, step_pos: 0, bias_actual: 30 })]
#[case(BiasState { step_range: 120, step_pos: 60, bias_actual: 50 })]
#[case(BiasState { step_range: u16::MAX, step_pos: u16::MAX, bias_actual: 70 })]
fn committed_state_reloads_exactly(#[case] state: BiasState) {
    let dir = tempdir().unwrap();
    let mut store = FileBiasStore::new(dir.path().join("bias_state.toml"));
    store.store(state).unwrap();
    assert_eq!(store.load().unwrap(), Some(state));
}

#[test]
fn recommit_replaces_the_record() {
    let dir = tempdir().unwrap();
    let mut store = FileBiasStore::new(dir.path().join("bias_state.toml"));
    store
        .store(BiasState {
            step_range: 100,
            step_pos: 10,
            bias_actual: 35,
        })
        .unwrap();
    let newer = BiasState {
        step_range: 90,
        step_pos: 45,
        bias_actual: 60,
    };
    store.store(newer).unwrap();
    assert_eq!(store.load().unwrap(), Some(newer));
}

#[test]
fn open_creates_missing_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("var/nested/bias_state.toml");
    let mut store = FileBiasStore::open(&path).unwrap();
    store
        .store(BiasState {
            step_range: 100,
            step_pos: 0,
            bias_actual: 30,
        })
        .unwrap();
    assert!(path.exists());
}

#[test]
fn corrupt_record_is_an_error_not_a_default() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bias_state.toml");
    std::fs::write(&path, "step_range = \"not a number\"").unwrap();
    let mut store = FileBiasStore::new(&path);
    let err = store.load().expect_err("corrupt file must not load");
    assert!(format!("{err}").contains("state file format"));
}
