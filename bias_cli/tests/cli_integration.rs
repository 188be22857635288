use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::process::Command;
use tempfile::tempdir;

fn bin() -> Command {
    Command::cargo_bin("bias_cli").expect("binary built")
}

#[rstest]
#[case("adjust")]
#[case("calibrate")]
#[case("status")]
#[case("self-check")]
fn help_lists_subcommands(#[case] name: &str) {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(name));
}

#[test]
fn adjust_requires_a_percent() {
    bin()
        .arg("adjust")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn adjust_commits_and_reports_json() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("state.toml");

    let assert = bin()
        .arg("--json")
        .arg("--state")
        .arg(&state)
        .args(["adjust", "31"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let line = stdout
        .lines()
        .find(|l| l.contains("adjustment_complete"))
        .expect("result line on stdout");
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["bias_actual"], 31);
    assert!(
        stdout.contains("adjustment_success"),
        "status report precedes the result: {stdout}"
    );
    assert!(state.exists(), "state file persisted");
}

#[test]
fn status_reads_a_committed_state() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("state.toml");
    std::fs::write(&state, "step_range = 120\nstep_pos = 60\nbias_actual = 50\n").unwrap();

    bin()
        .arg("--state")
        .arg(&state)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("bias 50%"));
}

#[test]
fn status_without_state_reports_first_boot() {
    let dir = tempdir().unwrap();
    bin()
        .arg("--state")
        .arg(dir.path().join("missing.toml"))
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("no committed bias state"));
}

#[test]
fn self_check_passes_in_sim_mode() {
    let dir = tempdir().unwrap();
    bin()
        .arg("--state")
        .arg(dir.path().join("state.toml"))
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("self-check ok"));
}

#[test]
fn calibrate_discovers_the_sim_travel() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("state.toml");
    let cfg = dir.path().join("cfg.toml");
    std::fs::write(
        &cfg,
        format!(
            r#"
[pins]
stepper_step = 13
stepper_dir = 19
left_eot = 5
right_eot = 6
brake_switch = 20
kill_circuit = 21
brake_light = 16

[storage]
state_file = "{}"

[sim]
travel_steps = 8
start_pos = 4
"#,
            state.display()
        ),
    )
    .unwrap();

    let assert = bin()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("calibrate")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let line = stdout
        .lines()
        .find(|l| l.contains("calibration_complete"))
        .expect("result line on stdout");
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["step_range"], 8);
    assert!(state.exists());
}

#[test]
fn invalid_config_fails_with_config_exit_code() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    // Duplicate pins fail validation.
    std::fs::write(
        &cfg,
        r#"
[pins]
stepper_step = 13
stepper_dir = 13
left_eot = 5
right_eot = 6
brake_switch = 20
kill_circuit = 21
brake_light = 16
"#,
    )
    .unwrap();

    bin()
        .arg("--config")
        .arg(&cfg)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("onfiguration"));
}
