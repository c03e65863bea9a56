use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn scenario(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("data")
        .join("scenarios")
        .join(name)
}

#[test]
fn designs_the_debris_removal_fleet() {
    Command::cargo_bin("fleet_design")
        .expect("fleet_design bin")
        .arg("--scenario")
        .arg(scenario("debris_removal.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Fleet: sso-debris-removal (single_picker)"))
        .stdout(predicate::str::contains("Convergence: reached"))
        .stdout(predicate::str::contains("picker-2"))
        .stdout(predicate::str::contains("Program duration:"));
}

#[test]
fn writes_report_and_timeline() {
    let dir = tempdir().expect("temp dir");
    let json = dir.path().join("fleet.json");
    let csv = dir.path().join("timeline.csv");
    Command::cargo_bin("fleet_design")
        .expect("fleet_design bin")
        .arg("--scenario")
        .arg(scenario("deployment.yaml"))
        .arg("--json")
        .arg(&json)
        .arg("--timeline")
        .arg(&csv)
        .arg("--phases")
        .assert()
        .success()
        .stdout(predicate::str::contains("upper-stage:sat-2:release"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json).expect("report written"))
            .expect("valid JSON");
    assert_eq!(report["fleet"], "shell-deployment");
    assert_eq!(report["spacecraft"].as_array().map(Vec::len), Some(1));

    let timeline = fs::read_to_string(&csv).expect("timeline written");
    assert_eq!(timeline.lines().count(), 1 + 8);
    assert!(timeline.starts_with("phase,kind,spacecraft,module"));
}

#[test]
fn settings_file_overrides_the_scenario() {
    let dir = tempdir().expect("temp dir");
    let settings = dir.path().join("settings.toml");
    fs::write(&settings, "[convergence]\nmax_iterations = 1\nhomogenize = false\n")
        .expect("write settings");
    Command::cargo_bin("fleet_design")
        .expect("fleet_design bin")
        .arg("--scenario")
        .arg(scenario("debris_removal.yaml"))
        .arg("--settings")
        .arg(&settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("Convergence: NOT reached after 1 iterations"))
        .stdout(predicate::str::contains("passes converged: [false]"));
}

#[test]
fn missing_scenario_fails_with_context() {
    Command::cargo_bin("fleet_design")
        .expect("fleet_design bin")
        .args(["--scenario", "does/not/exist.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading scenario does/not/exist.yaml"));
}
