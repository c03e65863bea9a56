use std::fs;
use std::path::PathBuf;

use fleet_export::report::{FleetReport, write_json_file};
use fleet_export::timeline::write_timeline_file;
use fleet_sizing::report::{fleet_report, timeline};
use fleet_sizing::scenario::{Scenario, load_scenario};
use tempfile::tempdir;

fn designed_debris_removal() -> (Scenario, fleet_sizing::fleet::ConvergenceReport) {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("scenarios")
        .join("debris_removal.yaml");
    let mut scenario = load_scenario(path).expect("bundled scenario builds");
    let report = scenario
        .fleet
        .design(&mut scenario.plan)
        .expect("design runs");
    (scenario, report)
}

#[test]
fn fleet_report_round_trips_through_json() {
    let (scenario, convergence) = designed_debris_removal();
    let report = fleet_report(
        &scenario.fleet,
        &scenario.plan,
        &convergence,
        scenario.program_margin_days,
    );
    assert_eq!(report.spacecraft.len(), 2);
    let wet: f64 = report.spacecraft.iter().map(|sc| sc.wet_mass_kg).sum();
    assert!((report.totals.wet_mass_kg - wet).abs() < 1e-9);
    assert!(report.program_duration_days > scenario.program_margin_days);

    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("out").join("fleet.json");
    write_json_file(&path, &report).expect("report written");

    let text = fs::read_to_string(&path).expect("report readable");
    let parsed: FleetReport = serde_json::from_str(&text).expect("valid JSON");
    assert_eq!(parsed.fleet, "sso-debris-removal");
    assert_eq!(parsed.convergence.converged, convergence.converged);
    assert_eq!(parsed.convergence.passes, convergence.passes);
    let value: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");
    let modules = value["spacecraft"][0]["modules"]
        .as_array()
        .expect("module list");
    let arm = modules
        .iter()
        .find(|m| m["id"] == "arm")
        .expect("capture module exported");
    assert!(arm.get("technology").is_none(), "capture modules have no technology");
}

#[test]
fn timeline_lists_every_phase_in_order() {
    let (scenario, _) = designed_debris_removal();
    let rows = timeline(&scenario.plan);
    assert_eq!(rows.len(), scenario.plan.phases().len());
    assert_eq!(rows[0].phase, "picker-1:insertion");
    assert_eq!(rows[0].kind, "Insertion");
    assert!(rows.iter().all(|row| row.start_utc <= row.end_utc));

    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("timeline.csv");
    write_timeline_file(&path, &rows).expect("timeline written");
    let text = fs::read_to_string(&path).expect("timeline readable");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some(
            "phase,kind,spacecraft,module,start_utc,end_utc,duration_days,delta_v_m_s,propellant_used_kg,propellant_left_kg"
        )
    );
    assert_eq!(lines.count(), rows.len());
}
