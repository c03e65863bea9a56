use std::fs;
use std::path::PathBuf;

use fleet_config::{
    ConfigError, PhasingConfig, RoleConfig, SpacecraftKindConfig, load_scenario, load_scenarios,
    load_simulation,
};
use tempfile::tempdir;

const MINIMAL_YAML: &str = r#"
name: minimal
starting_epoch: "2030-01-01T00:00:00Z"
targets:
  - id: debris
    mass_kg: 200
    orbit: { perigee_altitude_km: 700, inclination_deg: 98.0 }
spacecraft:
  - id: picker
    kind: servicer
    structure_mass_kg: 120
    propulsion:
      - { id: main, technology: mono_propellant, thrust_n: 22, isp_s: 220 }
    capture:
      - { id: arm }
    insertion_orbit: { perigee_altitude_km: 500, inclination_deg: 98.0 }
    targets: [debris]
"#;

fn scenario_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("scenarios")
}

fn write_yaml(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("scenario.yaml");
    fs::write(&path, contents).expect("write scenario");
    (dir, path)
}

#[test]
fn minimal_scenario_takes_defaults() {
    let (_dir, path) = write_yaml(MINIMAL_YAML);
    let scenario = load_scenario(&path).expect("valid scenario");

    assert_eq!(scenario.architecture, "single_picker");
    let picker = &scenario.spacecraft[0];
    assert_eq!(picker.kind, SpacecraftKindConfig::Servicer);
    assert_eq!(picker.phasing, PhasingConfig::Relative);
    assert!(picker.group.is_none());
    assert!((picker.mass_contingency - 0.2).abs() < 1e-12);
    let main = &picker.propulsion[0];
    assert_eq!(main.role, RoleConfig::Main);
    assert!((main.initial_propellant_kg - 100.0).abs() < 1e-12);
    assert!((main.propellant_contingency - 0.15).abs() < 1e-12);
    assert!(scenario.simulation.convergence.homogenize);
    assert_eq!(scenario.simulation.convergence.max_iterations, 200);
}

#[test]
fn toml_scenarios_load_like_yaml() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("scenario.toml");
    fs::write(
        &path,
        r#"
name = "minimal"
starting_epoch = "2030-01-01T00:00:00Z"
architecture = "multi_picker"

[simulation.convergence]
margin_kg = 0.25

[[targets]]
id = "debris"
mass_kg = 200.0
orbit = { perigee_altitude_km = 700.0, inclination_deg = 98.0 }

[[spacecraft]]
id = "picker"
kind = "servicer"
structure_mass_kg = 120.0
insertion_orbit = { perigee_altitude_km = 500.0, inclination_deg = 98.0 }
targets = ["debris"]
phasing = "free"
propulsion = [{ id = "main", technology = "electrical", thrust_n = 0.1, isp_s = 1500.0 }]
"#,
    )
    .expect("write scenario");

    let scenario = load_scenario(&path).expect("valid scenario");
    assert_eq!(scenario.architecture, "multi_picker");
    assert!((scenario.simulation.convergence.margin_kg - 0.25).abs() < 1e-12);
    assert!((scenario.simulation.convergence.design_tolerance_kg - 0.5).abs() < 1e-12);
    assert_eq!(scenario.spacecraft[0].phasing, PhasingConfig::Free);
}

#[test]
fn unknown_targets_are_rejected() {
    let (_dir, path) = write_yaml(&MINIMAL_YAML.replace("targets: [debris]", "targets: [ghost]"));
    let err = load_scenario(&path).expect_err("ghost is not a target");
    assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("ghost")));
}

#[test]
fn refueling_after_an_unvisited_target_is_rejected() {
    let (_dir, path) = write_yaml(&MINIMAL_YAML.replace(
        "targets: [debris]",
        "targets: [debris]\n    refuel_after: [elsewhere]",
    ));
    let err = load_scenario(&path).expect_err("refuel point not visited");
    assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("elsewhere")));
}

#[test]
fn self_launched_spacecraft_need_an_insertion_orbit() {
    let (_dir, path) = write_yaml(&MINIMAL_YAML.replace(
        "    insertion_orbit: { perigee_altitude_km: 500, inclination_deg: 98.0 }\n",
        "",
    ));
    let err = load_scenario(&path).expect_err("no way to reach orbit");
    assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("insertion orbit")));
}

#[test]
fn spacecraft_cannot_carry_themselves() {
    let (_dir, path) = write_yaml(&MINIMAL_YAML.replace(
        "targets: [debris]",
        "targets: [debris]\n    carrier: picker",
    ));
    let err = load_scenario(&path).expect_err("self carrier");
    assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("carrier")));
}

#[test]
fn duplicate_ids_are_rejected() {
    let doubled = MINIMAL_YAML.replace(
        "spacecraft:\n",
        "  - id: debris\n    mass_kg: 10\n    orbit: { perigee_altitude_km: 600, inclination_deg: 98.0 }\nspacecraft:\n",
    );
    let (_dir, path) = write_yaml(&doubled);
    let err = load_scenario(&path).expect_err("two targets named debris");
    assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("duplicate")));
}

#[test]
fn malformed_documents_report_parse_errors() {
    let (_dir, path) = write_yaml("name: [unterminated");
    let err = load_scenario(&path).expect_err("not YAML");
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn simulation_settings_load_alone() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("settings.yaml");
    fs::write(
        &path,
        "convergence:\n  homogenize: false\nmodels:\n  raan_cutoff_deg: 2.0\n",
    )
    .expect("write settings");
    let settings = load_simulation(&path).expect("valid settings");
    assert!(!settings.convergence.homogenize);
    assert!((settings.models.raan_cutoff_deg - 2.0).abs() < 1e-12);
    assert!((settings.models.atmosphere_limit_km - 80.0).abs() < 1e-12);
}

#[test]
fn bundled_scenarios_are_valid() {
    let scenarios = load_scenarios(scenario_dir()).expect("bundled scenarios");
    let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["sso-debris-removal", "shell-deployment"]);
}
