use std::path::PathBuf;

use fleet_config::{CaptureConfig, ScenarioConfig, SpacecraftConfig, load_scenario};
use fleet_sizing::scenario::{DISPENSER_ID, Scenario, ScenarioError, parse_epoch};
use fleet_transfer::PhaseKind;
use fleet_transfer::propulsion::{ObjectId, SpacecraftId, TargetId};

fn config(name: &str) -> ScenarioConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("scenarios")
        .join(name);
    load_scenario(path).expect("bundled scenario loads")
}

#[test]
fn debris_removal_profile_visits_each_target() {
    let scenario = Scenario::try_from(&config("debris_removal.yaml")).expect("scenario builds");
    let picker = SpacecraftId::new("picker-1");
    let ids: Vec<&str> = scenario
        .plan
        .phases_of_spacecraft(&picker)
        .map(|phase| phase.id())
        .collect();
    assert_eq!(
        ids,
        [
            "picker-1:insertion",
            "picker-1:debris-a:transfer",
            "picker-1:debris-a:approach",
            "picker-1:debris-a:capture",
            "picker-1:debris-a:disposal",
            "picker-1:debris-a:release",
            "picker-1:disposal",
        ]
    );
    assert_eq!(scenario.plan.phases().len(), 14);
    assert_eq!(scenario.plan.phases_of_kind(PhaseKind::Capture).count(), 2);

    let approach = scenario
        .plan
        .phase("picker-1:debris-a:approach")
        .expect("approach phase");
    assert_eq!(approach.module().map(|m| m.module.as_str()), Some("rcs"));
    assert!((scenario.program_margin_days - 365.0).abs() < 1e-12);
}

#[test]
fn deployment_profile_loads_every_target_on_the_stage() {
    let scenario = Scenario::try_from(&config("deployment.yaml")).expect("scenario builds");
    assert_eq!(scenario.fleet.architecture, "constellation");
    assert_eq!(scenario.plan.phases().len(), 8);
    assert_eq!(scenario.plan.phases_of_kind(PhaseKind::Release).count(), 3);

    let stage = SpacecraftId::new("upper-stage");
    let store = scenario.fleet.store();
    for sat in ["sat-1", "sat-2", "sat-3"] {
        let object = ObjectId::Target(TargetId::new(sat));
        assert_eq!(store.carrier_of(&object).expect("known"), Some(stage.clone()));
    }
    let capture = store
        .spacecraft(&stage)
        .expect("known")
        .capture_module_id()
        .map(|id| id.as_str().to_string());
    assert_eq!(capture.as_deref(), Some(DISPENSER_ID));
}

#[test]
fn small_launchers_overflow() {
    let mut config = config("deployment.yaml");
    config.launchers[0].payload_capacity_kg = 600.0;
    let err = Scenario::try_from(&config)
        .err()
        .expect("three satellites do not fit");
    match err {
        ScenarioError::LauncherOverflow {
            allowed, requested, ..
        } => {
            assert_eq!(allowed, 2);
            assert_eq!(requested, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn servicers_need_a_capture_module() {
    let mut config = config("debris_removal.yaml");
    config.spacecraft[0].capture.clear();
    let err = Scenario::try_from(&config).err().expect("no way to grab debris");
    assert!(matches!(
        err,
        ScenarioError::MissingModule { ref spacecraft, role: "capture" } if spacecraft == "picker-1"
    ));
}

#[test]
fn carried_spacecraft_cannot_visit_targets() {
    let mut config = config("debris_removal.yaml");
    let mut kit: SpacecraftConfig = config.spacecraft[1].clone();
    kit.id = "kit".to_string();
    kit.carrier = Some("picker-1".to_string());
    kit.capture = vec![CaptureConfig {
        id: "arm".to_string(),
        mass_contingency: 0.25,
        dry_mass_override_kg: None,
    }];
    config.spacecraft.push(kit);
    let err = Scenario::try_from(&config).err().expect("kit has targets");
    assert!(matches!(err, ScenarioError::CarriedWithTargets(ref id) if id == "kit"));
}

#[test]
fn carried_spacecraft_ride_without_phases() {
    let mut config = config("debris_removal.yaml");
    let mut kit: SpacecraftConfig = config.spacecraft[1].clone();
    kit.id = "kit".to_string();
    kit.carrier = Some("picker-1".to_string());
    kit.targets.clear();
    config.spacecraft.push(kit);
    let scenario = Scenario::try_from(&config).expect("scenario builds");

    let kit = SpacecraftId::new("kit");
    assert_eq!(scenario.plan.phases_of_spacecraft(&kit).count(), 0);
    assert_eq!(
        scenario
            .fleet
            .store()
            .root_carrier(&kit)
            .expect("known"),
        SpacecraftId::new("picker-1")
    );
}

#[test]
fn epochs_must_be_rfc3339() {
    assert!(parse_epoch("2030-01-01T00:00:00Z").is_ok());
    let err = parse_epoch("first of January").expect_err("not a timestamp");
    assert!(matches!(err, ScenarioError::Epoch { .. }));
}
