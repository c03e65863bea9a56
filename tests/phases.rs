use chrono::{TimeZone, Utc};
use fleet_core::time::{days_to_seconds, seconds_between};
use fleet_transfer::orbits::{Body, OrbitState};
use fleet_transfer::propulsion::{
    CaptureSpec, ModuleKind, ModuleRef, ObjectId, PropulsionSpec, Spacecraft, SpacecraftId,
    SpacecraftKind, Target, TargetId, ThrusterRole, VehicleStore,
};
use fleet_transfer::stack::{load_payloads, mount_capture, mount_propulsion};
use fleet_transfer::{
    Approach, AssignmentError, Capture, Insertion, MissionError, MissionSettings,
    OrbitMaintenance, Phase, Plan, Refueling, Release,
};

fn orbit(altitude_km: f64) -> OrbitState {
    let epoch = Utc
        .with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
        .single()
        .expect("valid epoch");
    OrbitState::circular(Body::Earth, altitude_km, 98.0, 0.0, epoch).expect("valid orbit")
}

fn picker() -> Spacecraft {
    let mut sc = Spacecraft::new("picker", SpacecraftKind::Servicer, "pickers", 150.0, 0.2);
    mount_propulsion(
        &mut sc,
        "main",
        PropulsionSpec {
            initial_propellant_kg: 100.0,
            ..PropulsionSpec::default()
        },
    )
    .expect("mount main");
    sc.set_main_propulsion("main").expect("main role");
    mount_capture(&mut sc, "arm", CaptureSpec::default()).expect("mount arm");
    sc.set_capture_module("arm").expect("capture role");
    sc
}

fn tanker(id: &str, propellant_kg: f64) -> Spacecraft {
    let mut sc = Spacecraft::new(id, SpacecraftKind::Servicer, "tankers", 40.0, 0.2);
    mount_propulsion(
        &mut sc,
        "tank",
        PropulsionSpec {
            initial_propellant_kg: propellant_kg,
            is_refueler: true,
            ..PropulsionSpec::default()
        },
    )
    .expect("mount tank");
    sc
}

fn store_with_debris(debris_altitude_km: f64) -> VehicleStore {
    let mut store = VehicleStore::new();
    store.insert_spacecraft(picker()).expect("insert picker");
    store
        .insert_target(Target::new("debris", 300.0, orbit(debris_altitude_km)))
        .expect("insert debris");
    store
}

fn main_ref() -> ModuleRef {
    ModuleRef::new("picker", "main")
}

fn arm_ref() -> ModuleRef {
    ModuleRef::new("picker", "arm")
}

fn debris() -> ObjectId {
    ObjectId::Target(TargetId::new("debris"))
}

fn removal_plan(store: &VehicleStore) -> Plan {
    let mut plan = Plan::new("removal", orbit(700.0).epoch());
    plan.add_assigned(store, "insertion", Insertion::new(orbit(700.0)), main_ref())
        .expect("insertion on main");
    plan.add_assigned(store, "approach", Approach::new(debris(), 2.0), main_ref())
        .expect("approach on main");
    plan.add_assigned(store, "capture", Capture::new(debris()), arm_ref())
        .expect("capture on arm");
    plan.add_assigned(store, "release", Release::new(debris()), arm_ref())
        .expect("release on arm");
    plan
}

#[test]
fn phases_reject_modules_of_the_wrong_kind() {
    let store = store_with_debris(700.0);
    let mut phase = Phase::new("capture", Capture::new(debris()));
    let err = phase
        .assign_module(&store, main_ref())
        .expect_err("a propulsion module cannot capture");
    match err {
        AssignmentError::WrongModuleKind {
            expected, found, ..
        } => {
            assert_eq!(expected, ModuleKind::Capture);
            assert_eq!(found, ModuleKind::Propulsion);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(phase.module().is_none());
}

#[test]
fn unassigned_phases_abort_the_replay() {
    let mut store = store_with_debris(700.0);
    let mut plan = Plan::new("orphans", orbit(700.0).epoch());
    plan.add_phase(Phase::new("orphan", Insertion::new(orbit(700.0))));
    let err = plan.apply(&mut store).expect_err("nothing to run the phase");
    assert!(matches!(err, MissionError::Unassigned { ref phase } if phase == "orphan"));
}

#[test]
fn capture_and_release_move_the_object_with_the_servicer() {
    let mut store = store_with_debris(700.0);
    let mut plan = removal_plan(&store);
    plan.apply(&mut store).expect("plan replays");

    let picker = SpacecraftId::new("picker");
    assert_eq!(store.carrier_of(&debris()).expect("known"), None);
    let servicer_orbit = *store
        .spacecraft(&picker)
        .expect("known")
        .orbit()
        .expect("placed");
    let debris_orbit = store.object_orbit(&debris()).expect("known").expect("placed");
    assert_eq!(debris_orbit.epoch(), servicer_orbit.epoch());

    let approach = plan.phase("approach").expect("approach phase");
    assert!((approach.record().propellant_used_kg - 2.2).abs() < 1e-9);
    let capture = plan.phase("capture").expect("capture phase");
    let snapshot = capture.snapshot().expect("snapshot after capture");
    let alone = plan
        .phase("approach")
        .and_then(Phase::snapshot)
        .expect("snapshot after approach")
        .vehicle_mass_kg;
    assert!((snapshot.vehicle_mass_kg - alone - 300.0).abs() < 1e-9);
}

#[test]
fn distant_objects_cannot_be_approached() {
    let mut store = store_with_debris(900.0);
    let mut plan = removal_plan(&store);
    let err = plan.apply(&mut store).expect_err("200 km apart");
    match err {
        MissionError::ApproachMismatch { phase, object, .. } => {
            assert_eq!(phase, "approach");
            assert_eq!(object, debris());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn replays_from_the_launch_configuration_are_identical() {
    let mut store = store_with_debris(700.0);
    let mut plan = removal_plan(&store);
    plan.apply(&mut store).expect("first replay");
    let first: Vec<_> = plan.phases().iter().map(|p| p.record().clone()).collect();

    store.reset();
    plan.apply(&mut store).expect("second replay");
    let second: Vec<_> = plan.phases().iter().map(|p| p.record().clone()).collect();
    assert_eq!(first, second);
}

#[test]
fn refueling_draws_from_the_fullest_carried_tank() {
    let mut store = store_with_debris(700.0);
    store.insert_spacecraft(tanker("tanker-a", 150.0)).expect("insert");
    store.insert_spacecraft(tanker("tanker-b", 300.0)).expect("insert");
    let picker = SpacecraftId::new("picker");
    load_payloads(
        &mut store,
        &picker,
        [
            ObjectId::Spacecraft(SpacecraftId::new("tanker-a")),
            ObjectId::Spacecraft(SpacecraftId::new("tanker-b")),
        ],
    )
    .expect("tankers ride the picker");

    let settings = MissionSettings::default();
    let mut insertion = Phase::new("insertion", Insertion::new(orbit(700.0)));
    insertion
        .assign_module(&store, main_ref())
        .expect("insertion on main");
    insertion.apply(&mut store, &settings).expect("inserted");

    store
        .propulsion_mut(&main_ref())
        .expect("module")
        .consume_propellant(80.0, ThrusterRole::Main)
        .expect("enough propellant");

    let mut refueling = Phase::new("refueling", Refueling::new());
    refueling
        .assign_module(&store, main_ref())
        .expect("refueling on main");
    refueling.apply(&mut store, &settings).expect("refueled");

    assert!((refueling.record().propellant_transferred_kg - 80.0).abs() < 1e-9);
    let level = |module: ModuleRef| {
        store
            .propulsion(&module)
            .expect("module")
            .current_propellant_kg()
    };
    assert!((level(main_ref()) - 100.0).abs() < 1e-9);
    assert!((level(ModuleRef::new("tanker-b", "tank")) - 220.0).abs() < 1e-9);
    assert!((level(ModuleRef::new("tanker-a", "tank")) - 150.0).abs() < 1e-9);
}

#[test]
fn refueling_without_a_tanker_fails() {
    let mut store = store_with_debris(700.0);
    let settings = MissionSettings::default();
    let mut insertion = Phase::new("insertion", Insertion::new(orbit(700.0)));
    insertion
        .assign_module(&store, main_ref())
        .expect("insertion on main");
    insertion.apply(&mut store, &settings).expect("inserted");

    let mut refueling = Phase::new("refueling", Refueling::new().with_refuel_mass_kg(10.0));
    refueling
        .assign_module(&store, main_ref())
        .expect("refueling on main");
    let err = refueling
        .apply(&mut store, &settings)
        .expect_err("nothing to draw from");
    assert!(matches!(err, MissionError::NoTanker { .. }));
}

#[test]
fn station_keeping_burns_and_advances_the_epoch() {
    let mut store = store_with_debris(700.0);
    let mut plan = Plan::new("upkeep", orbit(400.0).epoch());
    plan.add_assigned(&store, "insertion", Insertion::new(orbit(400.0)), main_ref())
        .expect("insertion on main");
    plan.add_assigned(
        &store,
        "upkeep",
        OrbitMaintenance::new(days_to_seconds(180.0)),
        main_ref(),
    )
    .expect("maintenance on main");
    plan.apply(&mut store).expect("plan replays");

    let upkeep = plan.phase("upkeep").expect("maintenance phase");
    let record = upkeep.record();
    assert!(record.delta_v_m_s() > 0.0);
    assert!(record.propellant_used_kg > 0.0);
    let (start, end) = (record.start.expect("started"), record.end.expect("ended"));
    assert!((seconds_between(start, end) - days_to_seconds(180.0)).abs() < 1.0);
}
