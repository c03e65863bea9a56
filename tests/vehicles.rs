use chrono::{TimeZone, Utc};
use fleet_core::constants::G0;
use fleet_transfer::orbits::{Body, OrbitState};
use fleet_transfer::propulsion::{
    CaptureSpec, ModuleRef, ObjectId, PropulsionError, PropulsionModule, PropulsionSpec,
    Spacecraft, SpacecraftId, SpacecraftKind, StoreError, Target, TargetId, ThrusterRole,
    VehicleStore,
};
use fleet_transfer::stack::{mount_capture, mount_propulsion};

fn orbit(altitude_km: f64) -> OrbitState {
    let epoch = Utc
        .with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
        .single()
        .expect("valid epoch");
    OrbitState::circular(Body::Earth, altitude_km, 98.0, 0.0, epoch).expect("valid orbit")
}

fn module(propellant_kg: f64) -> PropulsionModule {
    PropulsionModule::new(
        "main",
        PropulsionSpec {
            initial_propellant_kg: propellant_kg,
            ..PropulsionSpec::default()
        },
    )
    .expect("valid module")
}

fn servicer(id: &str) -> Spacecraft {
    let mut sc = Spacecraft::new(id, SpacecraftKind::Servicer, "pickers", 150.0, 0.2);
    mount_propulsion(&mut sc, "main", PropulsionSpec::default()).expect("mount main");
    sc.set_main_propulsion("main").expect("main role");
    mount_capture(&mut sc, "arm", CaptureSpec::default()).expect("mount arm");
    sc.set_capture_module("arm").expect("capture role");
    sc
}

#[test]
fn larger_delta_v_costs_more_propellant() {
    let tank = module(500.0);
    let small = tank.propellant_for_delta_v_kg(50.0, 800.0);
    let large = tank.propellant_for_delta_v_kg(100.0, 800.0);
    assert!(small > 0.0);
    assert!(large > small);
    // Rocket equation: the final mass is the initial mass over the mass ratio.
    let ratio = (100.0 / (G0 * tank.isp_s)).exp();
    assert!((800.0 - large - 800.0 / ratio).abs() < 1e-9);
}

#[test]
fn consumption_is_conserved_and_tracks_the_lowest_level() {
    let mut tank = module(100.0);
    tank.consume_propellant(30.0, ThrusterRole::Main).expect("enough propellant");
    tank.add_propellant(10.0).expect("valid amount");
    tank.consume_propellant(5.0, ThrusterRole::Rendezvous).expect("enough propellant");

    assert!((tank.current_propellant_kg() - 75.0).abs() < 1e-12);
    assert!((tank.lowest_propellant_kg() - 70.0).abs() < 1e-12);
    let throughput = tank.throughput();
    assert!((throughput.main_kg - 30.0).abs() < 1e-12);
    assert!((throughput.rendezvous_kg - 5.0).abs() < 1e-12);

    tank.reset();
    assert_eq!(tank.current_propellant_kg(), 100.0);
    assert_eq!(tank.lowest_propellant_kg(), 100.0);
    assert!((tank.previous_throughput().total_kg() - 35.0).abs() < 1e-12);
}

#[test]
fn overdraw_reports_the_shortfall() {
    let mut tank = module(20.0);
    let err = tank
        .consume_propellant(26.5, ThrusterRole::Main)
        .expect_err("not enough propellant");
    assert!(matches!(err, PropulsionError::InsufficientPropellant { .. }));
    let shortfall = err.shortfall_kg().expect("shortfall");
    assert!((shortfall - 6.5).abs() < 1e-12);
    assert_eq!(tank.current_propellant_kg(), 20.0, "failed draws leave the tank untouched");
}

#[test]
fn captured_objects_add_mass_until_released() {
    let mut store = VehicleStore::new();
    store.insert_spacecraft(servicer("picker")).expect("insert");
    store
        .insert_target(Target::new("debris", 400.0, orbit(700.0)))
        .expect("insert");
    let picker = SpacecraftId::new("picker");
    let debris = ObjectId::Target(TargetId::new("debris"));
    store.set_orbit(&picker, orbit(700.0)).expect("place");

    let alone = store.current_mass_kg(&picker).expect("mass");
    store.capture(&debris, &picker).expect("capture");
    let loaded = store.current_mass_kg(&picker).expect("mass");
    assert!((loaded - alone - 400.0).abs() < 1e-9);
    assert_eq!(store.carrier_of(&debris).expect("known"), Some(picker.clone()));

    store.release(&debris, &picker).expect("release");
    assert!((store.current_mass_kg(&picker).expect("mass") - alone).abs() < 1e-9);
    assert_eq!(store.carrier_of(&debris).expect("known"), None);
}

#[test]
fn reset_restores_launch_links_and_tanks() {
    let mut store = VehicleStore::new();
    store.insert_spacecraft(servicer("mother")).expect("insert");
    store.insert_spacecraft(servicer("kit")).expect("insert");
    let mother = SpacecraftId::new("mother");
    let kit = ObjectId::Spacecraft(SpacecraftId::new("kit"));
    store.assign_payload(kit.clone(), &mother).expect("load kit");
    store.set_orbit(&mother, orbit(500.0)).expect("place");

    let main = ModuleRef::new("mother", "main");
    store
        .propulsion_mut(&main)
        .expect("module")
        .consume_propellant(40.0, ThrusterRole::Main)
        .expect("enough propellant");
    store.release(&kit, &mother).expect("release");

    store.reset();
    assert_eq!(store.carrier_of(&kit).expect("known"), Some(mother.clone()));
    assert!(store.spacecraft(&mother).expect("known").orbit().is_none());
    assert_eq!(
        store.propulsion(&main).expect("module").current_propellant_kg(),
        PropulsionSpec::default().initial_propellant_kg
    );
}

#[test]
fn carry_links_cannot_form_cycles() {
    let mut store = VehicleStore::new();
    store.insert_spacecraft(servicer("a")).expect("insert");
    store.insert_spacecraft(servicer("b")).expect("insert");
    let a = SpacecraftId::new("a");
    let b = SpacecraftId::new("b");
    store
        .assign_payload(ObjectId::Spacecraft(b.clone()), &a)
        .expect("b rides a");
    let err = store
        .capture(&ObjectId::Spacecraft(a.clone()), &b)
        .expect_err("a cannot ride its own payload");
    assert!(matches!(err, StoreError::CaptureCycle { .. }));
}

#[test]
fn stacks_move_together() {
    let mut store = VehicleStore::new();
    store.insert_spacecraft(servicer("mother")).expect("insert");
    store.insert_spacecraft(servicer("kit")).expect("insert");
    let mother = SpacecraftId::new("mother");
    let kit = SpacecraftId::new("kit");
    store
        .assign_payload(ObjectId::Spacecraft(kit.clone()), &mother)
        .expect("load kit");
    store.set_orbit(&mother, orbit(600.0)).expect("place");

    let kit_orbit = store.spacecraft(&kit).expect("known").orbit().copied();
    assert_eq!(kit_orbit, Some(orbit(600.0)));
    assert_eq!(store.root_carrier(&kit).expect("known"), mother);
}

#[test]
fn rcs_role_falls_back_to_main_propulsion() {
    let mut sc = servicer("picker");
    let main = sc.main_propulsion().expect("main mounted");
    assert_eq!(main.id().as_str(), "main");
    let rcs = sc.rcs_propulsion().expect("falls back to main");
    assert_eq!(rcs.id().as_str(), "main");
    assert!(sc.dedicated_rcs_id().is_none());
    assert_eq!(sc.capture_module().map(|m| m.id().as_str()), Some("arm"));

    mount_propulsion(&mut sc, "thrusters", PropulsionSpec::default()).expect("mount rcs");
    sc.set_rcs_propulsion("thrusters").expect("rcs role");
    let rcs = sc.rcs_propulsion().expect("dedicated rcs");
    assert_eq!(rcs.id().as_str(), "thrusters");
    assert!(sc.set_rcs_propulsion("arm").is_err(), "arm is not a thruster");
}
