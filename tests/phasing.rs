use chrono::{TimeZone, Utc};
use fleet_core::time::Epoch;
use fleet_transfer::orbits::{Body, OrbitState, PrecessionDirection, precession_direction};
use fleet_transfer::propulsion::PropulsionTechnology;
use fleet_transfer::{
    Capability, PhasingBranch, PhasingRequest, RaanTargeting, TransferError, TransferSettings,
    raan_phasing,
};

fn epoch() -> Epoch {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
        .single()
        .expect("valid epoch")
}

fn sso_like(altitude_km: f64, raan_deg: f64) -> OrbitState {
    OrbitState::circular(Body::Earth, altitude_km, 98.0, raan_deg, epoch()).expect("valid orbit")
}

fn capability() -> Capability {
    Capability {
        technology: PropulsionTechnology::MonoPropellant,
        mass_kg: 500.0,
        thrust_n: 22.0,
        isp_s: 220.0,
    }
}

fn request<'a>(
    initial: &'a OrbitState,
    target: &'a OrbitState,
    targeting: RaanTargeting,
    cutoff_deg: f64,
) -> PhasingRequest<'a> {
    PhasingRequest {
        initial,
        target,
        manoeuvre_duration_s: 0.0,
        targeting,
        cutoff_deg,
    }
}

#[test]
fn gap_below_cutoff_is_burnt() {
    let initial = sso_like(500.0, 0.0);
    let target = sso_like(1200.0, 5.0);
    let phasing = raan_phasing(
        &request(&initial, &target, RaanTargeting::Relative, 10.0),
        &capability(),
        &TransferSettings::default(),
    )
    .expect("feasible phasing");

    assert_eq!(phasing.branch, PhasingBranch::DirectBurn);
    assert_eq!(phasing.phasing_duration_s, 0.0);
    let burn = phasing.raan_manoeuvre.expect("direct RAAN burn");
    assert!(burn.delta_v_m_s > 0.0);
    assert!((phasing.required_raan_deg - 5.0).abs() < 1e-9);
}

#[test]
fn gap_above_cutoff_drifts() {
    let initial = sso_like(500.0, 0.0);
    let target = sso_like(1200.0, 5.0);
    let phasing = raan_phasing(
        &request(&initial, &target, RaanTargeting::Relative, 1.0),
        &capability(),
        &TransferSettings::default(),
    )
    .expect("feasible phasing");

    assert_eq!(phasing.branch, PhasingBranch::Drift);
    assert!(phasing.raan_manoeuvre.is_none());
    assert!(phasing.phasing_duration_s > 0.0);

    // After the wait both nodes coincide.
    let vehicle_raan = initial.raan_deg() + phasing.raan_drift_deg;
    let target_raan =
        target.raan_deg() + target.nodal_precession_rate_deg_s() * phasing.phasing_duration_s;
    assert!(
        (vehicle_raan - target_raan).abs() < 1e-6,
        "vehicle node {vehicle_raan}° vs target node {target_raan}°"
    );
}

#[test]
fn wrong_precession_sign_is_infeasible() {
    // The lower orbit precesses faster eastward, so it can never fall behind.
    let initial = sso_like(500.0, 0.0);
    let target = sso_like(1200.0, -5.0);
    let err = raan_phasing(
        &request(&initial, &target, RaanTargeting::Relative, 1.0),
        &capability(),
        &TransferSettings::default(),
    )
    .expect_err("phasing must be infeasible");

    match err {
        TransferError::PhasingInfeasible {
            required_deg,
            rate_deg_day,
        } => {
            assert!(required_deg < 0.0);
            assert!(rate_deg_day > 0.0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_relative_precession_is_infeasible() {
    let initial = sso_like(700.0, 0.0);
    let target = sso_like(700.0, 5.0);
    let err = raan_phasing(
        &request(&initial, &target, RaanTargeting::Relative, 1.0),
        &capability(),
        &TransferSettings::default(),
    )
    .expect_err("phasing must be infeasible");
    assert!(matches!(err, TransferError::ZeroRelativePrecession { .. }));
}

#[test]
fn required_gap_is_wrapped() {
    let initial = sso_like(500.0, 5.0);
    let target = sso_like(1200.0, 350.0);
    let phasing = raan_phasing(
        &request(&initial, &target, RaanTargeting::Absolute, 20.0),
        &capability(),
        &TransferSettings::default(),
    )
    .expect("feasible phasing");
    assert_eq!(phasing.branch, PhasingBranch::DirectBurn);
    assert!((phasing.required_raan_deg + 15.0).abs() < 1e-9);
}

#[test]
fn free_targeting_only_drifts_with_the_transfer() {
    let initial = sso_like(500.0, 0.0);
    let target = sso_like(1200.0, 90.0);
    let phasing = raan_phasing(
        &PhasingRequest {
            manoeuvre_duration_s: 3_000.0,
            ..request(&initial, &target, RaanTargeting::Free, 0.5)
        },
        &capability(),
        &TransferSettings::default(),
    )
    .expect("free phasing never fails");
    assert_eq!(phasing.branch, PhasingBranch::Free);
    assert_eq!(phasing.phasing_duration_s, 0.0);
    assert!(phasing.raan_drift_deg > 0.0);
}

#[test]
fn retrograde_population_precesses_eastward() {
    let orbits = [sso_like(500.0, 0.0), sso_like(800.0, 30.0)];
    assert_eq!(
        precession_direction(orbits.iter()),
        Some(PrecessionDirection::Eastward)
    );
}
