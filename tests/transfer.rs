use std::f64::consts::PI;

use chrono::{TimeZone, Utc};
use fleet_core::time::Epoch;
use fleet_transfer::impulsive::{SecondBurn, two_burn_transfer};
use fleet_transfer::lowthrust::{LowThrustError, edelbaum};
use fleet_transfer::orbits::{Body, OrbitElements, OrbitState};
use fleet_transfer::propulsion::PropulsionTechnology;
use fleet_transfer::{Capability, TransferSettings, altitude_maintenance, main_manoeuvres};

fn epoch() -> Epoch {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
        .single()
        .expect("valid epoch")
}

fn circular(altitude_km: f64, inclination_deg: f64) -> OrbitState {
    OrbitState::circular(Body::Earth, altitude_km, inclination_deg, 0.0, epoch())
        .expect("valid orbit")
}

/// Closed-form Hohmann transfer between circular coplanar orbits:
/// total speed change (m/s) and time of flight (s).
fn hohmann_reference(r1_km: f64, r2_km: f64, mu_km3_s2: f64) -> (f64, f64) {
    let transfer_sma = 0.5 * (r1_km + r2_km);
    let departure = (mu_km3_s2 * (2.0 / r1_km - 1.0 / transfer_sma)).sqrt();
    let arrival = (mu_km3_s2 * (2.0 / r2_km - 1.0 / transfer_sma)).sqrt();
    let dv_km_s = (departure - (mu_km3_s2 / r1_km).sqrt()).abs()
        + ((mu_km3_s2 / r2_km).sqrt() - arrival).abs();
    let tof_s = PI * (transfer_sma.powi(3) / mu_km3_s2).sqrt();
    (dv_km_s * 1000.0, tof_s)
}

fn chemical(mass_kg: f64) -> Capability {
    Capability {
        technology: PropulsionTechnology::MonoPropellant,
        mass_kg,
        thrust_n: 22.0,
        isp_s: 240.0,
    }
}

#[test]
fn two_burn_matches_hohmann_between_circular_orbits() {
    let low = circular(500.0, 0.0);
    let high = circular(1200.0, 0.0);
    let transfer = main_manoeuvres(&low, &high, &chemical(500.0), &TransferSettings::default())
        .expect("feasible transfer");

    let (reference_m_s, reference_tof_s) = hohmann_reference(
        low.semi_major_axis_km(),
        high.semi_major_axis_km(),
        Body::Earth.mu_km3_s2(),
    );
    assert_eq!(transfer.manoeuvres.len(), 2);
    assert!(transfer.manoeuvres.iter().all(|m| m.delta_v_m_s > 0.0));
    assert!(
        (transfer.delta_v_m_s() - reference_m_s).abs() < 1e-6,
        "two-burn {} m/s vs Hohmann {reference_m_s} m/s",
        transfer.delta_v_m_s()
    );
    assert!((transfer.transfer_duration_s - reference_tof_s).abs() < 1e-6);
    assert!(transfer.reentry.is_none());
    // 22 N on 500 kg: every burn takes minutes, not zero time.
    assert!(transfer.manoeuvres.iter().all(|m| m.burn_duration_s > 60.0));
}

#[test]
fn plane_change_rides_on_the_outer_burn() {
    let low = circular(500.0, 97.0);
    let high = circular(1200.0, 98.0);
    let transfer = two_burn_transfer(&low, &high, SecondBurn::Perform).expect("feasible transfer");
    let coplanar = two_burn_transfer(&low, &circular(1200.0, 97.0), SecondBurn::Perform)
        .expect("feasible transfer");

    assert!(transfer.inclination_change_m_s > 0.0);
    assert!((transfer.first_burn_m_s - coplanar.first_burn_m_s).abs() < 1e-9);
    let second = transfer.second_burn_m_s.expect("arrival burn performed");
    let coplanar_second = coplanar.second_burn_m_s.expect("arrival burn performed");
    assert!(second > coplanar_second);
}

#[test]
fn decaying_destination_skips_the_arrival_burn() {
    let start = circular(700.0, 98.0);
    let disposal = OrbitState::from_apsides(Body::Earth, 50.0, 700.0, 98.0, 0.0, 0.0, epoch())
        .expect("valid orbit");
    let settings = TransferSettings::default();
    let transfer =
        main_manoeuvres(&start, &disposal, &chemical(800.0), &settings).expect("feasible transfer");

    assert_eq!(transfer.manoeuvres.len(), 1);
    let reentry = transfer.reentry.expect("reentry conditions recorded");
    assert!(reentry.speed_km_s > 7.0);
    assert!(reentry.flight_path_angle_deg < 0.0, "descending through the interface");
    assert!(reentry.true_anomaly_deg.is_finite());
}

#[test]
fn transfer_below_the_interface_records_no_reentry() {
    let start = circular(70.0, 98.0);
    let disposal = OrbitState::from_apsides(Body::Earth, 30.0, 70.0, 98.0, 0.0, 0.0, epoch())
        .expect("valid orbit");
    let transfer = main_manoeuvres(&start, &disposal, &chemical(800.0), &TransferSettings::default())
        .expect("an unreachable interface is not an error");

    assert_eq!(transfer.manoeuvres.len(), 1);
    assert!(transfer.reentry.is_none());
}

#[test]
fn edelbaum_coplanar_is_the_circular_speed_difference() {
    let low = circular(500.0, 98.0);
    let high = circular(1200.0, 98.0);
    let estimate = edelbaum(&low, &high, 0.1).expect("near-circular orbits");
    let expected = (estimate.initial_speed_km_s - estimate.final_speed_km_s).abs() * 1000.0;
    assert!((estimate.delta_v_m_s - expected).abs() < 1e-6);
}

#[test]
fn edelbaum_rejects_eccentricity_at_the_threshold() {
    let low = circular(500.0, 98.0);
    let eccentric = OrbitState::new(
        Body::Earth,
        OrbitElements {
            semi_major_axis_km: 8000.0,
            eccentricity: 0.1,
            inclination_deg: 98.0,
            raan_deg: 0.0,
            arg_periapsis_deg: 0.0,
            true_anomaly_deg: 0.0,
        },
        epoch(),
    )
    .expect("valid orbit");

    let err = edelbaum(&low, &eccentric, 0.1).expect_err("threshold is exclusive");
    assert!(matches!(err, LowThrustError::EccentricityLimit { .. }));
}

#[test]
fn electric_transfer_takes_longer_than_its_burn() {
    let low = circular(500.0, 98.0);
    let high = circular(1200.0, 98.0);
    let capability = Capability {
        technology: PropulsionTechnology::Electrical,
        mass_kg: 300.0,
        thrust_n: 0.05,
        isp_s: 1500.0,
    };
    let settings = TransferSettings::default();
    let transfer = main_manoeuvres(&low, &high, &capability, &settings).expect("feasible transfer");
    let burn = transfer.manoeuvres[0].burn_duration_s;
    let derate = settings.derate.duty_cycle * (1.0 - settings.derate.coast_cycle);
    assert!((transfer.transfer_duration_s - burn / derate).abs() < 1e-3);
}

#[test]
fn maintenance_scales_with_duration() {
    let orbit = circular(500.0, 98.0);
    let year = altitude_maintenance(&orbit, 365.25 * 86_400.0).expect("valid altitude");
    let half = altitude_maintenance(&orbit, 0.5 * 365.25 * 86_400.0).expect("valid altitude");
    assert!(year.delta_v_m_s > 0.0);
    assert!((year.delta_v_m_s - 2.0 * half.delta_v_m_s).abs() < 1e-9);

    let higher = altitude_maintenance(&circular(800.0, 98.0), 365.25 * 86_400.0)
        .expect("valid altitude");
    assert!(higher.delta_v_m_s < year.delta_v_m_s);
}

#[test]
fn true_anomaly_at_apsides_is_clipped() {
    let orbit = OrbitState::from_apsides(Body::Earth, 300.0, 1500.0, 45.0, 0.0, 0.0, epoch())
        .expect("valid orbit");
    let at_periapsis = orbit
        .true_anomaly_at_radius_deg(orbit.periapsis_radius_km())
        .expect("radius on orbit");
    let at_apoapsis = orbit
        .true_anomaly_at_radius_deg(orbit.apoapsis_radius_km())
        .expect("radius on orbit");
    assert!(at_periapsis.abs() < 1e-6);
    assert!((at_apoapsis - 180.0).abs() < 1e-6);
}
