//! Plane-change costs: inclination at a node and direct RAAN rotation.

use std::f64::consts::FRAC_PI_2;

use fleet_core::units::kms_to_ms;
use fleet_orbits::OrbitState;

/// Delta-v of an inclination-only plane change between two orbits (m/s).
///
/// Uses the node plane-change relation on the larger of the two orbits, with
/// the departure orbit's eccentricity and argument of periapsis.
pub fn inclination_change_delta_v_m_s(initial: &OrbitState, target: &OrbitState) -> f64 {
    let delta_i = (target.inclination_deg() - initial.inclination_deg()).to_radians();
    let e = initial.eccentricity();
    let w = initial.arg_periapsis_deg().to_radians();
    let f = -w;
    let a = initial.semi_major_axis_km().max(target.semi_major_axis_km());
    let n = (initial.body().mu_km3_s2() / a.powi(3)).sqrt();
    let dv_km_s =
        (2.0 * (delta_i / 2.0).sin() * (1.0 - e * e).sqrt() * (w + f).cos() * n * a
            / (1.0 + e * f.cos()))
        .abs();
    kms_to_ms(dv_km_s)
}

/// Delta-v to rotate the node by `delta_raan_deg` between two near-circular orbits (m/s).
///
/// Evaluated on the mean semi-major axis and mean inclination of both orbits.
pub fn direct_raan_change_delta_v_m_s(
    delta_raan_deg: f64,
    initial: &OrbitState,
    target: &OrbitState,
) -> f64 {
    let mean_a = 0.5 * (initial.semi_major_axis_km() + target.semi_major_axis_km());
    let mean_inc = 0.5 * (initial.inclination_deg() + target.inclination_deg());
    let speed = (initial.body().mu_km3_s2() / mean_a).sqrt();
    kms_to_ms(FRAC_PI_2 * speed * mean_inc.to_radians().sin() * delta_raan_deg.to_radians().abs())
}
