//! Impulsive transfers between apsides.
//!
//! [`two_burn_transfer`] handles arbitrary elliptical end orbits with an
//! inclination change folded into one burn.

use fleet_core::units::kms_to_ms;
use fleet_orbits::{OrbitElements, OrbitState};

use crate::ImpulsiveError;
use crate::plane::inclination_change_delta_v_m_s;

/// Whether the arrival burn is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondBurn {
    Perform,
    /// Arrival perigee is inside the atmosphere: the object is left to decay.
    Skip,
}

/// Impulsive transfer through an intermediate ellipse between two apsides.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoBurnTransfer {
    /// Magnitude of the departure burn (m/s).
    pub first_burn_m_s: f64,
    /// Magnitude of the arrival burn, `None` when skipped (m/s).
    pub second_burn_m_s: Option<f64>,
    /// Share of the burns spent on the plane change (m/s).
    pub inclination_change_m_s: f64,
    pub departure_radius_km: f64,
    pub arrival_radius_km: f64,
    pub transfer_orbit: OrbitState,
    /// Half the transfer-ellipse period (s).
    pub time_of_flight_s: f64,
}

/// Two-burn transfer from the apoapsis of `initial` to an apsis of `target`.
///
/// The arrival apsis is the target periapsis unless the lines of apsides are
/// flipped (argument of periapsis differing by 180° or more), in which case the
/// target apoapsis is used. The plane change rides on the burn performed at the
/// larger radius, where the local speed is lower. Burns combine the tangential
/// speed change and the plane change as orthogonal components.
pub fn two_burn_transfer(
    initial: &OrbitState,
    target: &OrbitState,
    second_burn: SecondBurn,
) -> Result<TwoBurnTransfer, ImpulsiveError> {
    if initial.body() != target.body() {
        return Err(ImpulsiveError::BodyMismatch {
            from: initial.body(),
            to: target.body(),
        });
    }

    let r1 = initial.apoapsis_radius_km();
    let delta_argp = (initial.arg_periapsis_deg() - target.arg_periapsis_deg()).abs();
    let r2 = if delta_argp < 180.0 {
        target.periapsis_radius_km()
    } else {
        target.apoapsis_radius_km()
    };

    let transfer_orbit = OrbitState::new(
        target.body(),
        OrbitElements {
            semi_major_axis_km: 0.5 * (r1 + r2),
            eccentricity: (r1 - r2).abs() / (r1 + r2),
            ..target.elements()
        },
        target.epoch(),
    )?;

    let inclination_dv = inclination_change_delta_v_m_s(initial, target);
    let (plane_first, plane_second) = if r1 >= r2 {
        (inclination_dv, 0.0)
    } else {
        (0.0, inclination_dv)
    };

    let v_initial = kms_to_ms(initial.speed_at_radius_km_s(r1)?);
    let v_departure = kms_to_ms(transfer_orbit.speed_at_radius_km_s(r1)?);
    let first_burn = (v_departure - v_initial).hypot(plane_first);

    let (second_burn_m_s, plane_applied) = match second_burn {
        SecondBurn::Perform => {
            let v_arrival = kms_to_ms(transfer_orbit.speed_at_radius_km_s(r2)?);
            let v_target = kms_to_ms(target.speed_at_radius_km_s(r2)?);
            (Some((v_target - v_arrival).hypot(plane_second)), inclination_dv)
        }
        SecondBurn::Skip => (None, plane_first),
    };

    Ok(TwoBurnTransfer {
        first_burn_m_s: first_burn,
        second_burn_m_s,
        inclination_change_m_s: plane_applied,
        departure_radius_km: r1,
        arrival_radius_km: r2,
        time_of_flight_s: 0.5 * transfer_orbit.period_s(),
        transfer_orbit,
    })
}
