//! Continuous-thrust analytical utilities.

use std::f64::consts::FRAC_PI_2;

use fleet_core::units::kms_to_ms;
use fleet_orbits::{OrbitError, OrbitState};
use serde::Serialize;
use thiserror::Error;

/// Default eccentricity above which the circular-orbit approximation is refused.
pub const DEFAULT_ECCENTRICITY_LIMIT: f64 = 0.1;

/// Errors raised by the continuous-thrust models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LowThrustError {
    #[error("eccentricity {eccentricity} is not below the low-thrust limit {limit}")]
    EccentricityLimit { eccentricity: f64, limit: f64 },
    #[error("duty cycle {duty_cycle} and coast cycle {coast_cycle} leave no thrusting time")]
    Derate { duty_cycle: f64, coast_cycle: f64 },
    #[error("orbit error: {0}")]
    Orbit(#[from] OrbitError),
}

/// Operating derate applied to continuous-thrust burn times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThrustDerate {
    /// Fraction of the time the thruster actually fires while in a thrust arc.
    pub duty_cycle: f64,
    /// Fraction of each revolution spent coasting.
    pub coast_cycle: f64,
}

impl Default for ThrustDerate {
    fn default() -> Self {
        Self {
            duty_cycle: 0.9,
            coast_cycle: 0.75,
        }
    }
}

impl ThrustDerate {
    /// Elapsed time needed to accumulate `burn_duration_s` of thrusting.
    pub fn elapsed_s(&self, burn_duration_s: f64) -> Result<f64, LowThrustError> {
        let effective = self.duty_cycle * (1.0 - self.coast_cycle);
        if !(effective > 0.0) {
            return Err(LowThrustError::Derate {
                duty_cycle: self.duty_cycle,
                coast_cycle: self.coast_cycle,
            });
        }
        Ok(burn_duration_s / effective)
    }
}

/// Edelbaum estimate between two near-circular orbits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdelbaumTransfer {
    pub initial_speed_km_s: f64,
    pub final_speed_km_s: f64,
    pub inclination_change_deg: f64,
    pub delta_v_m_s: f64,
}

/// Closed-form Edelbaum delta-v combining the circular-speed change and the plane change.
///
/// Both orbits must have an eccentricity strictly below `eccentricity_limit`; each is
/// approximated by the circle of radius (rp + ra) / 2.
pub fn edelbaum(
    initial: &OrbitState,
    target: &OrbitState,
    eccentricity_limit: f64,
) -> Result<EdelbaumTransfer, LowThrustError> {
    for orbit in [initial, target] {
        if orbit.eccentricity() >= eccentricity_limit {
            return Err(LowThrustError::EccentricityLimit {
                eccentricity: orbit.eccentricity(),
                limit: eccentricity_limit,
            });
        }
    }

    let v0 = circular_speed_km_s(initial)?;
    let vf = circular_speed_km_s(target)?;
    let delta_i_deg = target.inclination_deg() - initial.inclination_deg();
    let delta_i = delta_i_deg.to_radians();
    let dv_km_s = (v0 * v0 + vf * vf - 2.0 * v0 * vf * (FRAC_PI_2 * delta_i).cos())
        .max(0.0)
        .sqrt();

    Ok(EdelbaumTransfer {
        initial_speed_km_s: v0,
        final_speed_km_s: vf,
        inclination_change_deg: delta_i_deg,
        delta_v_m_s: kms_to_ms(dv_km_s),
    })
}

fn circular_speed_km_s(orbit: &OrbitState) -> Result<f64, OrbitError> {
    let radius = 0.5 * (orbit.apoapsis_radius_km() + orbit.periapsis_radius_km());
    orbit.speed_at_radius_km_s(radius)
}
