//! RAAN phasing: close a node gap with a direct burn or by waiting for differential precession.

use fleet_core::angles::wrap_signed_deg;
use fleet_core::constants::SECONDS_PER_DAY;
use fleet_impulsive::direct_raan_change_delta_v_m_s;
use fleet_orbits::OrbitState;
use fleet_propulsion::Manoeuvre;

use super::{Capability, TransferError, TransferSettings};

/// How the node of the goal orbit constrains the manoeuvre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RaanTargeting {
    /// Node not constrained: the vehicle simply drifts during the transfer.
    #[default]
    Free,
    /// Close the gap using the vehicle's own precession rate.
    Absolute,
    /// Close the gap using the rate difference with the goal orbit.
    Relative,
}

/// Branch taken by [`raan_phasing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhasingBranch {
    Free,
    DirectBurn,
    Drift,
}

#[derive(Debug, Clone, Copy)]
pub struct PhasingRequest<'a> {
    pub initial: &'a OrbitState,
    pub target: &'a OrbitState,
    /// Natural duration of the main transfer (s).
    pub manoeuvre_duration_s: f64,
    pub targeting: RaanTargeting,
    /// Gaps strictly below this angle are closed by a direct burn (deg).
    pub cutoff_deg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Phasing {
    pub branch: PhasingBranch,
    /// Waiting time added before the transfer (s).
    pub phasing_duration_s: f64,
    /// Total RAAN change of the vehicle over phasing plus transfer (deg).
    pub raan_drift_deg: f64,
    /// Gap left to close once the transfer's own drift is accounted for (deg).
    pub required_raan_deg: f64,
    pub raan_manoeuvre: Option<Manoeuvre>,
}

/// Decide how the RAAN gap between `initial` and `target` is closed.
///
/// Below the cutoff the gap is burnt away and no time is added. Above it the
/// vehicle waits in its initial orbit until precession closes the gap; a
/// precession rate of the wrong sign or of zero makes phasing infeasible.
pub fn raan_phasing(
    request: &PhasingRequest<'_>,
    capability: &Capability,
    settings: &TransferSettings,
) -> Result<Phasing, TransferError> {
    let initial_rate = request.initial.nodal_precession_rate_deg_s();
    let final_rate = request.target.nodal_precession_rate_deg_s();
    let transfer_rate = 0.5 * (initial_rate + final_rate);
    let transfer_drift = transfer_rate * request.manoeuvre_duration_s;

    let rate = match request.targeting {
        RaanTargeting::Free => {
            return Ok(Phasing {
                branch: PhasingBranch::Free,
                phasing_duration_s: 0.0,
                raan_drift_deg: transfer_drift,
                required_raan_deg: 0.0,
                raan_manoeuvre: None,
            });
        }
        RaanTargeting::Absolute => initial_rate,
        RaanTargeting::Relative => initial_rate - final_rate,
    };

    let manoeuvre_offset = request.manoeuvre_duration_s * (transfer_rate - final_rate);
    let required = wrap_signed_deg(
        request.target.raan_deg() - request.initial.raan_deg() - manoeuvre_offset,
    );

    if required.abs() < request.cutoff_deg {
        let delta_v = direct_raan_change_delta_v_m_s(required, request.initial, request.target);
        let raan_manoeuvre = if delta_v > 0.0 {
            let elapsed = capability.elapsed_s(delta_v, settings)?;
            Some(Manoeuvre::new("RAAN change", delta_v).with_burn_duration(elapsed))
        } else {
            None
        };
        return Ok(Phasing {
            branch: PhasingBranch::DirectBurn,
            phasing_duration_s: 0.0,
            raan_drift_deg: required + transfer_drift,
            required_raan_deg: required,
            raan_manoeuvre,
        });
    }

    let phasing_duration_s = if required == 0.0 {
        0.0
    } else if rate == 0.0 {
        return Err(TransferError::ZeroRelativePrecession {
            required_deg: required,
        });
    } else if required.signum() != rate.signum() {
        return Err(TransferError::PhasingInfeasible {
            required_deg: required,
            rate_deg_day: rate * SECONDS_PER_DAY,
        });
    } else {
        required / rate
    };

    Ok(Phasing {
        branch: PhasingBranch::Drift,
        phasing_duration_s,
        raan_drift_deg: initial_rate * phasing_duration_s + transfer_drift,
        required_raan_deg: required,
        raan_manoeuvre: None,
    })
}
