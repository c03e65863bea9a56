//! Altitude-maintenance budget against atmospheric or gravitational decay.

use fleet_core::time::seconds_to_years;
use fleet_orbits::OrbitState;
use fleet_propulsion::Manoeuvre;

use super::TransferError;

/// Delta-v needed to hold `orbit` for `duration_s`, spread over the whole duration.
pub fn altitude_maintenance(orbit: &OrbitState, duration_s: f64) -> Result<Manoeuvre, TransferError> {
    let per_year = orbit
        .body()
        .maintenance_delta_v_per_year(orbit.mean_altitude_km())?;
    let delta_v = per_year * seconds_to_years(duration_s.max(0.0));
    Ok(Manoeuvre::new("altitude maintenance", delta_v).with_burn_duration(duration_s))
}
