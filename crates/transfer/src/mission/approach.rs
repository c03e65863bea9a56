//! Approach: close from far rendezvous to proximity with an object.

use fleet_core::angles::wrap_signed_deg;
use fleet_core::time::{days_to_seconds, latest};
use fleet_propulsion::{ObjectId, ThrusterRole};

use super::{MissionError, PhaseContext, PhaseStep};

pub const DEFAULT_APPROACH_DAYS: f64 = 10.0;

/// Approach of `target`, burning a fixed amount of rendezvous propellant.
#[derive(Debug, Clone, PartialEq)]
pub struct Approach {
    pub target: ObjectId,
    pub propellant_kg: f64,
    pub propellant_contingency: f64,
    pub duration_s: f64,
}

impl Approach {
    pub fn new(target: impl Into<ObjectId>, propellant_kg: f64) -> Self {
        Self {
            target: target.into(),
            propellant_kg,
            propellant_contingency: 0.1,
            duration_s: days_to_seconds(DEFAULT_APPROACH_DAYS),
        }
    }

    pub fn with_duration_s(mut self, duration_s: f64) -> Self {
        self.duration_s = duration_s;
        self
    }

    fn mismatch(&self, ctx: &PhaseContext<'_>, reason: String) -> MissionError {
        MissionError::ApproachMismatch {
            phase: ctx.phase_id.to_string(),
            object: self.target.clone(),
            reason,
        }
    }
}

impl PhaseStep for Approach {
    fn execute(&self, ctx: &mut PhaseContext<'_>) -> Result<(), MissionError> {
        let own = ctx.orbit()?;
        let other = ctx.object_orbit(&self.target)?;

        // Both objects are brought to the later of the two epochs.
        let reference = latest(own.epoch(), other.epoch());
        let own = own
            .propagated_to(reference)
            .map_err(|err| ctx.transfer_error(err))?;
        let other = other
            .propagated_to(reference)
            .map_err(|err| ctx.transfer_error(err))?;
        ctx.place(own)?;
        ctx.store.set_object_orbit(&self.target, other)?;

        let tolerance = ctx.settings.approach;
        let delta_a = other.semi_major_axis_km() - own.semi_major_axis_km();
        let delta_inc = other.inclination_deg() - own.inclination_deg();
        let delta_raan = wrap_signed_deg(other.raan_deg() - own.raan_deg());
        if delta_a.abs() > tolerance.semi_major_axis_km {
            return Err(self.mismatch(
                ctx,
                format!("semi-major axes differ by {delta_a:.1} km"),
            ));
        }
        if delta_inc.abs() > tolerance.inclination_deg {
            return Err(self.mismatch(
                ctx,
                format!("inclinations differ by {delta_inc:.2}°"),
            ));
        }
        if delta_raan.abs() > tolerance.raan_deg {
            return Err(self.mismatch(ctx, format!("RAANs differ by {delta_raan:.2}°")));
        }

        ctx.consume(
            self.propellant_kg * (1.0 + self.propellant_contingency),
            ThrusterRole::Rendezvous,
        )?;
        ctx.advance(self.duration_s)
    }
}
