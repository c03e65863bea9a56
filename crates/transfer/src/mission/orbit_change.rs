//! Orbit change: main transfer, RAAN phasing and maintenance while waiting.

use fleet_core::time::seconds_to_days;
use fleet_orbits::OrbitState;
use fleet_propulsion::{ObjectId, ThrusterRole};
use log::debug;

use super::{MissionError, PhaseContext, PhaseStep};
use crate::calculator::{
    Capability, PhasingRequest, RaanTargeting, altitude_maintenance, main_manoeuvres, raan_phasing,
};

/// Where an orbit change goes.
#[derive(Debug, Clone, PartialEq)]
pub enum OrbitGoal {
    /// A fixed orbit; its node drifts from its own epoch to the vehicle's.
    Orbit(OrbitState),
    /// The current orbit of another object, read at apply time.
    Object(ObjectId),
}

impl From<OrbitState> for OrbitGoal {
    fn from(orbit: OrbitState) -> Self {
        OrbitGoal::Orbit(orbit)
    }
}

impl From<ObjectId> for OrbitGoal {
    fn from(object: ObjectId) -> Self {
        OrbitGoal::Object(object)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitChange {
    pub goal: OrbitGoal,
    pub targeting: RaanTargeting,
    /// Overrides the mission RAAN cutoff (deg).
    pub raan_cutoff_deg: Option<f64>,
    /// Overrides the mission delta-v contingency.
    pub delta_v_contingency: Option<f64>,
}

impl OrbitChange {
    pub fn new(goal: impl Into<OrbitGoal>) -> Self {
        Self {
            goal: goal.into(),
            targeting: RaanTargeting::Free,
            raan_cutoff_deg: None,
            delta_v_contingency: None,
        }
    }

    pub fn with_targeting(mut self, targeting: RaanTargeting) -> Self {
        self.targeting = targeting;
        self
    }

    pub fn with_raan_cutoff_deg(mut self, cutoff_deg: f64) -> Self {
        self.raan_cutoff_deg = Some(cutoff_deg);
        self
    }

    pub fn with_delta_v_contingency(mut self, contingency: f64) -> Self {
        self.delta_v_contingency = Some(contingency);
        self
    }

    fn resolve_goal(
        &self,
        ctx: &PhaseContext<'_>,
        initial: &OrbitState,
    ) -> Result<OrbitState, MissionError> {
        let goal = match &self.goal {
            OrbitGoal::Orbit(orbit) => *orbit,
            OrbitGoal::Object(object) => ctx.object_orbit(object)?,
        };
        Ok(goal.referenced_to(initial.epoch()))
    }
}

impl PhaseStep for OrbitChange {
    fn execute(&self, ctx: &mut PhaseContext<'_>) -> Result<(), MissionError> {
        let initial = ctx.orbit()?;
        let goal = self.resolve_goal(ctx, &initial)?;
        ctx.record.goal_orbit = Some(goal);

        let settings = *ctx.settings;
        let capability = Capability::of(ctx.propulsion()?, ctx.mass_kg()?);
        let main = main_manoeuvres(&initial, &goal, &capability, &settings.transfer)
            .map_err(|err| ctx.transfer_error(err))?;
        let request = PhasingRequest {
            initial: &initial,
            target: &goal,
            manoeuvre_duration_s: main.transfer_duration_s,
            targeting: self.targeting,
            cutoff_deg: self.raan_cutoff_deg.unwrap_or(settings.raan_cutoff_deg),
        };
        let phasing = raan_phasing(&request, &capability, &settings.transfer)
            .map_err(|err| ctx.transfer_error(err))?;

        let mut manoeuvres = Vec::with_capacity(main.manoeuvres.len() + 2);
        if phasing.phasing_duration_s > 0.0 {
            let upkeep = altitude_maintenance(&initial, phasing.phasing_duration_s)
                .map_err(|err| ctx.transfer_error(err))?;
            if upkeep.delta_v_m_s > 0.0 {
                manoeuvres.push(upkeep);
            }
        }
        manoeuvres.extend(main.manoeuvres);
        manoeuvres.extend(phasing.raan_manoeuvre);

        let contingency = self
            .delta_v_contingency
            .unwrap_or(settings.delta_v_contingency);
        for manoeuvre in manoeuvres {
            ctx.burn(manoeuvre, contingency, ThrusterRole::Main)?;
        }

        ctx.record.phasing_branch = Some(phasing.branch);
        ctx.record.phasing_duration_s = phasing.phasing_duration_s;
        ctx.record.raan_drift_deg = phasing.raan_drift_deg;
        ctx.record.reentry = main.reentry;

        let duration = phasing.phasing_duration_s + main.transfer_duration_s;
        let arrival = goal.with_raan(initial.raan_deg() + phasing.raan_drift_deg);
        ctx.arrive(arrival, duration)?;
        debug!(
            "{}: {:?} phasing, {:.1} m/s over {:.1} days",
            ctx.phase_id,
            phasing.branch,
            ctx.record.delta_v_m_s(),
            seconds_to_days(duration)
        );
        Ok(())
    }
}
