//! Refueling from a tank carried by the recipient.

use fleet_core::time::days_to_seconds;
use fleet_propulsion::{ModuleRef, ThrusterRole};
use log::debug;

use super::{MissionError, PhaseContext, PhaseStep};

pub const DEFAULT_REFUELING_DAYS: f64 = 3.0;

/// Transfer propellant into the assigned module.
///
/// The amount is, in order of precedence: `refuel_mass_kg` when given, the
/// module's top-off amount when this is its last refuel before a deadline,
/// otherwise whatever brings the module back to its initial load. A requested
/// amount of zero skips the transfer entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct Refueling {
    pub refuel_mass_kg: Option<f64>,
    pub last_refuel_for_recipient: bool,
    pub duration_s: f64,
}

impl Default for Refueling {
    fn default() -> Self {
        Self {
            refuel_mass_kg: None,
            last_refuel_for_recipient: false,
            duration_s: days_to_seconds(DEFAULT_REFUELING_DAYS),
        }
    }
}

impl Refueling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refuel_mass_kg(mut self, mass_kg: f64) -> Self {
        self.refuel_mass_kg = Some(mass_kg);
        self
    }

    pub fn last_refuel(mut self) -> Self {
        self.last_refuel_for_recipient = true;
        self
    }

    /// Tank with the most propellant among the refuelers carried by the recipient.
    fn find_tank(&self, ctx: &PhaseContext<'_>) -> Result<ModuleRef, MissionError> {
        let mut best: Option<(ModuleRef, f64)> = None;
        for tank in ctx.store.refueling_tanks(ctx.spacecraft()) {
            let available = ctx.store.propulsion(&tank)?.current_propellant_kg();
            if best.as_ref().is_none_or(|(_, most)| available > *most) {
                best = Some((tank, available));
            }
        }
        best.map(|(tank, _)| tank)
            .ok_or_else(|| MissionError::NoTanker {
                phase: ctx.phase_id.to_string(),
                spacecraft: ctx.spacecraft().clone(),
            })
    }

    fn requested_kg(&self, ctx: &PhaseContext<'_>) -> Result<f64, MissionError> {
        let recipient = ctx.propulsion()?;
        Ok(match (self.refuel_mass_kg, recipient.top_off_kg()) {
            (Some(mass), _) => mass,
            (None, Some(top_off)) if self.last_refuel_for_recipient => top_off,
            _ => (recipient.initial_propellant_kg() - recipient.current_propellant_kg()).max(0.0),
        })
    }
}

impl PhaseStep for Refueling {
    fn execute(&self, ctx: &mut PhaseContext<'_>) -> Result<(), MissionError> {
        if self.refuel_mass_kg != Some(0.0) {
            let tank = self.find_tank(ctx)?;
            let amount = self.requested_kg(ctx)?;
            ctx.store
                .propulsion_mut(&tank)?
                .consume_propellant(amount, ThrusterRole::Refueling)
                .map_err(|source| ctx.propulsion_error(&tank, source))?;
            ctx.store
                .propulsion_mut(ctx.module)?
                .add_propellant(amount)
                .map_err(|source| ctx.propulsion_error(ctx.module, source))?;
            ctx.record.propellant_transferred_kg = amount;
            debug!("{}: {amount:.1} kg from {tank} to {}", ctx.phase_id, ctx.module);
        }
        ctx.advance(self.duration_s)
    }
}
