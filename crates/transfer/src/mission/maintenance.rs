//! Station keeping against decay for a fixed time.

use fleet_propulsion::ThrusterRole;

use super::{MissionError, PhaseContext, PhaseStep};
use crate::calculator::altitude_maintenance;

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitMaintenance {
    pub duration_s: f64,
    /// Margin on the maintenance delta-v; the mission default when unset.
    pub contingency: Option<f64>,
}

impl OrbitMaintenance {
    pub fn new(duration_s: f64) -> Self {
        Self {
            duration_s,
            contingency: None,
        }
    }
}

impl PhaseStep for OrbitMaintenance {
    fn execute(&self, ctx: &mut PhaseContext<'_>) -> Result<(), MissionError> {
        let orbit = ctx.orbit()?;
        let manoeuvre =
            altitude_maintenance(&orbit, self.duration_s).map_err(|err| ctx.transfer_error(err))?;
        let contingency = self
            .contingency
            .unwrap_or(ctx.settings.maintenance_contingency);
        ctx.burn(manoeuvre, contingency, ThrusterRole::Main)?;
        ctx.advance(self.duration_s)
    }
}
