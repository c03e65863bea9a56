//! Insertion: a launcher drops the stack into its first orbit.

use fleet_core::time::days_to_seconds;
use fleet_orbits::OrbitState;
use fleet_propulsion::ThrusterRole;
use log::debug;

use super::{MissionError, PhaseContext, PhaseStep};

pub const DEFAULT_INSERTION_DAYS: f64 = 30.0;

/// Insertion into `orbit`, followed by commissioning.
#[derive(Debug, Clone, PartialEq)]
pub struct Insertion {
    pub orbit: OrbitState,
    /// Fixed propellant for separation and despin (kg).
    pub propellant_kg: f64,
    pub propellant_contingency: f64,
    pub duration_s: f64,
}

impl Insertion {
    pub fn new(orbit: OrbitState) -> Self {
        Self {
            orbit,
            propellant_kg: 0.0,
            propellant_contingency: 0.1,
            duration_s: days_to_seconds(DEFAULT_INSERTION_DAYS),
        }
    }

    pub fn with_propellant_kg(mut self, propellant_kg: f64) -> Self {
        self.propellant_kg = propellant_kg;
        self
    }

    pub fn with_duration_s(mut self, duration_s: f64) -> Self {
        self.duration_s = duration_s;
        self
    }
}

impl PhaseStep for Insertion {
    fn execute(&self, ctx: &mut PhaseContext<'_>) -> Result<(), MissionError> {
        ctx.place(self.orbit)?;
        if self.propellant_kg > 0.0 {
            ctx.consume(
                self.propellant_kg * (1.0 + self.propellant_contingency),
                ThrusterRole::Rendezvous,
            )?;
        }
        ctx.advance(self.duration_s)?;
        debug!("{} inserted into {}", ctx.spacecraft(), self.orbit);
        Ok(())
    }
}
