//! Ordered list of phases replayed as a linear pipeline.

use fleet_core::time::{Epoch, days_to_seconds, seconds_between};
use fleet_propulsion::{ModuleRef, SpacecraftId, VehicleStore};
use log::{debug, trace};

use super::{
    AssignmentError, MissionError, MissionSettings, Phase, PhaseAction, PhaseKind,
};

/// Demand the plan places on one module, used to size it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReferenceDemand {
    /// Largest orbit-change delta-v performed by the module (m/s).
    pub max_delta_v_m_s: f64,
    /// Propellant burnt by the module during approaches, before contingency (kg).
    pub rendezvous_propellant_kg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub id: String,
    pub starting_epoch: Epoch,
    pub settings: MissionSettings,
    phases: Vec<Phase>,
}

impl Plan {
    pub fn new(id: impl Into<String>, starting_epoch: Epoch) -> Self {
        Self {
            id: id.into(),
            starting_epoch,
            settings: MissionSettings::default(),
            phases: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: MissionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn add_phase(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    /// Build a phase, bind it to `module` and append it.
    pub fn add_assigned(
        &mut self,
        store: &VehicleStore,
        id: impl Into<String>,
        action: impl Into<PhaseAction>,
        module: ModuleRef,
    ) -> Result<(), AssignmentError> {
        let mut phase = Phase::new(id, action);
        phase.assign_module(store, module)?;
        self.phases.push(phase);
        Ok(())
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase(&self, id: &str) -> Option<&Phase> {
        self.phases.iter().find(|phase| phase.id() == id)
    }

    pub fn reset(&mut self) {
        for phase in &mut self.phases {
            phase.reset();
        }
    }

    /// Replay every phase in order against `store`; the first failure aborts the replay.
    ///
    /// The store is expected to be in its launch configuration.
    pub fn apply(&mut self, store: &mut VehicleStore) -> Result<(), MissionError> {
        self.reset();
        if let Some(phase) = self.phases.iter().find(|phase| phase.module().is_none()) {
            return Err(MissionError::Unassigned {
                phase: phase.id().to_string(),
            });
        }
        let settings = self.settings;
        for phase in &mut self.phases {
            phase.apply(store, &settings)?;
            if let Some(snapshot) = phase.snapshot() {
                trace!("{snapshot}");
            }
        }
        debug!("plan '{}' replayed {} phases", self.id, self.phases.len());
        Ok(())
    }

    pub fn phases_of_spacecraft<'a>(
        &'a self,
        spacecraft: &'a SpacecraftId,
    ) -> impl Iterator<Item = &'a Phase> + 'a {
        self.phases
            .iter()
            .filter(move |phase| phase.spacecraft() == Some(spacecraft))
    }

    pub fn phases_of_module<'a>(
        &'a self,
        module: &'a ModuleRef,
    ) -> impl Iterator<Item = &'a Phase> + 'a {
        self.phases
            .iter()
            .filter(move |phase| phase.module() == Some(module))
    }

    pub fn phases_of_kind(&self, kind: PhaseKind) -> impl Iterator<Item = &Phase> {
        self.phases.iter().filter(move |phase| phase.kind() == kind)
    }

    /// Latest phase end after the last replay.
    pub fn end_epoch(&self) -> Option<Epoch> {
        self.phases.iter().filter_map(|phase| phase.record().end).max()
    }

    /// Elapsed time from the plan start to the last phase end, plus `margin_days`.
    pub fn program_duration_s(&self, margin_days: f64) -> f64 {
        let end = self.end_epoch().unwrap_or(self.starting_epoch);
        seconds_between(self.starting_epoch, end).max(0.0) + days_to_seconds(margin_days)
    }

    /// Sizing demand on `module` from the last replay.
    pub fn reference_demand(&self, module: &ModuleRef) -> ReferenceDemand {
        let mut demand = ReferenceDemand::default();
        for phase in self.phases_of_module(module) {
            match phase.action() {
                PhaseAction::OrbitChange(_) => {
                    demand.max_delta_v_m_s =
                        demand.max_delta_v_m_s.max(phase.record().delta_v_m_s());
                }
                PhaseAction::Approach(approach) => {
                    demand.rendezvous_propellant_kg += approach.propellant_kg;
                }
                _ => {}
            }
        }
        demand
    }

    /// Operations cost of every phase, from the last replay.
    pub fn operational_cost(&self) -> f64 {
        self.phases
            .iter()
            .map(|phase| phase.operational_cost(&self.settings))
            .sum()
    }

    /// Snapshot text of every phase that ran, in plan order.
    pub fn report(&self) -> String {
        self.phases
            .iter()
            .filter_map(Phase::snapshot)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
