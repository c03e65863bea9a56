//! Mission phases and the plan that replays them.
//!
//! A [`Phase`] is bound to exactly one module and mutates the vehicle store
//! when applied. A [`Plan`] owns the phases and replays them in insertion order.

pub mod approach;
pub mod capture;
pub mod insertion;
pub mod maintenance;
pub mod orbit_change;
pub mod plan;
pub mod refueling;

use std::fmt;

use fleet_core::time::{self, Epoch, seconds_to_days, seconds_to_years};
use fleet_orbits::{OrbitError, OrbitState, ReentryConditions};
use fleet_propulsion::{
    Manoeuvre, ModuleKind, ModuleRef, ObjectId, PropulsionError, PropulsionModule, SpacecraftId,
    StoreError, ThrusterRole, VehicleStore,
};
use thiserror::Error;

use crate::calculator::{PhasingBranch, TransferError, TransferSettings};

pub use self::approach::Approach;
pub use self::capture::{Capture, Release};
pub use self::insertion::Insertion;
pub use self::maintenance::OrbitMaintenance;
pub use self::orbit_change::{OrbitChange, OrbitGoal};
pub use self::plan::{Plan, ReferenceDemand};
pub use self::refueling::Refueling;

/// Largest orbit mismatch at which an approach can start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproachTolerance {
    pub semi_major_axis_km: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
}

impl Default for ApproachTolerance {
    fn default() -> Self {
        Self {
            semi_major_axis_km: 50.0,
            inclination_deg: 5.0,
            raan_deg: 5.0,
        }
    }
}

/// Model constants used while replaying a plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionSettings {
    pub transfer: TransferSettings,
    /// Default margin applied to orbit-change delta-v.
    pub delta_v_contingency: f64,
    /// Default RAAN gap below which phasing burns instead of drifting (deg).
    pub raan_cutoff_deg: f64,
    pub approach: ApproachTolerance,
    pub maintenance_contingency: f64,
    /// Cost of one ground-station pass.
    pub ground_pass_cost: f64,
}

impl Default for MissionSettings {
    fn default() -> Self {
        Self {
            transfer: TransferSettings::default(),
            delta_v_contingency: 0.1,
            raan_cutoff_deg: 0.5,
            approach: ApproachTolerance::default(),
            maintenance_contingency: 0.1,
            ground_pass_cost: 100.0,
        }
    }
}

/// Raised when a phase is bound to an incompatible module.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssignmentError {
    #[error("phase '{phase}' needs a {expected} module but '{module}' is a {found} module")]
    WrongModuleKind {
        phase: String,
        module: ModuleRef,
        expected: ModuleKind,
        found: ModuleKind,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised while applying phases.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MissionError {
    #[error("phase '{phase}' has no assigned module")]
    Unassigned { phase: String },
    #[error("phase '{phase}': spacecraft '{spacecraft}' has no orbit; an insertion must come first")]
    NoOrbit {
        phase: String,
        spacecraft: SpacecraftId,
    },
    #[error("phase '{phase}': {object} has no orbit")]
    ObjectWithoutOrbit { phase: String, object: ObjectId },
    #[error("phase '{phase}' on {module}: {source}")]
    Propulsion {
        phase: String,
        module: ModuleRef,
        source: PropulsionError,
    },
    #[error("phase '{phase}': {source}")]
    Transfer {
        phase: String,
        source: TransferError,
    },
    #[error("phase '{phase}': cannot approach {object}, {reason}")]
    ApproachMismatch {
        phase: String,
        object: ObjectId,
        reason: String,
    },
    #[error("phase '{phase}': no refueling tank among objects carried by '{spacecraft}'")]
    NoTanker {
        phase: String,
        spacecraft: SpacecraftId,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl MissionError {
    /// Module and missing propellant when the failure is an empty tank.
    pub fn propellant_shortfall(&self) -> Option<(&ModuleRef, f64)> {
        match self {
            MissionError::Propulsion { module, source, .. } => {
                source.shortfall_kg().map(|shortfall| (module, shortfall))
            }
            _ => None,
        }
    }
}

/// Phase category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Insertion,
    OrbitChange,
    Approach,
    Capture,
    Release,
    Refueling,
    OrbitMaintenance,
}

impl PhaseKind {
    /// Module category the phase must be bound to.
    pub fn required_module(self) -> ModuleKind {
        match self {
            PhaseKind::Capture | PhaseKind::Release => ModuleKind::Capture,
            _ => ModuleKind::Propulsion,
        }
    }

    /// Ground segment effort while the phase runs.
    pub fn operations(self) -> Operations {
        let (fte, cost_per_fte_year, ground_passes_per_day) = match self {
            PhaseKind::Insertion | PhaseKind::Refueling => (10.0, 100_000.0, 0.0),
            PhaseKind::OrbitChange | PhaseKind::OrbitMaintenance => (0.0, 100_000.0, 0.0),
            PhaseKind::Approach | PhaseKind::Capture => (10.0, 250_000.0, 2.0),
            PhaseKind::Release => (10.0, 100_000.0, 2.0),
        };
        Operations {
            fte,
            cost_per_fte_year,
            ground_passes_per_day,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PhaseKind::Insertion => "Insertion",
            PhaseKind::OrbitChange => "Orbit change",
            PhaseKind::Approach => "Approach",
            PhaseKind::Capture => "Capture",
            PhaseKind::Release => "Release",
            PhaseKind::Refueling => "Refueling",
            PhaseKind::OrbitMaintenance => "Orbit maintenance",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Staffing and extra ground-station passes of a phase kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operations {
    pub fte: f64,
    pub cost_per_fte_year: f64,
    pub ground_passes_per_day: f64,
}

impl Operations {
    pub fn cost(&self, duration_s: f64, ground_pass_cost: f64) -> f64 {
        let passes = (seconds_to_days(duration_s) * self.ground_passes_per_day).round();
        self.fte * self.cost_per_fte_year * seconds_to_years(duration_s) + passes * ground_pass_cost
    }
}

/// Planned content of a phase.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseAction {
    Insertion(Insertion),
    OrbitChange(OrbitChange),
    Approach(Approach),
    Capture(Capture),
    Release(Release),
    Refueling(Refueling),
    OrbitMaintenance(OrbitMaintenance),
}

impl PhaseAction {
    pub fn kind(&self) -> PhaseKind {
        match self {
            PhaseAction::Insertion(_) => PhaseKind::Insertion,
            PhaseAction::OrbitChange(_) => PhaseKind::OrbitChange,
            PhaseAction::Approach(_) => PhaseKind::Approach,
            PhaseAction::Capture(_) => PhaseKind::Capture,
            PhaseAction::Release(_) => PhaseKind::Release,
            PhaseAction::Refueling(_) => PhaseKind::Refueling,
            PhaseAction::OrbitMaintenance(_) => PhaseKind::OrbitMaintenance,
        }
    }

    fn step(&self) -> &dyn PhaseStep {
        match self {
            PhaseAction::Insertion(step) => step,
            PhaseAction::OrbitChange(step) => step,
            PhaseAction::Approach(step) => step,
            PhaseAction::Capture(step) => step,
            PhaseAction::Release(step) => step,
            PhaseAction::Refueling(step) => step,
            PhaseAction::OrbitMaintenance(step) => step,
        }
    }
}

macro_rules! action_from {
    ($($variant:ident),*) => {
        $(impl From<$variant> for PhaseAction {
            fn from(step: $variant) -> Self {
                PhaseAction::$variant(step)
            }
        })*
    };
}

action_from!(
    Insertion,
    OrbitChange,
    Approach,
    Capture,
    Release,
    Refueling,
    OrbitMaintenance
);

/// State of the assigned vehicle at the end of a phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSnapshot {
    pub phase: String,
    pub kind: PhaseKind,
    pub module: ModuleRef,
    pub start: Epoch,
    pub end: Epoch,
    pub orbit: Option<OrbitState>,
    pub vehicle_mass_kg: f64,
    pub module_propellant_kg: Option<f64>,
    pub delta_v_m_s: f64,
}

impl fmt::Display for PhaseSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {}: {}", self.kind, self.phase)?;
        writeln!(f, "\tModule: {}", self.module)?;
        writeln!(
            f,
            "\tStart: {}  End: {}  ({:.2} days)",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M"),
            seconds_to_days(time::seconds_between(self.start, self.end))
        )?;
        if self.delta_v_m_s > 0.0 {
            writeln!(f, "\tΔV: {:.1} m/s", self.delta_v_m_s)?;
        }
        if let Some(orbit) = &self.orbit {
            writeln!(f, "\tOrbit: {orbit}")?;
        }
        if let Some(propellant) = self.module_propellant_kg {
            writeln!(f, "\tPropellant left: {propellant:.1} kg")?;
        }
        write!(f, "\tVehicle mass: {:.1} kg", self.vehicle_mass_kg)
    }
}

/// Everything a phase computes during one replay; cleared by reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseRecord {
    pub start: Option<Epoch>,
    pub end: Option<Epoch>,
    pub duration_s: f64,
    pub manoeuvres: Vec<Manoeuvre>,
    pub propellant_used_kg: f64,
    pub propellant_transferred_kg: f64,
    pub phasing_branch: Option<PhasingBranch>,
    pub phasing_duration_s: f64,
    pub raan_drift_deg: f64,
    /// Goal orbit resolved at the vehicle epoch.
    pub goal_orbit: Option<OrbitState>,
    pub reentry: Option<ReentryConditions>,
    pub snapshot: Option<PhaseSnapshot>,
}

impl PhaseRecord {
    pub fn delta_v_m_s(&self) -> f64 {
        self.manoeuvres.iter().map(|m| m.delta_v_m_s).sum()
    }
}

/// One step of a plan, performed by one module.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    id: String,
    module: Option<ModuleRef>,
    action: PhaseAction,
    record: PhaseRecord,
}

impl Phase {
    pub fn new(id: impl Into<String>, action: impl Into<PhaseAction>) -> Self {
        Self {
            id: id.into(),
            module: None,
            action: action.into(),
            record: PhaseRecord::default(),
        }
    }

    /// Bind the phase to `module`, checking the module category now rather than at apply time.
    pub fn assign_module(
        &mut self,
        store: &VehicleStore,
        module: ModuleRef,
    ) -> Result<(), AssignmentError> {
        let found = store.module(&module)?.kind();
        let expected = self.kind().required_module();
        if found != expected {
            return Err(AssignmentError::WrongModuleKind {
                phase: self.id.clone(),
                module,
                expected,
                found,
            });
        }
        self.module = Some(module);
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> PhaseKind {
        self.action.kind()
    }

    pub fn action(&self) -> &PhaseAction {
        &self.action
    }

    pub fn module(&self) -> Option<&ModuleRef> {
        self.module.as_ref()
    }

    pub fn spacecraft(&self) -> Option<&SpacecraftId> {
        self.module.as_ref().map(|module| &module.spacecraft)
    }

    pub fn record(&self) -> &PhaseRecord {
        &self.record
    }

    pub fn snapshot(&self) -> Option<&PhaseSnapshot> {
        self.record.snapshot.as_ref()
    }

    /// Operations cost of the last replay of this phase.
    pub fn operational_cost(&self, settings: &MissionSettings) -> f64 {
        self.kind()
            .operations()
            .cost(self.record.duration_s, settings.ground_pass_cost)
    }

    /// Forget everything computed by the last apply.
    pub fn reset(&mut self) {
        self.record = PhaseRecord::default();
    }

    /// Reset, then run the phase against the store.
    pub fn apply(
        &mut self,
        store: &mut VehicleStore,
        settings: &MissionSettings,
    ) -> Result<(), MissionError> {
        self.reset();
        let module = self.module.as_ref().ok_or_else(|| MissionError::Unassigned {
            phase: self.id.clone(),
        })?;
        let mut ctx = PhaseContext {
            phase_id: &self.id,
            kind: self.action.kind(),
            module,
            store,
            settings,
            record: &mut self.record,
        };
        self.action.step().execute(&mut ctx)?;
        ctx.take_snapshot()
    }
}

/// Behaviour of one phase kind.
pub(crate) trait PhaseStep {
    fn execute(&self, ctx: &mut PhaseContext<'_>) -> Result<(), MissionError>;
}

/// Mutable view handed to a phase while it runs.
pub(crate) struct PhaseContext<'a> {
    pub phase_id: &'a str,
    pub kind: PhaseKind,
    pub module: &'a ModuleRef,
    pub store: &'a mut VehicleStore,
    pub settings: &'a MissionSettings,
    pub record: &'a mut PhaseRecord,
}

impl PhaseContext<'_> {
    pub fn spacecraft(&self) -> &SpacecraftId {
        &self.module.spacecraft
    }

    pub fn orbit(&self) -> Result<OrbitState, MissionError> {
        self.store
            .spacecraft(self.spacecraft())?
            .orbit()
            .copied()
            .ok_or_else(|| MissionError::NoOrbit {
                phase: self.phase_id.to_string(),
                spacecraft: self.spacecraft().clone(),
            })
    }

    pub fn object_orbit(&self, object: &ObjectId) -> Result<OrbitState, MissionError> {
        self.store
            .object_orbit(object)?
            .ok_or_else(|| MissionError::ObjectWithoutOrbit {
                phase: self.phase_id.to_string(),
                object: object.clone(),
            })
    }

    /// Mass of the assigned vehicle with everything it carries.
    pub fn mass_kg(&self) -> Result<f64, MissionError> {
        Ok(self.store.current_mass_kg(self.spacecraft())?)
    }

    pub fn propulsion(&self) -> Result<&PropulsionModule, MissionError> {
        Ok(self.store.propulsion(self.module)?)
    }

    pub fn transfer_error(&self, source: impl Into<TransferError>) -> MissionError {
        MissionError::Transfer {
            phase: self.phase_id.to_string(),
            source: source.into(),
        }
    }

    pub fn propulsion_error(&self, module: &ModuleRef, source: PropulsionError) -> MissionError {
        MissionError::Propulsion {
            phase: self.phase_id.to_string(),
            module: module.clone(),
            source,
        }
    }

    /// Burn a manoeuvre (scaled by the contingency) on the assigned module and record it.
    pub fn burn(
        &mut self,
        manoeuvre: Manoeuvre,
        contingency: f64,
        role: ThrusterRole,
    ) -> Result<(), MissionError> {
        let mass = self.mass_kg()?;
        let used = self
            .store
            .propulsion_mut(self.module)?
            .apply_manoeuvre(&manoeuvre, contingency, mass, role)
            .map_err(|source| self.propulsion_error(self.module, source))?;
        self.record.propellant_used_kg += used;
        self.record.manoeuvres.push(manoeuvre);
        Ok(())
    }

    /// Draw a fixed propellant mass from the assigned module.
    pub fn consume(&mut self, mass_kg: f64, role: ThrusterRole) -> Result<(), MissionError> {
        self.store
            .propulsion_mut(self.module)?
            .consume_propellant(mass_kg, role)
            .map_err(|source| self.propulsion_error(self.module, source))?;
        self.record.propellant_used_kg += mass_kg;
        Ok(())
    }

    /// Put the whole stack the assigned vehicle belongs to on `orbit`.
    pub fn place(&mut self, orbit: OrbitState) -> Result<(), MissionError> {
        let root = self.store.root_carrier(self.spacecraft())?;
        self.store.set_orbit(&root, orbit)?;
        Ok(())
    }

    /// End the phase on `orbit`, `duration_s` after the vehicle's current epoch.
    pub fn arrive(&mut self, orbit: OrbitState, duration_s: f64) -> Result<(), MissionError> {
        let start = self.orbit()?.epoch();
        let end = time::advance(start, duration_s).ok_or_else(|| {
            self.transfer_error(OrbitError::EpochOverflow {
                seconds: duration_s,
            })
        })?;
        self.place(orbit.with_epoch(end))?;
        self.record.start = Some(start);
        self.record.end = Some(end);
        self.record.duration_s = duration_s;
        Ok(())
    }

    /// Let `duration_s` elapse: the node drifts and the epoch moves forward.
    pub fn advance(&mut self, duration_s: f64) -> Result<(), MissionError> {
        let orbit = self.orbit()?;
        let next = orbit
            .propagated_by(duration_s)
            .map_err(|err: OrbitError| self.transfer_error(err))?;
        self.place(next)?;
        self.record.start = Some(orbit.epoch());
        self.record.end = Some(next.epoch());
        self.record.duration_s = duration_s;
        Ok(())
    }

    fn take_snapshot(&mut self) -> Result<(), MissionError> {
        let spacecraft = self.store.spacecraft(self.spacecraft())?;
        let orbit = spacecraft.orbit().copied();
        let module_propellant_kg = self
            .store
            .propulsion(self.module)
            .ok()
            .map(PropulsionModule::current_propellant_kg);
        let end = self.record.end.or(orbit.map(|o| o.epoch()));
        let (Some(start), Some(end)) = (self.record.start.or(end), end) else {
            return Ok(());
        };
        self.record.snapshot = Some(PhaseSnapshot {
            phase: self.phase_id.to_string(),
            kind: self.kind,
            module: self.module.clone(),
            start,
            end,
            orbit,
            vehicle_mass_kg: self.mass_kg()?,
            module_propellant_kg,
            delta_v_m_s: self.record.delta_v_m_s(),
        });
        Ok(())
    }
}
