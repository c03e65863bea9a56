//! Fleet: sizes every spacecraft against a plan.
//!
//! Two nested loops. The inner design loop redesigns the modules of one
//! spacecraft until its wet mass settles. The outer search replays the plan and
//! corrects the initial propellant of every propulsion module until the lowest
//! level reached over the plan sits on the module's floor.

mod search;
mod summary;

pub use search::{ConvergenceReport, Correction, Sample, SearchState, Step};
pub use summary::{CostSummary, MassSummary, SpacecraftMass};

use std::collections::BTreeMap;

use fleet_config::ConvergenceConfig;
use fleet_transfer::propulsion::{
    ModuleId, ModuleRef, ObjectId, Spacecraft, SpacecraftId, StoreError, Target, VehicleStore,
};
use fleet_transfer::{MissionError, Plan};
use log::{debug, info, warn};
use thiserror::Error;

use crate::launch::Launcher;
use crate::sizing::{DesignContext, ModuleDesign, ModuleSizing};

#[derive(Debug, Error)]
pub enum FleetError {
    #[error(transparent)]
    Mission(#[from] MissionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no sizing capability bound to spacecraft '{0}'")]
    NoSizing(SpacecraftId),
}

/// Whether module dry masses may change during a convergence pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignMode {
    /// Run the inner design loop at every reset.
    Redesign,
    /// Keep module designs frozen; only propellant loads move.
    PropellantOnly,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceSettings {
    pub margin_kg: f64,
    pub design_tolerance_kg: f64,
    /// Cap on outer iterations per pass. A pass needs at least two to
    /// converge, so a cap of 1 always reports non-convergence.
    pub max_iterations: usize,
    pub max_design_iterations: usize,
    pub bootstrap_step_kg: f64,
    pub homogenize: bool,
}

impl Default for ConvergenceSettings {
    fn default() -> Self {
        Self::from(&ConvergenceConfig::default())
    }
}

impl From<&ConvergenceConfig> for ConvergenceSettings {
    fn from(config: &ConvergenceConfig) -> Self {
        Self {
            margin_kg: config.margin_kg,
            design_tolerance_kg: config.design_tolerance_kg,
            max_iterations: config.max_iterations,
            max_design_iterations: config.max_design_iterations,
            bootstrap_step_kg: config.bootstrap_step_kg,
            homogenize: config.homogenize,
        }
    }
}

/// Default module roles compared across a homogenization group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Role {
    Main,
    Rcs,
    Kit,
}

pub struct Fleet {
    pub id: String,
    pub architecture: String,
    pub settings: ConvergenceSettings,
    store: VehicleStore,
    sizing: BTreeMap<SpacecraftId, Box<dyn ModuleSizing>>,
    launchers: BTreeMap<String, Launcher>,
    search: BTreeMap<ModuleRef, SearchState>,
}

impl Fleet {
    pub fn new(id: impl Into<String>, architecture: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            architecture: architecture.into(),
            settings: ConvergenceSettings::default(),
            store: VehicleStore::new(),
            sizing: BTreeMap::new(),
            launchers: BTreeMap::new(),
            search: BTreeMap::new(),
        }
    }

    pub fn with_settings(mut self, settings: ConvergenceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn add_spacecraft(
        &mut self,
        spacecraft: Spacecraft,
        sizing: Box<dyn ModuleSizing>,
    ) -> Result<(), FleetError> {
        let id = spacecraft.id().clone();
        self.store.insert_spacecraft(spacecraft)?;
        self.sizing.insert(id, sizing);
        Ok(())
    }

    pub fn add_target(&mut self, target: Target) -> Result<(), FleetError> {
        self.store.insert_target(target)?;
        Ok(())
    }

    pub fn add_launcher(&mut self, launcher: Launcher) {
        self.launchers.insert(launcher.name.clone(), launcher);
    }

    pub fn launcher(&self, name: &str) -> Option<&Launcher> {
        self.launchers.get(name)
    }

    pub fn launchers(&self) -> impl Iterator<Item = &Launcher> {
        self.launchers.values()
    }

    pub fn store(&self) -> &VehicleStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VehicleStore {
        &mut self.store
    }

    pub fn sizing(&self, id: &SpacecraftId) -> Option<&dyn ModuleSizing> {
        self.sizing.get(id).map(Box::as_ref)
    }

    /// Spacecraft ids grouped by homogenization group.
    pub fn groups(&self) -> BTreeMap<String, Vec<SpacecraftId>> {
        let mut groups: BTreeMap<String, Vec<SpacecraftId>> = BTreeMap::new();
        for spacecraft in self.store.all_spacecraft() {
            groups
                .entry(spacecraft.group.clone())
                .or_default()
                .push(spacecraft.id().clone());
        }
        groups
    }

    /// Full design: converge with redesign, make groups identical, then refine propellant only.
    pub fn design(&mut self, plan: &mut Plan) -> Result<ConvergenceReport, FleetError> {
        self.search.clear();
        let first = self.converge(plan, DesignMode::Redesign)?;
        if !self.settings.homogenize {
            info!(
                "fleet '{}' designed in {} iterations (converged: {})",
                self.id, first.iterations, first.converged
            );
            return Ok(first);
        }
        if !first.converged {
            warn!(
                "fleet '{}': redesign pass stopped after {} iterations without converging; homogenizing anyway",
                self.id, first.iterations
            );
        }
        self.homogenize_groups(plan)?;
        let second = self.converge(plan, DesignMode::PropellantOnly)?;
        let report = first.then(second);
        info!(
            "fleet '{}' designed in {} iterations (passes converged: {:?})",
            self.id, report.iterations, report.passes
        );
        Ok(report)
    }

    /// Make every homogenization group physically identical. The search
    /// history is dropped: its samples were taken at the old dry masses.
    pub fn homogenize_groups(&mut self, plan: &Plan) -> Result<(), FleetError> {
        self.reset(plan, DesignMode::PropellantOnly)?;
        for members in self.groups().into_values() {
            self.homogenize(plan, &members)?;
        }
        for state in self.search.values_mut() {
            state.previous = None;
        }
        Ok(())
    }

    pub fn search_state(&self, module: &ModuleRef) -> Option<&SearchState> {
        self.search.get(module)
    }

    /// Outer propellant search.
    ///
    /// Non-convergence within the iteration cap is reported, not raised; the
    /// fleet is left in its last replayed state. Mission errors other than a
    /// propellant shortfall abort the search.
    pub fn converge(
        &mut self,
        plan: &mut Plan,
        mode: DesignMode,
    ) -> Result<ConvergenceReport, FleetError> {
        self.reset(plan, mode)?;
        let mut shortfall = self.replay(plan)?;
        let mut iterations = 0;
        loop {
            iterations += 1;
            let unsettled = match shortfall.take() {
                Some((module, missing_kg)) => {
                    self.grow(&module, missing_kg)?;
                    vec![module]
                }
                None => self.sweep(iterations == 1)?,
            };
            self.reset(plan, mode)?;
            shortfall = self.replay(plan)?;
            info!(
                "iteration {iterations}: {} module(s) outside the {:.2} kg margin",
                unsettled.len(),
                self.settings.margin_kg
            );

            // The first sweep seeds the top-off amounts, so its replay is not final.
            if unsettled.is_empty() && shortfall.is_none() && iterations >= 2 {
                return Ok(ConvergenceReport::pass(true, iterations, unsettled));
            }
            if iterations >= self.settings.max_iterations {
                warn!(
                    "no convergence in propellant mass after {iterations} iterations; {} module(s) unsettled",
                    unsettled.len()
                );
                return Ok(ConvergenceReport::pass(false, iterations, unsettled));
            }
        }
    }

    /// Back to launch configuration with the current guesses loaded; in
    /// [`DesignMode::Redesign`] every spacecraft also runs its design loop.
    pub fn reset(&mut self, plan: &Plan, mode: DesignMode) -> Result<(), FleetError> {
        for (module, state) in &self.search {
            let propulsion = self.store.propulsion_mut(module)?;
            propulsion.set_initial_propellant_kg(state.guess_kg);
            propulsion.set_top_off_kg(state.top_off_kg);
        }
        self.store.reset();
        if mode == DesignMode::Redesign {
            for id in self.store.spacecraft_ids() {
                self.design_spacecraft(plan, &id)?;
            }
        }
        Ok(())
    }

    /// Inner design loop of one spacecraft; `false` when the cap was hit.
    pub fn design_spacecraft(
        &mut self,
        plan: &Plan,
        id: &SpacecraftId,
    ) -> Result<bool, FleetError> {
        let limit = self.settings.max_design_iterations.max(1);
        for _ in 0..limit {
            let before = self.store.spacecraft(id)?.wet_mass_kg();
            let modules: Vec<ModuleId> = self
                .store
                .spacecraft(id)?
                .modules()
                .map(|module| module.id().clone())
                .collect();
            for module in modules {
                let design = self.module_design(plan, &ModuleRef::new(id.clone(), module.clone()))?;
                self.apply_design(&ModuleRef::new(id.clone(), module), design)?;
            }
            let after = self.store.spacecraft(id)?.wet_mass_kg();
            if (after - before).abs() <= self.settings.design_tolerance_kg {
                return Ok(true);
            }
        }
        warn!("no convergence in the design of '{id}' after {limit} iterations");
        Ok(false)
    }

    fn module_design(&self, plan: &Plan, module: &ModuleRef) -> Result<ModuleDesign, FleetError> {
        let sizing = self
            .sizing
            .get(&module.spacecraft)
            .ok_or_else(|| FleetError::NoSizing(module.spacecraft.clone()))?;
        let spacecraft = self.store.spacecraft(&module.spacecraft)?;
        let ctx = DesignContext {
            spacecraft,
            demand: plan.reference_demand(module),
            launch_payload_mass_kg: self.launch_payload_mass_kg(&module.spacecraft)?,
        };
        Ok(sizing.design_module(&ctx, self.store.module(module)?))
    }

    fn apply_design(&mut self, module: &ModuleRef, design: ModuleDesign) -> Result<(), FleetError> {
        let target = self.store.module_mut(module)?;
        if let Some(propulsion) = target.as_propulsion_mut() {
            propulsion.set_design(
                design.dry_mass_kg,
                design.reference_power_w,
                design.reference_thrust_n,
            );
        } else if let Some(capture) = target.as_capture_mut() {
            capture.set_design(design.dry_mass_kg, design.reference_power_w);
        }
        Ok(())
    }

    /// Mass of the objects loaded on `id`; called right after a reset, so these
    /// are the launch payloads.
    fn launch_payload_mass_kg(&self, id: &SpacecraftId) -> Result<f64, FleetError> {
        let mut mass = 0.0;
        for object in self.store.carried_by(id) {
            mass += self.store.object_mass_kg(&object)?;
        }
        Ok(mass)
    }

    /// Replay the plan; a propellant shortfall is returned rather than raised.
    fn replay(&mut self, plan: &mut Plan) -> Result<Option<(ModuleRef, f64)>, FleetError> {
        match plan.apply(&mut self.store) {
            Ok(()) => Ok(None),
            Err(err) => match err.propellant_shortfall() {
                Some((module, missing_kg)) => {
                    debug!("{err}; growing the guess for {module}");
                    Ok(Some((module.clone(), missing_kg)))
                }
                None => Err(err.into()),
            },
        }
    }

    fn state_for(&mut self, module: &ModuleRef) -> Result<&mut SearchState, FleetError> {
        let initial = self.store.propulsion(module)?.initial_propellant_kg();
        Ok(self
            .search
            .entry(module.clone())
            .or_insert_with(|| SearchState::new(initial)))
    }

    /// Raise the guess of a module that ran dry so the next replay gets further.
    fn grow(&mut self, module: &ModuleRef, missing_kg: f64) -> Result<(), FleetError> {
        let contingency = self.store.propulsion(module)?.propellant_contingency;
        let step = self.settings.bootstrap_step_kg;
        let state = self.state_for(module)?;
        state.guess_kg += missing_kg * (1.0 + contingency) + step;
        state.previous = None;
        debug!("{module}: short by {missing_kg:.2} kg, new guess {:.2} kg", state.guess_kg);
        Ok(())
    }

    /// Correct every module outside the margin; returns the ones corrected.
    fn sweep(&mut self, first: bool) -> Result<Vec<ModuleRef>, FleetError> {
        let margin = self.settings.margin_kg;
        let step = self.settings.bootstrap_step_kg;
        let mut unsettled = Vec::new();
        for module in self.store.propulsion_refs() {
            let propulsion = self.store.propulsion(&module)?;
            let sample = Sample {
                initial_kg: propulsion.initial_propellant_kg(),
                mismatch_kg: propulsion.lowest_propellant_kg() - propulsion.propellant_floor_kg(),
            };
            let final_kg = propulsion.current_propellant_kg();
            let contingency = propulsion.propellant_contingency;

            let state = self.state_for(&module)?;
            let last_mismatch_kg = state.previous.map(|previous| previous.mismatch_kg);
            match state.correct(sample, margin, step) {
                Correction::Settled => {
                    if first {
                        state.advance(sample, sample.initial_kg);
                    }
                }
                Correction::Moved {
                    guess_kg,
                    diverging,
                } => {
                    if let (true, Some(last)) = (diverging, last_mismatch_kg) {
                        warn!(
                            "{module}: propellant search diverging ({last:.3} kg -> {:.3} kg)",
                            sample.mismatch_kg
                        );
                    }
                    debug!(
                        "{module}: mismatch {:.3} kg at {:.3} kg, next guess {guess_kg:.3} kg",
                        sample.mismatch_kg, sample.initial_kg
                    );
                    unsettled.push(module);
                }
            }
            let floor = state.guess_kg * contingency;
            state.update_top_off(final_kg, floor);
        }
        Ok(unsettled)
    }

    /// Make every member of a group physically identical: each default role is
    /// designed against the largest propellant load found in the group.
    fn homogenize(&mut self, plan: &Plan, members: &[SpacecraftId]) -> Result<(), FleetError> {
        let mut slots: BTreeMap<Role, Vec<ModuleRef>> = BTreeMap::new();
        for id in members {
            let spacecraft = self.store.spacecraft(id)?;
            if let Some(main) = spacecraft.main_propulsion_id() {
                slots
                    .entry(Role::Main)
                    .or_default()
                    .push(ModuleRef::new(id.clone(), main.clone()));
            }
            if let Some(rcs) = spacecraft.dedicated_rcs_id() {
                slots
                    .entry(Role::Rcs)
                    .or_default()
                    .push(ModuleRef::new(id.clone(), rcs.clone()));
            }
            for object in self.store.carried_by(id) {
                if let ObjectId::Spacecraft(kit) = object {
                    if let Some(main) = self.store.spacecraft(&kit)?.main_propulsion_id() {
                        slots
                            .entry(Role::Kit)
                            .or_default()
                            .push(ModuleRef::new(kit.clone(), main.clone()));
                    }
                }
            }
        }

        for (role, modules) in slots {
            let mut heaviest = 0.0_f64;
            for module in &modules {
                heaviest = heaviest.max(self.store.propulsion(module)?.initial_propellant_kg());
            }
            let mut designs = Vec::with_capacity(modules.len());
            for module in &modules {
                let own = self.store.propulsion(module)?.initial_propellant_kg();
                self.store
                    .propulsion_mut(module)?
                    .set_initial_propellant_kg(heaviest);
                designs.push(self.module_design(plan, module)?);
                self.store.propulsion_mut(module)?.set_initial_propellant_kg(own);
            }
            let Some(common) = designs.into_iter().reduce(|a, b| ModuleDesign {
                dry_mass_kg: a.dry_mass_kg.max(b.dry_mass_kg),
                reference_power_w: a.reference_power_w.max(b.reference_power_w),
                reference_thrust_n: a.reference_thrust_n.max(b.reference_thrust_n),
            }) else {
                continue;
            };
            debug!(
                "{role:?} modules of {} member(s) set to {:.2} kg dry for {heaviest:.2} kg of propellant",
                modules.len(),
                common.dry_mass_kg
            );
            for module in &modules {
                self.apply_design(module, common)?;
                if let Some(state) = self.search.get_mut(module) {
                    state.top_off_kg = None;
                }
            }
        }
        Ok(())
    }

    pub fn mass_summary(&self) -> MassSummary {
        MassSummary::of(&self.store)
    }

    pub fn cost_summary(&self, plan: &Plan) -> CostSummary {
        CostSummary::of(self, plan)
    }
}
