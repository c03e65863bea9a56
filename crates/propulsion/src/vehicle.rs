//! Spacecraft and passive targets.

use std::collections::BTreeMap;
use std::fmt;

use fleet_orbits::OrbitState;

use crate::ids::{ModuleId, ModuleRef, SpacecraftId, TargetId};
use crate::module::{CaptureModule, Module, ModuleKind, PropulsionModule};
use crate::StoreError;

/// Spacecraft class; selects the sizing capability at fleet construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpacecraftKind {
    Servicer,
    UpperStage,
    KickStage,
}

impl fmt::Display for SpacecraftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpacecraftKind::Servicer => f.write_str("servicer"),
            SpacecraftKind::UpperStage => f.write_str("upper stage"),
            SpacecraftKind::KickStage => f.write_str("kick stage"),
        }
    }
}

/// Default module for each role.
#[derive(Debug, Clone, Default, PartialEq)]
struct Roles {
    main: Option<ModuleId>,
    rcs: Option<ModuleId>,
    capture: Option<ModuleId>,
}

/// An active vehicle owning modules, an orbit and carried payload links.
#[derive(Debug, Clone, PartialEq)]
pub struct Spacecraft {
    id: SpacecraftId,
    pub kind: SpacecraftKind,
    /// Homogenization group: members end up with identical module designs.
    pub group: String,
    /// Structure and platform mass outside of the modules (kg).
    pub structure_mass_kg: f64,
    pub mass_contingency: f64,
    modules: BTreeMap<ModuleId, Module>,
    roles: Roles,
    orbit: Option<OrbitState>,
    pub(crate) carrier: Option<SpacecraftId>,
    pub(crate) initial_carrier: Option<SpacecraftId>,
}

impl Spacecraft {
    pub fn new(
        id: impl Into<SpacecraftId>,
        kind: SpacecraftKind,
        group: impl Into<String>,
        structure_mass_kg: f64,
        mass_contingency: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            group: group.into(),
            structure_mass_kg,
            mass_contingency,
            modules: BTreeMap::new(),
            roles: Roles::default(),
            orbit: None,
            carrier: None,
            initial_carrier: None,
        }
    }

    pub fn id(&self) -> &SpacecraftId {
        &self.id
    }

    /// Mount a module. The first propulsion and capture modules become the role defaults.
    pub fn add_module(&mut self, module: impl Into<Module>) -> Result<(), StoreError> {
        let module = module.into();
        let id = module.id().clone();
        if self.modules.contains_key(&id) {
            return Err(StoreError::DuplicateModule(ModuleRef {
                spacecraft: self.id.clone(),
                module: id,
            }));
        }
        match module.kind() {
            ModuleKind::Propulsion if self.roles.main.is_none() => {
                self.roles.main = Some(id.clone())
            }
            ModuleKind::Capture if self.roles.capture.is_none() => {
                self.roles.capture = Some(id.clone())
            }
            _ => {}
        }
        self.modules.insert(id, module);
        Ok(())
    }

    pub fn set_main_propulsion(&mut self, id: impl Into<ModuleId>) -> Result<(), StoreError> {
        let id = self.checked_role(id.into(), ModuleKind::Propulsion)?;
        self.roles.main = Some(id);
        Ok(())
    }

    pub fn set_rcs_propulsion(&mut self, id: impl Into<ModuleId>) -> Result<(), StoreError> {
        let id = self.checked_role(id.into(), ModuleKind::Propulsion)?;
        self.roles.rcs = Some(id);
        Ok(())
    }

    pub fn set_capture_module(&mut self, id: impl Into<ModuleId>) -> Result<(), StoreError> {
        let id = self.checked_role(id.into(), ModuleKind::Capture)?;
        self.roles.capture = Some(id);
        Ok(())
    }

    fn checked_role(&self, id: ModuleId, expected: ModuleKind) -> Result<ModuleId, StoreError> {
        let module_ref = ModuleRef {
            spacecraft: self.id.clone(),
            module: id,
        };
        match self.modules.get(&module_ref.module) {
            None => Err(StoreError::UnknownModule(module_ref)),
            Some(module) if module.kind() != expected => Err(StoreError::WrongModuleKind {
                module: module_ref,
                expected,
                found: module.kind(),
            }),
            Some(_) => Ok(module_ref.module),
        }
    }

    pub fn main_propulsion_id(&self) -> Option<&ModuleId> {
        self.roles.main.as_ref()
    }

    /// RCS module id, falling back to main propulsion.
    pub fn rcs_propulsion_id(&self) -> Option<&ModuleId> {
        self.roles.rcs.as_ref().or(self.roles.main.as_ref())
    }

    /// Dedicated RCS module id, without fallback.
    pub fn dedicated_rcs_id(&self) -> Option<&ModuleId> {
        self.roles.rcs.as_ref()
    }

    pub fn capture_module_id(&self) -> Option<&ModuleId> {
        self.roles.capture.as_ref()
    }

    pub fn main_propulsion(&self) -> Option<&PropulsionModule> {
        self.main_propulsion_id()
            .and_then(|id| self.modules.get(id))
            .and_then(Module::as_propulsion)
    }

    /// RCS module, or main propulsion when no dedicated RCS is mounted.
    pub fn rcs_propulsion(&self) -> Option<&PropulsionModule> {
        self.rcs_propulsion_id()
            .and_then(|id| self.modules.get(id))
            .and_then(Module::as_propulsion)
    }

    pub fn capture_module(&self) -> Option<&CaptureModule> {
        self.capture_module_id()
            .and_then(|id| self.modules.get(id))
            .and_then(Module::as_capture)
    }

    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn module_mut(&mut self, id: &ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(id)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn propulsion_modules(&self) -> impl Iterator<Item = &PropulsionModule> {
        self.modules.values().filter_map(Module::as_propulsion)
    }

    pub fn orbit(&self) -> Option<&OrbitState> {
        self.orbit.as_ref()
    }

    pub(crate) fn set_orbit(&mut self, orbit: OrbitState) {
        self.orbit = Some(orbit);
    }

    /// Spacecraft currently carrying this one, if docked.
    pub fn carrier(&self) -> Option<&SpacecraftId> {
        self.carrier.as_ref()
    }

    /// Carrier at launch (kit on a mothership, satellite on a stage).
    pub fn initial_carrier(&self) -> Option<&SpacecraftId> {
        self.initial_carrier.as_ref()
    }

    /// (structure + module dry masses) × (1 + contingency) when requested.
    pub fn dry_mass_kg(&self, with_contingency: bool) -> f64 {
        let modules: f64 = self
            .modules
            .values()
            .map(|module| module.dry_mass_kg(with_contingency))
            .sum();
        let dry = self.structure_mass_kg + modules;
        if with_contingency {
            dry * (1.0 + self.mass_contingency)
        } else {
            dry
        }
    }

    pub fn initial_propellant_kg(&self) -> f64 {
        self.propulsion_modules()
            .map(PropulsionModule::initial_propellant_kg)
            .sum()
    }

    pub fn current_propellant_kg(&self) -> f64 {
        self.propulsion_modules()
            .map(PropulsionModule::current_propellant_kg)
            .sum()
    }

    /// Launch mass of the vehicle alone (carried objects excluded).
    pub fn wet_mass_kg(&self) -> f64 {
        self.dry_mass_kg(true) + self.initial_propellant_kg()
    }

    /// Current mass of the vehicle alone (carried objects excluded).
    pub fn own_mass_kg(&self) -> f64 {
        self.dry_mass_kg(true) + self.current_propellant_kg()
    }

    pub(crate) fn reset(&mut self) {
        self.orbit = None;
        self.carrier = self.initial_carrier.clone();
        for module in self.modules.values_mut() {
            module.reset();
        }
    }
}

/// Passive payload: a debris object to remove or a satellite to deploy.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    id: TargetId,
    pub mass_kg: f64,
    pub volume_m3: f64,
    operational_orbit: OrbitState,
    /// Where the object is left after removal, if it has a planned disposal.
    pub disposal_orbit: Option<OrbitState>,
    orbit: OrbitState,
    pub(crate) carrier: Option<SpacecraftId>,
    pub(crate) initial_carrier: Option<SpacecraftId>,
}

impl Target {
    pub fn new(id: impl Into<TargetId>, mass_kg: f64, operational_orbit: OrbitState) -> Self {
        Self {
            id: id.into(),
            mass_kg,
            volume_m3: 0.0,
            operational_orbit,
            disposal_orbit: None,
            orbit: operational_orbit,
            carrier: None,
            initial_carrier: None,
        }
    }

    pub fn with_disposal_orbit(mut self, orbit: OrbitState) -> Self {
        self.disposal_orbit = Some(orbit);
        self
    }

    pub fn with_volume(mut self, volume_m3: f64) -> Self {
        self.volume_m3 = volume_m3;
        self
    }

    pub fn id(&self) -> &TargetId {
        &self.id
    }

    /// Orbit the object occupies (debris) or is destined for (satellite).
    pub fn operational_orbit(&self) -> &OrbitState {
        &self.operational_orbit
    }

    /// Current orbit; follows the carrier while captured.
    pub fn orbit(&self) -> &OrbitState {
        &self.orbit
    }

    pub(crate) fn set_orbit(&mut self, orbit: OrbitState) {
        self.orbit = orbit;
    }

    pub fn carrier(&self) -> Option<&SpacecraftId> {
        self.carrier.as_ref()
    }

    pub(crate) fn reset(&mut self) {
        self.orbit = self.operational_orbit;
        self.carrier = self.initial_carrier.clone();
    }
}
