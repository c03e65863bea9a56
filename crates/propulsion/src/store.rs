//! Id-keyed store of spacecraft and targets.
//!
//! Carry links are foreign keys: a captured object records the id of the
//! spacecraft holding it. Masses and orbits of carried objects are resolved
//! through the store, so no object ever points at another.

use std::collections::BTreeMap;

use fleet_orbits::OrbitState;
use log::debug;

use crate::ids::{ModuleRef, ObjectId, SpacecraftId, TargetId};
use crate::module::{Module, ModuleKind, PropulsionModule};
use crate::vehicle::{Spacecraft, Target};
use crate::StoreError;

#[derive(Debug, Clone, Default)]
pub struct VehicleStore {
    spacecraft: BTreeMap<SpacecraftId, Spacecraft>,
    targets: BTreeMap<TargetId, Target>,
}

impl VehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_spacecraft(&mut self, spacecraft: Spacecraft) -> Result<(), StoreError> {
        let id = spacecraft.id().clone();
        if self.spacecraft.contains_key(&id) {
            return Err(StoreError::DuplicateSpacecraft(id));
        }
        self.spacecraft.insert(id, spacecraft);
        Ok(())
    }

    pub fn insert_target(&mut self, target: Target) -> Result<(), StoreError> {
        let id = target.id().clone();
        if self.targets.contains_key(&id) {
            return Err(StoreError::DuplicateTarget(id));
        }
        self.targets.insert(id, target);
        Ok(())
    }

    pub fn spacecraft(&self, id: &SpacecraftId) -> Result<&Spacecraft, StoreError> {
        self.spacecraft
            .get(id)
            .ok_or_else(|| StoreError::UnknownSpacecraft(id.clone()))
    }

    pub fn spacecraft_mut(&mut self, id: &SpacecraftId) -> Result<&mut Spacecraft, StoreError> {
        self.spacecraft
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownSpacecraft(id.clone()))
    }

    pub fn target(&self, id: &TargetId) -> Result<&Target, StoreError> {
        self.targets
            .get(id)
            .ok_or_else(|| StoreError::UnknownTarget(id.clone()))
    }

    pub fn target_mut(&mut self, id: &TargetId) -> Result<&mut Target, StoreError> {
        self.targets
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownTarget(id.clone()))
    }

    pub fn all_spacecraft(&self) -> impl Iterator<Item = &Spacecraft> {
        self.spacecraft.values()
    }

    pub fn spacecraft_ids(&self) -> Vec<SpacecraftId> {
        self.spacecraft.keys().cloned().collect()
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn carrier_of(&self, object: &ObjectId) -> Result<Option<SpacecraftId>, StoreError> {
        Ok(match object {
            ObjectId::Spacecraft(id) => self.spacecraft(id)?.carrier.clone(),
            ObjectId::Target(id) => self.target(id)?.carrier.clone(),
        })
    }

    fn set_carrier(
        &mut self,
        object: &ObjectId,
        carrier: Option<SpacecraftId>,
        at_launch: bool,
    ) -> Result<(), StoreError> {
        match object {
            ObjectId::Spacecraft(id) => {
                let spacecraft = self.spacecraft_mut(id)?;
                if at_launch {
                    spacecraft.initial_carrier = carrier.clone();
                }
                spacecraft.carrier = carrier;
            }
            ObjectId::Target(id) => {
                let target = self.target_mut(id)?;
                if at_launch {
                    target.initial_carrier = carrier.clone();
                }
                target.carrier = carrier;
            }
        }
        Ok(())
    }

    /// Objects directly carried by `id`, spacecraft first, in id order.
    pub fn carried_by(&self, id: &SpacecraftId) -> Vec<ObjectId> {
        let spacecraft = self
            .spacecraft
            .values()
            .filter(|sc| sc.carrier.as_ref() == Some(id))
            .map(|sc| ObjectId::Spacecraft(sc.id().clone()));
        let targets = self
            .targets
            .values()
            .filter(|target| target.carrier.as_ref() == Some(id))
            .map(|target| ObjectId::Target(target.id().clone()));
        spacecraft.chain(targets).collect()
    }

    /// Carriers of `id`, nearest first.
    fn carrier_chain(&self, id: &SpacecraftId) -> Result<Vec<SpacecraftId>, StoreError> {
        let mut chain = Vec::new();
        let mut current = self.spacecraft(id)?.carrier.clone();
        while let Some(carrier) = current {
            if chain.contains(&carrier) || chain.len() > self.spacecraft.len() {
                break;
            }
            current = self.spacecraft(&carrier)?.carrier.clone();
            chain.push(carrier);
        }
        Ok(chain)
    }

    /// Outermost vehicle of the stack `id` belongs to.
    pub fn root_carrier(&self, id: &SpacecraftId) -> Result<SpacecraftId, StoreError> {
        Ok(self
            .carrier_chain(id)?
            .pop()
            .unwrap_or_else(|| id.clone()))
    }

    fn check_link(&self, object: &ObjectId, carrier: &SpacecraftId) -> Result<(), StoreError> {
        self.spacecraft(carrier)?;
        if let ObjectId::Spacecraft(id) = object {
            if id == carrier || self.carrier_chain(carrier)?.contains(id) {
                return Err(StoreError::CaptureCycle {
                    object: object.clone(),
                    carrier: carrier.clone(),
                });
            }
        }
        Ok(())
    }

    /// Load an object on a carrier at launch; reset restores this link.
    pub fn assign_payload(
        &mut self,
        object: ObjectId,
        carrier: &SpacecraftId,
    ) -> Result<(), StoreError> {
        self.check_link(&object, carrier)?;
        self.set_carrier(&object, Some(carrier.clone()), true)
    }

    /// Link `object` to `by`; the object adopts the carrier's orbit.
    pub fn capture(&mut self, object: &ObjectId, by: &SpacecraftId) -> Result<(), StoreError> {
        self.check_link(object, by)?;
        match self.carrier_of(object)? {
            Some(current) if &current != by => {
                return Err(StoreError::AlreadyCarried {
                    object: object.clone(),
                    carrier: current,
                });
            }
            _ => {}
        }
        self.set_carrier(object, Some(by.clone()), false)?;
        if let Some(orbit) = self.spacecraft(by)?.orbit().copied() {
            self.set_object_orbit(object, orbit)?;
        }
        debug!("{by} captured {object}");
        Ok(())
    }

    /// Unlink `object` from `from`; the object keeps its current orbit.
    pub fn release(&mut self, object: &ObjectId, from: &SpacecraftId) -> Result<(), StoreError> {
        if self.carrier_of(object)?.as_ref() != Some(from) {
            return Err(StoreError::NotCarried {
                object: object.clone(),
                spacecraft: from.clone(),
            });
        }
        self.set_carrier(object, None, false)?;
        debug!("{from} released {object}");
        Ok(())
    }

    /// Current mass of `id` including everything it carries.
    pub fn current_mass_kg(&self, id: &SpacecraftId) -> Result<f64, StoreError> {
        let own = self.spacecraft(id)?.own_mass_kg();
        let mut carried = 0.0;
        for object in self.carried_by(id) {
            carried += self.object_mass_kg(&object)?;
        }
        Ok(own + carried)
    }

    pub fn object_mass_kg(&self, object: &ObjectId) -> Result<f64, StoreError> {
        match object {
            ObjectId::Spacecraft(id) => self.current_mass_kg(id),
            ObjectId::Target(id) => Ok(self.target(id)?.mass_kg),
        }
    }

    pub fn object_orbit(&self, object: &ObjectId) -> Result<Option<OrbitState>, StoreError> {
        Ok(match object {
            ObjectId::Spacecraft(id) => self.spacecraft(id)?.orbit().copied(),
            ObjectId::Target(id) => Some(*self.target(id)?.orbit()),
        })
    }

    /// Move `id` and, transitively, everything it carries.
    pub fn set_orbit(&mut self, id: &SpacecraftId, orbit: OrbitState) -> Result<(), StoreError> {
        self.spacecraft_mut(id)?.set_orbit(orbit);
        for object in self.carried_by(id) {
            self.set_object_orbit(&object, orbit)?;
        }
        Ok(())
    }

    pub fn set_object_orbit(
        &mut self,
        object: &ObjectId,
        orbit: OrbitState,
    ) -> Result<(), StoreError> {
        match object {
            ObjectId::Spacecraft(id) => self.set_orbit(id, orbit),
            ObjectId::Target(id) => {
                self.target_mut(id)?.set_orbit(orbit);
                Ok(())
            }
        }
    }

    pub fn module(&self, module: &ModuleRef) -> Result<&Module, StoreError> {
        self.spacecraft(&module.spacecraft)?
            .module(&module.module)
            .ok_or_else(|| StoreError::UnknownModule(module.clone()))
    }

    pub fn module_mut(&mut self, module: &ModuleRef) -> Result<&mut Module, StoreError> {
        self.spacecraft_mut(&module.spacecraft)?
            .module_mut(&module.module)
            .ok_or_else(|| StoreError::UnknownModule(module.clone()))
    }

    pub fn propulsion(&self, module: &ModuleRef) -> Result<&PropulsionModule, StoreError> {
        let found = self.module(module)?;
        found.as_propulsion().ok_or_else(|| StoreError::WrongModuleKind {
            module: module.clone(),
            expected: ModuleKind::Propulsion,
            found: found.kind(),
        })
    }

    pub fn propulsion_mut(
        &mut self,
        module: &ModuleRef,
    ) -> Result<&mut PropulsionModule, StoreError> {
        let found = self.module_mut(module)?;
        let kind = found.kind();
        found
            .as_propulsion_mut()
            .ok_or_else(|| StoreError::WrongModuleKind {
                module: module.clone(),
                expected: ModuleKind::Propulsion,
                found: kind,
            })
    }

    /// Every propulsion module in the store, in spacecraft then module id order.
    pub fn propulsion_refs(&self) -> Vec<ModuleRef> {
        self.spacecraft
            .values()
            .flat_map(|sc| {
                sc.propulsion_modules()
                    .map(move |module| ModuleRef::new(sc.id().clone(), module.id().clone()))
            })
            .collect()
    }

    /// Refueling-capable tanks among the spacecraft carried (transitively) by `recipient`.
    pub fn refueling_tanks(&self, recipient: &SpacecraftId) -> Vec<ModuleRef> {
        let mut tanks = Vec::new();
        let mut pending = vec![recipient.clone()];
        let mut visited = Vec::new();
        while let Some(carrier) = pending.pop() {
            if visited.contains(&carrier) {
                continue;
            }
            for object in self.carried_by(&carrier) {
                if let ObjectId::Spacecraft(id) = object {
                    if let Some(spacecraft) = self.spacecraft.get(&id) {
                        tanks.extend(
                            spacecraft
                                .propulsion_modules()
                                .filter(|module| module.is_refueler)
                                .map(|module| ModuleRef::new(id.clone(), module.id().clone())),
                        );
                    }
                    pending.push(id);
                }
            }
            visited.push(carrier);
        }
        tanks
    }

    /// Back to launch configuration: no orbits, launch carry links, full tanks.
    pub fn reset(&mut self) {
        for spacecraft in self.spacecraft.values_mut() {
            spacecraft.reset();
        }
        for target in self.targets.values_mut() {
            target.reset();
        }
    }
}
