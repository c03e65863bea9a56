//! Re-exported APIs for consumers of the transfer crate.

pub use crate::calculator::{
    Capability, MainTransfer, Phasing, PhasingBranch, PhasingRequest, RaanTargeting,
    TransferError, TransferSettings, altitude_maintenance, main_manoeuvres, raan_phasing,
};
pub use crate::mission::{
    Approach, ApproachTolerance, AssignmentError, Capture, Insertion, MissionError,
    MissionSettings, Operations, OrbitChange, OrbitGoal, OrbitMaintenance, Phase, PhaseAction,
    PhaseKind, PhaseRecord, PhaseSnapshot, Plan, ReferenceDemand, Refueling, Release,
};

pub mod stack {
    //! Helpers for assembling a vehicle store before a plan is built.

    use fleet_propulsion::{
        CaptureModule, CaptureSpec, ModuleRef, ObjectId, PropulsionModule, PropulsionSpec,
        Spacecraft, SpacecraftId, StoreError, VehicleStore,
    };
    use thiserror::Error;

    /// Errors surfaced while assembling a stack.
    #[derive(Debug, Error)]
    pub enum StackError {
        #[error("invalid module: {0}")]
        Module(#[from] fleet_propulsion::PropulsionError),
        #[error(transparent)]
        Store(#[from] StoreError),
    }

    /// Mount a propulsion module on a spacecraft and return its reference.
    pub fn mount_propulsion(
        spacecraft: &mut Spacecraft,
        id: &str,
        spec: PropulsionSpec,
    ) -> Result<ModuleRef, StackError> {
        spacecraft.add_module(PropulsionModule::new(id, spec)?)?;
        Ok(ModuleRef::new(spacecraft.id().clone(), id))
    }

    /// Mount a capture module on a spacecraft and return its reference.
    pub fn mount_capture(
        spacecraft: &mut Spacecraft,
        id: &str,
        spec: CaptureSpec,
    ) -> Result<ModuleRef, StackError> {
        spacecraft.add_module(CaptureModule::new(id, spec))?;
        Ok(ModuleRef::new(spacecraft.id().clone(), id))
    }

    /// Load every object of `payloads` on `carrier` for launch.
    pub fn load_payloads<I>(
        store: &mut VehicleStore,
        carrier: &SpacecraftId,
        payloads: I,
    ) -> Result<(), StackError>
    where
        I: IntoIterator<Item = ObjectId>,
    {
        for payload in payloads {
            store.assign_payload(payload, carrier)?;
        }
        Ok(())
    }
}
