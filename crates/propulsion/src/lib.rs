//! Propulsion modules, spacecraft and the vehicle store.

mod ids;
mod manoeuvre;
mod module;
mod store;
mod vehicle;

pub use ids::{ModuleId, ModuleRef, ObjectId, SpacecraftId, TargetId};
pub use manoeuvre::{Manoeuvre, burn_duration_s};
pub use module::{
    CaptureModule, CaptureSpec, Module, ModuleKind, PropulsionModule, PropulsionSpec,
    PropulsionTechnology, ThrusterRole, Throughput,
};
pub use store::VehicleStore;
pub use vehicle::{Spacecraft, SpacecraftKind, Target};

use thiserror::Error;

/// Errors raised by propellant bookkeeping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropulsionError {
    #[error("module {module} needs {required_kg:.3} kg of propellant but holds {available_kg:.3} kg")]
    InsufficientPropellant {
        module: ModuleId,
        required_kg: f64,
        available_kg: f64,
    },
    #[error("module {module}: invalid {parameter} = {value}")]
    InvalidParameter {
        module: ModuleId,
        parameter: &'static str,
        value: f64,
    },
}

impl PropulsionError {
    /// Missing propellant when the failure is a shortfall.
    pub fn shortfall_kg(&self) -> Option<f64> {
        match self {
            PropulsionError::InsufficientPropellant {
                required_kg,
                available_kg,
                ..
            } => Some(required_kg - available_kg),
            PropulsionError::InvalidParameter { .. } => None,
        }
    }
}

/// Errors raised by the vehicle store and spacecraft assembly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("unknown spacecraft '{0}'")]
    UnknownSpacecraft(SpacecraftId),
    #[error("unknown target '{0}'")]
    UnknownTarget(TargetId),
    #[error("unknown module '{0}'")]
    UnknownModule(ModuleRef),
    #[error("spacecraft '{0}' already exists")]
    DuplicateSpacecraft(SpacecraftId),
    #[error("target '{0}' already exists")]
    DuplicateTarget(TargetId),
    #[error("module '{0}' already exists")]
    DuplicateModule(ModuleRef),
    #[error("module '{module}' is a {found} module, expected {expected}")]
    WrongModuleKind {
        module: ModuleRef,
        expected: ModuleKind,
        found: ModuleKind,
    },
    #[error("{object} is already carried by '{carrier}'")]
    AlreadyCarried {
        object: ObjectId,
        carrier: SpacecraftId,
    },
    #[error("{object} is not carried by '{spacecraft}'")]
    NotCarried {
        object: ObjectId,
        spacecraft: SpacecraftId,
    },
    #[error("carrying {object} on '{carrier}' would create a loop")]
    CaptureCycle {
        object: ObjectId,
        carrier: SpacecraftId,
    },
    #[error("spacecraft '{0}' has no orbit yet (no insertion applied)")]
    NoOrbit(SpacecraftId),
}
