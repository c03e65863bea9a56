//! String identifiers keying the vehicle store.

use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a spacecraft in a [`VehicleStore`](crate::VehicleStore).
    SpacecraftId
);
string_id!(
    /// Identifier of a passive payload (debris object, satellite to deploy).
    TargetId
);
string_id!(
    /// Identifier of a module, unique within its spacecraft.
    ModuleId
);

/// Fully qualified module address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleRef {
    pub spacecraft: SpacecraftId,
    pub module: ModuleId,
}

impl ModuleRef {
    pub fn new(spacecraft: impl Into<SpacecraftId>, module: impl Into<ModuleId>) -> Self {
        Self {
            spacecraft: spacecraft.into(),
            module: module.into(),
        }
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.spacecraft, self.module)
    }
}

/// Anything that can be carried: another spacecraft or a passive target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectId {
    Spacecraft(SpacecraftId),
    Target(TargetId),
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Spacecraft(id) => write!(f, "spacecraft {id}"),
            ObjectId::Target(id) => write!(f, "target {id}"),
        }
    }
}

impl From<SpacecraftId> for ObjectId {
    fn from(id: SpacecraftId) -> Self {
        ObjectId::Spacecraft(id)
    }
}

impl From<TargetId> for ObjectId {
    fn from(id: TargetId) -> Self {
        ObjectId::Target(id)
    }
}
