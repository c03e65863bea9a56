//! Transfer façade crate: the orbit transfer calculator and the mission phases built on it.

pub mod calculator;
pub mod mission;

pub use facade::*;
pub use fleet_impulsive as impulsive;
pub use fleet_lowthrust as lowthrust;
pub use fleet_orbits as orbits;
pub use fleet_propulsion as propulsion;

mod facade;
