//! High-thrust impulsive manoeuvre models.

pub mod plane;
pub mod transfers;

pub use plane::{direct_raan_change_delta_v_m_s, inclination_change_delta_v_m_s};
pub use transfers::{SecondBurn, TwoBurnTransfer, two_burn_transfer};

use fleet_orbits::{Body, OrbitError};
use thiserror::Error;

/// Errors raised by the impulsive models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImpulsiveError {
    #[error("orbit error: {0}")]
    Orbit(#[from] OrbitError),
    #[error("transfer between bodies is not modelled ({from} -> {to})")]
    BodyMismatch { from: Body, to: Body },
}
