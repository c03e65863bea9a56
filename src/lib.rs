//! Fleet sizing: designs every spacecraft of a fleet against its mission plan.
//!
//! The orbit transfer calculator and the phase/plan state machine live in the
//! `fleet_transfer` crate; this library adds the module sizing models, the
//! convergence engine and the scenario builders shared by the front-ends.

pub mod fleet;
pub mod launch;
pub mod report;
pub mod scenario;
pub mod sizing;

pub use fleet_transfer as transfer;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
