//! Orbit transfer calculator: turns an orbit-change intent into manoeuvres and elapsed time.
//!
//! Model selection follows the propulsion technology: chemical modules use the
//! impulsive two-burn model, electric modules the Edelbaum estimate. RAAN
//! phasing and altitude maintenance are layered on top by [`phasing`] and
//! [`maintenance`].

pub mod maintenance;
pub mod phasing;

pub use maintenance::altitude_maintenance;
pub use phasing::{Phasing, PhasingBranch, PhasingRequest, RaanTargeting, raan_phasing};

use fleet_core::constants::G0;
use fleet_impulsive::{ImpulsiveError, SecondBurn, two_burn_transfer};
use fleet_lowthrust::{DEFAULT_ECCENTRICITY_LIMIT, LowThrustError, ThrustDerate, edelbaum};
use fleet_orbits::{OrbitError, OrbitState, ReentryConditions};
use fleet_propulsion::{Manoeuvre, PropulsionModule, PropulsionTechnology, burn_duration_s};
use log::warn;
use thiserror::Error;

/// Numeric model settings shared by all transfer computations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSettings {
    /// Perigee altitude below which an object is left to decay (km).
    pub atmosphere_limit_km: f64,
    pub derate: ThrustDerate,
    pub low_thrust_eccentricity_limit: f64,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            atmosphere_limit_km: 80.0,
            derate: ThrustDerate::default(),
            low_thrust_eccentricity_limit: DEFAULT_ECCENTRICITY_LIMIT,
        }
    }
}

/// Errors raised by the transfer calculator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransferError {
    #[error("impulsive model: {0}")]
    Impulsive(#[from] ImpulsiveError),
    #[error("low-thrust model: {0}")]
    LowThrust(#[from] LowThrustError),
    #[error("orbit error: {0}")]
    Orbit(#[from] OrbitError),
    #[error(
        "infeasible phasing: {required_deg:.3}° of RAAN to close but precession drifts {rate_deg_day:+.5}°/day"
    )]
    PhasingInfeasible { required_deg: f64, rate_deg_day: f64 },
    #[error("infeasible phasing: {required_deg:.3}° of RAAN to close with zero precession rate")]
    ZeroRelativePrecession { required_deg: f64 },
}

/// What the vehicle can do when the manoeuvre starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capability {
    pub technology: PropulsionTechnology,
    /// Vehicle mass including carried objects (kg).
    pub mass_kg: f64,
    pub thrust_n: f64,
    pub isp_s: f64,
}

impl Capability {
    pub fn of(module: &PropulsionModule, mass_kg: f64) -> Self {
        Self {
            technology: module.technology,
            mass_kg,
            thrust_n: module.reference_thrust_n(),
            isp_s: module.isp_s,
        }
    }

    /// Burn time for `delta_v_m_s`, derated for continuous-thrust technologies.
    pub fn elapsed_s(
        &self,
        delta_v_m_s: f64,
        settings: &TransferSettings,
    ) -> Result<f64, TransferError> {
        let burn = burn_duration_s(delta_v_m_s, self.mass_kg, self.thrust_n, self.isp_s);
        if self.technology.is_low_thrust() {
            Ok(settings.derate.elapsed_s(burn)?)
        } else {
            Ok(burn)
        }
    }
}

/// Manoeuvres of an orbit change before any RAAN phasing.
#[derive(Debug, Clone, PartialEq)]
pub struct MainTransfer {
    pub manoeuvres: Vec<Manoeuvre>,
    pub transfer_duration_s: f64,
    /// Interface crossing when the arrival burn was skipped.
    pub reentry: Option<ReentryConditions>,
}

impl MainTransfer {
    pub fn delta_v_m_s(&self) -> f64 {
        self.manoeuvres.iter().map(|m| m.delta_v_m_s).sum()
    }
}

/// Main manoeuvres to go from `initial` to `target`.
pub fn main_manoeuvres(
    initial: &OrbitState,
    target: &OrbitState,
    capability: &Capability,
    settings: &TransferSettings,
) -> Result<MainTransfer, TransferError> {
    if capability.technology.is_low_thrust() {
        low_thrust_transfer(initial, target, capability, settings)
    } else {
        high_thrust_transfer(initial, target, capability, settings)
    }
}

fn high_thrust_transfer(
    initial: &OrbitState,
    target: &OrbitState,
    capability: &Capability,
    settings: &TransferSettings,
) -> Result<MainTransfer, TransferError> {
    let decays = target.periapsis_altitude_km() < settings.atmosphere_limit_km;
    let second = if decays {
        SecondBurn::Skip
    } else {
        SecondBurn::Perform
    };
    let transfer = two_burn_transfer(initial, target, second)?;

    let first = Manoeuvre::powered(
        "transfer first burn",
        transfer.first_burn_m_s,
        capability.mass_kg,
        capability.thrust_n,
        capability.isp_s,
    );
    let mut manoeuvres = vec![first];
    if let Some(dv) = transfer.second_burn_m_s {
        let mass_after_first = capability.mass_kg
            / (transfer.first_burn_m_s / (G0 * capability.isp_s)).exp();
        manoeuvres.push(Manoeuvre::powered(
            "transfer second burn",
            dv,
            mass_after_first,
            capability.thrust_n,
            capability.isp_s,
        ));
    }

    let reentry = if decays {
        match transfer
            .transfer_orbit
            .reentry_conditions(settings.atmosphere_limit_km)
        {
            Ok(conditions) => Some(conditions),
            Err(err) => {
                warn!(
                    "transfer orbit never crosses the {:.0} km interface, no reentry recorded: {err}",
                    settings.atmosphere_limit_km
                );
                None
            }
        }
    } else {
        None
    };

    Ok(MainTransfer {
        manoeuvres,
        transfer_duration_s: transfer.time_of_flight_s,
        reentry,
    })
}

fn low_thrust_transfer(
    initial: &OrbitState,
    target: &OrbitState,
    capability: &Capability,
    settings: &TransferSettings,
) -> Result<MainTransfer, TransferError> {
    let estimate = edelbaum(initial, target, settings.low_thrust_eccentricity_limit)?;
    let manoeuvre = Manoeuvre::powered(
        "low-thrust transfer",
        estimate.delta_v_m_s,
        capability.mass_kg,
        capability.thrust_n,
        capability.isp_s,
    );
    let transfer_duration_s = settings.derate.elapsed_s(manoeuvre.burn_duration_s)?;
    Ok(MainTransfer {
        manoeuvres: vec![manoeuvre],
        transfer_duration_s,
        reentry: None,
    })
}
