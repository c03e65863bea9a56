//! Delta-v records produced by the transfer calculator.

use std::fmt;

use fleet_core::constants::G0;

/// Burn time of a constant-thrust manoeuvre evaluated on the mean vehicle mass.
pub fn burn_duration_s(delta_v_m_s: f64, initial_mass_kg: f64, thrust_n: f64, isp_s: f64) -> f64 {
    let final_mass = initial_mass_kg / (delta_v_m_s / (G0 * isp_s)).exp();
    let mean_mass = 0.5 * (initial_mass_kg + final_mass);
    mean_mass / thrust_n * delta_v_m_s
}

/// A single delta-v with the time spent thrusting.
#[derive(Debug, Clone, PartialEq)]
pub struct Manoeuvre {
    pub label: String,
    pub delta_v_m_s: f64,
    pub burn_duration_s: f64,
}

impl Manoeuvre {
    pub fn new(label: impl Into<String>, delta_v_m_s: f64) -> Self {
        Self {
            label: label.into(),
            delta_v_m_s,
            burn_duration_s: 0.0,
        }
    }

    /// Manoeuvre with its burn time derived from vehicle mass, thrust and isp.
    pub fn powered(
        label: impl Into<String>,
        delta_v_m_s: f64,
        initial_mass_kg: f64,
        thrust_n: f64,
        isp_s: f64,
    ) -> Self {
        let mut manoeuvre = Self::new(label, delta_v_m_s);
        manoeuvre.compute_burn_duration(initial_mass_kg, thrust_n, isp_s);
        manoeuvre
    }

    pub fn with_burn_duration(mut self, burn_duration_s: f64) -> Self {
        self.burn_duration_s = burn_duration_s;
        self
    }

    /// Recompute the burn duration for a new mass/thrust/isp triple.
    pub fn compute_burn_duration(&mut self, initial_mass_kg: f64, thrust_n: f64, isp_s: f64) {
        self.burn_duration_s = burn_duration_s(self.delta_v_m_s, initial_mass_kg, thrust_n, isp_s);
    }
}

impl fmt::Display for Manoeuvre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.1} m/s over {:.1} h",
            self.label,
            self.delta_v_m_s,
            self.burn_duration_s / 3_600.0
        )
    }
}
