//! Per-module state of the propellant search.

use fleet_transfer::propulsion::ModuleRef;

/// One evaluated point of the search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub initial_kg: f64,
    /// Lowest propellant level minus the required floor (kg).
    pub mismatch_kg: f64,
}

/// Search bookkeeping for one propulsion module, owned by the fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    /// Initial propellant written into the module before the next replay (kg).
    pub guess_kg: f64,
    pub previous: Option<Sample>,
    /// Amount a "last refuel" tops the module up with (kg).
    pub top_off_kg: Option<f64>,
}

impl SearchState {
    pub fn new(guess_kg: f64) -> Self {
        Self {
            guess_kg,
            previous: None,
            top_off_kg: None,
        }
    }

    /// Next guess from the current `sample`: a fixed step against the mismatch
    /// when there is no usable history, a secant step otherwise.
    pub fn next_guess(&self, sample: Sample, bootstrap_step_kg: f64) -> Step {
        let bootstrap = || Step {
            guess_kg: (sample.initial_kg - sample.mismatch_kg.signum() * bootstrap_step_kg)
                .max(0.0),
            secant: false,
        };
        let Some(previous) = self.previous else {
            return bootstrap();
        };
        let run = sample.initial_kg - previous.initial_kg;
        if run == 0.0 {
            return bootstrap();
        }
        let slope = (sample.mismatch_kg - previous.mismatch_kg) / run;
        if slope == 0.0 || !slope.is_finite() {
            return bootstrap();
        }
        Step {
            guess_kg: (sample.initial_kg - sample.mismatch_kg / slope).max(0.0),
            secant: true,
        }
    }

    /// One search step: settle when `sample` is within `margin_kg` of the
    /// floor, otherwise move to the next guess.
    pub fn correct(
        &mut self,
        sample: Sample,
        margin_kg: f64,
        bootstrap_step_kg: f64,
    ) -> Correction {
        if sample.mismatch_kg.abs() <= margin_kg {
            return Correction::Settled;
        }
        let next = self.next_guess(sample, bootstrap_step_kg);
        let diverging = next.secant
            && self
                .previous
                .is_some_and(|previous| sample.mismatch_kg.abs() > previous.mismatch_kg.abs());
        self.advance(sample, next.guess_kg);
        Correction::Moved {
            guess_kg: next.guess_kg,
            diverging,
        }
    }

    /// Record `sample` and move to `guess_kg`.
    pub fn advance(&mut self, sample: Sample, guess_kg: f64) {
        self.previous = Some(sample);
        self.guess_kg = guess_kg;
    }

    /// Update the top-off amount from the propellant left after the last replay.
    pub fn update_top_off(&mut self, final_kg: f64, floor_kg: f64) {
        self.top_off_kg = Some(match self.top_off_kg {
            Some(top_off) => top_off - final_kg + floor_kg,
            None => self.guess_kg - final_kg,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub guess_kg: f64,
    pub secant: bool,
}

/// Result of [`SearchState::correct`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    Settled,
    Moved {
        guess_kg: f64,
        /// The last step grew the mismatch instead of shrinking it.
        diverging: bool,
    },
}

/// Outcome of a convergence run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvergenceReport {
    /// Outcome of the last pass.
    pub converged: bool,
    pub iterations: usize,
    /// Modules still outside the margin when the run stopped.
    pub unsettled: Vec<ModuleRef>,
    /// Whether each pass converged, in run order.
    pub passes: Vec<bool>,
}

impl ConvergenceReport {
    pub(crate) fn pass(converged: bool, iterations: usize, unsettled: Vec<ModuleRef>) -> Self {
        Self {
            converged,
            iterations,
            unsettled,
            passes: vec![converged],
        }
    }

    /// Chain a later pass after this one.
    pub fn then(self, later: ConvergenceReport) -> ConvergenceReport {
        let mut passes = self.passes;
        passes.extend(later.passes);
        ConvergenceReport {
            converged: later.converged,
            iterations: self.iterations + later.iterations,
            unsettled: later.unsettled,
            passes,
        }
    }

    /// Every pass converged, not only the last one.
    pub fn all_passes_converged(&self) -> bool {
        self.converged && self.passes.iter().all(|&converged| converged)
    }
}
