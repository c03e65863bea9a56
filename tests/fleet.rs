use std::path::PathBuf;

use fleet_sizing::fleet::{
    ConvergenceSettings, Correction, DesignMode, FleetError, Sample, SearchState,
};
use fleet_sizing::scenario::{Scenario, load_scenario};
use fleet_transfer::propulsion::{SpacecraftId, TargetId};

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("scenarios")
        .join(name)
}

fn debris_removal() -> Scenario {
    let _ = pretty_env_logger::try_init();
    load_scenario(scenario_path("debris_removal.yaml")).expect("bundled scenario builds")
}

/// Search one module whose mismatch is `mismatch(initial)`, the way a sweep
/// does; returns the mismatch history and whether it settled within `cap`.
fn search(mismatch: impl Fn(f64) -> f64, start_kg: f64, cap: usize) -> (Vec<f64>, bool) {
    let mut state = SearchState::new(start_kg);
    let mut history = Vec::new();
    for _ in 0..cap {
        let sample = Sample {
            initial_kg: state.guess_kg,
            mismatch_kg: mismatch(state.guess_kg),
        };
        history.push(sample.mismatch_kg);
        if state.correct(sample, 0.5, 1.0) == Correction::Settled {
            return (history, true);
        }
    }
    (history, false)
}

#[test]
fn first_step_without_history_is_the_bootstrap_step() {
    let mut state = SearchState::new(100.0);
    let sample = Sample {
        initial_kg: 100.0,
        mismatch_kg: 40.0,
    };
    let step = state.next_guess(sample, 1.0);
    assert!(!step.secant);
    assert_eq!(step.guess_kg, 99.0);

    state.advance(sample, step.guess_kg);
    let next = state.next_guess(
        Sample {
            initial_kg: 99.0,
            mismatch_kg: 39.2,
        },
        1.0,
    );
    assert!(next.secant);
    assert!((next.guess_kg - 50.0).abs() < 1e-9, "linear mismatch is solved in one secant step");
}

#[test]
fn monotone_mismatch_shrinks_every_secant_step() {
    let (linear, settled) = search(|x| 0.8 * x - 40.0, 100.0, 20);
    assert!(settled);
    assert_eq!(linear.len(), 3);

    let (convex, settled) = search(|x| 0.002 * x * x + 0.5 * x - 40.0, 100.0, 20);
    assert!(settled, "history: {convex:?}");
    assert!(convex.len() > 3);
    for pair in convex[1..].windows(2) {
        assert!(
            pair[1].abs() < pair[0].abs(),
            "mismatch grew from {} to {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn mismatch_that_never_reaches_the_margin_runs_to_the_cap() {
    let (history, settled) = search(|x| 20.0 + 10.0 * (x / 10.0).cos(), 100.0, 25);
    assert!(!settled);
    assert_eq!(history.len(), 25);
}

#[test]
fn unreachable_margin_stops_the_fleet_at_the_cap() {
    let Scenario {
        mut fleet,
        mut plan,
        ..
    } = debris_removal();
    fleet.settings = ConvergenceSettings {
        margin_kg: 0.0,
        max_iterations: 6,
        homogenize: false,
        ..fleet.settings
    };
    let report = fleet.design(&mut plan).expect("capped design still returns");
    assert!(!report.converged);
    assert_eq!(report.iterations, 6);
    assert!(!report.unsettled.is_empty());
    assert_eq!(report.passes, [false]);
}

#[test]
fn debris_removal_converges_on_the_propellant_floor() {
    let Scenario {
        mut fleet,
        mut plan,
        ..
    } = debris_removal();
    let report = fleet.design(&mut plan).expect("design runs");
    assert!(report.converged, "unsettled modules: {:?}", report.unsettled);
    assert!(report.iterations >= 2);
    assert_eq!(report.passes.len(), 2, "redesign pass then propellant-only pass");
    assert!(report.all_passes_converged());

    let margin = fleet.settings.margin_kg;
    for module in fleet.store().propulsion_refs() {
        let propulsion = fleet.store().propulsion(&module).expect("module");
        let mismatch = propulsion.lowest_propellant_kg() - propulsion.propellant_floor_kg();
        assert!(
            mismatch.abs() <= margin,
            "{module}: lowest level {mismatch:.3} kg away from its floor"
        );
    }
}

#[test]
fn homogenized_group_members_are_identical() {
    let Scenario {
        mut fleet,
        mut plan,
        ..
    } = debris_removal();
    fleet.design(&mut plan).expect("design runs");

    let groups = fleet.groups();
    let pickers = groups.get("pickers").expect("pickers group");
    assert_eq!(pickers.len(), 2);
    let dry = |id: &SpacecraftId| {
        fleet
            .store()
            .spacecraft(id)
            .expect("known")
            .dry_mass_kg(true)
    };
    assert!((dry(&pickers[0]) - dry(&pickers[1])).abs() < 1e-9);
}

#[test]
fn heavier_debris_needs_more_propellant() {
    let Scenario {
        mut fleet,
        mut plan,
        ..
    } = debris_removal();
    fleet.settings.homogenize = false;
    fleet.design(&mut plan).expect("design runs");

    let initial = |id: &str| {
        fleet
            .store()
            .spacecraft(&SpacecraftId::new(id))
            .expect("known")
            .initial_propellant_kg()
    };
    // picker-2 hauls the 500 kg object down, picker-1 the 300 kg one.
    assert!(initial("picker-2") > initial("picker-1"));
    let debris = fleet
        .store()
        .target(&TargetId::new("debris-b"))
        .expect("known");
    assert!(debris.orbit().periapsis_altitude_km() < 300.0, "released on its disposal orbit");
}

#[test]
fn iteration_cap_is_reported_not_raised() {
    let Scenario {
        mut fleet,
        mut plan,
        ..
    } = debris_removal();
    fleet.settings = ConvergenceSettings {
        max_iterations: 1,
        homogenize: false,
        ..fleet.settings
    };
    let report = fleet.design(&mut plan).expect("capped design still returns");
    assert!(!report.converged);
    assert_eq!(report.iterations, 1);
    assert_eq!(report.passes, [false]);
}

#[test]
fn single_iteration_cap_never_converges() {
    let Scenario {
        mut fleet,
        mut plan,
        ..
    } = debris_removal();
    fleet.settings.max_iterations = 1;
    let report = fleet.design(&mut plan).expect("capped design still returns");
    assert_eq!(report.iterations, 2);
    assert_eq!(report.passes, [false, false]);
    assert!(!report.all_passes_converged());
}

#[test]
fn homogenizing_restarts_the_search_history() {
    let Scenario {
        mut fleet,
        mut plan,
        ..
    } = debris_removal();
    let first = fleet
        .converge(&mut plan, DesignMode::Redesign)
        .expect("redesign pass runs");
    assert_eq!(first.passes, [first.converged]);
    let modules = fleet.store().propulsion_refs();
    assert!(
        modules
            .iter()
            .any(|module| fleet.search_state(module).is_some_and(|s| s.previous.is_some())),
        "redesign pass leaves samples behind"
    );

    fleet.homogenize_groups(&plan).expect("groups homogenized");
    for module in &modules {
        if let Some(state) = fleet.search_state(module) {
            assert!(state.previous.is_none(), "{module} kept a stale sample");
        }
    }
}

#[test]
fn cost_summary_adds_up() {
    let Scenario {
        mut fleet,
        mut plan,
        ..
    } = debris_removal();
    fleet.design(&mut plan).expect("design runs");
    let costs = fleet.cost_summary(&plan);

    let parts = costs.hardware
        + costs.development
        + costs.assembly_integration_test
        + costs.mission_operations_center
        + costs.ground_segment
        + costs.launch
        + costs.operations;
    assert!((costs.total - parts).abs() < 1e-6 * costs.total);
    assert!(costs.hardware > 0.0);
    assert!(costs.operations > 0.0);
    assert!((costs.assembly_integration_test - 0.139 * costs.hardware).abs() < 1e-6);

    let masses = fleet.mass_summary();
    assert_eq!(masses.spacecraft.len(), 2);
    assert!((masses.wet_mass_kg - masses.dry_mass_kg - masses.propellant_kg).abs() < 1e-9);
}

#[test]
fn unknown_spacecraft_cannot_be_designed() {
    let Scenario {
        mut fleet, plan, ..
    } = debris_removal();
    let err = fleet
        .design_spacecraft(&plan, &SpacecraftId::new("ghost"))
        .expect_err("not in the fleet");
    assert!(matches!(err, FleetError::Store(_)));
}
