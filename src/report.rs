//! Snapshots of a designed fleet and its plan in export form.

use fleet_core::time::seconds_to_days;
use fleet_export::report::{Convergence, FleetReport, ModuleReport, SpacecraftReport, Totals};
use fleet_export::timeline::TimelineRow;
use fleet_transfer::Plan;

use crate::fleet::{ConvergenceReport, Fleet};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn fleet_report(
    fleet: &Fleet,
    plan: &Plan,
    convergence: &ConvergenceReport,
    program_margin_days: f64,
) -> FleetReport {
    let mut totals = Totals {
        operational_cost: plan.operational_cost(),
        ..Totals::default()
    };
    let mut spacecraft = Vec::new();
    for sc in fleet.store().all_spacecraft() {
        let sizing = fleet.sizing(sc.id());
        let modules: Vec<ModuleReport> = sc
            .modules()
            .map(|module| {
                let propulsion = module.as_propulsion();
                ModuleReport {
                    id: module.id().to_string(),
                    kind: module.kind().to_string(),
                    technology: propulsion.map(|p| p.technology.to_string()),
                    dry_mass_kg: module.dry_mass_kg(true),
                    reference_power_w: module.reference_power_w(),
                    initial_propellant_kg: propulsion.map_or(0.0, |p| p.initial_propellant_kg()),
                    lowest_propellant_kg: propulsion.map_or(0.0, |p| p.lowest_propellant_kg()),
                    recurring_cost: sizing.map_or(0.0, |s| s.recurring_cost(module)),
                    non_recurring_cost: sizing.map_or(0.0, |s| s.non_recurring_cost(module)),
                }
            })
            .collect();
        let entry = SpacecraftReport {
            id: sc.id().to_string(),
            kind: sc.kind.to_string(),
            group: sc.group.clone(),
            dry_mass_kg: sc.dry_mass_kg(true),
            propellant_kg: sc.initial_propellant_kg(),
            wet_mass_kg: sc.wet_mass_kg(),
            recurring_cost: modules.iter().map(|m| m.recurring_cost).sum(),
            non_recurring_cost: modules.iter().map(|m| m.non_recurring_cost).sum(),
            modules,
        };
        totals.dry_mass_kg += entry.dry_mass_kg;
        totals.propellant_kg += entry.propellant_kg;
        totals.wet_mass_kg += entry.wet_mass_kg;
        totals.recurring_cost += entry.recurring_cost;
        totals.non_recurring_cost += entry.non_recurring_cost;
        spacecraft.push(entry);
    }

    FleetReport {
        fleet: fleet.id.clone(),
        architecture: fleet.architecture.clone(),
        convergence: Convergence {
            converged: convergence.converged,
            iterations: convergence.iterations,
            unsettled_modules: convergence.unsettled.iter().map(ToString::to_string).collect(),
            passes: convergence.passes.clone(),
        },
        program_duration_days: seconds_to_days(plan.program_duration_s(program_margin_days)),
        spacecraft,
        totals,
    }
}

/// One row per phase that ran during the last replay.
pub fn timeline(plan: &Plan) -> Vec<TimelineRow> {
    plan.phases()
        .iter()
        .filter_map(|phase| {
            let snapshot = phase.snapshot()?;
            let record = phase.record();
            Some(TimelineRow {
                phase: phase.id().to_string(),
                kind: phase.kind().label().to_string(),
                spacecraft: snapshot.module.spacecraft.to_string(),
                module: snapshot.module.module.to_string(),
                start_utc: snapshot.start.format(TIMESTAMP_FORMAT).to_string(),
                end_utc: snapshot.end.format(TIMESTAMP_FORMAT).to_string(),
                duration_days: seconds_to_days(record.duration_s),
                delta_v_m_s: record.delta_v_m_s(),
                propellant_used_kg: record.propellant_used_kg,
                propellant_left_kg: snapshot.module_propellant_kg,
            })
        })
        .collect()
}

