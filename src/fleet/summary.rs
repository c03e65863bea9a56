//! Mass and cost roll-ups of a designed fleet.

use std::collections::BTreeMap;
use std::fmt;

use fleet_transfer::Plan;
use fleet_transfer::propulsion::{SpacecraftId, VehicleStore};

use super::Fleet;

const SOFTWARE_LINES: f64 = 40_000.0;
const COST_PER_SOFTWARE_LINE: f64 = 550.0;
const MISSION_OPERATIONS_CENTER_COST: f64 = 4.7e6;
const GROUND_SEGMENT_FRACTION: f64 = 0.08;
const AIT_FRACTION: f64 = 0.139;
const LAUNCH_MASS_MARGIN: f64 = 1.15;
const LAUNCH_COST_PER_KG: f64 = 5_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SpacecraftMass {
    pub id: SpacecraftId,
    pub dry_mass_kg: f64,
    pub propellant_kg: f64,
    pub wet_mass_kg: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MassSummary {
    pub spacecraft: Vec<SpacecraftMass>,
    pub dry_mass_kg: f64,
    pub propellant_kg: f64,
    pub wet_mass_kg: f64,
}

impl MassSummary {
    pub fn of(store: &VehicleStore) -> Self {
        let mut summary = MassSummary::default();
        for spacecraft in store.all_spacecraft() {
            let entry = SpacecraftMass {
                id: spacecraft.id().clone(),
                dry_mass_kg: spacecraft.dry_mass_kg(true),
                propellant_kg: spacecraft.initial_propellant_kg(),
                wet_mass_kg: spacecraft.wet_mass_kg(),
            };
            summary.dry_mass_kg += entry.dry_mass_kg;
            summary.propellant_kg += entry.propellant_kg;
            summary.wet_mass_kg += entry.wet_mass_kg;
            summary.spacecraft.push(entry);
        }
        summary
    }
}

impl fmt::Display for MassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sc in &self.spacecraft {
            writeln!(
                f,
                "{:<16} dry {:>9.2} kg  propellant {:>9.2} kg  wet {:>9.2} kg",
                sc.id.as_str(),
                sc.dry_mass_kg,
                sc.propellant_kg,
                sc.wet_mass_kg
            )?;
        }
        write!(
            f,
            "{:<16} dry {:>9.2} kg  propellant {:>9.2} kg  wet {:>9.2} kg",
            "fleet", self.dry_mass_kg, self.propellant_kg, self.wet_mass_kg
        )
    }
}

/// Program cost breakdown (same currency as the sizing cost models).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostSummary {
    pub hardware: f64,
    pub development: f64,
    pub assembly_integration_test: f64,
    pub mission_operations_center: f64,
    pub ground_segment: f64,
    pub launch: f64,
    pub operations: f64,
    pub total: f64,
}

impl CostSummary {
    pub fn of(fleet: &Fleet, plan: &Plan) -> Self {
        let store = fleet.store();
        let mut hardware = 0.0;
        let mut launch_mass_kg = 0.0;
        let mut count = 0usize;
        // Groups share one development: the most expensive member pays it.
        let mut group_development: BTreeMap<&str, f64> = BTreeMap::new();
        for spacecraft in store.all_spacecraft() {
            count += 1;
            launch_mass_kg += spacecraft.wet_mass_kg();
            let Some(sizing) = fleet.sizing(spacecraft.id()) else {
                continue;
            };
            hardware += spacecraft
                .modules()
                .map(|module| sizing.recurring_cost(module))
                .sum::<f64>();
            let development: f64 = spacecraft
                .modules()
                .map(|module| sizing.non_recurring_cost(module))
                .sum();
            let slot = group_development
                .entry(spacecraft.group.as_str())
                .or_insert(0.0);
            *slot = slot.max(development);
        }

        let development =
            SOFTWARE_LINES * COST_PER_SOFTWARE_LINE + group_development.values().sum::<f64>();
        let ground_segment = if count > 0 {
            hardware / count as f64 * GROUND_SEGMENT_FRACTION
        } else {
            0.0
        };
        let assembly_integration_test = hardware * AIT_FRACTION;
        let launch = launch_mass_kg * LAUNCH_MASS_MARGIN * LAUNCH_COST_PER_KG;
        let operations = plan.operational_cost();
        let total = hardware
            + development
            + assembly_integration_test
            + MISSION_OPERATIONS_CENTER_COST
            + ground_segment
            + launch
            + operations;
        Self {
            hardware,
            development,
            assembly_integration_test,
            mission_operations_center: MISSION_OPERATIONS_CENTER_COST,
            ground_segment,
            launch,
            operations,
            total,
        }
    }
}

impl fmt::Display for CostSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("hardware", self.hardware),
            ("development", self.development),
            ("AIT", self.assembly_integration_test),
            ("MOC", self.mission_operations_center),
            ("ground segment", self.ground_segment),
            ("launch", self.launch),
            ("operations", self.operations),
        ];
        for (label, value) in rows {
            writeln!(f, "{label:<16} {:>14.0}", value)?;
        }
        write!(f, "{:<16} {:>14.0}", "total", self.total)
    }
}
