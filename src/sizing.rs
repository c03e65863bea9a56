//! Parametric module sizing, one capability per spacecraft class.
//!
//! The fleet asks the capability bound to each spacecraft for the dry mass,
//! reference power and reference thrust of every module, given the demand the
//! plan placed on that module during the last replay.

use std::fmt;

use fleet_core::constants::{G0, SECONDS_PER_DAY};
use fleet_transfer::ReferenceDemand;
use fleet_transfer::propulsion::{
    CaptureModule, Module, PropulsionModule, PropulsionTechnology, Spacecraft, SpacecraftKind,
    Throughput,
};

/// Time over which a chemical orbit-change burn is assumed to last (s).
const CHEMICAL_REFERENCE_BURN_S: f64 = 20.0 * 60.0;
/// Time over which an electric orbit change is assumed to last (s).
const ELECTRIC_REFERENCE_BURN_S: f64 = 6.0 * 7.0 * SECONDS_PER_DAY;
const ELECTRIC_DUTY_CYCLE: f64 = 0.25;
const RENDEZVOUS_THRUSTERS: f64 = 8.0;
/// Throughput a single rendezvous thruster is qualified for (kg).
const RENDEZVOUS_THRUSTER_THROUGHPUT_KG: f64 = 24.0;
const REFUELER_CONDITIONING_KG: f64 = 10.0;
const DEFAULT_CAPTURE_DRY_MASS_KG: f64 = 43.1;
pub const DEFAULT_DISPENSER_MASS_FRACTION: f64 = 0.1164;

const GAS_CONSTANT: f64 = 8.314_462_618;
const WATER_MOLAR_MASS_KG: f64 = 0.018;
const OXYGEN_PAIR_MOLAR_MASS_KG: f64 = 0.036;
const GAS_TANK_TEMPERATURE_K: f64 = 291.0;
const GAS_TANK_PRESSURE_PA: f64 = 24.0e5;

/// Outcome of sizing one module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleDesign {
    pub dry_mass_kg: f64,
    pub reference_power_w: f64,
    pub reference_thrust_n: f64,
}

/// Inputs available to a sizing model.
#[derive(Debug, Clone, Copy)]
pub struct DesignContext<'a> {
    pub spacecraft: &'a Spacecraft,
    /// Demand the plan placed on the module being sized.
    pub demand: ReferenceDemand,
    /// Mass of everything the spacecraft carries at launch (kg).
    pub launch_payload_mass_kg: f64,
}

impl DesignContext<'_> {
    fn wet_mass_kg(&self) -> f64 {
        self.spacecraft.wet_mass_kg()
    }

    fn reference_power_w(&self) -> f64 {
        self.spacecraft
            .modules()
            .map(Module::reference_power_w)
            .sum()
    }

    /// Inertia about the main axis from a box-and-wings shape (kg·m²).
    fn reference_inertia(&self) -> f64 {
        let body = 100.0 * (self.spacecraft.wet_mass_kg() / 200.0).powf(5.0 / 3.0);
        let arrays = 50.0 * self.reference_power_w() / 600.0;
        body + arrays
    }
}

/// Sizing and costing of the modules of one spacecraft class.
pub trait ModuleSizing: fmt::Debug {
    fn design_propulsion(&self, ctx: &DesignContext<'_>, module: &PropulsionModule)
    -> ModuleDesign;

    fn design_capture(&self, ctx: &DesignContext<'_>, module: &CaptureModule) -> ModuleDesign;

    fn design_module(&self, ctx: &DesignContext<'_>, module: &Module) -> ModuleDesign {
        match module {
            Module::Propulsion(propulsion) => self.design_propulsion(ctx, propulsion),
            Module::Capture(capture) => self.design_capture(ctx, capture),
        }
    }

    fn recurring_cost(&self, module: &Module) -> f64 {
        match module {
            Module::Propulsion(propulsion) => {
                let propellant = propulsion.initial_propellant_kg();
                match propulsion.technology {
                    PropulsionTechnology::MonoPropellant => 1.0e6 + 200.0 * propellant,
                    PropulsionTechnology::Electrical => 2.5e6 + 1500.0 * propellant,
                    PropulsionTechnology::Water => {
                        1.5e6 + 6000.0 * propulsion.reference_power_w()
                    }
                    PropulsionTechnology::BiPropellant | PropulsionTechnology::Solid => 0.0,
                }
            }
            Module::Capture(_) => 250_000.0,
        }
    }

    fn non_recurring_cost(&self, module: &Module) -> f64 {
        match module {
            Module::Propulsion(_) => 1.7e6,
            Module::Capture(_) => 3.825e6,
        }
    }
}

/// Capability matching the class of `kind`.
pub fn sizing_for(kind: SpacecraftKind) -> Box<dyn ModuleSizing> {
    match kind {
        SpacecraftKind::Servicer => Box::new(ServicerSizing),
        SpacecraftKind::UpperStage | SpacecraftKind::KickStage => Box::new(StageSizing::default()),
    }
}

/// Servicers: thruster sets and tanks sized from the plan demand.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServicerSizing;

impl ModuleSizing for ServicerSizing {
    fn design_propulsion(
        &self,
        ctx: &DesignContext<'_>,
        module: &PropulsionModule,
    ) -> ModuleDesign {
        let thrusters = ThrusterPlan::new(ctx, module);
        let reference_power_w = thrusters.reference_power_w(module.technology);
        let dry_mass_kg = match module.dry_mass_override_kg {
            Some(dry) => dry,
            None => servicer_dry_mass_kg(ctx, module, &thrusters) + refueler_mass_kg(module),
        };
        let reference_thrust_n = if thrusters.main_thrust_n > 0.0 {
            thrusters.main_thrust_n
        } else {
            module.reference_thrust_n()
        };
        ModuleDesign {
            dry_mass_kg,
            reference_power_w,
            reference_thrust_n,
        }
    }

    fn design_capture(&self, _ctx: &DesignContext<'_>, module: &CaptureModule) -> ModuleDesign {
        ModuleDesign {
            dry_mass_kg: module
                .dry_mass_override_kg
                .unwrap_or(DEFAULT_CAPTURE_DRY_MASS_KG),
            reference_power_w: module.reference_power_w(),
            reference_thrust_n: 0.0,
        }
    }
}

/// Upper and kick stages: engine plus tank, and a dispenser scaled on the launch payload.
#[derive(Debug, Clone, Copy)]
pub struct StageSizing {
    pub dispenser_mass_fraction: f64,
}

impl Default for StageSizing {
    fn default() -> Self {
        Self {
            dispenser_mass_fraction: DEFAULT_DISPENSER_MASS_FRACTION,
        }
    }
}

impl ModuleSizing for StageSizing {
    fn design_propulsion(
        &self,
        _ctx: &DesignContext<'_>,
        module: &PropulsionModule,
    ) -> ModuleDesign {
        let thrust = module.max_thrust_n;
        let dry_mass_kg = match module.dry_mass_override_kg {
            Some(dry) => dry,
            None => {
                let engine = 9.81e-4 * thrust + 5.37e-4 * thrust * 90f64.sqrt() + 25.0;
                let tank = 0.1 * module.initial_propellant_kg();
                engine + tank + refueler_mass_kg(module)
            }
        };
        ModuleDesign {
            dry_mass_kg,
            reference_power_w: thruster_power_w(module.technology, thrust, 1.0),
            reference_thrust_n: thrust,
        }
    }

    fn design_capture(&self, ctx: &DesignContext<'_>, module: &CaptureModule) -> ModuleDesign {
        ModuleDesign {
            dry_mass_kg: module
                .dry_mass_override_kg
                .unwrap_or(self.dispenser_mass_fraction * ctx.launch_payload_mass_kg),
            reference_power_w: 0.0,
            reference_thrust_n: 0.0,
        }
    }
}

/// Thrusters needed by a servicer propulsion module.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ThrusterPlan {
    main_thrust_n: f64,
    main_count: f64,
    main_sets: f64,
    rendezvous_thrust_n: f64,
    rendezvous_count: f64,
    rendezvous_sets: f64,
    tanks: f64,
    /// Largest delta-v of a single main burn once split into thrust-limited manoeuvres (m/s).
    main_burn_delta_v_m_s: f64,
}

impl ThrusterPlan {
    fn new(ctx: &DesignContext<'_>, module: &PropulsionModule) -> Self {
        let delta_v = ctx.demand.max_delta_v_m_s;
        let wet = ctx.wet_mass_kg();
        let (main_thrust_n, main_burn_delta_v_m_s) = if delta_v > 0.0 {
            if module.technology.is_low_thrust() {
                (
                    wet * delta_v / ELECTRIC_REFERENCE_BURN_S / ELECTRIC_DUTY_CYCLE,
                    delta_v,
                )
            } else {
                let thrust = wet * delta_v / CHEMICAL_REFERENCE_BURN_S;
                let manoeuvres = (thrust / module.max_thrust_n).ceil().max(1.0);
                (thrust / manoeuvres, delta_v / manoeuvres)
            }
        } else {
            (0.0, 0.0)
        };
        let rendezvous_thrust_n = if ctx.demand.rendezvous_propellant_kg > 0.0 {
            ctx.reference_inertia() / 167.0
        } else {
            0.0
        };

        let previous: Throughput = module.previous_throughput();
        let main_limit = match module.technology {
            PropulsionTechnology::MonoPropellant | PropulsionTechnology::Water => 150.0,
            _ => 1000.0,
        };
        let (main_count, main_sets) = if main_thrust_n > 0.0 {
            let count = (main_thrust_n / module.max_thrust_n).ceil().max(1.0);
            (count, duplicates(previous.main_kg, main_limit * count))
        } else {
            (0.0, 0.0)
        };
        let (rendezvous_count, rendezvous_sets) = if rendezvous_thrust_n > 0.0 {
            (
                RENDEZVOUS_THRUSTERS,
                duplicates(
                    previous.rendezvous_kg,
                    RENDEZVOUS_THRUSTER_THROUGHPUT_KG * RENDEZVOUS_THRUSTERS,
                ),
            )
        } else {
            (0.0, 0.0)
        };
        let tanks = (module.initial_propellant_kg() / module.max_tank_capacity_kg)
            .ceil()
            .max(1.0);

        Self {
            main_thrust_n,
            main_count,
            main_sets,
            rendezvous_thrust_n,
            rendezvous_count,
            rendezvous_sets,
            tanks,
            main_burn_delta_v_m_s,
        }
    }

    fn reference_power_w(&self, technology: PropulsionTechnology) -> f64 {
        let rendezvous = if self.rendezvous_thrust_n > 0.0 {
            thruster_power_w(technology, self.rendezvous_thrust_n, self.rendezvous_count)
        } else {
            0.0
        };
        let main = if self.main_thrust_n > 0.0 {
            thruster_power_w(technology, self.main_thrust_n, self.main_count)
        } else {
            0.0
        };
        rendezvous.max(main)
    }
}

/// Sets of thrusters needed so that none exceeds its qualified throughput.
fn duplicates(throughput_kg: f64, qualified_kg: f64) -> f64 {
    (throughput_kg / qualified_kg).ceil().max(1.0)
}

fn refueler_mass_kg(module: &PropulsionModule) -> f64 {
    if module.is_refueler {
        REFUELER_CONDITIONING_KG
    } else {
        0.0
    }
}

/// Electrical power drawn by `count` thrusters delivering `thrust_n` together.
fn thruster_power_w(technology: PropulsionTechnology, thrust_n: f64, count: f64) -> f64 {
    let count = count.max(1.0);
    let valves = count * (7.76 + 0.106 * thrust_n / count) / 4.0;
    match technology {
        PropulsionTechnology::MonoPropellant => {
            let heaters =
                count * (3.76 + 0.868 * thrust_n - 0.00193 * 0.868 * thrust_n.powi(2) / count);
            valves + heaters
        }
        PropulsionTechnology::Water | PropulsionTechnology::BiPropellant => valves,
        PropulsionTechnology::Solid => 1.0,
        PropulsionTechnology::Electrical => (thrust_n + 3.8612) / 0.0633,
    }
}

/// Mass of one propellant tank sized for `propellant_kg`.
fn liquid_tank_mass_kg(propellant_kg: f64) -> f64 {
    1.4015 + 0.1269 * propellant_kg - 0.00007 * propellant_kg.powi(2)
}

fn servicer_dry_mass_kg(
    ctx: &DesignContext<'_>,
    module: &PropulsionModule,
    thrusters: &ThrusterPlan,
) -> f64 {
    let propellant = module.initial_propellant_kg();
    let per_tank = propellant / thrusters.tanks;
    let rendezvous_thrusters = thrusters.rendezvous_count * thrusters.rendezvous_sets;
    let main_thrusters = thrusters.main_count * thrusters.main_sets;
    match module.technology {
        PropulsionTechnology::MonoPropellant => {
            2.0 + 3.2 / 8.0 * rendezvous_thrusters
                + 1.1 * main_thrusters
                + thrusters.tanks * liquid_tank_mass_kg(per_tank)
        }
        PropulsionTechnology::Electrical => {
            2.0 + 5.7 * main_thrusters + thrusters.tanks * (5.0163 + 0.07161 * per_tank)
        }
        PropulsionTechnology::Water => {
            let thrusters_kg = 3.5 + main_thrusters + 3.2 / 8.0 * rendezvous_thrusters;
            let gas_tanks_kg = electrolysis_tanks_mass_kg(
                ctx.wet_mass_kg(),
                thrusters.main_burn_delta_v_m_s,
                module.isp_s,
            );
            2.0 + thrusters_kg + thrusters.tanks * liquid_tank_mass_kg(per_tank) + gas_tanks_kg
        }
        PropulsionTechnology::BiPropellant => 51.0 + (0.096 * 1.278 + 0.08) * propellant,
        PropulsionTechnology::Solid => 0.1 * propellant,
    }
}

/// Hydrogen and oxygen buffer tanks of a water thruster for its longest burn.
fn electrolysis_tanks_mass_kg(wet_mass_kg: f64, burn_delta_v_m_s: f64, isp_s: f64) -> f64 {
    let split = wet_mass_kg * (1.0 - (-burn_delta_v_m_s / (isp_s * G0)).exp());
    if split <= 0.0 {
        return 0.0;
    }
    let gas_volume_m3 = |molar_mass: f64| {
        split / molar_mass * GAS_CONSTANT * GAS_TANK_TEMPERATURE_K / GAS_TANK_PRESSURE_PA
    };
    let tank_kg = |volume_m3: f64| 5.0163 + 0.12836 * volume_m3;
    tank_kg(gas_volume_m3(WATER_MOLAR_MASS_KG)) + tank_kg(gas_volume_m3(OXYGEN_PAIR_MOLAR_MASS_KG))
}
