//! Spacecraft modules: propulsion (propellant bookkeeping) and capture.

use std::fmt;

use fleet_core::constants::G0;

use crate::ids::ModuleId;
use crate::manoeuvre::Manoeuvre;
use crate::PropulsionError;

/// Consumption below this amount past an empty tank is treated as rounding.
const PROPELLANT_EPSILON_KG: f64 = 1e-9;

/// Propulsion technology of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropulsionTechnology {
    MonoPropellant,
    BiPropellant,
    Solid,
    Water,
    Electrical,
}

impl PropulsionTechnology {
    /// Continuous low-thrust technologies use the Edelbaum model.
    pub fn is_low_thrust(self) -> bool {
        matches!(self, PropulsionTechnology::Electrical)
    }

    pub fn name(self) -> &'static str {
        match self {
            PropulsionTechnology::MonoPropellant => "mono-propellant",
            PropulsionTechnology::BiPropellant => "bi-propellant",
            PropulsionTechnology::Solid => "solid",
            PropulsionTechnology::Water => "water",
            PropulsionTechnology::Electrical => "electrical",
        }
    }
}

impl fmt::Display for PropulsionTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Thruster role a consumption is booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrusterRole {
    /// Orbit changes, phasing and maintenance.
    Main,
    /// Rendezvous, approach and insertion trims.
    Rendezvous,
    /// Propellant handed over to another module.
    Refueling,
}

/// Propellant mass pushed through each role during one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Throughput {
    pub main_kg: f64,
    pub rendezvous_kg: f64,
    pub refueling_kg: f64,
}

impl Throughput {
    fn book(&mut self, role: ThrusterRole, mass_kg: f64) {
        match role {
            ThrusterRole::Main => self.main_kg += mass_kg,
            ThrusterRole::Rendezvous => self.rendezvous_kg += mass_kg,
            ThrusterRole::Refueling => self.refueling_kg += mass_kg,
        }
    }

    pub fn total_kg(&self) -> f64 {
        self.main_kg + self.rendezvous_kg + self.refueling_kg
    }
}

/// Construction parameters of a [`PropulsionModule`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropulsionSpec {
    pub technology: PropulsionTechnology,
    pub max_thrust_n: f64,
    pub min_thrust_n: f64,
    pub isp_s: f64,
    pub initial_propellant_kg: f64,
    pub max_tank_capacity_kg: f64,
    /// Fraction of the initial load that must remain at the lowest point of the plan.
    pub propellant_contingency: f64,
    pub mass_contingency: f64,
    pub is_refueler: bool,
    /// Fixed dry mass that bypasses parametric sizing.
    pub dry_mass_override_kg: Option<f64>,
}

impl Default for PropulsionSpec {
    fn default() -> Self {
        Self {
            technology: PropulsionTechnology::MonoPropellant,
            max_thrust_n: 22.0,
            min_thrust_n: 1.0,
            isp_s: 220.0,
            initial_propellant_kg: 100.0,
            max_tank_capacity_kg: 5_000.0,
            propellant_contingency: 0.15,
            mass_contingency: 0.25,
            is_refueler: false,
            dry_mass_override_kg: None,
        }
    }
}

/// Propulsion module: a tank plus thrusters, owning its propellant counters.
#[derive(Debug, Clone, PartialEq)]
pub struct PropulsionModule {
    id: ModuleId,
    pub technology: PropulsionTechnology,
    pub max_thrust_n: f64,
    pub min_thrust_n: f64,
    pub isp_s: f64,
    pub max_tank_capacity_kg: f64,
    pub propellant_contingency: f64,
    pub mass_contingency: f64,
    pub is_refueler: bool,
    pub dry_mass_override_kg: Option<f64>,
    dry_mass_kg: f64,
    reference_power_w: f64,
    reference_thrust_n: f64,
    initial_propellant_kg: f64,
    current_propellant_kg: f64,
    lowest_propellant_kg: f64,
    top_off_kg: Option<f64>,
    throughput: Throughput,
    previous_throughput: Throughput,
}

impl PropulsionModule {
    pub fn new(id: impl Into<ModuleId>, spec: PropulsionSpec) -> Result<Self, PropulsionError> {
        let id = id.into();
        if !(spec.isp_s > 0.0) {
            return Err(PropulsionError::InvalidParameter {
                module: id,
                parameter: "isp_s",
                value: spec.isp_s,
            });
        }
        if !(spec.max_thrust_n > 0.0) {
            return Err(PropulsionError::InvalidParameter {
                module: id,
                parameter: "max_thrust_n",
                value: spec.max_thrust_n,
            });
        }
        if !(0.0..1.0).contains(&spec.propellant_contingency) {
            return Err(PropulsionError::InvalidParameter {
                module: id,
                parameter: "propellant_contingency",
                value: spec.propellant_contingency,
            });
        }
        let initial = spec.initial_propellant_kg.max(0.0);
        Ok(Self {
            id,
            technology: spec.technology,
            max_thrust_n: spec.max_thrust_n,
            min_thrust_n: spec.min_thrust_n,
            isp_s: spec.isp_s,
            max_tank_capacity_kg: spec.max_tank_capacity_kg,
            propellant_contingency: spec.propellant_contingency,
            mass_contingency: spec.mass_contingency,
            is_refueler: spec.is_refueler,
            dry_mass_override_kg: spec.dry_mass_override_kg,
            dry_mass_kg: spec.dry_mass_override_kg.unwrap_or(0.0),
            reference_power_w: 0.0,
            reference_thrust_n: spec.max_thrust_n,
            initial_propellant_kg: initial,
            current_propellant_kg: initial,
            lowest_propellant_kg: initial,
            top_off_kg: None,
            throughput: Throughput::default(),
            previous_throughput: Throughput::default(),
        })
    }

    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    pub fn initial_propellant_kg(&self) -> f64 {
        self.initial_propellant_kg
    }

    pub fn current_propellant_kg(&self) -> f64 {
        self.current_propellant_kg
    }

    /// Lowest propellant level reached since the last reset.
    pub fn lowest_propellant_kg(&self) -> f64 {
        self.lowest_propellant_kg
    }

    /// Level that must remain at the lowest point of the plan.
    pub fn propellant_floor_kg(&self) -> f64 {
        self.initial_propellant_kg * self.propellant_contingency
    }

    /// Amount delivered by a "last refuel" top-off, if one has been estimated.
    pub fn top_off_kg(&self) -> Option<f64> {
        self.top_off_kg
    }

    pub fn throughput(&self) -> Throughput {
        self.throughput
    }

    /// Throughput of the replay before the last reset.
    pub fn previous_throughput(&self) -> Throughput {
        self.previous_throughput
    }

    pub fn reference_thrust_n(&self) -> f64 {
        self.reference_thrust_n
    }

    pub fn reference_power_w(&self) -> f64 {
        self.reference_power_w
    }

    pub fn dry_mass_kg(&self, with_contingency: bool) -> f64 {
        if with_contingency {
            self.dry_mass_kg * (1.0 + self.mass_contingency)
        } else {
            self.dry_mass_kg
        }
    }

    /// Dry mass with contingency plus the initial load.
    pub fn wet_mass_kg(&self) -> f64 {
        self.dry_mass_kg(true) + self.initial_propellant_kg
    }

    pub fn set_initial_propellant_kg(&mut self, mass_kg: f64) {
        self.initial_propellant_kg = mass_kg.max(0.0);
    }

    pub fn set_top_off_kg(&mut self, mass_kg: Option<f64>) {
        self.top_off_kg = mass_kg.map(|m| m.max(0.0));
    }

    /// Store the outcome of a sizing pass.
    pub fn set_design(&mut self, dry_mass_kg: f64, reference_power_w: f64, reference_thrust_n: f64) {
        self.dry_mass_kg = dry_mass_kg;
        self.reference_power_w = reference_power_w;
        self.reference_thrust_n = reference_thrust_n;
    }

    /// Propellant burnt by a vehicle of `vehicle_mass_kg` to gain `delta_v_m_s`.
    pub fn propellant_for_delta_v_kg(&self, delta_v_m_s: f64, vehicle_mass_kg: f64) -> f64 {
        let ratio = (delta_v_m_s / (G0 * self.isp_s)).exp();
        vehicle_mass_kg * (ratio - 1.0) / ratio
    }

    /// Burn for `delta_v_m_s` on a vehicle of `vehicle_mass_kg`; returns the propellant used.
    pub fn apply_delta_v(
        &mut self,
        delta_v_m_s: f64,
        vehicle_mass_kg: f64,
        role: ThrusterRole,
    ) -> Result<f64, PropulsionError> {
        if !(delta_v_m_s >= 0.0) {
            return Err(PropulsionError::InvalidParameter {
                module: self.id.clone(),
                parameter: "delta_v_m_s",
                value: delta_v_m_s,
            });
        }
        let propellant = self.propellant_for_delta_v_kg(delta_v_m_s, vehicle_mass_kg);
        self.consume_propellant(propellant, role)?;
        Ok(propellant)
    }

    /// Burn a manoeuvre scaled by `1 + contingency`.
    pub fn apply_manoeuvre(
        &mut self,
        manoeuvre: &Manoeuvre,
        contingency: f64,
        vehicle_mass_kg: f64,
        role: ThrusterRole,
    ) -> Result<f64, PropulsionError> {
        self.apply_delta_v(manoeuvre.delta_v_m_s * (1.0 + contingency), vehicle_mass_kg, role)
    }

    /// Remove propellant from the tank, failing rather than going negative.
    pub fn consume_propellant(
        &mut self,
        mass_kg: f64,
        role: ThrusterRole,
    ) -> Result<(), PropulsionError> {
        if !(mass_kg >= 0.0) || !mass_kg.is_finite() {
            return Err(PropulsionError::InvalidParameter {
                module: self.id.clone(),
                parameter: "propellant_mass_kg",
                value: mass_kg,
            });
        }
        if mass_kg > self.current_propellant_kg + PROPELLANT_EPSILON_KG {
            return Err(PropulsionError::InsufficientPropellant {
                module: self.id.clone(),
                required_kg: mass_kg,
                available_kg: self.current_propellant_kg,
            });
        }
        self.current_propellant_kg = (self.current_propellant_kg - mass_kg).max(0.0);
        self.lowest_propellant_kg = self.lowest_propellant_kg.min(self.current_propellant_kg);
        self.throughput.book(role, mass_kg);
        Ok(())
    }

    /// Receive propellant from a tanker.
    pub fn add_propellant(&mut self, mass_kg: f64) -> Result<(), PropulsionError> {
        if !(mass_kg >= 0.0) || !mass_kg.is_finite() {
            return Err(PropulsionError::InvalidParameter {
                module: self.id.clone(),
                parameter: "propellant_mass_kg",
                value: mass_kg,
            });
        }
        self.current_propellant_kg += mass_kg;
        Ok(())
    }

    /// Back to the pre-simulation state: full initial load, throughput rolled over.
    pub fn reset(&mut self) {
        self.previous_throughput = self.throughput;
        self.throughput = Throughput::default();
        self.current_propellant_kg = self.initial_propellant_kg;
        self.lowest_propellant_kg = self.initial_propellant_kg;
    }
}

/// Construction parameters of a [`CaptureModule`].
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSpec {
    pub mass_contingency: f64,
    pub dry_mass_override_kg: Option<f64>,
}

impl Default for CaptureSpec {
    fn default() -> Self {
        Self {
            mass_contingency: 0.25,
            dry_mass_override_kg: None,
        }
    }
}

/// Capture mechanism or dispenser; links carried objects through the store.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureModule {
    id: ModuleId,
    pub mass_contingency: f64,
    pub dry_mass_override_kg: Option<f64>,
    dry_mass_kg: f64,
    reference_power_w: f64,
}

impl CaptureModule {
    pub fn new(id: impl Into<ModuleId>, spec: CaptureSpec) -> Self {
        Self {
            id: id.into(),
            mass_contingency: spec.mass_contingency,
            dry_mass_override_kg: spec.dry_mass_override_kg,
            dry_mass_kg: spec.dry_mass_override_kg.unwrap_or(0.0),
            reference_power_w: 0.0,
        }
    }

    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    pub fn dry_mass_kg(&self, with_contingency: bool) -> f64 {
        if with_contingency {
            self.dry_mass_kg * (1.0 + self.mass_contingency)
        } else {
            self.dry_mass_kg
        }
    }

    pub fn reference_power_w(&self) -> f64 {
        self.reference_power_w
    }

    pub fn set_design(&mut self, dry_mass_kg: f64, reference_power_w: f64) {
        self.dry_mass_kg = dry_mass_kg;
        self.reference_power_w = reference_power_w;
    }
}

/// Module category, used to type-check phase assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Propulsion,
    Capture,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKind::Propulsion => f.write_str("propulsion"),
            ModuleKind::Capture => f.write_str("capture"),
        }
    }
}

/// A module mounted on a spacecraft.
#[derive(Debug, Clone, PartialEq)]
pub enum Module {
    Propulsion(PropulsionModule),
    Capture(CaptureModule),
}

impl Module {
    pub fn id(&self) -> &ModuleId {
        match self {
            Module::Propulsion(module) => module.id(),
            Module::Capture(module) => module.id(),
        }
    }

    pub fn kind(&self) -> ModuleKind {
        match self {
            Module::Propulsion(_) => ModuleKind::Propulsion,
            Module::Capture(_) => ModuleKind::Capture,
        }
    }

    pub fn dry_mass_kg(&self, with_contingency: bool) -> f64 {
        match self {
            Module::Propulsion(module) => module.dry_mass_kg(with_contingency),
            Module::Capture(module) => module.dry_mass_kg(with_contingency),
        }
    }

    pub fn reference_power_w(&self) -> f64 {
        match self {
            Module::Propulsion(module) => module.reference_power_w(),
            Module::Capture(module) => module.reference_power_w(),
        }
    }

    pub fn as_propulsion(&self) -> Option<&PropulsionModule> {
        match self {
            Module::Propulsion(module) => Some(module),
            Module::Capture(_) => None,
        }
    }

    pub fn as_propulsion_mut(&mut self) -> Option<&mut PropulsionModule> {
        match self {
            Module::Propulsion(module) => Some(module),
            Module::Capture(_) => None,
        }
    }

    pub fn as_capture(&self) -> Option<&CaptureModule> {
        match self {
            Module::Capture(module) => Some(module),
            Module::Propulsion(_) => None,
        }
    }

    pub fn as_capture_mut(&mut self) -> Option<&mut CaptureModule> {
        match self {
            Module::Capture(module) => Some(module),
            Module::Propulsion(_) => None,
        }
    }

    pub fn reset(&mut self) {
        if let Module::Propulsion(module) = self {
            module.reset();
        }
    }
}

impl From<PropulsionModule> for Module {
    fn from(module: PropulsionModule) -> Self {
        Module::Propulsion(module)
    }
}

impl From<CaptureModule> for Module {
    fn from(module: CaptureModule) -> Self {
        Module::Capture(module)
    }
}
