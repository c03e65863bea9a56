//! Configuration models and loaders for fleet sizing scenarios.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings of the convergence loops.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// Band around the propellant floor within which a module is settled (kg).
    pub margin_kg: f64,
    /// Wet-mass change below which the inner design loop stops (kg).
    pub design_tolerance_kg: f64,
    /// Outer search iterations per pass; converging takes at least 2.
    pub max_iterations: usize,
    pub max_design_iterations: usize,
    /// First correction of a module with no search history (kg).
    pub bootstrap_step_kg: f64,
    /// Run the group homogenization and propellant-only pass after the first convergence.
    pub homogenize: bool,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            margin_kg: 0.5,
            design_tolerance_kg: 0.5,
            max_iterations: 200,
            max_design_iterations: 50,
            bootstrap_step_kg: 1.0,
            homogenize: true,
        }
    }
}

/// Physical and operational model constants.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub raan_cutoff_deg: f64,
    pub atmosphere_limit_km: f64,
    pub duty_cycle: f64,
    pub coast_cycle: f64,
    pub low_thrust_eccentricity_limit: f64,
    pub delta_v_contingency: f64,
    pub approach_semi_major_axis_km: f64,
    pub approach_inclination_deg: f64,
    pub approach_raan_deg: f64,
    pub maintenance_contingency: f64,
    pub ground_pass_cost: f64,
    pub program_margin_days: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            raan_cutoff_deg: 0.5,
            atmosphere_limit_km: 80.0,
            duty_cycle: 0.9,
            coast_cycle: 0.75,
            low_thrust_eccentricity_limit: 0.1,
            delta_v_contingency: 0.1,
            approach_semi_major_axis_km: 50.0,
            approach_inclination_deg: 5.0,
            approach_raan_deg: 5.0,
            maintenance_contingency: 0.1,
            ground_pass_cost: 100.0,
            program_margin_days: 365.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub convergence: ConvergenceConfig,
    pub models: ModelConfig,
}

/// Orbit given by its apsides; a missing apogee means circular.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OrbitConfig {
    #[serde(default = "default_body")]
    pub body: String,
    pub perigee_altitude_km: f64,
    #[serde(default)]
    pub apogee_altitude_km: Option<f64>,
    pub inclination_deg: f64,
    #[serde(default)]
    pub raan_deg: f64,
    #[serde(default)]
    pub arg_periapsis_deg: f64,
}

fn default_body() -> String {
    "earth".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TechnologyConfig {
    MonoPropellant,
    BiPropellant,
    Solid,
    Water,
    Electrical,
}

/// Default role a propulsion module plays on its spacecraft.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoleConfig {
    #[default]
    Main,
    Rcs,
    /// Neither main nor rcs, e.g. a refueling tank.
    Auxiliary,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PropulsionConfig {
    pub id: String,
    pub technology: TechnologyConfig,
    pub thrust_n: f64,
    #[serde(default = "default_min_thrust")]
    pub min_thrust_n: f64,
    pub isp_s: f64,
    #[serde(default = "default_initial_propellant")]
    pub initial_propellant_kg: f64,
    #[serde(default = "default_tank_capacity")]
    pub max_tank_capacity_kg: f64,
    #[serde(default = "default_propellant_contingency")]
    pub propellant_contingency: f64,
    #[serde(default = "default_module_contingency")]
    pub mass_contingency: f64,
    #[serde(default)]
    pub refueler: bool,
    #[serde(default)]
    pub dry_mass_override_kg: Option<f64>,
    #[serde(default)]
    pub role: RoleConfig,
}

fn default_min_thrust() -> f64 {
    1.0
}

fn default_initial_propellant() -> f64 {
    100.0
}

fn default_tank_capacity() -> f64 {
    5_000.0
}

fn default_propellant_contingency() -> f64 {
    0.15
}

fn default_module_contingency() -> f64 {
    0.25
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CaptureConfig {
    pub id: String,
    #[serde(default = "default_module_contingency")]
    pub mass_contingency: f64,
    #[serde(default)]
    pub dry_mass_override_kg: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpacecraftKindConfig {
    Servicer,
    UpperStage,
    KickStage,
}

/// How the node of each target orbit is reached.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhasingConfig {
    Free,
    Absolute,
    #[default]
    Relative,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SpacecraftConfig {
    pub id: String,
    pub kind: SpacecraftKindConfig,
    /// Homogenization group; defaults to the spacecraft id.
    #[serde(default)]
    pub group: Option<String>,
    pub structure_mass_kg: f64,
    #[serde(default = "default_spacecraft_contingency")]
    pub mass_contingency: f64,
    #[serde(default)]
    pub propulsion: Vec<PropulsionConfig>,
    #[serde(default)]
    pub capture: Vec<CaptureConfig>,
    /// Required for spacecraft launched on their own; carried ones ride their carrier.
    #[serde(default)]
    pub insertion_orbit: Option<OrbitConfig>,
    #[serde(default)]
    pub insertion_propellant_kg: f64,
    #[serde(default)]
    pub disposal_orbit: Option<OrbitConfig>,
    /// Targets serviced or deployed, in visiting order.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Spacecraft carrying this one at launch.
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub launcher: Option<String>,
    #[serde(default = "default_approach_propellant")]
    pub approach_propellant_kg: f64,
    #[serde(default)]
    pub phasing: PhasingConfig,
    /// Targets after which the spacecraft is refueled from a carried tanker.
    #[serde(default)]
    pub refuel_after: Vec<String>,
}

fn default_spacecraft_contingency() -> f64 {
    0.2
}

fn default_approach_propellant() -> f64 {
    5.0
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TargetConfig {
    pub id: String,
    pub mass_kg: f64,
    #[serde(default)]
    pub volume_m3: f64,
    pub orbit: OrbitConfig,
    #[serde(default)]
    pub disposal_orbit: Option<OrbitConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LauncherConfig {
    pub name: String,
    pub payload_capacity_kg: f64,
    pub fairing_volume_m3: f64,
    #[serde(default = "default_dispenser_mass_fraction")]
    pub dispenser_mass_fraction: f64,
    #[serde(default = "default_dispenser_volume_fraction")]
    pub dispenser_volume_fraction: f64,
}

fn default_dispenser_mass_fraction() -> f64 {
    0.1164
}

fn default_dispenser_volume_fraction() -> f64 {
    0.1
}

/// A complete sizing problem: targets, spacecraft, launchers and settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub name: String,
    /// RFC 3339 start of the plan.
    pub starting_epoch: String,
    #[serde(default = "default_architecture")]
    pub architecture: String,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
    pub spacecraft: Vec<SpacecraftConfig>,
    #[serde(default)]
    pub launchers: Vec<LauncherConfig>,
}

fn default_architecture() -> String {
    "single_picker".to_string()
}

impl ScenarioConfig {
    /// Check cross references between the sections of the document.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let targets = unique_ids(self.targets.iter().map(|t| t.id.as_str()), "target")?;
        let spacecraft = unique_ids(self.spacecraft.iter().map(|s| s.id.as_str()), "spacecraft")?;
        let launchers = unique_ids(self.launchers.iter().map(|l| l.name.as_str()), "launcher")?;
        for sc in &self.spacecraft {
            if let Some(target) = sc.targets.iter().find(|t| !targets.contains(t.as_str())) {
                return Err(ConfigError::Invalid(format!(
                    "spacecraft '{}' references unknown target '{target}'",
                    sc.id
                )));
            }
            if let Some(target) = sc.refuel_after.iter().find(|t| !sc.targets.contains(t)) {
                return Err(ConfigError::Invalid(format!(
                    "spacecraft '{}' refuels after '{target}', which it does not visit",
                    sc.id
                )));
            }
            if sc.carrier.is_none() && sc.insertion_orbit.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "spacecraft '{}' is launched on its own but has no insertion orbit",
                    sc.id
                )));
            }
            if let Some(carrier) = &sc.carrier {
                if carrier == &sc.id || !spacecraft.contains(carrier.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "spacecraft '{}' has invalid carrier '{carrier}'",
                        sc.id
                    )));
                }
            }
            if let Some(launcher) = &sc.launcher {
                if !launchers.contains(launcher.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "spacecraft '{}' references unknown launcher '{launcher}'",
                        sc.id
                    )));
                }
            }
        }
        Ok(())
    }
}

fn unique_ids<'a, I>(ids: I, what: &str) -> Result<BTreeSet<&'a str>, ConfigError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigError::Invalid(format!("duplicate {what} id '{id}'")));
        }
    }
    Ok(seen)
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid scenario: {0}")]
    Invalid(String),
}

/// Load and validate a scenario from a YAML or TOML file.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<ScenarioConfig, ConfigError> {
    let scenario: ScenarioConfig = load_record(path)?;
    scenario.validate()?;
    Ok(scenario)
}

/// Load every scenario of a directory, sorted by file name.
pub fn load_scenarios<P: AsRef<Path>>(dir: P) -> Result<Vec<ScenarioConfig>, ConfigError> {
    let scenarios: Vec<ScenarioConfig> = read_dir_records(dir.as_ref())?;
    for scenario in &scenarios {
        scenario.validate()?;
    }
    Ok(scenarios)
}

/// Load simulation settings alone, e.g. to override a scenario's.
pub fn load_simulation<P: AsRef<Path>>(path: P) -> Result<SimulationConfig, ConfigError> {
    load_record(path)
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false)
}

fn load_record<T, P>(path: P) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_toml(path) || is_yaml(path))
        .collect();
    entries.sort();
    entries.into_iter().map(load_record).collect()
}
