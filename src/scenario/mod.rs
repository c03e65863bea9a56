//! Builds a fleet and its plan from a scenario document.
//!
//! Servicers fly a debris-removal profile over their targets; upper and kick
//! stages fly a deployment profile, releasing their targets one by one.
//! Spacecraft with a carrier have no phases of their own: they ride their
//! carrier as kits or tankers.

use std::path::Path;

use chrono::{DateTime, Utc};
use fleet_config::{
    CaptureConfig, ConfigError, ModelConfig, OrbitConfig, PhasingConfig, PropulsionConfig,
    RoleConfig, ScenarioConfig, SpacecraftConfig, SpacecraftKindConfig, TargetConfig,
    TechnologyConfig,
};
use fleet_transfer::lowthrust::ThrustDerate;
use fleet_transfer::orbits::{Body, OrbitError, OrbitState};
use fleet_transfer::propulsion::{
    CaptureSpec, ModuleRef, ObjectId, PropulsionSpec, PropulsionTechnology, Spacecraft,
    SpacecraftId, SpacecraftKind, StoreError, Target, TargetId,
};
use fleet_transfer::stack::{StackError, mount_capture, mount_propulsion};
use fleet_transfer::{
    Approach, ApproachTolerance, AssignmentError, Capture, Insertion, MissionSettings,
    OrbitChange, OrbitGoal, Plan, RaanTargeting, Refueling, Release, TransferSettings,
};
use log::{debug, info};
use thiserror::Error;

use crate::fleet::{ConvergenceSettings, Fleet, FleetError};
use crate::launch::{Launcher, LauncherCapacity, PayloadReference};
use crate::sizing::{ModuleSizing, StageSizing, sizing_for};

/// Id of the dispenser mounted on stages that declare no capture module.
pub const DISPENSER_ID: &str = "dispenser";

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid starting epoch '{value}': {source}")]
    Epoch {
        value: String,
        source: chrono::ParseError,
    },
    #[error("invalid orbit: {0}")]
    Orbit(#[from] OrbitError),
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Fleet(#[from] FleetError),
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error("spacecraft '{spacecraft}' has no {role} module")]
    MissingModule {
        spacecraft: String,
        role: &'static str,
    },
    #[error("spacecraft '{0}' rides a carrier and cannot visit targets")]
    CarriedWithTargets(String),
    #[error("launcher '{launcher}' fits {allowed} payloads of '{spacecraft}', {requested} requested")]
    LauncherOverflow {
        launcher: String,
        spacecraft: String,
        allowed: usize,
        requested: usize,
    },
}

/// A fleet ready to be designed against its plan.
pub struct Scenario {
    pub name: String,
    pub fleet: Fleet,
    pub plan: Plan,
    pub program_margin_days: f64,
}

impl Scenario {
    pub fn program_duration_s(&self) -> f64 {
        self.plan.program_duration_s(self.program_margin_days)
    }
}

/// Load, validate and build a scenario file.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, ScenarioError> {
    let config = fleet_config::load_scenario(path)?;
    Scenario::try_from(&config)
}

impl TryFrom<&ScenarioConfig> for Scenario {
    type Error = ScenarioError;

    fn try_from(config: &ScenarioConfig) -> Result<Self, Self::Error> {
        config.validate()?;
        let epoch = parse_epoch(&config.starting_epoch)?;
        let models = &config.simulation.models;

        let mut fleet = Fleet::new(config.name.as_str(), config.architecture.as_str())
            .with_settings(ConvergenceSettings::from(&config.simulation.convergence));
        for launcher in &config.launchers {
            fleet.add_launcher(Launcher::from(launcher));
        }
        for target in &config.targets {
            fleet.add_target(build_target(target, epoch)?)?;
        }
        for sc in &config.spacecraft {
            let spacecraft = build_spacecraft(sc)?;
            let sizing: Box<dyn ModuleSizing> = match spacecraft.kind {
                SpacecraftKind::Servicer => sizing_for(spacecraft.kind),
                SpacecraftKind::UpperStage | SpacecraftKind::KickStage => {
                    let stage = sc
                        .launcher
                        .as_deref()
                        .and_then(|name| fleet.launcher(name))
                        .map(|launcher| StageSizing {
                            dispenser_mass_fraction: launcher.dispenser_mass_fraction,
                        })
                        .unwrap_or_default();
                    Box::new(stage)
                }
            };
            fleet.add_spacecraft(spacecraft, sizing)?;
        }
        for sc in &config.spacecraft {
            if let Some(carrier) = &sc.carrier {
                if !sc.targets.is_empty() {
                    return Err(ScenarioError::CarriedWithTargets(sc.id.clone()));
                }
                fleet.store_mut().assign_payload(
                    ObjectId::Spacecraft(SpacecraftId::new(sc.id.as_str())),
                    &SpacecraftId::new(carrier.as_str()),
                )?;
            }
        }

        let mut plan = Plan::new(config.name.as_str(), epoch).with_settings(mission_settings(models));
        for sc in config.spacecraft.iter().filter(|sc| sc.carrier.is_none()) {
            match sc.kind {
                SpacecraftKindConfig::Servicer => {
                    debris_removal(&fleet, &mut plan, config, sc, epoch)?
                }
                SpacecraftKindConfig::UpperStage | SpacecraftKindConfig::KickStage => {
                    deployment(&mut fleet, &mut plan, config, sc, epoch)?
                }
            }
        }
        info!(
            "scenario '{}': {} spacecraft, {} targets, {} phases",
            config.name,
            config.spacecraft.len(),
            config.targets.len(),
            plan.phases().len()
        );

        Ok(Scenario {
            name: config.name.clone(),
            fleet,
            plan,
            program_margin_days: models.program_margin_days,
        })
    }
}

pub fn parse_epoch(value: &str) -> Result<DateTime<Utc>, ScenarioError> {
    DateTime::parse_from_rfc3339(value)
        .map(|epoch| epoch.with_timezone(&Utc))
        .map_err(|source| ScenarioError::Epoch {
            value: value.to_string(),
            source,
        })
}

pub fn mission_settings(models: &ModelConfig) -> MissionSettings {
    MissionSettings {
        transfer: TransferSettings {
            atmosphere_limit_km: models.atmosphere_limit_km,
            derate: ThrustDerate {
                duty_cycle: models.duty_cycle,
                coast_cycle: models.coast_cycle,
            },
            low_thrust_eccentricity_limit: models.low_thrust_eccentricity_limit,
        },
        delta_v_contingency: models.delta_v_contingency,
        raan_cutoff_deg: models.raan_cutoff_deg,
        approach: ApproachTolerance {
            semi_major_axis_km: models.approach_semi_major_axis_km,
            inclination_deg: models.approach_inclination_deg,
            raan_deg: models.approach_raan_deg,
        },
        maintenance_contingency: models.maintenance_contingency,
        ground_pass_cost: models.ground_pass_cost,
    }
}

pub fn build_orbit(config: &OrbitConfig, epoch: DateTime<Utc>) -> Result<OrbitState, ScenarioError> {
    let body: Body = config.body.parse()?;
    Ok(OrbitState::from_apsides(
        body,
        config.perigee_altitude_km,
        config.apogee_altitude_km.unwrap_or(config.perigee_altitude_km),
        config.inclination_deg,
        config.raan_deg,
        config.arg_periapsis_deg,
        epoch,
    )?)
}

fn build_target(config: &TargetConfig, epoch: DateTime<Utc>) -> Result<Target, ScenarioError> {
    let mut target = Target::new(config.id.as_str(), config.mass_kg, build_orbit(&config.orbit, epoch)?)
        .with_volume(config.volume_m3);
    if let Some(disposal) = &config.disposal_orbit {
        target = target.with_disposal_orbit(build_orbit(disposal, epoch)?);
    }
    Ok(target)
}

fn technology(config: TechnologyConfig) -> PropulsionTechnology {
    match config {
        TechnologyConfig::MonoPropellant => PropulsionTechnology::MonoPropellant,
        TechnologyConfig::BiPropellant => PropulsionTechnology::BiPropellant,
        TechnologyConfig::Solid => PropulsionTechnology::Solid,
        TechnologyConfig::Water => PropulsionTechnology::Water,
        TechnologyConfig::Electrical => PropulsionTechnology::Electrical,
    }
}

fn spacecraft_kind(config: SpacecraftKindConfig) -> SpacecraftKind {
    match config {
        SpacecraftKindConfig::Servicer => SpacecraftKind::Servicer,
        SpacecraftKindConfig::UpperStage => SpacecraftKind::UpperStage,
        SpacecraftKindConfig::KickStage => SpacecraftKind::KickStage,
    }
}

fn targeting(config: PhasingConfig) -> RaanTargeting {
    match config {
        PhasingConfig::Free => RaanTargeting::Free,
        PhasingConfig::Absolute => RaanTargeting::Absolute,
        PhasingConfig::Relative => RaanTargeting::Relative,
    }
}

fn propulsion_spec(config: &PropulsionConfig) -> PropulsionSpec {
    PropulsionSpec {
        technology: technology(config.technology),
        max_thrust_n: config.thrust_n,
        min_thrust_n: config.min_thrust_n,
        isp_s: config.isp_s,
        initial_propellant_kg: config.initial_propellant_kg,
        max_tank_capacity_kg: config.max_tank_capacity_kg,
        propellant_contingency: config.propellant_contingency,
        mass_contingency: config.mass_contingency,
        is_refueler: config.refueler,
        dry_mass_override_kg: config.dry_mass_override_kg,
    }
}

fn capture_spec(config: &CaptureConfig) -> CaptureSpec {
    CaptureSpec {
        mass_contingency: config.mass_contingency,
        dry_mass_override_kg: config.dry_mass_override_kg,
    }
}

fn build_spacecraft(config: &SpacecraftConfig) -> Result<Spacecraft, ScenarioError> {
    let kind = spacecraft_kind(config.kind);
    let group = config.group.clone().unwrap_or_else(|| config.id.clone());
    let mut spacecraft = Spacecraft::new(
        config.id.as_str(),
        kind,
        group,
        config.structure_mass_kg,
        config.mass_contingency,
    );
    for module in &config.propulsion {
        mount_propulsion(&mut spacecraft, &module.id, propulsion_spec(module))?;
        match module.role {
            RoleConfig::Main => spacecraft.set_main_propulsion(module.id.as_str())?,
            RoleConfig::Rcs => spacecraft.set_rcs_propulsion(module.id.as_str())?,
            RoleConfig::Auxiliary => {}
        }
    }
    for module in &config.capture {
        mount_capture(&mut spacecraft, &module.id, capture_spec(module))?;
    }
    if let Some(first) = config.capture.first() {
        spacecraft.set_capture_module(first.id.as_str())?;
    } else if kind != SpacecraftKind::Servicer {
        mount_capture(
            &mut spacecraft,
            DISPENSER_ID,
            CaptureSpec {
                mass_contingency: 0.0,
                dry_mass_override_kg: None,
            },
        )?;
        spacecraft.set_capture_module(DISPENSER_ID)?;
    }
    Ok(spacecraft)
}

/// Default modules of a root spacecraft, resolved once per profile.
struct Roles {
    id: SpacecraftId,
    main: ModuleRef,
    rcs: ModuleRef,
    capture: ModuleRef,
}

impl Roles {
    fn of(fleet: &Fleet, config: &SpacecraftConfig) -> Result<Self, ScenarioError> {
        let id = SpacecraftId::new(config.id.as_str());
        let spacecraft = fleet.store().spacecraft(&id)?;
        let missing = |role| ScenarioError::MissingModule {
            spacecraft: config.id.clone(),
            role,
        };
        let main = spacecraft.main_propulsion_id().ok_or_else(|| missing("main propulsion"))?;
        let rcs = spacecraft.rcs_propulsion_id().ok_or_else(|| missing("rcs propulsion"))?;
        let capture = spacecraft.capture_module_id().ok_or_else(|| missing("capture"))?;
        Ok(Self {
            main: ModuleRef::new(id.clone(), main.clone()),
            rcs: ModuleRef::new(id.clone(), rcs.clone()),
            capture: ModuleRef::new(id.clone(), capture.clone()),
            id,
        })
    }
}

fn insertion_orbit(
    config: &SpacecraftConfig,
    epoch: DateTime<Utc>,
) -> Result<OrbitState, ScenarioError> {
    let orbit = config
        .insertion_orbit
        .as_ref()
        .ok_or_else(|| {
            ConfigError::Invalid(format!("spacecraft '{}' has no insertion orbit", config.id))
        })?;
    build_orbit(orbit, epoch)
}

fn find_target<'a>(config: &'a ScenarioConfig, id: &str) -> Result<&'a TargetConfig, ScenarioError> {
    config
        .targets
        .iter()
        .find(|target| target.id == id)
        .ok_or_else(|| StoreError::UnknownTarget(TargetId::new(id)).into())
}

/// Insertion, then per target: transfer, approach, capture, optional disposal
/// of the target, release and optional refueling; finally the own disposal.
fn debris_removal(
    fleet: &Fleet,
    plan: &mut Plan,
    scenario: &ScenarioConfig,
    config: &SpacecraftConfig,
    epoch: DateTime<Utc>,
) -> Result<(), ScenarioError> {
    let roles = Roles::of(fleet, config)?;
    let store = fleet.store();
    let sc = roles.id.as_str();
    plan.add_assigned(
        store,
        format!("{sc}:insertion"),
        Insertion::new(insertion_orbit(config, epoch)?)
            .with_propellant_kg(config.insertion_propellant_kg),
        roles.rcs.clone(),
    )?;

    let last_refuel = config.refuel_after.last();
    for target_id in &config.targets {
        let target = find_target(scenario, target_id)?;
        let object = ObjectId::Target(TargetId::new(target_id.as_str()));
        plan.add_assigned(
            store,
            format!("{sc}:{target_id}:transfer"),
            OrbitChange::new(OrbitGoal::Object(object.clone()))
                .with_targeting(targeting(config.phasing)),
            roles.main.clone(),
        )?;
        plan.add_assigned(
            store,
            format!("{sc}:{target_id}:approach"),
            Approach::new(object.clone(), config.approach_propellant_kg),
            roles.rcs.clone(),
        )?;
        plan.add_assigned(
            store,
            format!("{sc}:{target_id}:capture"),
            Capture::new(object.clone()),
            roles.capture.clone(),
        )?;
        if let Some(disposal) = &target.disposal_orbit {
            plan.add_assigned(
                store,
                format!("{sc}:{target_id}:disposal"),
                OrbitChange::new(build_orbit(disposal, epoch)?),
                roles.main.clone(),
            )?;
        }
        plan.add_assigned(
            store,
            format!("{sc}:{target_id}:release"),
            Release::new(object),
            roles.capture.clone(),
        )?;
        if config.refuel_after.contains(target_id) {
            let mut refueling = Refueling::new();
            if last_refuel == Some(target_id) {
                refueling = refueling.last_refuel();
            }
            plan.add_assigned(
                store,
                format!("{sc}:{target_id}:refueling"),
                refueling,
                roles.main.clone(),
            )?;
        }
    }

    if let Some(disposal) = &config.disposal_orbit {
        plan.add_assigned(
            store,
            format!("{sc}:disposal"),
            OrbitChange::new(build_orbit(disposal, epoch)?),
            roles.main.clone(),
        )?;
    }
    debug!("debris removal profile of '{sc}' covers {} targets", config.targets.len());
    Ok(())
}

/// Insertion with every target on board, then per target: transfer to its
/// operational orbit and release; finally the stage's disposal.
fn deployment(
    fleet: &mut Fleet,
    plan: &mut Plan,
    scenario: &ScenarioConfig,
    config: &SpacecraftConfig,
    epoch: DateTime<Utc>,
) -> Result<(), ScenarioError> {
    let roles = Roles::of(fleet, config)?;
    let targets = config
        .targets
        .iter()
        .map(|id| find_target(scenario, id))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(launcher) = config.launcher.as_deref().and_then(|name| fleet.launcher(name)) {
        let reference = PayloadReference {
            mass_kg: targets.iter().map(|t| t.mass_kg).fold(0.0, f64::max),
            volume_m3: targets.iter().map(|t| t.volume_m3).fold(0.0, f64::max),
        };
        let allowance = launcher.allowance(&reference);
        if allowance.count < targets.len() {
            return Err(ScenarioError::LauncherOverflow {
                launcher: launcher.name().to_string(),
                spacecraft: config.id.clone(),
                allowed: allowance.count,
                requested: targets.len(),
            });
        }
        debug!(
            "'{}' on {}: {} payloads, room for {}, dispenser {:.1} kg",
            config.id,
            launcher.name(),
            targets.len(),
            allowance.count,
            allowance.dispenser_mass_kg
        );
    }
    for target in &targets {
        fleet.store_mut().assign_payload(
            ObjectId::Target(TargetId::new(target.id.as_str())),
            &roles.id,
        )?;
    }

    let store = fleet.store();
    let sc = roles.id.as_str();
    plan.add_assigned(
        store,
        format!("{sc}:insertion"),
        Insertion::new(insertion_orbit(config, epoch)?)
            .with_propellant_kg(config.insertion_propellant_kg),
        roles.rcs.clone(),
    )?;
    for target in &targets {
        let object = ObjectId::Target(TargetId::new(target.id.as_str()));
        plan.add_assigned(
            store,
            format!("{sc}:{}:transfer", target.id),
            OrbitChange::new(build_orbit(&target.orbit, epoch)?)
                .with_targeting(targeting(config.phasing)),
            roles.main.clone(),
        )?;
        plan.add_assigned(
            store,
            format!("{sc}:{}:release", target.id),
            Release::new(object),
            roles.capture.clone(),
        )?;
    }
    if let Some(disposal) = &config.disposal_orbit {
        plan.add_assigned(
            store,
            format!("{sc}:disposal"),
            OrbitChange::new(build_orbit(disposal, epoch)?),
            roles.main.clone(),
        )?;
    }
    debug!("deployment profile of '{sc}' releases {} targets", targets.len());
    Ok(())
}
