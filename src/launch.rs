//! Launcher capacity: how many payloads of a reference size fit under a fairing.

use fleet_config::LauncherConfig;

/// Payload used as the unit of a launcher allowance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayloadReference {
    pub mass_kg: f64,
    pub volume_m3: f64,
}

/// Number of reference payloads a launcher can take, and the dispenser it needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allowance {
    pub by_mass: usize,
    /// `None` when the reference payload has no volume.
    pub by_volume: Option<usize>,
    pub count: usize,
    pub dispenser_mass_kg: f64,
    pub dispenser_volume_m3: f64,
}

pub trait LauncherCapacity {
    fn name(&self) -> &str;

    /// Mass that can be put in the insertion orbit, dispenser included (kg).
    fn payload_capacity_kg(&self) -> f64;

    fn fairing_volume_m3(&self) -> f64;

    fn dispenser_mass_kg(&self, payload_mass_kg: f64) -> f64;

    fn dispenser_volume_m3(&self, payload_volume_m3: f64) -> f64;

    /// Payloads of `reference` size that fit by mass and by volume, dispenser included.
    fn allowance(&self, reference: &PayloadReference) -> Allowance {
        let unit_mass = reference.mass_kg + self.dispenser_mass_kg(reference.mass_kg);
        let by_mass = if unit_mass > 0.0 {
            (self.payload_capacity_kg() / unit_mass).floor().max(0.0) as usize
        } else {
            0
        };
        let by_volume = (reference.volume_m3 > 0.0).then(|| {
            let unit_volume = reference.volume_m3 + self.dispenser_volume_m3(reference.volume_m3);
            (self.fairing_volume_m3() / unit_volume).floor().max(0.0) as usize
        });
        let count = by_volume.map_or(by_mass, |volume| volume.min(by_mass));
        Allowance {
            by_mass,
            by_volume,
            count,
            dispenser_mass_kg: self.dispenser_mass_kg(reference.mass_kg * count as f64),
            dispenser_volume_m3: self.dispenser_volume_m3(reference.volume_m3 * count as f64),
        }
    }
}

/// Launcher described by catalogue figures with dispensers proportional to the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Launcher {
    pub name: String,
    pub payload_capacity_kg: f64,
    pub fairing_volume_m3: f64,
    pub dispenser_mass_fraction: f64,
    pub dispenser_volume_fraction: f64,
}

impl From<&LauncherConfig> for Launcher {
    fn from(config: &LauncherConfig) -> Self {
        Self {
            name: config.name.clone(),
            payload_capacity_kg: config.payload_capacity_kg,
            fairing_volume_m3: config.fairing_volume_m3,
            dispenser_mass_fraction: config.dispenser_mass_fraction,
            dispenser_volume_fraction: config.dispenser_volume_fraction,
        }
    }
}

impl LauncherCapacity for Launcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn payload_capacity_kg(&self) -> f64 {
        self.payload_capacity_kg
    }

    fn fairing_volume_m3(&self) -> f64 {
        self.fairing_volume_m3
    }

    fn dispenser_mass_kg(&self, payload_mass_kg: f64) -> f64 {
        self.dispenser_mass_fraction * payload_mass_kg
    }

    fn dispenser_volume_m3(&self, payload_volume_m3: f64) -> f64 {
        self.dispenser_volume_fraction * payload_volume_m3
    }
}
