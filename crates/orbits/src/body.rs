//! Attracting bodies and their gravity-field and decay models.

use std::fmt;
use std::str::FromStr;

use crate::OrbitError;

/// Earth empirical maintenance law: Δv per year = C · altitude_km^K (m/s).
const EARTH_MAINTENANCE_COEFFICIENT: f64 = 9.0e18;
const EARTH_MAINTENANCE_EXPONENT: f64 = -6.746;
/// Lunar orbits need a flat station-keeping budget (m/s per year).
const MOON_MAINTENANCE_M_S_PER_YEAR: f64 = 50.0;

/// Central body of an orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Body {
    Earth,
    Moon,
}

impl Body {
    /// Gravitational parameter (km³/s²).
    pub fn mu_km3_s2(self) -> f64 {
        match self {
            Body::Earth => 398_600.441_8,
            Body::Moon => 4_902.800_066,
        }
    }

    /// Equatorial radius (km).
    pub fn radius_km(self) -> f64 {
        match self {
            Body::Earth => 6_378.137,
            Body::Moon => 1_737.4,
        }
    }

    /// Second zonal harmonic (oblateness coefficient).
    pub fn j2(self) -> f64 {
        match self {
            Body::Earth => 1.082_626_68e-3,
            Body::Moon => 2.033_542_48e-4,
        }
    }

    /// Delta-v per year needed to hold an orbit against decay (m/s).
    pub fn maintenance_delta_v_per_year(self, altitude_km: f64) -> Result<f64, OrbitError> {
        if !(altitude_km > 0.0) {
            return Err(OrbitError::BelowSurface {
                altitude_km,
                body: self,
            });
        }
        Ok(match self {
            Body::Earth => {
                EARTH_MAINTENANCE_COEFFICIENT * altitude_km.powf(EARTH_MAINTENANCE_EXPONENT)
            }
            Body::Moon => MOON_MAINTENANCE_M_S_PER_YEAR,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Body::Earth => "Earth",
            Body::Moon => "Moon",
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Body {
    type Err = OrbitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "earth" => Ok(Body::Earth),
            "moon" => Ok(Body::Moon),
            _ => Err(OrbitError::UnknownBody(s.to_string())),
        }
    }
}
