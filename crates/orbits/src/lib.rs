//! Keplerian orbit states with linearised J2 nodal precession.
//!
//! An [`OrbitState`] is a value: every manoeuvre or propagation step produces a
//! new state bound to a new epoch. Distances are kilometres, angles degrees and
//! speeds km/s unless a name says otherwise.

mod body;

use std::f64::consts::PI;
use std::fmt;

use fleet_core::angles::{clipped_acos, wrap_signed_deg};
use fleet_core::time::{self, Epoch};
use thiserror::Error;

pub use body::Body;

/// Slack allowed when checking that a radius lies on an orbit (1 m).
const RADIUS_TOLERANCE_KM: f64 = 1e-3;

/// Errors raised while building or propagating orbit states.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrbitError {
    #[error("eccentricity {0} is outside [0, 1)")]
    Eccentricity(f64),
    #[error("semi-major axis {0} km is not a positive finite value")]
    SemiMajorAxis(f64),
    #[error("periapsis radius {0:.3} km is not positive")]
    Periapsis(f64),
    #[error("radius {radius_km:.3} km is not reached by a {periapsis_km:.3} x {apoapsis_km:.3} km orbit")]
    UnattainableRadius {
        radius_km: f64,
        periapsis_km: f64,
        apoapsis_km: f64,
    },
    #[error("cannot propagate {seconds:.1} s backwards in time")]
    BackwardPropagation { seconds: f64 },
    #[error("propagating by {seconds:.1} s leaves the representable epoch range")]
    EpochOverflow { seconds: f64 },
    #[error("altitude {altitude_km:.1} km is below the surface of {body}")]
    BelowSurface { altitude_km: f64, body: Body },
    #[error("unknown central body '{0}'")]
    UnknownBody(String),
}

/// The six classical elements, used to build an [`OrbitState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitElements {
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub arg_periapsis_deg: f64,
    pub true_anomaly_deg: f64,
}

/// Conditions met when crossing an altitude on the descending leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReentryConditions {
    pub true_anomaly_deg: f64,
    pub speed_km_s: f64,
    pub flight_path_angle_deg: f64,
}

/// Snapshot of an orbit around a [`Body`] at an epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    body: Body,
    elements: OrbitElements,
    epoch: Epoch,
}

impl OrbitState {
    /// Validate the elements and build a state. RAAN is wrapped into (-180°, 180°].
    pub fn new(body: Body, elements: OrbitElements, epoch: Epoch) -> Result<Self, OrbitError> {
        let a = elements.semi_major_axis_km;
        if !(a.is_finite() && a > 0.0) {
            return Err(OrbitError::SemiMajorAxis(a));
        }
        let e = elements.eccentricity;
        if !(0.0..1.0).contains(&e) {
            return Err(OrbitError::Eccentricity(e));
        }
        let periapsis = a * (1.0 - e);
        if periapsis <= 0.0 {
            return Err(OrbitError::Periapsis(periapsis));
        }
        let mut elements = elements;
        elements.raan_deg = wrap_signed_deg(elements.raan_deg);
        Ok(Self {
            body,
            elements,
            epoch,
        })
    }

    /// Circular orbit at an altitude above the body's equatorial radius.
    pub fn circular(
        body: Body,
        altitude_km: f64,
        inclination_deg: f64,
        raan_deg: f64,
        epoch: Epoch,
    ) -> Result<Self, OrbitError> {
        Self::from_apsides(body, altitude_km, altitude_km, inclination_deg, raan_deg, 0.0, epoch)
    }

    /// Orbit defined by periapsis and apoapsis altitudes.
    pub fn from_apsides(
        body: Body,
        periapsis_altitude_km: f64,
        apoapsis_altitude_km: f64,
        inclination_deg: f64,
        raan_deg: f64,
        arg_periapsis_deg: f64,
        epoch: Epoch,
    ) -> Result<Self, OrbitError> {
        let rp = body.radius_km() + periapsis_altitude_km.min(apoapsis_altitude_km);
        let ra = body.radius_km() + periapsis_altitude_km.max(apoapsis_altitude_km);
        let elements = OrbitElements {
            semi_major_axis_km: 0.5 * (rp + ra),
            eccentricity: (ra - rp) / (ra + rp),
            inclination_deg,
            raan_deg,
            arg_periapsis_deg,
            true_anomaly_deg: 0.0,
        };
        Self::new(body, elements, epoch)
    }

    pub fn body(&self) -> Body {
        self.body
    }

    pub fn elements(&self) -> OrbitElements {
        self.elements
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn semi_major_axis_km(&self) -> f64 {
        self.elements.semi_major_axis_km
    }

    pub fn eccentricity(&self) -> f64 {
        self.elements.eccentricity
    }

    pub fn inclination_deg(&self) -> f64 {
        self.elements.inclination_deg
    }

    pub fn raan_deg(&self) -> f64 {
        self.elements.raan_deg
    }

    pub fn arg_periapsis_deg(&self) -> f64 {
        self.elements.arg_periapsis_deg
    }

    pub fn true_anomaly_deg(&self) -> f64 {
        self.elements.true_anomaly_deg
    }

    pub fn periapsis_radius_km(&self) -> f64 {
        self.semi_major_axis_km() * (1.0 - self.eccentricity())
    }

    pub fn apoapsis_radius_km(&self) -> f64 {
        self.semi_major_axis_km() * (1.0 + self.eccentricity())
    }

    pub fn periapsis_altitude_km(&self) -> f64 {
        self.periapsis_radius_km() - self.body.radius_km()
    }

    pub fn apoapsis_altitude_km(&self) -> f64 {
        self.apoapsis_radius_km() - self.body.radius_km()
    }

    /// Altitude of the semi-major axis above the equatorial radius.
    pub fn mean_altitude_km(&self) -> f64 {
        self.semi_major_axis_km() - self.body.radius_km()
    }

    pub fn semi_latus_rectum_km(&self) -> f64 {
        let e = self.eccentricity();
        self.semi_major_axis_km() * (1.0 - e * e)
    }

    /// Mean motion (rad/s).
    pub fn mean_motion_rad_s(&self) -> f64 {
        (self.body.mu_km3_s2() / self.semi_major_axis_km().powi(3)).sqrt()
    }

    /// Orbital period (s).
    pub fn period_s(&self) -> f64 {
        2.0 * PI / self.mean_motion_rad_s()
    }

    /// Vis-viva speed at a radius on this orbit.
    ///
    /// Radii beyond apoapsis (plus 1 m of slack) are rejected.
    pub fn speed_at_radius_km_s(&self, radius_km: f64) -> Result<f64, OrbitError> {
        if radius_km > self.apoapsis_radius_km() + RADIUS_TOLERANCE_KM || radius_km <= 0.0 {
            return Err(self.unattainable(radius_km));
        }
        let energy = 2.0 / radius_km - 1.0 / self.semi_major_axis_km();
        Ok((self.body.mu_km3_s2() * energy.max(0.0)).sqrt())
    }

    /// True anomaly (0..=180°) at which the orbit crosses `radius_km` on the ascending leg.
    ///
    /// Circular orbits return 0°. The cosine is clipped so that apsis radii map to 0° / 180°.
    pub fn true_anomaly_at_radius_deg(&self, radius_km: f64) -> Result<f64, OrbitError> {
        if radius_km > self.apoapsis_radius_km() + RADIUS_TOLERANCE_KM
            || radius_km < self.periapsis_radius_km() - RADIUS_TOLERANCE_KM
        {
            return Err(self.unattainable(radius_km));
        }
        let e = self.eccentricity();
        if e == 0.0 {
            return Ok(0.0);
        }
        let cosine = (self.semi_latus_rectum_km() / radius_km - 1.0) / e;
        Ok(clipped_acos(cosine).to_degrees())
    }

    /// Flight-path angle at a true anomaly (degrees, positive while climbing).
    pub fn flight_path_angle_deg(&self, true_anomaly_deg: f64) -> f64 {
        let e = self.eccentricity();
        let nu = true_anomaly_deg.to_radians();
        (e * nu.sin()).atan2(1.0 + e * nu.cos()).to_degrees()
    }

    /// True anomaly, speed and flight-path angle when descending through `altitude_km`.
    pub fn reentry_conditions(&self, altitude_km: f64) -> Result<ReentryConditions, OrbitError> {
        let radius = self.body.radius_km() + altitude_km;
        let ascending = self.true_anomaly_at_radius_deg(radius)?;
        let true_anomaly_deg = -ascending;
        Ok(ReentryConditions {
            true_anomaly_deg,
            speed_km_s: self.speed_at_radius_km_s(radius)?,
            flight_path_angle_deg: self.flight_path_angle_deg(true_anomaly_deg),
        })
    }

    /// Secular RAAN drift caused by J2 (deg/s).
    pub fn nodal_precession_rate_deg_s(&self) -> f64 {
        let ratio = self.body.radius_km() / self.semi_latus_rectum_km();
        let rate_rad_s = -1.5
            * self.mean_motion_rad_s()
            * self.body.j2()
            * ratio
            * ratio
            * self.inclination_deg().to_radians().cos();
        rate_rad_s.to_degrees()
    }

    /// Drift the node forward to `epoch`; going backwards is an error.
    pub fn propagated_to(&self, epoch: Epoch) -> Result<Self, OrbitError> {
        let seconds = time::seconds_between(self.epoch, epoch);
        if seconds < 0.0 {
            return Err(OrbitError::BackwardPropagation { seconds });
        }
        Ok(self.drifted(seconds, epoch))
    }

    /// Drift the node forward by `seconds`.
    pub fn propagated_by(&self, seconds: f64) -> Result<Self, OrbitError> {
        if seconds < 0.0 {
            return Err(OrbitError::BackwardPropagation { seconds });
        }
        let epoch =
            time::advance(self.epoch, seconds).ok_or(OrbitError::EpochOverflow { seconds })?;
        Ok(self.drifted(seconds, epoch))
    }

    /// Reference orbit re-expressed at `epoch`, drifting the node in either direction.
    ///
    /// Meant for goal orbits that may be stamped later than the vehicle chasing them.
    pub fn referenced_to(&self, epoch: Epoch) -> Self {
        let seconds = time::seconds_between(self.epoch, epoch);
        self.drifted(seconds, epoch)
    }

    fn drifted(&self, seconds: f64, epoch: Epoch) -> Self {
        let raan = self.raan_deg() + self.nodal_precession_rate_deg_s() * seconds;
        self.with_raan(raan).with_epoch(epoch)
    }

    /// Same orbit with a new RAAN (wrapped into (-180°, 180°]).
    pub fn with_raan(&self, raan_deg: f64) -> Self {
        let mut next = *self;
        next.elements.raan_deg = wrap_signed_deg(raan_deg);
        next
    }

    pub fn with_epoch(&self, epoch: Epoch) -> Self {
        let mut next = *self;
        next.epoch = epoch;
        next
    }

    fn unattainable(&self, radius_km: f64) -> OrbitError {
        OrbitError::UnattainableRadius {
            radius_km,
            periapsis_km: self.periapsis_radius_km(),
            apoapsis_km: self.apoapsis_radius_km(),
        }
    }
}

impl fmt::Display for OrbitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0} x {:.0} km ({}), inc {:.2}°, raan {:.2}°, argp {:.1}°, nu {:.1}° @ {}",
            self.periapsis_altitude_km(),
            self.apoapsis_altitude_km(),
            self.body,
            self.inclination_deg(),
            self.raan_deg(),
            self.arg_periapsis_deg(),
            self.true_anomaly_deg(),
            self.epoch.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

/// Sense in which the nodes of a population of orbits regress or advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecessionDirection {
    /// RAAN increases with time (retrograde inclinations, e.g. sun-synchronous).
    Eastward,
    /// RAAN decreases with time (prograde inclinations).
    Westward,
}

impl PrecessionDirection {
    /// +1 for eastward drift, -1 for westward.
    pub fn sign(self) -> f64 {
        match self {
            PrecessionDirection::Eastward => 1.0,
            PrecessionDirection::Westward => -1.0,
        }
    }
}

/// Dominant precession direction of a population, from the mean nodal rate.
///
/// Returns `None` for an empty population or a mean rate of exactly zero.
pub fn precession_direction<'a, I>(orbits: I) -> Option<PrecessionDirection>
where
    I: IntoIterator<Item = &'a OrbitState>,
{
    let (sum, count) = orbits
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), orbit| {
            (sum + orbit.nodal_precession_rate_deg_s(), count + 1)
        });
    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;
    if mean > 0.0 {
        Some(PrecessionDirection::Eastward)
    } else if mean < 0.0 {
        Some(PrecessionDirection::Westward)
    } else {
        None
    }
}
