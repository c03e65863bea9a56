//! Core units, constants, and shared primitives for the fleet sizing workspace.

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Standard gravity at Earth's surface (m/s²).
    pub const G0: f64 = 9.80665;
    /// Seconds per Julian day.
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
    /// Seconds per Julian year (365.25 days).
    pub const SECONDS_PER_YEAR: f64 = 365.25 * SECONDS_PER_DAY;
}

/// Unit conversion helpers.
pub mod units {
    /// Convert kilometres per second to metres per second.
    #[inline]
    pub fn kms_to_ms(v: f64) -> f64 {
        v * 1_000.0
    }
}

/// Angle normalisation helpers (degrees).
pub mod angles {
    /// Wrap an angle into the half-open interval (-180°, 180°].
    pub fn wrap_signed_deg(angle_deg: f64) -> f64 {
        let wrapped = angle_deg.rem_euclid(360.0);
        if wrapped > 180.0 {
            wrapped - 360.0
        } else {
            wrapped
        }
    }

    /// Inverse cosine with the argument clipped to [-1, 1].
    ///
    /// Apsis computations land on ±1 up to rounding; clipping keeps them in the domain.
    #[inline]
    pub fn clipped_acos(cosine: f64) -> f64 {
        cosine.clamp(-1.0, 1.0).acos()
    }
}

/// Lightweight time utilities shared across crates.
pub mod time {
    use chrono::{DateTime, TimeDelta, Utc};

    use super::constants::{SECONDS_PER_DAY, SECONDS_PER_YEAR};

    /// Mission epoch (UTC).
    pub type Epoch = DateTime<Utc>;

    /// Convert days to seconds.
    #[inline]
    pub fn days_to_seconds(days: f64) -> f64 {
        days * SECONDS_PER_DAY
    }

    /// Convert seconds to days.
    #[inline]
    pub fn seconds_to_days(seconds: f64) -> f64 {
        seconds / SECONDS_PER_DAY
    }

    /// Convert seconds to Julian years.
    #[inline]
    pub fn seconds_to_years(seconds: f64) -> f64 {
        seconds / SECONDS_PER_YEAR
    }

    /// Advance an epoch by a (possibly fractional) number of seconds.
    ///
    /// Returns `None` when the duration is not finite or the result leaves chrono's range.
    pub fn advance(epoch: Epoch, seconds: f64) -> Option<Epoch> {
        if !seconds.is_finite() {
            return None;
        }
        let micros = (seconds * 1e6).round();
        if micros.abs() >= i64::MAX as f64 {
            return None;
        }
        epoch.checked_add_signed(TimeDelta::microseconds(micros as i64))
    }

    /// Signed number of seconds from `from` to `to`.
    pub fn seconds_between(from: Epoch, to: Epoch) -> f64 {
        let delta = to - from;
        match delta.num_microseconds() {
            Some(us) => us as f64 * 1e-6,
            None => delta.num_milliseconds() as f64 * 1e-3,
        }
    }

    /// Later of two epochs.
    #[inline]
    pub fn latest(a: Epoch, b: Epoch) -> Epoch {
        if b > a { b } else { a }
    }
}
