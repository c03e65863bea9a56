//! Capture and release of objects by a capture module.

use fleet_core::time::days_to_seconds;
use fleet_propulsion::ObjectId;

use super::{MissionError, PhaseContext, PhaseStep};

pub const DEFAULT_CAPTURE_DAYS: f64 = 14.0;
pub const DEFAULT_RELEASE_DAYS: f64 = 3.0;

/// Link `object` to the assigned spacecraft; from then on it moves with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub object: ObjectId,
    pub duration_s: f64,
}

impl Capture {
    pub fn new(object: impl Into<ObjectId>) -> Self {
        Self {
            object: object.into(),
            duration_s: days_to_seconds(DEFAULT_CAPTURE_DAYS),
        }
    }

    pub fn with_duration_s(mut self, duration_s: f64) -> Self {
        self.duration_s = duration_s;
        self
    }
}

impl PhaseStep for Capture {
    fn execute(&self, ctx: &mut PhaseContext<'_>) -> Result<(), MissionError> {
        let spacecraft = ctx.spacecraft().clone();
        ctx.store.capture(&self.object, &spacecraft)?;
        ctx.advance(self.duration_s)
    }
}

/// Unlink `object` from the assigned spacecraft; it keeps the orbit it is released on.
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub object: ObjectId,
    pub duration_s: f64,
}

impl Release {
    pub fn new(object: impl Into<ObjectId>) -> Self {
        Self {
            object: object.into(),
            duration_s: days_to_seconds(DEFAULT_RELEASE_DAYS),
        }
    }

    pub fn with_duration_s(mut self, duration_s: f64) -> Self {
        self.duration_s = duration_s;
        self
    }
}

impl PhaseStep for Release {
    fn execute(&self, ctx: &mut PhaseContext<'_>) -> Result<(), MissionError> {
        let spacecraft = ctx.spacecraft().clone();
        ctx.store.release(&self.object, &spacecraft)?;
        ctx.advance(self.duration_s)?;
        let orbit = ctx.orbit()?;
        ctx.store.set_object_orbit(&self.object, orbit)?;
        Ok(())
    }
}
