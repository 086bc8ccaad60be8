//! Player-orbiting deflector and the energy pool that powers it.
//!
//! A deflector's position is never stored independently: it is derived from
//! its owner's position, the orbit radius, and the orbit angle, and is
//! re-anchored after every movement pass. Inert deflectors still orbit, they
//! just ignore waves.

use std::f32::consts::PI;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{DeflectorConfig, PlayerConfig};
use crate::entity::EntityId;

/// What an active deflector does to a standard wave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeflectorMode {
    /// Remove the wave.
    #[default]
    Destroy,
    /// Send the wave back, arming it against enemies.
    Reflect,
}

impl fmt::Display for DeflectorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Destroy => write!(f, "Destroy"),
            Self::Reflect => write!(f, "Reflect"),
        }
    }
}

/// Orbit and mode state of one deflector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeflectorState {
    /// Entity the deflector orbits.
    pub owner: EntityId,
    /// Orbit angle in radians, counter-clockwise from `+X`.
    pub angle: f32,
    /// Distance from the owner.
    pub orbit_radius: f32,
    /// Collision radius.
    pub collider_radius: f32,
    /// Outward push added to reflections.
    pub bounce_force: f32,
    /// Radians of rotation per unit of scroll delta.
    pub rotation_speed: f32,
    /// Whether the deflector currently intercepts waves.
    pub active: bool,
    /// Current mode.
    pub mode: DeflectorMode,
}

impl DeflectorState {
    /// Creates a deflector for `owner` at angle zero.
    #[must_use]
    pub fn new(owner: EntityId, config: &DeflectorConfig) -> Self {
        Self {
            owner,
            angle: 0.0,
            orbit_radius: config.orbit_radius,
            collider_radius: config.collider_radius,
            bounce_force: config.bounce_force,
            rotation_speed: config.rotation_speed_degrees.to_radians(),
            active: config.start_active,
            mode: DeflectorMode::default(),
        }
    }

    /// World position for an owner at `owner_position`.
    #[must_use]
    pub fn position_around(&self, owner_position: Vec2) -> Vec2 {
        owner_position + Vec2::from_angle(self.angle) * self.orbit_radius
    }

    /// Facing of the deflector, pointing back at its owner.
    #[must_use]
    pub fn facing(&self) -> f32 {
        wrap_angle(self.angle + PI)
    }

    /// Accumulates a scroll delta into the orbit angle.
    pub fn rotate(&mut self, delta: f32) {
        self.angle = wrap_angle(self.angle + delta * self.rotation_speed);
    }

    /// Points the orbit at `point`. A point on top of the owner is ignored.
    pub fn aim_at(&mut self, owner_position: Vec2, point: Vec2) {
        let offset = point - owner_position;
        if offset.length_squared() > f32::EPSILON {
            self.angle = offset.y.atan2(offset.x);
        }
    }
}

/// Wraps an angle into `(-PI, PI]`.
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

// =============================================================================
// Energy
// =============================================================================

/// Energy spent by active deflectors and recovered while they rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyPool {
    current: f32,
    max: f32,
    drain_rate: f32,
    regen_rate: f32,
}

impl EnergyPool {
    /// Creates a full pool from the player tuning.
    #[must_use]
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            current: config.energy_max,
            max: config.energy_max,
            drain_rate: config.energy_drain,
            regen_rate: config.energy_regen,
        }
    }

    /// Current energy.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Maximum energy.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Returns `true` when no energy is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current <= 0.0
    }

    /// Drains for `active` deflectors over `dt`.
    ///
    /// # Returns
    ///
    /// `true` if this call emptied the pool.
    pub fn drain(&mut self, active: usize, dt: f32) -> bool {
        if active == 0 || self.is_empty() {
            return false;
        }
        #[allow(clippy::cast_precision_loss)]
        let cost = self.drain_rate * active as f32 * dt;
        self.current = (self.current - cost).max(0.0);
        self.is_empty()
    }

    /// Regenerates over `dt`, clamped to max.
    pub fn regenerate(&mut self, dt: f32) {
        self.current = (self.current + self.regen_rate * dt).min(self.max);
    }
}
