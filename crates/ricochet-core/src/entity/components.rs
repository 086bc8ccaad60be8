//! Component structs for each entity type.
//!
//! Every entity carries a [`TransformState`]. Combat targets (player, enemies,
//! allies) add physics and a [`HealthState`]; the rest carry the state of
//! their own subsystem.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{CombatConfig, DeflectorConfig, EmitterConfig, PlayerConfig};
use crate::deflector::{DeflectorState, EnergyPool};
use crate::emitter::{EmitterMode, EmitterState};
use crate::encounter::GateId;
use crate::entity::EntityId;
use crate::geometry::Shape;
use crate::projectile::ProjectileState;
use crate::timer::Timer;

pub use crate::combat::{HealthState, StatusFlags};

// =============================================================================
// Shared State
// =============================================================================

/// Position and facing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    /// World position.
    pub position: Vec2,
    /// Facing in radians, counter-clockwise from `+X`.
    pub heading: f32,
}

impl TransformState {
    /// Creates a transform at `position` facing `+X`.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self {
            position,
            heading: 0.0,
        }
    }
}

/// Linear motion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicsState {
    /// Velocity in world units per second.
    pub velocity: Vec2,
}

/// Side a combat target or wave belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// The player and allies.
    Player,
    /// Enemies.
    Enemy,
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Enemy => write!(f, "Enemy"),
        }
    }
}

// =============================================================================
// Characters
// =============================================================================

/// Components for the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerComponents {
    /// Position and facing.
    pub transform: TransformState,
    /// Motion.
    pub physics: PhysicsState,
    /// Health.
    pub health: HealthState,
    /// Collision radius.
    pub radius: f32,
    /// Deflector energy.
    pub energy: EnergyPool,
    /// Requested movement direction (unit or zero).
    pub move_direction: Vec2,
    /// Normal movement speed.
    pub move_speed: f32,
    /// Movement speed while boosting.
    pub boosted_speed: f32,
    /// Running boost, if any.
    pub boost: Option<Timer>,
}

impl PlayerComponents {
    /// Creates a player at `position`.
    #[must_use]
    pub fn new(position: Vec2, combat: &CombatConfig, player: &PlayerConfig) -> Self {
        Self {
            transform: TransformState::at(position),
            physics: PhysicsState::default(),
            health: HealthState::new(combat.player_max_health),
            radius: combat.player_radius,
            energy: EnergyPool::new(player),
            move_direction: Vec2::ZERO,
            move_speed: player.move_speed,
            boosted_speed: player.boosted_speed,
            boost: None,
        }
    }

    /// Speed for this tick, taking a running boost into account.
    #[must_use]
    pub fn current_speed(&self) -> f32 {
        if self.boost.is_some_and(|b| !b.is_finished()) {
            self.boosted_speed
        } else {
            self.move_speed
        }
    }
}

/// Components for an enemy. Every enemy carries an emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyComponents {
    /// Position and facing.
    pub transform: TransformState,
    /// Motion.
    pub physics: PhysicsState,
    /// Health.
    pub health: HealthState,
    /// Collision radius.
    pub radius: f32,
    /// Firing and AI state.
    pub emitter: EmitterState,
    /// Delay before a dead enemy is removed.
    pub despawn: Option<Timer>,
    /// Gate this enemy belongs to.
    pub gate: Option<GateId>,
}

impl EnemyComponents {
    /// Creates an enemy at `position` with an emitter anchored there.
    #[must_use]
    pub fn new(position: Vec2, mode: EmitterMode, combat: &CombatConfig, emitter: &EmitterConfig) -> Self {
        Self {
            transform: TransformState::at(position),
            physics: PhysicsState::default(),
            health: HealthState::new(combat.enemy_max_health),
            radius: combat.enemy_radius,
            emitter: EmitterState::new(mode, position, emitter),
            despawn: None,
            gate: None,
        }
    }
}

/// Components for an ally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllyComponents {
    /// Position and facing.
    pub transform: TransformState,
    /// Motion.
    pub physics: PhysicsState,
    /// Health.
    pub health: HealthState,
    /// Collision radius.
    pub radius: f32,
}

impl AllyComponents {
    /// Creates an ally at `position`.
    #[must_use]
    pub fn new(position: Vec2, combat: &CombatConfig) -> Self {
        Self {
            transform: TransformState::at(position),
            physics: PhysicsState::default(),
            health: HealthState::new(combat.ally_max_health),
            radius: combat.ally_radius,
        }
    }
}

// =============================================================================
// Waves, Deflectors, Obstacles
// =============================================================================

/// Components for a wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileComponents {
    /// Position and facing.
    pub transform: TransformState,
    /// Motion and collision state.
    pub projectile: ProjectileState,
}

impl ProjectileComponents {
    /// Creates a wave at `origin` facing its direction of travel.
    #[must_use]
    pub fn new(origin: Vec2, projectile: ProjectileState) -> Self {
        Self {
            transform: TransformState {
                position: origin,
                heading: projectile.heading(),
            },
            projectile,
        }
    }
}

/// Components for a deflector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeflectorComponents {
    /// Derived position and facing.
    pub transform: TransformState,
    /// Orbit and mode.
    pub deflector: DeflectorState,
}

impl DeflectorComponents {
    /// Creates a deflector orbiting an owner at `owner_position`.
    #[must_use]
    pub fn new(owner: EntityId, owner_position: Vec2, config: &DeflectorConfig) -> Self {
        let deflector = DeflectorState::new(owner, config);
        Self {
            transform: TransformState {
                position: deflector.position_around(owner_position),
                heading: deflector.facing(),
            },
            deflector,
        }
    }
}

/// Kind of static obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Solid; reflects waves.
    Wall,
    /// Trigger; glides away when a wave hits it.
    Pushable,
    /// Trigger; removed when a wave hits it.
    Breakable,
}

impl fmt::Display for ObstacleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wall => write!(f, "Wall"),
            Self::Pushable => write!(f, "Pushable"),
            Self::Breakable => write!(f, "Breakable"),
        }
    }
}

/// A pushable box gliding toward its destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PushMotion {
    /// Where the glide started.
    pub start: Vec2,
    /// Where the glide ends.
    pub target: Vec2,
    /// Interpolation progress in `[0, 1]`.
    pub progress: f32,
}

impl PushMotion {
    /// Advances the glide.
    ///
    /// # Returns
    ///
    /// The new position and whether the glide finished.
    pub fn advance(&mut self, rate: f32, dt: f32) -> (Vec2, bool) {
        self.progress = (self.progress + rate * dt).min(1.0);
        (self.start.lerp(self.target, self.progress), self.progress >= 1.0)
    }
}

/// Components for an obstacle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleComponents {
    /// Position.
    pub transform: TransformState,
    /// Collision shape.
    pub shape: Shape,
    /// Obstacle kind.
    pub kind: ObstacleKind,
    /// Running push glide, if any.
    pub push: Option<PushMotion>,
}

impl ObstacleComponents {
    /// Creates an obstacle at `position`.
    #[must_use]
    pub const fn new(position: Vec2, shape: Shape, kind: ObstacleKind) -> Self {
        Self {
            transform: TransformState::at(position),
            shape,
            kind,
            push: None,
        }
    }
}
