//! Who is in the room.
//!
//! Every entity is an [`EntityId`], an [`EntityTag`] picking its plugin
//! bundle, and an [`EntityInner`] variant holding that tag's component struct.
//! The tag is always derived from the variant. Helpers on [`Entity`] reach the
//! parts several kinds share (transform, motion, health, collider) without a
//! match at every call site.
//!
//! ```
//! use glam::Vec2;
//! use ricochet_core::config::CombatConfig;
//! use ricochet_core::entity::{AllyComponents, Entity, EntityId, EntityInner, EntityTag, Faction};
//!
//! let ally = Entity::from_inner(
//!     EntityId::new(7),
//!     EntityInner::Ally(AllyComponents::new(Vec2::ZERO, &CombatConfig::default())),
//! );
//! assert_eq!(ally.tag(), EntityTag::Ally);
//! assert_eq!(ally.faction(), Some(Faction::Player));
//! assert!(ally.is_alive());
//! ```

pub mod components;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::combat::HealthState;
use crate::geometry::Shape;

pub use components::{
    AllyComponents, DeflectorComponents, EnemyComponents, Faction, ObstacleComponents,
    PhysicsState, PlayerComponents, ProjectileComponents, TransformState,
};

/// Handle to an entity. Handed out in increasing order and never reused, so
/// ID order is spawn order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Kind of entity. Selects the plugin bundle that runs on it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityTag {
    /// The player character.
    Player,
    /// A hostile combat target carrying an emitter.
    Enemy,
    /// A friendly combat target.
    Ally,
    /// A wave in flight.
    Projectile,
    /// A player-orbiting deflector.
    Deflector,
    /// A wall or box.
    Obstacle,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
            Self::Ally => "ally",
            Self::Projectile => "wave",
            Self::Deflector => "deflector",
            Self::Obstacle => "obstacle",
        })
    }
}

/// Per-kind component storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityInner {
    /// The player.
    Player(PlayerComponents),
    /// Enemy with an emitter.
    Enemy(EnemyComponents),
    /// Friendly combat target.
    Ally(AllyComponents),
    /// Wave in flight.
    Projectile(ProjectileComponents),
    /// Orbiting deflector.
    Deflector(DeflectorComponents),
    /// Wall or box.
    Obstacle(ObstacleComponents),
}

macro_rules! inner_accessors {
    ($($variant:ident, $components:ty, $get:ident, $get_mut:ident;)*) => {
        impl EntityInner {
            $(
                #[doc = concat!("`", stringify!($components), "` if the variant matches.")]
                #[must_use]
                pub const fn $get(&self) -> Option<&$components> {
                    match self {
                        Self::$variant(components) => Some(components),
                        _ => None,
                    }
                }

                #[doc = concat!("Mutable `", stringify!($components), "` if the variant matches.")]
                #[must_use]
                pub fn $get_mut(&mut self) -> Option<&mut $components> {
                    match self {
                        Self::$variant(components) => Some(components),
                        _ => None,
                    }
                }
            )*
        }

        impl Entity {
            $(
                #[doc = concat!("`", stringify!($components), "` if this is a ", stringify!($variant), ".")]
                #[must_use]
                pub const fn $get(&self) -> Option<&$components> {
                    self.inner.$get()
                }

                #[doc = concat!("Mutable `", stringify!($components), "` if this is a ", stringify!($variant), ".")]
                #[must_use]
                pub fn $get_mut(&mut self) -> Option<&mut $components> {
                    self.inner.$get_mut()
                }
            )*
        }
    };
}

inner_accessors! {
    Player, PlayerComponents, as_player, as_player_mut;
    Enemy, EnemyComponents, as_enemy, as_enemy_mut;
    Ally, AllyComponents, as_ally, as_ally_mut;
    Projectile, ProjectileComponents, as_projectile, as_projectile_mut;
    Deflector, DeflectorComponents, as_deflector, as_deflector_mut;
    Obstacle, ObstacleComponents, as_obstacle, as_obstacle_mut;
}

impl EntityInner {
    /// Tag matching the variant.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        match self {
            Self::Player(_) => EntityTag::Player,
            Self::Enemy(_) => EntityTag::Enemy,
            Self::Ally(_) => EntityTag::Ally,
            Self::Projectile(_) => EntityTag::Projectile,
            Self::Deflector(_) => EntityTag::Deflector,
            Self::Obstacle(_) => EntityTag::Obstacle,
        }
    }
}

/// One arena record. `tag` always agrees with the `inner` variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    tag: EntityTag,
    inner: EntityInner,
}

impl Entity {
    /// Builds a record, taking the tag from `inner`.
    #[must_use]
    pub const fn from_inner(id: EntityId, inner: EntityInner) -> Self {
        Self {
            id,
            tag: inner.tag(),
            inner,
        }
    }

    /// Handle of this record.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Kind of entity.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }

    /// Component storage for resolvers that need to match on the kind. The
    /// variant cannot be swapped through this reference without breaking the
    /// tag, so callers only edit fields.
    #[must_use]
    pub fn inner_mut(&mut self) -> &mut EntityInner {
        &mut self.inner
    }

    /// Position and facing. Every entity type has one.
    #[must_use]
    pub const fn transform(&self) -> &TransformState {
        match &self.inner {
            EntityInner::Player(c) => &c.transform,
            EntityInner::Enemy(c) => &c.transform,
            EntityInner::Ally(c) => &c.transform,
            EntityInner::Projectile(c) => &c.transform,
            EntityInner::Deflector(c) => &c.transform,
            EntityInner::Obstacle(c) => &c.transform,
        }
    }

    /// Mutable position and facing.
    #[must_use]
    pub fn transform_mut(&mut self) -> &mut TransformState {
        match &mut self.inner {
            EntityInner::Player(c) => &mut c.transform,
            EntityInner::Enemy(c) => &mut c.transform,
            EntityInner::Ally(c) => &mut c.transform,
            EntityInner::Projectile(c) => &mut c.transform,
            EntityInner::Deflector(c) => &mut c.transform,
            EntityInner::Obstacle(c) => &mut c.transform,
        }
    }

    /// Motion state, for entity types that move under their own velocity.
    #[must_use]
    pub const fn physics(&self) -> Option<&PhysicsState> {
        match &self.inner {
            EntityInner::Player(c) => Some(&c.physics),
            EntityInner::Enemy(c) => Some(&c.physics),
            EntityInner::Ally(c) => Some(&c.physics),
            _ => None,
        }
    }

    /// Mutable motion state.
    #[must_use]
    pub fn physics_mut(&mut self) -> Option<&mut PhysicsState> {
        match &mut self.inner {
            EntityInner::Player(c) => Some(&mut c.physics),
            EntityInner::Enemy(c) => Some(&mut c.physics),
            EntityInner::Ally(c) => Some(&mut c.physics),
            _ => None,
        }
    }

    /// Health, for combat targets.
    #[must_use]
    pub const fn health(&self) -> Option<&HealthState> {
        match &self.inner {
            EntityInner::Player(c) => Some(&c.health),
            EntityInner::Enemy(c) => Some(&c.health),
            EntityInner::Ally(c) => Some(&c.health),
            _ => None,
        }
    }

    /// Mutable health, for combat targets.
    #[must_use]
    pub fn health_mut(&mut self) -> Option<&mut HealthState> {
        match &mut self.inner {
            EntityInner::Player(c) => Some(&mut c.health),
            EntityInner::Enemy(c) => Some(&mut c.health),
            EntityInner::Ally(c) => Some(&mut c.health),
            _ => None,
        }
    }

    /// Side of a combat target. Allies fight for the player.
    #[must_use]
    pub const fn faction(&self) -> Option<Faction> {
        match self.tag {
            EntityTag::Player | EntityTag::Ally => Some(Faction::Player),
            EntityTag::Enemy => Some(Faction::Enemy),
            _ => None,
        }
    }

    /// Returns `true` for a combat target that has not died.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health().is_some_and(|h| !h.is_dead())
    }

    /// Collision shape centered on the entity's position.
    #[must_use]
    pub fn collider(&self) -> Shape {
        match &self.inner {
            EntityInner::Player(c) => Shape::circle(c.radius),
            EntityInner::Enemy(c) => Shape::circle(c.radius),
            EntityInner::Ally(c) => Shape::circle(c.radius),
            EntityInner::Projectile(c) => Shape::circle(c.projectile.radius),
            EntityInner::Deflector(c) => Shape::circle(c.deflector.collider_radius),
            EntityInner::Obstacle(c) => c.shape,
        }
    }
}
