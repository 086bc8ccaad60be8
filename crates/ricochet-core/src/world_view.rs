//! Read-only window onto the frozen arena that plugins look through.
//!
//! A view built with [`WorldView::for_plugin`] only answers for the
//! [`ComponentKind`]s the plugin listed in `reads`. Asking for another kind is
//! a plugin bug: debug builds assert, release builds answer `None`. Entity
//! lookup, tag scans and the spatial queries only reveal IDs and tags, so they
//! are open to every plugin.
//!
//! ```
//! use glam::Vec2;
//! use ricochet_core::arena::Arena;
//! use ricochet_core::config::ProjectileConfig;
//! use ricochet_core::entity::{EntityInner, EntityTag, Faction, ProjectileComponents};
//! use ricochet_core::plugin::{ComponentKind, PluginDeclaration, PluginId};
//! use ricochet_core::projectile::{ProjectileKind, ProjectileState};
//! use ricochet_core::world_view::WorldView;
//!
//! let mut arena = Arena::new();
//! let state = ProjectileState::new(
//!     ProjectileKind::Piercing,
//!     &ProjectileConfig::default(),
//!     Vec2::Y,
//!     Faction::Enemy,
//!     None,
//! );
//! let wave = arena.spawn(EntityInner::Projectile(ProjectileComponents::new(Vec2::ZERO, state)));
//!
//! let decl = PluginDeclaration {
//!     id: PluginId::new("tracker"),
//!     required_tags: vec![EntityTag::Projectile],
//!     reads: vec![ComponentKind::Projectile],
//!     emits: Vec::new(),
//! };
//! let view = WorldView::for_plugin(&arena, &decl, 0);
//! assert_eq!(view.get_projectile(wave).map(|p| p.kind), Some(ProjectileKind::Piercing));
//! ```

use glam::Vec2;

use crate::arena::Arena;
use crate::combat::HealthState;
use crate::deflector::DeflectorState;
use crate::emitter::EmitterState;
use crate::entity::components::{
    Faction, ObstacleComponents, PhysicsState, PlayerComponents, TransformState,
};
use crate::entity::{Entity, EntityId, EntityTag};
use crate::plugin::{ComponentKind, PluginDeclaration};
use crate::projectile::ProjectileState;

// =============================================================================
// WorldView
// =============================================================================

/// Borrowed arena plus the list of component kinds the holder may read.
#[derive(Debug)]
pub struct WorldView<'a> {
    arena: &'a Arena,
    tick: u64,
    allowed_components: &'a [ComponentKind],
}

impl<'a> WorldView<'a> {
    /// View limited to `decl.reads`.
    #[must_use]
    pub fn for_plugin(arena: &'a Arena, decl: &'a PluginDeclaration, tick: u64) -> Self {
        Self {
            arena,
            tick,
            allowed_components: &decl.reads,
        }
    }

    /// Unrestricted view for code that is not a plugin.
    #[must_use]
    pub fn full_access(arena: &'a Arena, tick: u64) -> Self {
        Self {
            arena,
            tick,
            allowed_components: &ComponentKind::ALL,
        }
    }

    /// Tick of the arena being viewed.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Whole entity record. Open to every plugin.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&'a Entity> {
        self.arena.get(id)
    }

    /// Returns an entity's transform. Requires [`ComponentKind::Transform`].
    #[must_use]
    pub fn get_transform(&self, id: EntityId) -> Option<&'a TransformState> {
        self.check_access(ComponentKind::Transform)?;
        Some(self.arena.get(id)?.transform())
    }

    /// Returns a character's physics state. Requires [`ComponentKind::Physics`].
    #[must_use]
    pub fn get_physics(&self, id: EntityId) -> Option<&'a PhysicsState> {
        self.check_access(ComponentKind::Physics)?;
        self.arena.get(id)?.physics()
    }

    /// Returns a combat target's health. Requires [`ComponentKind::Health`].
    #[must_use]
    pub fn get_health(&self, id: EntityId) -> Option<&'a HealthState> {
        self.check_access(ComponentKind::Health)?;
        self.arena.get(id)?.health()
    }

    /// Returns a wave's state. Requires [`ComponentKind::Projectile`].
    #[must_use]
    pub fn get_projectile(&self, id: EntityId) -> Option<&'a ProjectileState> {
        self.check_access(ComponentKind::Projectile)?;
        self.arena.get(id)?.as_projectile().map(|c| &c.projectile)
    }

    /// Returns an enemy's emitter. Requires [`ComponentKind::Emitter`].
    #[must_use]
    pub fn get_emitter(&self, id: EntityId) -> Option<&'a EmitterState> {
        self.check_access(ComponentKind::Emitter)?;
        self.arena.get(id)?.as_enemy().map(|c| &c.emitter)
    }

    /// Returns a deflector's state. Requires [`ComponentKind::Deflector`].
    #[must_use]
    pub fn get_deflector(&self, id: EntityId) -> Option<&'a DeflectorState> {
        self.check_access(ComponentKind::Deflector)?;
        self.arena.get(id)?.as_deflector().map(|c| &c.deflector)
    }

    /// Returns an obstacle's components. Requires [`ComponentKind::Obstacle`].
    #[must_use]
    pub fn get_obstacle(&self, id: EntityId) -> Option<&'a ObstacleComponents> {
        self.check_access(ComponentKind::Obstacle)?;
        self.arena.get(id)?.as_obstacle()
    }

    /// Returns the player's components. Requires [`ComponentKind::Player`].
    #[must_use]
    pub fn get_player(&self, id: EntityId) -> Option<&'a PlayerComponents> {
        self.check_access(ComponentKind::Player)?;
        self.arena.get(id)?.as_player()
    }

    /// Entities whose position lies within `radius` of `center`, sorted by ID.
    #[must_use]
    pub fn query_in_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        self.arena.spatial().query_radius(center, radius)
    }

    /// Contact candidates for a circle at `center`, sorted by ID.
    ///
    /// Includes entities whose collider extent reaches the circle, so callers
    /// still need an exact shape test.
    #[must_use]
    pub fn query_touching(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        self.arena.spatial().query_touching(center, radius)
    }

    /// Nearest living combat target of `faction`, other than `exclude`.
    ///
    /// Always allowed: only the ID is returned.
    #[must_use]
    pub fn nearest_target(&self, from: Vec2, faction: Faction, exclude: Option<EntityId>) -> Option<EntityId> {
        self.arena.nearest_target(from, faction, exclude)
    }

    /// Entity IDs carrying `tag`, in ID order.
    pub fn query_by_tag(&self, tag: EntityTag) -> impl Iterator<Item = EntityId> + 'a {
        self.arena.entities_with_tag(tag).map(Entity::id)
    }

    fn check_access(&self, kind: ComponentKind) -> Option<()> {
        let allowed = self.allowed_components.contains(&kind);
        debug_assert!(allowed, "undeclared read of {kind} (declared {:?})", self.allowed_components);
        allowed.then_some(())
    }
}

// =============================================================================
// Tests
// =============================================================================
