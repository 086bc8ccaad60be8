//! Everything that exists in one room: characters, waves, deflectors and
//! boxes, keyed by [`EntityId`] in a `BTreeMap` so every walk over the arena
//! visits them in the same order.
//!
//! Alongside the entities the arena keeps a broad-phase [`SpatialIndex`] and
//! the [`ProjectileRegistry`] of live waves. Spawning and despawning keep both
//! in step. Moving an entity through [`Arena::get_mut`] does not; follow it
//! with [`Arena::update_spatial`].
//!
//! ```
//! use glam::Vec2;
//! use ricochet_core::arena::Arena;
//! use ricochet_core::config::CombatConfig;
//! use ricochet_core::entity::{AllyComponents, EntityInner};
//!
//! let mut arena = Arena::new();
//! let ally = arena.spawn(EntityInner::Ally(AllyComponents::new(
//!     Vec2::new(4.0, -2.0),
//!     &CombatConfig::default(),
//! )));
//! assert_eq!(arena.spatial().query_radius(Vec2::new(4.0, 0.0), 2.5), vec![ally]);
//! ```

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntityInner, EntityTag, Faction};
use crate::registry::ProjectileRegistry;

// =============================================================================
// Spatial Index
// =============================================================================

/// Indexed position and broad-phase extent of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct SpatialEntry {
    position: Vec2,
    extent: f32,
}

/// Positions and collider extents for proximity and contact queries.
///
/// Lookups scan every entry. Results come back sorted by ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpatialIndex {
    entries: HashMap<EntityId, SpatialEntry>,
}

impl SpatialIndex {
    /// An empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records where `id` is. `extent` is the farthest its collider reaches
    /// from `position`.
    pub fn insert(&mut self, id: EntityId, position: Vec2, extent: f32) {
        self.entries.insert(id, SpatialEntry { position, extent });
    }

    /// Forgets `id`. Unknown ids are ignored.
    pub fn remove(&mut self, id: EntityId) {
        self.entries.remove(&id);
    }

    /// Last recorded position of `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<Vec2> {
        self.entries.get(&id).map(|e| e.position)
    }

    /// Entities whose recorded position is within `radius` of `center`,
    /// boundary included.
    #[must_use]
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        let limit = radius * radius;
        self.collect_sorted(|e| center.distance_squared(e.position) <= limit)
    }

    /// Contact candidates for a circle of `radius` at `center`: anything
    /// whose extent could reach it. Callers still run the exact shape test.
    #[must_use]
    pub fn query_touching(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        self.collect_sorted(|e| center.distance(e.position) <= radius + e.extent)
    }

    fn collect_sorted(&self, keep: impl Fn(&SpatialEntry) -> bool) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .entries
            .iter()
            .filter_map(|(id, e)| keep(e).then_some(*id))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of indexed entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Entity storage for one simulation buffer.
///
/// IDs are handed out in increasing order and never reused. Waves enter the
/// [`registry`](Self::registry) when spawned and leave it when despawned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    next_id: u64,
    entities: BTreeMap<EntityId, Entity>,
    spatial: SpatialIndex,
    registry: ProjectileRegistry,
    tick: u64,
}

impl Arena {
    /// An empty arena at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entities: BTreeMap::new(),
            spatial: SpatialIndex::new(),
            registry: ProjectileRegistry::new(),
            tick: 0,
        }
    }

    /// Adds an entity and returns its fresh ID. Waves are registered as live.
    pub fn spawn(&mut self, inner: EntityInner) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;

        let entity = Entity::from_inner(id, inner);
        if entity.tag() == EntityTag::Projectile {
            self.registry.register(id);
        }
        self.entities.insert(id, entity);
        self.update_spatial(id);
        id
    }

    /// Removes `id` from storage, the index and the wave registry.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.spatial.remove(id);
        self.registry.remove(id);
        self.entities.remove(&id)
    }

    /// Looks up `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Looks up `id` for editing. Call [`update_spatial`](Self::update_spatial)
    /// after moving it.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Whether `id` is present.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Every entity, lowest ID first.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Every entity for editing, lowest ID first.
    pub fn entities_sorted_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.entities.values_mut()
    }

    /// Entities carrying `tag`, in ID order.
    pub fn entities_with_tag(&self, tag: EntityTag) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values().filter(move |e| e.tag() == tag)
    }

    /// Nearest living combat target of `faction`, ties broken by lowest ID.
    #[must_use]
    pub fn nearest_target(&self, from: Vec2, faction: Faction, exclude: Option<EntityId>) -> Option<EntityId> {
        self.entities
            .values()
            .filter(|e| e.faction() == Some(faction) && e.is_alive() && Some(e.id()) != exclude)
            .map(|e| (e.id(), from.distance_squared(e.transform().position)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| id)
    }

    /// Number of entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// True when nothing is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Broad-phase index.
    #[must_use]
    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Handles of every live wave.
    #[must_use]
    pub fn registry(&self) -> &ProjectileRegistry {
        &self.registry
    }

    /// Empties the wave registry and despawns every wave it held.
    ///
    /// Handles are copied out of the registry before any despawn, so the
    /// purge never observes a registry it is modifying.
    ///
    /// # Returns
    ///
    /// IDs of the waves that were despawned.
    pub fn purge_projectiles(&mut self) -> Vec<EntityId> {
        let handles = self.registry.purge_all();
        handles
            .into_iter()
            .filter(|id| self.despawn(*id).is_some())
            .collect()
    }

    /// Drops registry handles whose wave no longer exists.
    ///
    /// # Returns
    ///
    /// Number of stale handles removed.
    pub fn sweep_registry(&mut self) -> usize {
        let entities = &self.entities;
        self.registry.sweep(|id| {
            entities
                .get(&id)
                .is_some_and(|e| e.tag() == EntityTag::Projectile)
        })
    }

    /// Tick this buffer represents.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Moves to the next tick.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Re-reads the position and collider of `id` into the index.
    pub fn update_spatial(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get(&id) else {
            return;
        };
        self.spatial
            .insert(id, entity.transform().position, entity.collider().extent());
    }

    /// Re-syncs the spatial index for every entity.
    pub fn update_spatial_all(&mut self) {
        for (id, entity) in &self.entities {
            self.spatial
                .insert(*id, entity.transform().position, entity.collider().extent());
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
