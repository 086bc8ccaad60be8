//! Registry of live waves, owned by the arena.
//!
//! Every wave the simulation spawns is registered here so that it can be
//! purged in one call when the player is hit. Handles are stored in a
//! `BTreeSet` so purges and sweeps visit them in a deterministic order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Set of live wave handles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileRegistry {
    live: BTreeSet<EntityId>,
}

impl ProjectileRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a wave. Duplicate registrations are ignored.
    ///
    /// # Returns
    ///
    /// `true` if the handle was newly added.
    pub fn register(&mut self, id: EntityId) -> bool {
        self.live.insert(id)
    }

    /// Removes a wave handle, if present.
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.live.remove(&id)
    }

    /// Returns `true` if the handle is registered.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.live.contains(&id)
    }

    /// Empties the registry, returning every handle it held.
    ///
    /// The caller despawns the returned handles. The registry is already
    /// empty by then, so despawn bookkeeping can call [`remove`](Self::remove)
    /// freely.
    pub fn purge_all(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.live).into_iter().collect()
    }

    /// Drops handles for which `is_live` returns `false`.
    ///
    /// # Returns
    ///
    /// Number of stale handles removed.
    pub fn sweep(&mut self, mut is_live: impl FnMut(EntityId) -> bool) -> usize {
        let before = self.live.len();
        self.live.retain(|id| is_live(*id));
        before - self.live.len()
    }

    /// Number of registered handles.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Registered handles in ID order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.live.iter().copied()
    }
}
