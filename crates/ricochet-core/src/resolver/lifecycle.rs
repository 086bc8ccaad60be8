//! Lifecycle resolver for per-tick timers.
//!
//! Handles no outputs. Every tick it:
//! 1. Ages waves (lifetime, growth, roll) and removes expired ones
//! 2. Advances post-hit windows on combat targets
//! 3. Removes dead enemies whose despawn delay ran out
//! 4. Ends finished speed boosts
//! 5. Drains deflector energy, or regenerates it while no deflector is active
//!
//! Runs after the combat resolver, so a death recorded this tick has its
//! despawn delay start counting on the next tick.

use std::collections::BTreeMap;

use crate::arena::Arena;
use crate::config::SimConfig;
use crate::entity::{Entity, EntityId, EntityTag};
use crate::journal::EventJournal;
use crate::output::{Event, OutputEnvelope, OutputKind};

use super::{Resolver, FIXED_DT};

/// Resolver for timers, expiry, and energy.
#[derive(Debug, Clone)]
pub struct LifecycleResolver {
    dt: f32,
}

impl LifecycleResolver {
    /// Creates a lifecycle resolver with the default fixed timestep.
    #[must_use]
    pub fn new() -> Self {
        Self { dt: FIXED_DT }
    }

    /// Creates a lifecycle resolver using the simulation's timestep.
    #[must_use]
    pub fn from_config(config: &SimConfig) -> Self {
        Self { dt: config.dt }
    }

    fn age_waves(&self, next: &mut Arena, journal: &mut EventJournal) {
        let tick = next.current_tick();
        let expired: Vec<EntityId> = next
            .entities_sorted_mut()
            .filter_map(|entity| {
                let id = entity.id();
                let wave = entity.as_projectile_mut()?;
                wave.projectile.tick(self.dt).then_some(id)
            })
            .collect();

        for id in expired {
            if next.despawn(id).is_some() {
                tracing::trace!(tick, projectile = %id, "wave expired");
                journal.record(tick, Event::ProjectileExpired { projectile: id });
            }
        }
    }

    fn tick_characters(&self, next: &mut Arena, journal: &mut EventJournal) {
        let tick = next.current_tick();
        let mut removals = Vec::new();

        for entity in next.entities_sorted_mut() {
            let id = entity.id();
            if let Some(health) = entity.health_mut() {
                health.tick(self.dt);
            }
            if let Some(enemy) = entity.as_enemy_mut() {
                if enemy.despawn.as_mut().is_some_and(|t| t.tick(self.dt)) {
                    removals.push(id);
                }
            }
            if let Some(player) = entity.as_player_mut() {
                if player.boost.as_mut().is_some_and(|b| b.tick(self.dt)) {
                    player.boost = None;
                }
            }
        }

        for id in removals {
            if next.despawn(id).is_some() {
                tracing::debug!(tick, entity = %id, "dead enemy removed");
                journal.record(tick, Event::EntityRemoved { entity: id });
            }
        }
    }

    fn update_energy(&self, next: &mut Arena, journal: &mut EventJournal) {
        let tick = next.current_tick();
        let mut active: BTreeMap<EntityId, usize> = BTreeMap::new();
        for entity in next.entities_with_tag(EntityTag::Deflector) {
            if let Some(d) = entity.as_deflector().filter(|d| d.deflector.active) {
                *active.entry(d.deflector.owner).or_default() += 1;
            }
        }

        let mut depleted = Vec::new();
        for entity in next.entities_sorted_mut() {
            let id = entity.id();
            let Some(player) = entity.as_player_mut() else {
                continue;
            };
            match active.get(&id).copied().unwrap_or(0) {
                0 => player.energy.regenerate(self.dt),
                count => {
                    if player.energy.drain(count, self.dt) {
                        depleted.push(id);
                    }
                }
            }
        }

        for owner in depleted {
            for entity in next.entities_sorted_mut() {
                if let Some(d) = entity.as_deflector_mut() {
                    if d.deflector.owner == owner {
                        d.deflector.active = false;
                    }
                }
            }
            tracing::info!(tick, %owner, "deflector energy depleted");
            journal.record(tick, Event::DeflectorDepleted { owner });
        }
    }
}

impl Default for LifecycleResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for LifecycleResolver {
    fn name(&self) -> &'static str {
        "lifecycle"
    }

    fn handles(&self) -> &[OutputKind] {
        &[]
    }

    fn resolve(
        &self,
        _outputs: &[&OutputEnvelope],
        _current: &Arena,
        next: &mut Arena,
        journal: &mut EventJournal,
    ) {
        self.age_waves(next, journal);
        self.tick_characters(next, journal);
        self.update_energy(next, journal);
    }
}

/// Returns the number of active deflectors owned by `owner`.
#[must_use]
pub(crate) fn active_deflectors(arena: &Arena, owner: EntityId) -> usize {
    arena
        .entities_with_tag(EntityTag::Deflector)
        .filter_map(Entity::as_deflector)
        .filter(|d| d.deflector.owner == owner && d.deflector.active)
        .count()
}

// =============================================================================
// Tests
// =============================================================================
