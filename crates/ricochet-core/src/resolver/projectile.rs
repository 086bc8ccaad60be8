//! Projectile resolver for wave lifecycle and obstacle commands.
//!
//! The `ProjectileResolver` handles:
//! - `SpawnProjectile`: create a wave and register it
//! - `RedirectProjectile`, `SetContacts`, `StartRoll`: update a live wave
//! - `DestroyProjectile`, `PurgeProjectiles`: remove waves
//! - `PushObstacle`, `BreakObstacle`: box reactions to wave contacts
//!
//! It also sweeps stale handles out of the wave registry every
//! `sweep_interval_ticks` ticks.
//!
//! Commands whose target no longer exists are dropped. In particular, once a
//! wave is destroyed or purged, later commands for it in the same tick do
//! nothing.

use glam::Vec2;

use crate::arena::Arena;
use crate::config::{ObstacleConfig, ProjectileConfig, SimConfig};
use crate::entity::components::{Faction, ObstacleKind, PushMotion};
use crate::entity::{Entity, EntityId, EntityInner, ProjectileComponents};
use crate::journal::EventJournal;
use crate::output::{Command, Event, OutputEnvelope, OutputKind};
use crate::projectile::{ProjectileKind, ProjectileState};
use crate::timer::Timer;

use super::Resolver;

/// Resolver for wave and obstacle commands.
///
/// # Example
///
/// ```
/// use ricochet_core::config::SimConfig;
/// use ricochet_core::resolver::{ProjectileResolver, Resolver};
/// use ricochet_core::output::OutputKind;
///
/// let resolver = ProjectileResolver::from_config(&SimConfig::default());
/// assert_eq!(resolver.handles(), &[OutputKind::Command]);
/// ```
#[derive(Debug, Clone)]
pub struct ProjectileResolver {
    projectile: ProjectileConfig,
    obstacle: ObstacleConfig,
}

impl ProjectileResolver {
    /// Creates a resolver from the projectile and obstacle tuning.
    #[must_use]
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            projectile: config.projectile.clone(),
            obstacle: config.obstacle.clone(),
        }
    }

    fn spawn(
        &self,
        next: &mut Arena,
        journal: &mut EventJournal,
        spawn: Spawn,
    ) {
        let mut state = ProjectileState::new(
            spawn.kind,
            &self.projectile,
            spawn.direction,
            spawn.faction,
            Some(spawn.source),
        );
        if let Some(speed) = spawn.speed {
            state = state.with_speed(speed);
        }
        let projectile = next.spawn(EntityInner::Projectile(ProjectileComponents::new(spawn.origin, state)));
        tracing::debug!(%projectile, source = %spawn.source, kind = %spawn.kind, "wave fired");
        journal.record(
            next.current_tick(),
            Event::ProjectileFired {
                projectile,
                source: Some(spawn.source),
                kind: spawn.kind,
            },
        );
    }

    fn redirect(next: &mut Arena, journal: &mut EventJournal, target: EntityId, redirect: Redirect) {
        let tick = next.current_tick();
        let Some(wave) = next.get_mut(target).and_then(Entity::as_projectile_mut) else {
            return;
        };
        let state = &mut wave.projectile;
        let direction = redirect.direction.normalize_or_zero();
        if direction != Vec2::ZERO {
            state.direction = direction;
        }
        state.speed = redirect.speed.max(0.0);
        state.bounce_count = redirect.bounce_count.min(state.bounce_limit);
        state.faction = redirect.faction;
        wave.transform.heading = state.heading();

        journal.record(
            tick,
            Event::ProjectileBounced {
                projectile: target,
                bounce_count: state.bounce_count,
            },
        );
    }

    fn push_obstacle(&self, next: &mut Arena, journal: &mut EventJournal, target: EntityId, direction: Vec2) {
        let tick = next.current_tick();
        let Some(obstacle) = next.get_mut(target).and_then(Entity::as_obstacle_mut) else {
            return;
        };
        if obstacle.kind != ObstacleKind::Pushable || obstacle.push.is_some() {
            return;
        }
        let start = obstacle.transform.position;
        let destination = start + direction.normalize_or_zero() * self.obstacle.push_distance;
        obstacle.push = Some(PushMotion {
            start,
            target: destination,
            progress: 0.0,
        });
        journal.record(
            tick,
            Event::ObstaclePushed {
                obstacle: target,
                destination,
            },
        );
    }

    fn break_obstacle(next: &mut Arena, journal: &mut EventJournal, target: EntityId) {
        let breakable = next
            .get(target)
            .and_then(Entity::as_obstacle)
            .is_some_and(|o| o.kind == ObstacleKind::Breakable);
        if breakable && next.despawn(target).is_some() {
            journal.record(next.current_tick(), Event::ObstacleBroken { obstacle: target });
        }
    }

    fn sweep(&self, next: &mut Arena) {
        let tick = next.current_tick();
        let interval = self.projectile.sweep_interval_ticks;
        if interval > 0 && tick > 0 && tick % interval == 0 {
            let removed = next.sweep_registry();
            if removed > 0 {
                tracing::debug!(tick, removed, "swept stale wave handles");
            }
        }
    }
}

struct Spawn {
    source: EntityId,
    kind: ProjectileKind,
    origin: Vec2,
    direction: Vec2,
    faction: Faction,
    speed: Option<f32>,
}

struct Redirect {
    direction: Vec2,
    speed: f32,
    bounce_count: u32,
    faction: Faction,
}

impl Resolver for ProjectileResolver {
    fn name(&self) -> &'static str {
        "projectile"
    }

    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Command]
    }

    fn resolve(
        &self,
        outputs: &[&OutputEnvelope],
        _current: &Arena,
        next: &mut Arena,
        journal: &mut EventJournal,
    ) {
        let tick = next.current_tick();

        for envelope in outputs {
            let Some(command) = envelope.output().as_command() else {
                continue;
            };
            match command {
                Command::SpawnProjectile {
                    source,
                    kind,
                    origin,
                    direction,
                    faction,
                    speed,
                } => self.spawn(
                    next,
                    journal,
                    Spawn {
                        source: *source,
                        kind: *kind,
                        origin: *origin,
                        direction: *direction,
                        faction: *faction,
                        speed: *speed,
                    },
                ),
                Command::RedirectProjectile {
                    target,
                    direction,
                    speed,
                    bounce_count,
                    faction,
                } => Self::redirect(
                    next,
                    journal,
                    *target,
                    Redirect {
                        direction: *direction,
                        speed: *speed,
                        bounce_count: *bounce_count,
                        faction: *faction,
                    },
                ),
                Command::SetContacts { target, contacts } => {
                    if let Some(wave) = next.get_mut(*target).and_then(Entity::as_projectile_mut) {
                        wave.projectile.contacts.clone_from(contacts);
                    }
                }
                Command::StartRoll { target } => {
                    if let Some(wave) = next.get_mut(*target).and_then(Entity::as_projectile_mut) {
                        wave.projectile.roll = Some(Timer::new(self.projectile.roll_duration));
                    }
                }
                Command::DestroyProjectile { target } => {
                    let is_wave = next.get(*target).is_some_and(|e| e.as_projectile().is_some());
                    if is_wave && next.despawn(*target).is_some() {
                        journal.record(tick, Event::ProjectileDestroyed { projectile: *target });
                    }
                }
                Command::PurgeProjectiles { source } => {
                    let count = next.purge_projectiles().len();
                    if count > 0 {
                        tracing::info!(tick, %source, count, "purged live waves");
                        journal.record(tick, Event::ProjectilesPurged { count });
                    }
                }
                Command::PushObstacle { target, direction } => {
                    self.push_obstacle(next, journal, *target, *direction);
                }
                Command::BreakObstacle { target, .. } => Self::break_obstacle(next, journal, *target),
                Command::SetVelocity { .. } | Command::SyncEmitter { .. } => {}
            }
        }

        self.sweep(next);
    }
}

// =============================================================================
// Tests
// =============================================================================
