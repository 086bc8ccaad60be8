//! Combat resolver for damage, healing, and death.
//!
//! The `CombatResolver` handles:
//! - `ApplyDamage`: Reduce health, honoring the post-hit window unless bypassed
//! - `ApplyHealing`: Restore health, capped at max
//! - `Kill`: Kill outright
//! - `SetStatusFlag`: Toggle invincibility, or kill/revive via `DEAD`
//!
//! # Death Handling
//!
//! Death is observed through the [`DamageOutcome`] returned by
//! [`HealthState`](crate::combat::HealthState), which reports a kill only once
//! per life, so `EntityDied` is recorded exactly once. A dead enemy stops
//! firing and moving and is scheduled for removal after
//! `enemy_destroy_delay`; a dead player also produces `PlayerDied`.

use glam::Vec2;

use crate::arena::Arena;
use crate::combat::{DamageOutcome, StatusFlags};
use crate::config::{CombatConfig, SimConfig};
use crate::entity::{Entity, EntityId, EntityInner};
use crate::journal::EventJournal;
use crate::output::{Event, Modifier, OutputEnvelope, OutputKind};
use crate::timer::Timer;

use super::Resolver;

/// Resolver for health-related modifiers.
///
/// # Example
///
/// ```
/// use ricochet_core::resolver::CombatResolver;
/// use ricochet_core::resolver::Resolver;
/// use ricochet_core::output::OutputKind;
///
/// let resolver = CombatResolver::new();
/// assert!(resolver.handles().contains(&OutputKind::Modifier));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CombatResolver {
    combat: CombatConfig,
}

impl CombatResolver {
    /// Creates a new combat resolver with default tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a combat resolver from the simulation's combat tuning.
    #[must_use]
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            combat: config.combat.clone(),
        }
    }

    fn apply_damage(
        &self,
        next: &mut Arena,
        journal: &mut EventJournal,
        target: EntityId,
        source: Option<EntityId>,
        amount: f32,
        bypass_window: bool,
    ) {
        let tick = next.current_tick();
        let Some(health) = next.get_mut(target).and_then(Entity::health_mut) else {
            return;
        };
        let outcome = if bypass_window {
            health.apply_unblockable_damage(amount)
        } else {
            health.apply_damage(amount)
        };

        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::Damaged { remaining } => {
                if !bypass_window {
                    health.start_hit_window(self.combat.invincibility_duration);
                }
                journal.record(
                    tick,
                    Event::DamageApplied {
                        source,
                        target,
                        amount,
                        remaining,
                    },
                );
            }
            DamageOutcome::Killed => {
                journal.record(
                    tick,
                    Event::DamageApplied {
                        source,
                        target,
                        amount,
                        remaining: 0.0,
                    },
                );
                self.handle_death(next, journal, target, source);
            }
        }
    }

    fn kill(&self, next: &mut Arena, journal: &mut EventJournal, target: EntityId, source: Option<EntityId>) {
        let killed = next
            .get_mut(target)
            .and_then(Entity::health_mut)
            .is_some_and(|h| h.kill());
        if killed {
            self.handle_death(next, journal, target, source);
        }
    }

    fn set_status_flag(
        &self,
        next: &mut Arena,
        journal: &mut EventJournal,
        target: EntityId,
        flag: StatusFlags,
        value: bool,
    ) {
        if flag.contains(StatusFlags::DEAD) {
            if value {
                self.kill(next, journal, target, None);
            } else if let Some(health) = next.get_mut(target).and_then(Entity::health_mut) {
                health.revive();
            }
        }
        if flag.contains(StatusFlags::INVINCIBLE) {
            if let Some(health) = next.get_mut(target).and_then(Entity::health_mut) {
                health.set_invincible(value);
            }
        }
    }

    /// Runs the one-time consequences of a death.
    fn handle_death(&self, next: &mut Arena, journal: &mut EventJournal, target: EntityId, killer: Option<EntityId>) {
        let tick = next.current_tick();
        let Some(entity) = next.get_mut(target) else {
            return;
        };
        let tag = entity.tag();
        tracing::info!(tick, entity = %target, %tag, killer = ?killer, "combat target died");
        journal.record(
            tick,
            Event::EntityDied {
                entity: target,
                tag,
                killer,
            },
        );

        if let Some(physics) = entity.physics_mut() {
            physics.velocity = Vec2::ZERO;
        }
        match entity.inner_mut() {
            EntityInner::Enemy(enemy) => {
                enemy.emitter.deactivate();
                enemy.despawn = Some(Timer::new(self.combat.enemy_destroy_delay));
            }
            EntityInner::Player(_) => {
                journal.record(tick, Event::PlayerDied { player: target });
            }
            _ => {}
        }
    }
}

impl Resolver for CombatResolver {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Modifier]
    }

    fn resolve(
        &self,
        outputs: &[&OutputEnvelope],
        _current: &Arena,
        next: &mut Arena,
        journal: &mut EventJournal,
    ) {
        for envelope in outputs {
            let Some(modifier) = envelope.output().as_modifier() else {
                continue;
            };
            match modifier {
                Modifier::ApplyDamage {
                    target,
                    source,
                    amount,
                    bypass_window,
                } => self.apply_damage(next, journal, *target, *source, *amount, *bypass_window),
                Modifier::ApplyHealing { target, amount } => {
                    if let Some(health) = next.get_mut(*target).and_then(Entity::health_mut) {
                        health.heal(*amount);
                    }
                }
                Modifier::Kill { target, source } => self.kill(next, journal, *target, *source),
                Modifier::SetStatusFlag { target, flag, value } => {
                    self.set_status_flag(next, journal, *target, *flag, *value);
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmitterConfig, PlayerConfig};
    use crate::emitter::EmitterMode;
    use crate::entity::{AllyComponents, EnemyComponents, EntityTag, PlayerComponents};
    use crate::output::{Command, Output};
    use crate::resolver::make_envelope;

    fn spawn_enemy(arena: &mut Arena) -> EntityId {
        let mut enemy = EnemyComponents::new(
            Vec2::ZERO,
            EmitterMode::Passive,
            &CombatConfig::default(),
            &EmitterConfig::default(),
        );
        enemy.emitter.activate();
        enemy.physics.velocity = Vec2::X;
        arena.spawn(EntityInner::Enemy(enemy))
    }

    fn spawn_player(arena: &mut Arena) -> EntityId {
        arena.spawn(EntityInner::Player(PlayerComponents::new(
            Vec2::ZERO,
            &CombatConfig::default(),
            &PlayerConfig::default(),
        )))
    }

    fn damage(target: EntityId, amount: f32, bypass_window: bool) -> Modifier {
        Modifier::ApplyDamage {
            target,
            source: Some(EntityId::new(99)),
            amount,
            bypass_window,
        }
    }

    fn resolve_in_place(arena: &mut Arena, journal: &mut EventJournal, modifiers: Vec<Modifier>) {
        let envelopes: Vec<OutputEnvelope> = modifiers
            .into_iter()
            .map(|m| make_envelope(Output::Modifier(m), EntityId::new(99)))
            .collect();
        let refs: Vec<&OutputEnvelope> = envelopes.iter().collect();
        let current = arena.clone();
        CombatResolver::new().resolve(&refs, &current, arena, journal);
    }

    fn health_of(arena: &Arena, id: EntityId) -> f32 {
        arena.get(id).and_then(Entity::health).map_or(-1.0, |h| h.current())
    }

    fn tick_health(arena: &mut Arena, id: EntityId, dt: f32) {
        if let Some(health) = arena.get_mut(id).and_then(Entity::health_mut) {
            health.tick(dt);
        }
    }

    mod resolver_trait_tests {
        use super::*;

        #[test]
        fn handles_modifier_kind() {
            let resolver = CombatResolver::from_config(&SimConfig::default());
            assert_eq!(resolver.handles(), &[OutputKind::Modifier]);
        }
    }

    mod apply_damage_tests {
        use super::*;

        #[test]
        fn damage_reduces_health_and_records() {
            let mut arena = Arena::new();
            let ally = arena.spawn(EntityInner::Ally(AllyComponents::new(Vec2::ZERO, &CombatConfig::default())));
            let mut journal = EventJournal::new();
            resolve_in_place(&mut arena, &mut journal, vec![damage(ally, 30.0, false)]);

            assert!((health_of(&arena, ally) - 70.0).abs() < f32::EPSILON);
            assert_eq!(
                journal.entries()[0].event,
                Event::DamageApplied {
                    source: Some(EntityId::new(99)),
                    target: ally,
                    amount: 30.0,
                    remaining: 70.0,
                }
            );
        }

        #[test]
        fn hit_window_blocks_second_unbounced_hit() {
            let mut arena = Arena::new();
            let enemy = spawn_enemy(&mut arena);
            let mut journal = EventJournal::new();
            resolve_in_place(
                &mut arena,
                &mut journal,
                vec![damage(enemy, 30.0, false), damage(enemy, 30.0, false)],
            );
            assert!((health_of(&arena, enemy) - 70.0).abs() < f32::EPSILON);
            assert_eq!(journal.len(), 1);
        }

        #[test]
        fn bypass_lands_inside_window() {
            let mut arena = Arena::new();
            let enemy = spawn_enemy(&mut arena);
            let mut journal = EventJournal::new();
            resolve_in_place(
                &mut arena,
                &mut journal,
                vec![damage(enemy, 30.0, false), damage(enemy, 50.0, true)],
            );
            assert!((health_of(&arena, enemy) - 20.0).abs() < f32::EPSILON);
        }

        #[test]
        fn four_spaced_hits_kill_once() {
            let mut arena = Arena::new();
            let enemy = spawn_enemy(&mut arena);
            let mut journal = EventJournal::new();
            for _ in 0..5 {
                resolve_in_place(&mut arena, &mut journal, vec![damage(enemy, 30.0, false)]);
                tick_health(&mut arena, enemy, 0.2);
            }

            assert!(arena.get(enemy).and_then(Entity::health).unwrap().is_dead());
            assert_eq!(journal.count_matching(|e| matches!(e, Event::EntityDied { .. })), 1);
            assert_eq!(journal.count_matching(|e| matches!(e, Event::DamageApplied { .. })), 4);
        }

        #[test]
        fn damage_nonexistent_entity_ignored() {
            let mut arena = Arena::new();
            let mut journal = EventJournal::new();
            resolve_in_place(&mut arena, &mut journal, vec![damage(EntityId::new(5), 10.0, false)]);
            assert!(journal.is_empty());
        }
    }

    mod death_tests {
        use super::*;

        #[test]
        fn enemy_death_stops_emitter_and_schedules_removal() {
            let mut arena = Arena::new();
            let enemy = spawn_enemy(&mut arena);
            let mut journal = EventJournal::new();
            resolve_in_place(&mut arena, &mut journal, vec![damage(enemy, 100.0, true)]);

            let components = arena.get(enemy).and_then(Entity::as_enemy).unwrap();
            assert!(!components.emitter.is_active());
            assert_eq!(components.physics.velocity, Vec2::ZERO);
            assert!(components.despawn.is_some());
            assert_eq!(
                journal.entries()[1].event,
                Event::EntityDied {
                    entity: enemy,
                    tag: EntityTag::Enemy,
                    killer: Some(EntityId::new(99)),
                }
            );
        }

        #[test]
        fn player_death_records_player_died() {
            let mut arena = Arena::new();
            let player = spawn_player(&mut arena);
            let mut journal = EventJournal::new();
            resolve_in_place(
                &mut arena,
                &mut journal,
                vec![Modifier::Kill { target: player, source: None }],
            );
            assert_eq!(journal.count_matching(|e| *e == Event::PlayerDied { player }), 1);
        }

        #[test]
        fn kill_twice_reports_once() {
            let mut arena = Arena::new();
            let enemy = spawn_enemy(&mut arena);
            let mut journal = EventJournal::new();
            resolve_in_place(
                &mut arena,
                &mut journal,
                vec![
                    Modifier::Kill { target: enemy, source: None },
                    Modifier::Kill { target: enemy, source: None },
                    damage(enemy, 100.0, true),
                ],
            );
            assert_eq!(journal.len(), 1);
        }
    }

    mod healing_tests {
        use super::*;

        #[test]
        fn healing_capped_at_max() {
            let mut arena = Arena::new();
            let player = spawn_player(&mut arena);
            let mut journal = EventJournal::new();
            resolve_in_place(
                &mut arena,
                &mut journal,
                vec![
                    damage(player, 30.0, true),
                    Modifier::ApplyHealing { target: player, amount: 50.0 },
                ],
            );
            assert!((health_of(&arena, player) - 100.0).abs() < f32::EPSILON);
        }
    }

    mod status_flag_tests {
        use super::*;

        #[test]
        fn invincible_blocks_damage_until_cleared() {
            let mut arena = Arena::new();
            let enemy = spawn_enemy(&mut arena);
            let mut journal = EventJournal::new();
            resolve_in_place(
                &mut arena,
                &mut journal,
                vec![
                    Modifier::SetStatusFlag {
                        target: enemy,
                        flag: StatusFlags::INVINCIBLE,
                        value: true,
                    },
                    damage(enemy, 50.0, true),
                ],
            );
            assert!((health_of(&arena, enemy) - 100.0).abs() < f32::EPSILON);

            resolve_in_place(
                &mut arena,
                &mut journal,
                vec![
                    Modifier::SetStatusFlag {
                        target: enemy,
                        flag: StatusFlags::INVINCIBLE,
                        value: false,
                    },
                    damage(enemy, 50.0, true),
                ],
            );
            assert!((health_of(&arena, enemy) - 50.0).abs() < f32::EPSILON);
        }

        #[test]
        fn dead_flag_kills_and_revives() {
            let mut arena = Arena::new();
            let player = spawn_player(&mut arena);
            let mut journal = EventJournal::new();
            let set_dead = |value| Modifier::SetStatusFlag {
                target: player,
                flag: StatusFlags::DEAD,
                value,
            };
            resolve_in_place(&mut arena, &mut journal, vec![set_dead(true)]);
            assert!(arena.get(player).and_then(Entity::health).unwrap().is_dead());

            resolve_in_place(&mut arena, &mut journal, vec![set_dead(false)]);
            assert!((health_of(&arena, player) - 100.0).abs() < f32::EPSILON);
        }
    }

    mod output_filtering_tests {
        use super::*;

        #[test]
        fn ignores_command_outputs() {
            let mut arena = Arena::new();
            let enemy = spawn_enemy(&mut arena);
            let before = arena.clone();
            let envelope = make_envelope(
                Output::Command(Command::SetVelocity {
                    target: enemy,
                    velocity: Vec2::ZERO,
                }),
                enemy,
            );
            let mut journal = EventJournal::new();
            CombatResolver::new().resolve(&[&envelope], &before, &mut arena, &mut journal);
            assert_eq!(arena.get(enemy), before.get(enemy));
        }
    }
}
