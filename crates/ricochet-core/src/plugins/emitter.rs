//! Emitter plugin for enemy firing and roaming.
//!
//! Runs a copy of the enemy's [`EmitterState`](crate::emitter::EmitterState)
//! forward one tick and translates its actions into outputs. Shot directions
//! are resolved against the snapshot at the moment each shot fires, so a wave
//! flies toward where its target was, not where it will be.
//!
//! Randomness (roam points, random kinds) comes from a `ChaCha8Rng` seeded
//! with the plugin instance's trace ID, which is itself derived from the
//! master seed, tick, and entity.
//!
//! # Outputs
//!
//! - `Command::SpawnProjectile`: one per shot
//! - `Command::SetVelocity`: AI steering
//! - `Command::SyncEmitter`: the advanced emitter state

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::emitter::{EmitterAction, TargetSpec};
use crate::entity::components::Faction;
use crate::entity::{EntityId, EntityTag};
use crate::output::{Command, Output, OutputKind, PluginId};
use crate::plugin::{ComponentKind, Plugin, PluginContext, PluginDeclaration};
use crate::projectile::aim_direction;
use crate::world_view::WorldView;

/// Plugin that drives enemy emitters.
///
/// # Example
///
/// ```
/// use ricochet_core::plugins::EmitterPlugin;
/// use ricochet_core::plugin::Plugin;
///
/// let plugin = EmitterPlugin::new();
/// assert_eq!(plugin.declaration().id.as_str(), "emitter");
/// ```
pub struct EmitterPlugin {
    declaration: PluginDeclaration,
}

impl EmitterPlugin {
    /// Creates a new `EmitterPlugin`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            declaration: PluginDeclaration {
                id: PluginId::new("emitter"),
                required_tags: vec![EntityTag::Enemy],
                reads: vec![
                    ComponentKind::Transform,
                    ComponentKind::Emitter,
                    ComponentKind::Health,
                ],
                emits: vec![OutputKind::Command],
            },
        }
    }

    fn resolve_target(view: &WorldView, source: EntityId, origin: Vec2, spec: TargetSpec) -> Option<Vec2> {
        let id = match spec {
            TargetSpec::Point(point) => return Some(point),
            TargetSpec::Player => view.query_by_tag(EntityTag::Player).next()?,
            TargetSpec::NearestOf(faction) => view.nearest_target(origin, faction, Some(source))?,
        };
        view.get_transform(id).map(|t| t.position)
    }
}

impl Default for EmitterPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for EmitterPlugin {
    fn declaration(&self) -> &PluginDeclaration {
        &self.declaration
    }

    fn run(&self, ctx: &PluginContext, view: &WorldView) -> Vec<Output> {
        let mut outputs = vec![];

        let Some(emitter) = view.get_emitter(ctx.entity_id) else {
            return outputs;
        };
        if view.get_health(ctx.entity_id).is_some_and(|h| h.is_dead()) {
            return outputs;
        }
        let Some(origin) = view.get_transform(ctx.entity_id).map(|t| t.position) else {
            return outputs;
        };

        let mut rng = ChaCha8Rng::seed_from_u64(ctx.trace_id.as_u64());
        let mut next = emitter.clone();
        let actions = next.advance(ctx.dt, origin, &mut rng);

        for action in actions {
            match action {
                EmitterAction::Fire { kind, target, speed } => {
                    let aim = Self::resolve_target(view, ctx.entity_id, origin, target);
                    outputs.push(Output::Command(Command::SpawnProjectile {
                        source: ctx.entity_id,
                        kind,
                        origin,
                        direction: aim_direction(origin, aim),
                        faction: Faction::Enemy,
                        speed,
                    }));
                }
                EmitterAction::Steer { velocity } => {
                    outputs.push(Output::Command(Command::SetVelocity {
                        target: ctx.entity_id,
                        velocity,
                    }));
                }
            }
        }

        if next != *emitter {
            outputs.push(Output::Command(Command::SyncEmitter {
                target: ctx.entity_id,
                emitter: Box::new(next),
            }));
        }

        outputs
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::config::{CombatConfig, EmitterConfig, PlayerConfig};
    use crate::emitter::EmitterMode;
    use crate::entity::{AllyComponents, EnemyComponents, Entity, EntityInner, PlayerComponents};
    use crate::output::TraceId;
    use crate::projectile::ProjectileKind;

    const DT: f32 = 1.0 / 60.0;

    fn spawn_enemy(arena: &mut Arena, position: Vec2, mode: EmitterMode) -> EntityId {
        arena.spawn(EntityInner::Enemy(EnemyComponents::new(
            position,
            mode,
            &CombatConfig::default(),
            &EmitterConfig::default(),
        )))
    }

    fn spawn_player(arena: &mut Arena, position: Vec2) -> EntityId {
        arena.spawn(EntityInner::Player(PlayerComponents::new(
            position,
            &CombatConfig::default(),
            &PlayerConfig::default(),
        )))
    }

    fn with_emitter(arena: &mut Arena, id: EntityId, f: impl FnOnce(&mut crate::emitter::EmitterState)) {
        if let Some(enemy) = arena.get_mut(id).and_then(Entity::as_enemy_mut) {
            f(&mut enemy.emitter);
        }
    }

    fn run(arena: &Arena, id: EntityId, seed: u64) -> Vec<Output> {
        let plugin = EmitterPlugin::new();
        let view = WorldView::for_plugin(arena, plugin.declaration(), arena.current_tick());
        let ctx = PluginContext {
            entity_id: id,
            tick: arena.current_tick(),
            trace_id: TraceId::new(seed),
            dt: DT,
        };
        plugin.run(&ctx, &view)
    }

    fn spawns(outputs: &[Output]) -> Vec<(ProjectileKind, Vec2)> {
        outputs
            .iter()
            .filter_map(|o| match o.as_command() {
                Some(Command::SpawnProjectile { kind, direction, .. }) => Some((*kind, *direction)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn declaration_targets_enemies() {
        let plugin = EmitterPlugin::default();
        let decl = plugin.declaration();
        assert!(decl.supports_tag(EntityTag::Enemy));
        assert!(decl.reads_component(ComponentKind::Emitter));
        assert!(decl.emits_output(OutputKind::Command));
    }

    #[test]
    fn inactive_passive_emitter_is_silent() {
        let mut arena = Arena::new();
        spawn_player(&mut arena, Vec2::new(10.0, 0.0));
        let enemy = spawn_enemy(&mut arena, Vec2::ZERO, EmitterMode::Passive);
        assert!(run(&arena, enemy, 1).is_empty());
    }

    #[test]
    fn burst_fires_at_player() {
        let mut arena = Arena::new();
        spawn_player(&mut arena, Vec2::new(0.0, 10.0));
        let enemy = spawn_enemy(&mut arena, Vec2::ZERO, EmitterMode::Passive);
        with_emitter(&mut arena, enemy, |e| {
            e.activate();
            e.start_burst();
        });

        let outputs = run(&arena, enemy, 1);
        let shots = spawns(&outputs);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].0, ProjectileKind::Standard);
        assert!((shots[0].1 - Vec2::Y).length() < 1e-5);
        assert!(outputs
            .iter()
            .any(|o| matches!(o.as_command(), Some(Command::SyncEmitter { .. }))));
    }

    #[test]
    fn nearest_of_override_aims_at_ally() {
        let mut arena = Arena::new();
        spawn_player(&mut arena, Vec2::new(0.0, 50.0));
        arena.spawn(EntityInner::Ally(AllyComponents::new(
            Vec2::new(-4.0, 0.0),
            &CombatConfig::default(),
        )));
        let enemy = spawn_enemy(&mut arena, Vec2::ZERO, EmitterMode::Passive);
        with_emitter(&mut arena, enemy, |e| {
            e.overrides.insert(ProjectileKind::Standard, TargetSpec::NearestOf(Faction::Player));
            e.activate();
            e.start_burst();
        });

        let shots = spawns(&run(&arena, enemy, 1));
        assert!((shots[0].1 - Vec2::NEG_X).length() < 1e-5);
    }

    #[test]
    fn missing_player_fires_along_x() {
        let mut arena = Arena::new();
        let enemy = spawn_enemy(&mut arena, Vec2::ZERO, EmitterMode::Passive);
        with_emitter(&mut arena, enemy, |e| {
            e.activate();
            e.start_burst();
        });
        let shots = spawns(&run(&arena, enemy, 1));
        assert_eq!(shots[0].1, Vec2::X);
    }

    #[test]
    fn dead_enemy_does_nothing() {
        let mut arena = Arena::new();
        let enemy = spawn_enemy(&mut arena, Vec2::ZERO, EmitterMode::Ai);
        with_emitter(&mut arena, enemy, |e| e.activate());
        if let Some(health) = arena.get_mut(enemy).and_then(Entity::health_mut) {
            health.kill();
        }
        assert!(run(&arena, enemy, 1).is_empty());
    }

    #[test]
    fn ai_roaming_steers() {
        let mut arena = Arena::new();
        let enemy = spawn_enemy(&mut arena, Vec2::ZERO, EmitterMode::Ai);
        with_emitter(&mut arena, enemy, |e| e.activate());
        let outputs = run(&arena, enemy, 3);
        assert!(outputs
            .iter()
            .any(|o| matches!(o.as_command(), Some(Command::SetVelocity { .. }))));
    }

    #[test]
    fn same_trace_id_same_outputs() {
        let mut arena = Arena::new();
        let enemy = spawn_enemy(&mut arena, Vec2::ZERO, EmitterMode::Ai);
        with_emitter(&mut arena, enemy, |e| e.activate());
        assert_eq!(run(&arena, enemy, 9), run(&arena, enemy, 9));
    }

    #[test]
    fn plugin_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EmitterPlugin>();
    }
}
