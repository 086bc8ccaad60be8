//! Player motion plugin.
//!
//! Converts the queued movement direction into a velocity, honoring an active
//! speed boost. A dead player stands still.
//!
//! # Outputs
//!
//! - `Command::SetVelocity`

use glam::Vec2;

use crate::entity::EntityTag;
use crate::output::{Command, Output, OutputKind, PluginId};
use crate::plugin::{ComponentKind, Plugin, PluginContext, PluginDeclaration};
use crate::world_view::WorldView;

/// Plugin that moves the player.
///
/// # Example
///
/// ```
/// use ricochet_core::plugins::PlayerMotionPlugin;
/// use ricochet_core::plugin::Plugin;
///
/// let plugin = PlayerMotionPlugin::new();
/// assert_eq!(plugin.declaration().id.as_str(), "player_motion");
/// ```
pub struct PlayerMotionPlugin {
    declaration: PluginDeclaration,
}

impl PlayerMotionPlugin {
    /// Creates a new `PlayerMotionPlugin`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            declaration: PluginDeclaration {
                id: PluginId::new("player_motion"),
                required_tags: vec![EntityTag::Player],
                reads: vec![ComponentKind::Player, ComponentKind::Physics],
                emits: vec![OutputKind::Command],
            },
        }
    }
}

impl Default for PlayerMotionPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PlayerMotionPlugin {
    fn declaration(&self) -> &PluginDeclaration {
        &self.declaration
    }

    fn run(&self, ctx: &PluginContext, view: &WorldView) -> Vec<Output> {
        let Some(player) = view.get_player(ctx.entity_id) else {
            return vec![];
        };

        let velocity = if player.health.is_dead() {
            Vec2::ZERO
        } else {
            player.move_direction.normalize_or_zero() * player.current_speed()
        };

        let unchanged = view
            .get_physics(ctx.entity_id)
            .is_some_and(|p| p.velocity == velocity);
        if unchanged {
            return vec![];
        }

        vec![Output::Command(Command::SetVelocity {
            target: ctx.entity_id,
            velocity,
        })]
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::config::{CombatConfig, PlayerConfig};
    use crate::entity::{Entity, EntityId, EntityInner, PlayerComponents};
    use crate::output::TraceId;
    use crate::timer::Timer;

    fn spawn_player(arena: &mut Arena, direction: Vec2) -> EntityId {
        let mut player = PlayerComponents::new(Vec2::ZERO, &CombatConfig::default(), &PlayerConfig::default());
        player.move_direction = direction;
        arena.spawn(EntityInner::Player(player))
    }

    fn run(arena: &Arena, id: EntityId) -> Vec<Output> {
        let plugin = PlayerMotionPlugin::new();
        let view = WorldView::for_plugin(arena, plugin.declaration(), arena.current_tick());
        let ctx = PluginContext {
            entity_id: id,
            tick: arena.current_tick(),
            trace_id: TraceId::new(0),
            dt: 1.0 / 60.0,
        };
        plugin.run(&ctx, &view)
    }

    fn velocity_of(outputs: &[Output]) -> Option<Vec2> {
        outputs.iter().find_map(|o| match o.as_command() {
            Some(Command::SetVelocity { velocity, .. }) => Some(*velocity),
            _ => None,
        })
    }

    #[test]
    fn declaration_targets_player() {
        let plugin = PlayerMotionPlugin::default();
        let decl = plugin.declaration();
        assert!(decl.supports_tag(EntityTag::Player));
        assert!(!decl.supports_tag(EntityTag::Enemy));
        assert!(decl.reads_component(ComponentKind::Player));
    }

    #[test]
    fn moves_at_base_speed() {
        let mut arena = Arena::new();
        let id = spawn_player(&mut arena, Vec2::new(3.0, 0.0));
        assert_eq!(velocity_of(&run(&arena, id)), Some(Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn boost_raises_speed() {
        let mut arena = Arena::new();
        let id = spawn_player(&mut arena, Vec2::Y);
        if let Some(player) = arena.get_mut(id).and_then(Entity::as_player_mut) {
            player.boost = Some(Timer::new(0.3));
        }
        assert_eq!(velocity_of(&run(&arena, id)), Some(Vec2::new(0.0, 15.0)));
    }

    #[test]
    fn idle_player_emits_nothing() {
        let mut arena = Arena::new();
        let id = spawn_player(&mut arena, Vec2::ZERO);
        assert!(run(&arena, id).is_empty());
    }

    #[test]
    fn dead_player_stops() {
        let mut arena = Arena::new();
        let id = spawn_player(&mut arena, Vec2::X);
        if let Some(entity) = arena.get_mut(id) {
            if let Some(physics) = entity.physics_mut() {
                physics.velocity = Vec2::X * 5.0;
            }
            if let Some(health) = entity.health_mut() {
                health.kill();
            }
        }
        assert_eq!(velocity_of(&run(&arena, id)), Some(Vec2::ZERO));
    }

    #[test]
    fn nonexistent_entity_is_ignored() {
        let arena = Arena::new();
        assert!(run(&arena, EntityId::new(999)).is_empty());
    }

    #[test]
    fn plugin_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PlayerMotionPlugin>();
    }
}
