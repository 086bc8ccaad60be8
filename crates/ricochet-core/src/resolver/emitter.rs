//! Emitter resolver.
//!
//! Stores each enemy's advanced [`EmitterState`](crate::emitter::EmitterState).
//! Runs before the combat resolver, so an enemy killed this tick ends the tick
//! with a deactivated emitter even though its plugin already advanced it.

use crate::arena::Arena;
use crate::entity::Entity;
use crate::journal::EventJournal;
use crate::output::{Command, OutputEnvelope, OutputKind};

use super::Resolver;

/// Resolver for `SyncEmitter` commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitterResolver;

impl EmitterResolver {
    /// Creates a new emitter resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Resolver for EmitterResolver {
    fn name(&self) -> &'static str {
        "emitter"
    }

    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Command]
    }

    fn resolve(
        &self,
        outputs: &[&OutputEnvelope],
        _current: &Arena,
        next: &mut Arena,
        _journal: &mut EventJournal,
    ) {
        for envelope in outputs {
            if let Some(Command::SyncEmitter { target, emitter }) = envelope.output().as_command() {
                if let Some(enemy) = next.get_mut(*target).and_then(Entity::as_enemy_mut) {
                    enemy.emitter = (**emitter).clone();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::config::{CombatConfig, EmitterConfig};
    use crate::emitter::EmitterMode;
    use crate::entity::{AllyComponents, EnemyComponents, EntityId, EntityInner};
    use crate::output::Output;
    use crate::resolver::make_envelope;

    fn spawn_enemy(arena: &mut Arena) -> EntityId {
        arena.spawn(EntityInner::Enemy(EnemyComponents::new(
            Vec2::ZERO,
            EmitterMode::Passive,
            &CombatConfig::default(),
            &EmitterConfig::default(),
        )))
    }

    #[test]
    fn sync_replaces_emitter() {
        let mut current = Arena::new();
        let enemy = spawn_enemy(&mut current);
        let mut next = current.clone();

        let mut advanced = current
            .get(enemy)
            .and_then(Entity::as_enemy)
            .map(|e| e.emitter.clone())
            .unwrap();
        advanced.activate();

        let envelope = make_envelope(
            Output::Command(Command::SyncEmitter {
                target: enemy,
                emitter: Box::new(advanced),
            }),
            enemy,
        );
        EmitterResolver::new().resolve(&[&envelope], &current, &mut next, &mut EventJournal::new());

        assert!(next.get(enemy).and_then(Entity::as_enemy).unwrap().emitter.is_active());
    }

    #[test]
    fn sync_for_non_enemy_is_ignored() {
        let mut current = Arena::new();
        let ally = current.spawn(EntityInner::Ally(AllyComponents::new(Vec2::ZERO, &CombatConfig::default())));
        let enemy = spawn_enemy(&mut current);
        let mut next = current.clone();
        let emitter = current.get(enemy).and_then(Entity::as_enemy).map(|e| e.emitter.clone()).unwrap();

        let envelope = make_envelope(
            Output::Command(Command::SyncEmitter {
                target: ally,
                emitter: Box::new(emitter),
            }),
            enemy,
        );
        EmitterResolver::new().resolve(&[&envelope], &current, &mut next, &mut EventJournal::new());
        assert_eq!(next.get(ally), current.get(ally));
    }
}
