//! Projectile contact plugin.
//!
//! Finds everything a wave newly overlaps this tick and folds the collision
//! table over those contacts in ID order. The plugin works on a local copy of
//! the wave so that a reflection earlier in the list is visible to later
//! contacts, then emits one final result:
//!
//! - `Command::DestroyProjectile` if any contact was terminal, otherwise
//! - `Command::RedirectProjectile` if the wave reflected, and
//! - `Command::SetContacts` whenever the overlap set changed.
//!
//! Contacts only trigger on entry: an entity that was already overlapped on
//! the previous tick is ignored. The firing entity is ignored until the wave
//! has bounced, so a wave never hits its emitter on the way out.
//!
//! # Outputs
//!
//! - Commands: the above plus `StartRoll`, `PushObstacle`, `BreakObstacle`,
//!   and `PurgeProjectiles`
//! - Modifiers: `ApplyDamage`, `Kill`
//! - Events: `ProjectileHit` for every contact that had consequences

use std::collections::BTreeSet;

use glam::Vec2;

use crate::config::{DamagePolicy, EarthquakeVariant, SimConfig};
use crate::entity::components::Faction;
use crate::entity::{Entity, EntityId, EntityTag};
use crate::geometry::contact_normal;
use crate::output::{Command, Event, Modifier, Output, OutputKind, PluginId};
use crate::plugin::{ComponentKind, Plugin, PluginContext, PluginDeclaration};
use crate::projectile::{resolve_contact, ContactEffect, ProjectileState, Surface};
use crate::world_view::WorldView;

/// Plugin that resolves wave contacts.
///
/// # Example
///
/// ```
/// use ricochet_core::config::SimConfig;
/// use ricochet_core::plugins::ProjectileContactPlugin;
/// use ricochet_core::plugin::Plugin;
///
/// let plugin = ProjectileContactPlugin::new(&SimConfig::default());
/// assert_eq!(plugin.declaration().id.as_str(), "projectile_contact");
/// ```
pub struct ProjectileContactPlugin {
    declaration: PluginDeclaration,
    policy: DamagePolicy,
    variant: EarthquakeVariant,
    min_push_speed: f32,
}

impl ProjectileContactPlugin {
    /// Creates a new `ProjectileContactPlugin` using the damage and obstacle
    /// rules from `config`.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            declaration: PluginDeclaration {
                id: PluginId::new("projectile_contact"),
                required_tags: vec![EntityTag::Projectile],
                reads: vec![
                    ComponentKind::Transform,
                    ComponentKind::Projectile,
                    ComponentKind::Health,
                    ComponentKind::Deflector,
                    ComponentKind::Obstacle,
                ],
                emits: vec![OutputKind::Command, OutputKind::Modifier, OutputKind::Event],
            },
            policy: config.damage.clone(),
            variant: config.projectile.earthquake_variant,
            min_push_speed: config.obstacle.min_push_speed,
        }
    }

    /// Surface data for `entity`, or `None` if the wave cannot interact with it.
    fn surface_for(view: &WorldView, entity: &Entity, wave_position: Vec2) -> Option<Surface> {
        let center = entity.transform().position;
        match entity.tag() {
            EntityTag::Deflector => {
                let deflector = view.get_deflector(entity.id())?;
                if !deflector.active {
                    return None;
                }
                let faction = view
                    .get_entity(deflector.owner)
                    .and_then(Entity::faction)
                    .unwrap_or(Faction::Player);
                Some(Surface::Deflector {
                    mode: deflector.mode,
                    normal: contact_normal(&entity.collider(), center, wave_position),
                    bounce_force: deflector.bounce_force,
                    faction,
                })
            }
            EntityTag::Player | EntityTag::Ally | EntityTag::Enemy => {
                if view.get_health(entity.id()).map_or(true, |h| h.is_dead()) {
                    return None;
                }
                Some(match entity.tag() {
                    EntityTag::Player => Surface::Player,
                    EntityTag::Ally => Surface::Ally,
                    _ => Surface::Enemy,
                })
            }
            EntityTag::Obstacle => {
                let obstacle = view.get_obstacle(entity.id())?;
                Some(Surface::Obstacle {
                    kind: obstacle.kind,
                    normal: contact_normal(&obstacle.shape, center, wave_position),
                })
            }
            EntityTag::Projectile => None,
        }
    }
}

impl Plugin for ProjectileContactPlugin {
    fn declaration(&self) -> &PluginDeclaration {
        &self.declaration
    }

    fn run(&self, ctx: &PluginContext, view: &WorldView) -> Vec<Output> {
        let mut outputs = vec![];

        let Some(wave) = view.get_projectile(ctx.entity_id) else {
            return outputs;
        };
        let Some(position) = view.get_transform(ctx.entity_id).map(|t| t.position) else {
            return outputs;
        };

        let mut state: ProjectileState = wave.clone();
        let mut overlaps = BTreeSet::new();
        let mut reflected = false;
        let mut destroyed = false;

        for id in view.query_touching(position, wave.radius) {
            if id == ctx.entity_id || (Some(id) == wave.owner && !wave.has_bounced()) {
                continue;
            }
            let Some(entity) = view.get_entity(id) else {
                continue;
            };
            if entity.tag() == EntityTag::Projectile
                || !entity
                    .collider()
                    .overlaps_circle(entity.transform().position, position, wave.radius)
            {
                continue;
            }
            overlaps.insert(id);
            if destroyed || wave.contacts.contains(&id) {
                continue;
            }

            let Some(surface) = Self::surface_for(view, entity, position) else {
                continue;
            };
            let effects = resolve_contact(&state, &surface, &self.policy, self.variant);
            if effects.is_empty() {
                continue;
            }

            tracing::debug!(wave = %ctx.entity_id, target = %id, kind = %state.kind, ?effects, "wave contact");
            outputs.push(Output::Event(Event::ProjectileHit {
                projectile: ctx.entity_id,
                target: id,
                kind: state.kind,
                bounce_count: state.bounce_count,
            }));

            for effect in effects {
                match effect {
                    ContactEffect::Reflect { normal, push, faction } => {
                        state.apply_reflection(normal, push);
                        state.faction = faction;
                        reflected = true;
                    }
                    ContactEffect::Destroy => destroyed = true,
                    ContactEffect::StartRoll => {
                        outputs.push(Output::Command(Command::StartRoll {
                            target: ctx.entity_id,
                        }));
                    }
                    ContactEffect::Damage { amount, bypass_window } => {
                        outputs.push(Output::Modifier(Modifier::ApplyDamage {
                            target: id,
                            source: Some(ctx.entity_id),
                            amount,
                            bypass_window,
                        }));
                    }
                    ContactEffect::Kill => {
                        outputs.push(Output::Modifier(Modifier::Kill {
                            target: id,
                            source: Some(ctx.entity_id),
                        }));
                    }
                    ContactEffect::Push => {
                        let resting = view.get_obstacle(id).is_some_and(|o| o.push.is_none());
                        if resting && state.speed > self.min_push_speed {
                            outputs.push(Output::Command(Command::PushObstacle {
                                target: id,
                                direction: state.direction,
                            }));
                        }
                    }
                    ContactEffect::Break => {
                        outputs.push(Output::Command(Command::BreakObstacle {
                            target: id,
                            source: ctx.entity_id,
                        }));
                    }
                    ContactEffect::Purge => {
                        outputs.push(Output::Command(Command::PurgeProjectiles {
                            source: ctx.entity_id,
                        }));
                    }
                }
            }
        }

        if destroyed {
            outputs.push(Output::Command(Command::DestroyProjectile {
                target: ctx.entity_id,
            }));
            return outputs;
        }
        if reflected {
            outputs.push(Output::Command(Command::RedirectProjectile {
                target: ctx.entity_id,
                direction: state.direction,
                speed: state.speed,
                bounce_count: state.bounce_count,
                faction: state.faction,
            }));
        }
        if overlaps != wave.contacts {
            outputs.push(Output::Command(Command::SetContacts {
                target: ctx.entity_id,
                contacts: overlaps,
            }));
        }

        outputs
    }
}

// =============================================================================
// Tests
// =============================================================================
