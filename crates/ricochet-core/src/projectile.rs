//! Projectile ("wave") state and collision response.
//!
//! A wave is a moving hazard with a fixed direction chosen at spawn. The kinds
//! differ only in how they respond to contacts, so the response table lives
//! here as a pure function over [`ProjectileState`] and [`Surface`]. The
//! projectile plugin detects contacts and turns the returned
//! [`ContactEffect`]s into outputs.
//!
//! # Contact Table
//!
//! | Kind | Deflector | Ally | Enemy | Player | Wall |
//! |------|-----------|------|-------|--------|------|
//! | Standard | reflect or destroy | pass | bounced only: damage, destroy | damage, destroy | reflect |
//! | Piercing | pass | pass | bounced only: damage, continue | damage, destroy | reflect, pass at limit |
//! | Earthquake (roll) | start roll | damage, destroy | pass | damage, destroy | destroy |
//! | Earthquake (pass) | pass | damage, destroy | kill, continue | damage, destroy | destroy |
//!
//! Boxes never change a wave's motion: pushable boxes are pushed and breakable
//! boxes are broken by every kind.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use ricochet_core::config::{DamagePolicy, EarthquakeVariant, ProjectileConfig};
//! use ricochet_core::entity::components::Faction;
//! use ricochet_core::projectile::{resolve_contact, ContactEffect, ProjectileKind, ProjectileState, Surface};
//!
//! let config = ProjectileConfig::default();
//! let wave = ProjectileState::new(ProjectileKind::Standard, &config, Vec2::X, Faction::Enemy, None);
//!
//! // A fresh standard wave passes harmlessly through enemies.
//! let effects = resolve_contact(&wave, &Surface::Enemy, &DamagePolicy::default(), EarthquakeVariant::RollOver);
//! assert!(effects.is_empty());
//! ```

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{DamagePolicy, EarthquakeVariant, ProjectileConfig};
use crate::deflector::DeflectorMode;
use crate::entity::components::{Faction, ObstacleKind};
use crate::entity::EntityId;
use crate::geometry::{heading_of, is_approaching, reflect};
use crate::timer::Timer;

// =============================================================================
// Projectile Kind
// =============================================================================

/// Collision-response variant of a wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Reflects off deflectors and walls; hurts enemies only after bouncing.
    Standard,
    /// Ignores deflectors; keeps going after hitting an enemy.
    Piercing,
    /// Rolls over or passes through deflectors; hurts allies.
    Earthquake,
}

impl ProjectileKind {
    /// All kinds, in cycle order.
    pub const ALL: [Self; 3] = [Self::Standard, Self::Piercing, Self::Earthquake];
}

impl fmt::Display for ProjectileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "Standard"),
            Self::Piercing => write!(f, "Piercing"),
            Self::Earthquake => write!(f, "Earthquake"),
        }
    }
}

/// Unit direction from `origin` toward `target`.
///
/// A missing target or a target on top of the origin degrades to `+X` with a
/// warning, so a misconfigured emitter still fires.
#[must_use]
pub fn aim_direction(origin: Vec2, target: Option<Vec2>) -> Vec2 {
    let Some(target) = target else {
        tracing::warn!(?origin, "no target to aim at, firing along +X");
        return Vec2::X;
    };
    let direction = (target - origin).normalize_or_zero();
    if direction == Vec2::ZERO {
        tracing::warn!(?origin, "target coincides with origin, firing along +X");
        Vec2::X
    } else {
        direction
    }
}

// =============================================================================
// Projectile State
// =============================================================================

/// Per-wave motion and collision state.
///
/// # Invariants
///
/// - `direction` is unit length
/// - `bounce_count <= bounce_limit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    /// Collision-response variant.
    pub kind: ProjectileKind,
    /// Side the wave currently belongs to. Deflector bounces hand it to the
    /// deflector owner's side.
    pub faction: Faction,
    /// Entity that fired the wave, if any.
    pub owner: Option<EntityId>,
    /// Unit direction of travel.
    pub direction: Vec2,
    /// Speed in world units per second.
    pub speed: f32,
    /// Remaining time before the wave expires.
    pub lifetime: Timer,
    /// Number of reflections so far.
    pub bounce_count: u32,
    /// Maximum number of reflections.
    pub bounce_limit: u32,
    /// Speed multiplier applied on every reflection.
    pub damping: f32,
    /// Whether the wave damages allies.
    pub can_hit_allies: bool,
    /// Collider radius; grows over the wave's life.
    pub radius: f32,
    /// Radius growth per second.
    pub growth_rate: f32,
    /// Roll animation started by a deflector contact.
    pub roll: Option<Timer>,
    /// Entities overlapped last tick. Contacts only trigger on entry.
    pub contacts: BTreeSet<EntityId>,
}

impl ProjectileState {
    /// Creates a wave of `kind` travelling along `direction`.
    ///
    /// Kind-specific speed, lifetime, bounce limit, and damping come from
    /// `config`. A zero direction degrades to `+X`.
    #[must_use]
    pub fn new(
        kind: ProjectileKind,
        config: &ProjectileConfig,
        direction: Vec2,
        faction: Faction,
        owner: Option<EntityId>,
    ) -> Self {
        let tuning = config.tuning(kind);
        let mut unit = direction.normalize_or_zero();
        if unit == Vec2::ZERO {
            tracing::warn!(%kind, "zero spawn direction, firing along +X");
            unit = Vec2::X;
        }
        Self {
            kind,
            faction,
            owner,
            direction: unit,
            speed: tuning.speed,
            lifetime: Timer::new(tuning.lifetime),
            bounce_count: 0,
            bounce_limit: tuning.bounce_limit,
            damping: tuning.damping,
            can_hit_allies: tuning.can_hit_allies,
            radius: config.radius,
            growth_rate: config.growth_rate,
            roll: None,
            contacts: BTreeSet::new(),
        }
    }

    /// Overrides the spawn speed.
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.max(0.0);
        self
    }

    /// Current velocity vector.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.direction * self.speed
    }

    /// Heading matching the direction of travel.
    #[must_use]
    pub fn heading(&self) -> f32 {
        heading_of(self.direction)
    }

    /// Returns `true` once the bounce limit is reached.
    #[must_use]
    pub const fn at_bounce_limit(&self) -> bool {
        self.bounce_count >= self.bounce_limit
    }

    /// Returns `true` if the wave has bounced at least once.
    #[must_use]
    pub const fn has_bounced(&self) -> bool {
        self.bounce_count > 0
    }

    /// Returns `true` while a roll animation is running.
    #[must_use]
    pub fn is_rolling(&self) -> bool {
        self.roll.is_some_and(|r| !r.is_finished())
    }

    /// Advances lifetime, growth, and roll.
    ///
    /// # Returns
    ///
    /// `true` if the wave's lifetime has run out.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.radius += self.growth_rate * dt;
        if let Some(roll) = self.roll.as_mut() {
            if roll.tick(dt) {
                self.roll = None;
            }
        }
        self.lifetime.tick(dt)
    }

    /// Applies a reflection: mirror about `normal`, damp speed, add an
    /// outward push, and count the bounce.
    ///
    /// Does nothing at the bounce limit.
    pub fn apply_reflection(&mut self, normal: Vec2, push: f32) {
        if self.at_bounce_limit() {
            return;
        }
        let mirrored = reflect(self.direction, normal) * self.speed * self.damping;
        let combined = (mirrored + normal * push).normalize_or_zero();
        self.direction = if combined == Vec2::ZERO { normal } else { combined };
        self.speed *= self.damping;
        self.bounce_count += 1;
    }
}

// =============================================================================
// Collision Response
// =============================================================================

/// What a wave touched, with the surface data the response needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surface {
    /// An active deflector.
    Deflector {
        /// Current deflector mode.
        mode: DeflectorMode,
        /// Outward contact normal.
        normal: Vec2,
        /// Outward push added to reflections.
        bounce_force: f32,
        /// Side of the deflector's owner.
        faction: Faction,
    },
    /// The player.
    Player,
    /// An ally.
    Ally,
    /// An enemy.
    Enemy,
    /// An obstacle.
    Obstacle {
        /// Obstacle kind.
        kind: ObstacleKind,
        /// Outward contact normal.
        normal: Vec2,
    },
}

/// One consequence of a contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEffect {
    /// Mirror the wave about `normal` and count a bounce.
    Reflect {
        /// Outward contact normal.
        normal: Vec2,
        /// Outward push added to the reflected direction.
        push: f32,
        /// Side the wave belongs to afterwards.
        faction: Faction,
    },
    /// Remove the wave.
    Destroy,
    /// Start the roll animation.
    StartRoll,
    /// Damage the touched target.
    Damage {
        /// Damage amount.
        amount: f32,
        /// Whether the hit ignores the target's post-hit window.
        bypass_window: bool,
    },
    /// Kill the touched target outright.
    Kill,
    /// Push the touched box along the wave's direction.
    Push,
    /// Break the touched box.
    Break,
    /// Purge every live wave.
    Purge,
}

/// Computes the effects of `state` touching `surface`.
///
/// Pure: the caller applies the effects. An empty result means the wave
/// passes through without consequence.
#[must_use]
pub fn resolve_contact(
    state: &ProjectileState,
    surface: &Surface,
    policy: &DamagePolicy,
    variant: EarthquakeVariant,
) -> Vec<ContactEffect> {
    use ContactEffect::{Damage, Destroy, Kill, Purge, StartRoll};

    match (*surface, state.kind) {
        (Surface::Deflector { mode, normal, bounce_force, faction }, ProjectileKind::Standard) => {
            match mode {
                DeflectorMode::Destroy => vec![Destroy],
                DeflectorMode::Reflect => reflect_or(state, normal, bounce_force, faction, true),
            }
        }
        (Surface::Deflector { .. }, ProjectileKind::Piercing) => Vec::new(),
        (Surface::Deflector { .. }, ProjectileKind::Earthquake) => match variant {
            EarthquakeVariant::RollOver if !state.is_rolling() => vec![StartRoll],
            _ => Vec::new(),
        },

        (Surface::Player, _) => {
            if state.faction == Faction::Player {
                return Vec::new();
            }
            let mut effects = vec![
                Damage {
                    amount: policy.player_hit,
                    bypass_window: false,
                },
                Destroy,
            ];
            if policy.purge_on_player_hit {
                effects.push(Purge);
            }
            effects
        }

        (Surface::Ally, _) => {
            if state.can_hit_allies {
                vec![
                    Damage {
                        amount: policy.ally_hit,
                        bypass_window: false,
                    },
                    Destroy,
                ]
            } else {
                Vec::new()
            }
        }

        (Surface::Enemy, ProjectileKind::Standard) => {
            if state.has_bounced() {
                vec![
                    Damage {
                        amount: policy.bounced_wave,
                        bypass_window: true,
                    },
                    Destroy,
                ]
            } else if policy.unbounced_waves_hurt_enemies {
                vec![
                    Damage {
                        amount: policy.normal_wave,
                        bypass_window: false,
                    },
                    Destroy,
                ]
            } else {
                Vec::new()
            }
        }
        (Surface::Enemy, ProjectileKind::Piercing) => {
            if state.has_bounced() {
                vec![Damage {
                    amount: policy.bounced_wave,
                    bypass_window: true,
                }]
            } else {
                Vec::new()
            }
        }
        (Surface::Enemy, ProjectileKind::Earthquake) => match variant {
            EarthquakeVariant::PassThrough => vec![Kill],
            EarthquakeVariant::RollOver => Vec::new(),
        },

        (Surface::Obstacle { kind: ObstacleKind::Pushable, .. }, _) => vec![ContactEffect::Push],
        (Surface::Obstacle { kind: ObstacleKind::Breakable, .. }, _) => vec![ContactEffect::Break],
        (Surface::Obstacle { kind: ObstacleKind::Wall, .. }, ProjectileKind::Earthquake) => {
            vec![Destroy]
        }
        (Surface::Obstacle { kind: ObstacleKind::Wall, normal }, kind) => {
            reflect_or(state, normal, 0.0, state.faction, kind == ProjectileKind::Standard)
        }
    }
}

/// Reflects if possible; at the limit either destroys or passes through.
fn reflect_or(
    state: &ProjectileState,
    normal: Vec2,
    push: f32,
    faction: Faction,
    destroy_at_limit: bool,
) -> Vec<ContactEffect> {
    if !is_approaching(state.direction, normal) {
        return Vec::new();
    }
    if state.at_bounce_limit() {
        return if destroy_at_limit {
            vec![ContactEffect::Destroy]
        } else {
            Vec::new()
        };
    }
    vec![ContactEffect::Reflect {
        normal,
        push,
        faction,
    }]
}
