//! Physics resolver for movement commands and motion integration.
//!
//! The `PhysicsResolver` handles:
//! - `SetVelocity` commands: Update a character's velocity
//! - Integration: `position += velocity * dt` for characters and waves
//! - Push glides: pushable boxes slide toward their destination
//! - Deflector anchoring: deflectors follow their owner's position
//!
//! # Fixed Timestep
//!
//! The default timestep is 1/60 seconds. The simulation builds its resolver
//! from [`SimConfig::dt`](crate::config::SimConfig::dt).

use glam::Vec2;

use crate::arena::Arena;
use crate::config::SimConfig;
use crate::entity::{Entity, EntityId, EntityInner};
use crate::geometry::heading_of;
use crate::journal::EventJournal;
use crate::output::{Command, OutputEnvelope, OutputKind};

use super::Resolver;

/// Fixed timestep for physics integration (1/60 second = ~16.67ms).
pub const FIXED_DT: f32 = 1.0 / 60.0;

/// Resolver for velocity commands and integration.
///
/// # Processing Order
///
/// 1. Apply all velocity changes from `SetVelocity` commands
/// 2. Integrate characters, waves, and push glides
/// 3. Re-anchor deflectors on their owners' new positions
/// 4. Re-sync the spatial index
///
/// # Example
///
/// ```
/// use ricochet_core::resolver::PhysicsResolver;
/// use ricochet_core::resolver::Resolver;
/// use ricochet_core::output::OutputKind;
///
/// let resolver = PhysicsResolver::new();
/// assert!(resolver.handles().contains(&OutputKind::Command));
/// ```
#[derive(Debug, Clone)]
pub struct PhysicsResolver {
    /// Fixed timestep for integration
    dt: f32,
    /// Fraction of a push glide completed per second
    push_speed: f32,
}

impl PhysicsResolver {
    /// Creates a new physics resolver with the default fixed timestep.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&SimConfig::default())
    }

    /// Creates a physics resolver with a custom timestep.
    ///
    /// Useful for testing or non-standard tick rates.
    #[must_use]
    pub fn with_dt(dt: f32) -> Self {
        Self { dt, ..Self::new() }
    }

    /// Creates a physics resolver from the simulation configuration.
    #[must_use]
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            dt: config.dt,
            push_speed: config.obstacle.push_speed,
        }
    }

    /// Returns the timestep used for integration.
    #[must_use]
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Applies a velocity change. Dead characters keep standing still.
    fn apply_set_velocity(next: &mut Arena, target: EntityId, velocity: Vec2) {
        let Some(entity) = next.get_mut(target) else {
            return;
        };
        if entity.health().is_some_and(|h| h.is_dead()) {
            return;
        }
        if let Some(physics) = entity.physics_mut() {
            physics.velocity = velocity;
        }
    }

    fn integrate(&self, next: &mut Arena) {
        let dt = self.dt;
        for entity in next.entities_sorted_mut() {
            match entity.inner_mut() {
                EntityInner::Player(c) => {
                    c.transform.position += c.physics.velocity * dt;
                    if c.physics.velocity != Vec2::ZERO {
                        c.transform.heading = heading_of(c.physics.velocity);
                    }
                }
                EntityInner::Enemy(c) => {
                    c.transform.position += c.physics.velocity * dt;
                    if c.physics.velocity != Vec2::ZERO {
                        c.transform.heading = heading_of(c.physics.velocity);
                    }
                }
                EntityInner::Ally(c) => {
                    c.transform.position += c.physics.velocity * dt;
                    if c.physics.velocity != Vec2::ZERO {
                        c.transform.heading = heading_of(c.physics.velocity);
                    }
                }
                EntityInner::Projectile(c) => {
                    c.transform.position += c.projectile.velocity() * dt;
                    c.transform.heading = c.projectile.heading();
                }
                EntityInner::Obstacle(c) => {
                    if let Some(push) = c.push.as_mut() {
                        let (position, done) = push.advance(self.push_speed, dt);
                        c.transform.position = position;
                        if done {
                            c.push = None;
                        }
                    }
                }
                EntityInner::Deflector(_) => {}
            }
        }
    }

    /// Places every deflector on its owner's orbit.
    fn anchor_deflectors(next: &mut Arena) {
        let placements: Vec<(EntityId, Vec2, f32)> = next
            .entities_sorted()
            .filter_map(|entity| {
                let d = entity.as_deflector()?;
                let owner = next.get(d.deflector.owner).map(|o| o.transform().position)?;
                Some((entity.id(), d.deflector.position_around(owner), d.deflector.facing()))
            })
            .collect();

        for (id, position, heading) in placements {
            if let Some(d) = next.get_mut(id).and_then(Entity::as_deflector_mut) {
                d.transform.position = position;
                d.transform.heading = heading;
            }
        }
    }
}

impl Default for PhysicsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for PhysicsResolver {
    fn name(&self) -> &'static str {
        "physics"
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
            if let Some(Command::SetVelocity { target, velocity }) = envelope.output().as_command() {
                Self::apply_set_velocity(next, *target, *velocity);
            }
        }

        self.integrate(next);
        Self::anchor_deflectors(next);
        next.update_spatial_all();
    }
}

// =============================================================================
// Tests
// =============================================================================
