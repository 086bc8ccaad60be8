//! # Ricochet Core
//!
//! Projectile and encounter simulation core for the Ricochet arena shooter.
//!
//! This crate provides the deterministic combat simulation: waves that move,
//! bounce off deflectors and walls, pierce or roll through them, and damage
//! combat targets; emitters that spawn those waves; encounter gates that lock a
//! room until its enemies are defeated; and a stage sequence that moves the
//! player through a series of rooms.
//!
//! ## Architecture
//!
//! The simulation follows the Entity-Plugin-Resolver pattern:
//!
//! - **Entities**: Player, enemies, allies, projectiles, deflectors, obstacles
//! - **Plugins**: Read-only behavior (projectile collisions, emitter AI, player motion)
//! - **Resolvers**: State mutation (physics, projectiles, combat, timers, events)
//!
//! Encounter gates and the stage sequence are owned by the [`Simulation`] and run
//! after resolution, once per tick.
//!
//! ## Usage
//!
//! ```
//! use ricochet_core::simulation::Simulation;
//! use ricochet_core::config::SimConfig;
//! use glam::Vec2;
//!
//! let mut sim = Simulation::new(SimConfig::default(), 7).unwrap();
//! let player = sim.spawn_player(Vec2::ZERO);
//! sim.spawn_deflector(player).unwrap();
//!
//! for _ in 0..60 {
//!     sim.step();
//! }
//!
//! assert_eq!(sim.tick(), 60);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod combat;
pub mod config;
pub mod deflector;
pub mod emitter;
pub mod encounter;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod journal;
pub mod output;
pub mod plugin;
pub mod plugins;
pub mod progression;
pub mod projectile;
pub mod registry;
pub mod resolver;
pub mod simulation;
pub mod timer;
pub mod world_view;

pub use config::SimConfig;
pub use error::{ConfigError, ExitError, ProgressionError, SimError};
pub use simulation::Simulation;

#[cfg(test)]
mod tests;
