//! Test helper functions for setting up simulations and reading state.

use glam::Vec2;

use crate::config::SimConfig;
use crate::deflector::DeflectorMode;
use crate::entity::{Entity, EntityId};
use crate::journal::JournalEntry;
use crate::output::Event;
use crate::simulation::Simulation;

/// Seed used by tests that do not care about the seed.
pub const TEST_SEED: u64 = 7;

/// Ticks per second at the default timestep.
pub const TICKS_PER_SECOND: u64 = 60;

/// Routes `tracing` output to the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a simulation with the default configuration.
pub fn new_sim() -> Simulation {
    new_sim_with(SimConfig::default())
}

/// Builds a simulation with `config`.
pub fn new_sim_with(config: SimConfig) -> Simulation {
    init_tracing();
    Simulation::new(config, TEST_SEED).expect("valid test config")
}

/// Runs the simulation for `seconds` of simulated time.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn run_seconds(sim: &mut Simulation, seconds: f32) {
    let ticks = (seconds * TICKS_PER_SECOND as f32).round() as u64;
    sim.run(ticks);
}

/// Spawns a player at `position` with one deflector, switched on in `mode`
/// by queued inputs.
pub fn spawn_guarded_player(sim: &mut Simulation, position: Vec2, mode: DeflectorMode) -> (EntityId, EntityId) {
    let player = sim.spawn_player(position);
    let deflector = sim.spawn_deflector(player).expect("player exists");
    sim.toggle_deflector(deflector);
    sim.set_deflector_mode(deflector, mode);
    (player, deflector)
}

/// Current health of a combat target.
pub fn health_of(sim: &Simulation, id: EntityId) -> Option<f32> {
    sim.arena().get(id).and_then(Entity::health).map(|h| h.current())
}

/// Returns `true` if the entity exists and has died.
pub fn is_dead(sim: &Simulation, id: EntityId) -> bool {
    sim.arena()
        .get(id)
        .and_then(Entity::health)
        .is_some_and(|h| h.is_dead())
}

/// Counts entries whose event satisfies `predicate`.
pub fn count_events(entries: &[JournalEntry], predicate: impl Fn(&Event) -> bool) -> usize {
    entries.iter().filter(|e| predicate(&e.event)).count()
}

/// Counts `EntityDied` events for `entity`.
pub fn deaths_of(entries: &[JournalEntry], entity: EntityId) -> usize {
    count_events(entries, |e| matches!(e, Event::EntityDied { entity: id, .. } if *id == entity))
}

/// Kills a combat target directly, bypassing the damage pipeline.
pub fn force_kill(sim: &mut Simulation, id: EntityId) {
    if let Some(health) = sim.arena_mut().get_mut(id).and_then(Entity::health_mut) {
        health.kill();
    }
}
