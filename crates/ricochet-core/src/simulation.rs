//! The tick loop and everything a host calls into.
//!
//! One [`Simulation::step`] is:
//!
//! 1. drain the input queue into the current arena;
//! 2. run every plugin bundle on the rayon pool against that arena, frozen;
//! 3. copy current into next and let each resolver apply its outputs to next;
//! 4. swap the two arenas;
//! 5. let encounter gates and the stage sequence react, then bump the tick.
//!
//! Two runs with the same seed, config and input sequence produce the same
//! arenas and the same journal. Outputs are put in a fixed order before
//! resolution, entities are walked by ID, and plugin RNGs are seeded from
//! hashes of the master seed.
//!
//! ```
//! use glam::Vec2;
//! use ricochet_core::config::SimConfig;
//! use ricochet_core::emitter::EmitterMode;
//! use ricochet_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimConfig::default(), 42).unwrap();
//! let player = sim.spawn_player(Vec2::ZERO);
//! let gate = sim.add_gate(Vec2::new(10.0, 0.0));
//! let enemy = sim.spawn_enemy(Vec2::new(10.0, 0.0), EmitterMode::Passive);
//! sim.add_gate_member(gate, enemy).unwrap();
//!
//! // The player stands within reach of the gate, so its battle starts.
//! for _ in 0..30 {
//!     sim.step();
//! }
//! assert!(sim.gate_diagnostics(gate).unwrap().battle_active);
//! assert_eq!(sim.player(), Some(player));
//! ```

use rayon::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::config::SimConfig;
use crate::deflector::DeflectorMode;
use crate::emitter::EmitterMode;
use crate::encounter::{Encounters, ExitId, ExitTransit, GateDiagnostics, GateId};
use crate::entity::{
    AllyComponents, DeflectorComponents, EnemyComponents, Entity, EntityId, EntityInner, EntityTag, Faction,
    ObstacleComponents, PlayerComponents, ProjectileComponents,
};
use crate::entity::components::ObstacleKind;
use crate::error::{SimError, SimResult};
use crate::geometry::Shape;
use crate::journal::{EventJournal, JournalEntry};
use crate::output::{Event, OutputEnvelope, PluginInstanceId, TraceId};
use crate::plugin::{PluginContext, PluginRegistry};
use crate::progression::{AdvanceOutcome, Stage, StageSequence};
use crate::projectile::{ProjectileKind, ProjectileState};
use crate::resolver::{default_pipeline, Resolver};
use crate::world_view::WorldView;

// =============================================================================
// Input
// =============================================================================

/// A discrete input signal, queued and applied at the start of the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Input {
    /// Set the player's movement direction.
    Move {
        /// Desired direction; normalized when applied.
        direction: Vec2,
    },
    /// Start a speed boost.
    Boost,
    /// Switch a deflector on or off.
    ToggleDeflector {
        /// The deflector.
        deflector: EntityId,
    },
    /// Change a deflector's mode.
    SetDeflectorMode {
        /// The deflector.
        deflector: EntityId,
        /// New mode.
        mode: DeflectorMode,
    },
    /// Turn a deflector around its owner by a scroll delta.
    RotateDeflector {
        /// The deflector.
        deflector: EntityId,
        /// Scroll units; one unit turns by the configured rotation speed.
        delta: f32,
    },
    /// Point a deflector at a world position.
    AimDeflector {
        /// The deflector.
        deflector: EntityId,
        /// Aim point.
        point: Vec2,
    },
    /// Start a burst on every active emitter.
    FireTestBurst,
}

// =============================================================================
// Simulation
// =============================================================================

/// One combat room with its gates, stages, input queue and journal.
///
/// Holds two arenas. Plugins read `current`; resolvers write `next`, which
/// starts each tick as a copy of `current`. The two trade places at the end of
/// resolution, so the allocation is reused.
pub struct Simulation {
    config: SimConfig,
    current: Arena,
    next: Arena,
    plugins: PluginRegistry,
    /// Applied in order; see [`default_pipeline`].
    resolvers: Vec<Box<dyn Resolver>>,
    encounters: Encounters,
    stages: StageSequence,
    journal: EventJournal,
    inputs: Vec<Input>,
    player: Option<EntityId>,
    master_seed: u64,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("current", &self.current)
            .field("plugins", &self.plugins)
            .field("resolvers", &self.resolvers.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("encounters", &self.encounters)
            .field("stages", &self.stages)
            .field("pending_events", &self.journal.len())
            .field("queued_inputs", &self.inputs.len())
            .field("player", &self.player)
            .field("master_seed", &self.master_seed)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a simulation at tick 0 with the default plugins and resolvers.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if `config` fails validation.
    ///
    /// # Example
    ///
    /// ```
    /// use ricochet_core::config::SimConfig;
    /// use ricochet_core::simulation::Simulation;
    ///
    /// let sim = Simulation::new(SimConfig::default(), 12345).unwrap();
    /// assert_eq!(sim.tick(), 0);
    /// assert_eq!(sim.seed(), 12345);
    ///
    /// let bad = SimConfig { dt: 0.0, ..SimConfig::default() };
    /// assert!(Simulation::new(bad, 1).is_err());
    /// ```
    pub fn new(config: SimConfig, seed: u64) -> SimResult<Self> {
        config.validate()?;
        tracing::debug!(seed, dt = config.dt, "simulation created");
        Ok(Self {
            current: Arena::new(),
            next: Arena::new(),
            plugins: PluginRegistry::default_bundles(&config),
            resolvers: default_pipeline(&config),
            encounters: Encounters::new(&config.encounter),
            stages: StageSequence::new(&config.progression, Vec::new()),
            journal: EventJournal::new(),
            inputs: Vec::new(),
            player: None,
            master_seed: seed,
            config,
        })
    }

    // =========================================================================
    // Tick loop
    // =========================================================================

    /// Advances the room by one fixed step of `config.dt` seconds.
    ///
    /// Inputs queued since the previous step take effect before any plugin
    /// runs. Events produced along the way land in the journal; drain them
    /// with [`take_events`](Self::take_events).
    pub fn step(&mut self) {
        let tick = self.current.current_tick();
        self.apply_inputs();

        let outputs = self.run_plugins(tick);

        self.next.clone_from(&self.current);
        for resolver in &self.resolvers {
            let handled = resolver.handles();
            let routed: Vec<&OutputEnvelope> = outputs
                .iter()
                .filter(|o| handled.contains(&o.kind()))
                .collect();
            resolver.resolve(&routed, &self.current, &mut self.next, &mut self.journal);
        }
        std::mem::swap(&mut self.current, &mut self.next);

        self.direct();
        self.current.advance_tick();
        tracing::trace!(tick, outputs = outputs.len(), live_waves = self.current.registry().live_count(), "step");
    }

    /// Runs `ticks` steps.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Runs every bundle against the frozen arena. The result is ordered by
    /// entity, then plugin name, then position in the plugin's result list.
    fn run_plugins(&self, tick: u64) -> Vec<OutputEnvelope> {
        let jobs: Vec<_> = self
            .current
            .entities_sorted()
            .flat_map(|entity| {
                self.plugins
                    .plugins_for(entity.tag())
                    .iter()
                    .enumerate()
                    .map(move |(idx, plugin)| (entity.id(), idx, Arc::clone(plugin)))
            })
            .collect();

        let dt = self.config.dt;
        let mut envelopes: Vec<OutputEnvelope> = jobs
            .par_iter()
            .flat_map_iter(|(entity_id, slot, plugin)| {
                let decl = plugin.declaration();
                let trace_id = self.generate_trace_id(tick, entity_id.as_u64(), *slot as u64);
                let ctx = PluginContext {
                    entity_id: *entity_id,
                    tick,
                    trace_id,
                    dt,
                };
                let source = PluginInstanceId::new(*entity_id, decl.id.clone());
                plugin
                    .run(&ctx, &WorldView::for_plugin(&self.current, decl, tick))
                    .into_iter()
                    .zip(0u32..)
                    .map(move |(output, seq)| OutputEnvelope::new(output, source.clone(), trace_id, tick, seq))
            })
            .collect();

        envelopes.sort_by(|a, b| {
            let (sa, sb) = (a.source(), b.source());
            (sa.entity_id(), sa.plugin_id(), a.sequence()).cmp(&(sb.entity_id(), sb.plugin_id(), b.sequence()))
        });
        envelopes
    }

    /// Hash of (seed, tick, entity, plugin slot).
    fn generate_trace_id(&self, tick: u64, entity: u64, plugin: u64) -> TraceId {
        let mut hasher = DefaultHasher::new();
        self.master_seed.hash(&mut hasher);
        tick.hash(&mut hasher);
        entity.hash(&mut hasher);
        plugin.hash(&mut hasher);
        TraceId::new(hasher.finish())
    }

    fn direct(&mut self) {
        let dt = self.config.dt;
        let player = self.player_position();
        self.encounters
            .update(&mut self.current, player, dt, &mut self.journal);
        if let Some(AdvanceOutcome::Advanced(_)) =
            self.stages
                .update(dt, &mut self.encounters, &self.current, &mut self.journal)
        {
            self.place_player_at_stage();
        }
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    fn apply_inputs(&mut self) {
        let tick = self.current.current_tick();
        for input in std::mem::take(&mut self.inputs) {
            match input {
                Input::Move { direction } => {
                    if let Some(p) = self.player_components_mut() {
                        p.move_direction = direction.normalize_or_zero();
                    }
                }
                Input::Boost => self.apply_boost(tick),
                Input::ToggleDeflector { deflector } => self.apply_toggle(deflector, tick),
                Input::SetDeflectorMode { deflector, mode } => {
                    let Some(d) = self.deflector_mut(deflector) else {
                        continue;
                    };
                    if d.deflector.mode != mode {
                        d.deflector.mode = mode;
                        self.journal
                            .record(tick, Event::DeflectorModeChanged { deflector, mode });
                    }
                }
                Input::RotateDeflector { deflector, delta } => {
                    if let Some(d) = self.deflector_mut(deflector) {
                        d.deflector.rotate(delta);
                    }
                    self.reanchor_deflector(deflector);
                }
                Input::AimDeflector { deflector, point } => {
                    let owner = self
                        .current
                        .get(deflector)
                        .and_then(Entity::as_deflector)
                        .and_then(|d| self.current.get(d.deflector.owner))
                        .map(|o| o.transform().position);
                    match (owner, self.deflector_mut(deflector)) {
                        (Some(owner), Some(d)) => d.deflector.aim_at(owner, point),
                        (None, Some(_)) => tracing::warn!(%deflector, "cannot aim deflector without owner"),
                        _ => {}
                    }
                    self.reanchor_deflector(deflector);
                }
                Input::FireTestBurst => {
                    let mut started = 0;
                    for entity in self.current.entities_sorted_mut() {
                        if !entity.is_alive() {
                            continue;
                        }
                        if let Some(enemy) = entity.as_enemy_mut() {
                            started += usize::from(enemy.emitter.start_burst());
                        }
                    }
                    tracing::debug!(tick, started, "test burst");
                }
            }
        }
    }

    fn apply_boost(&mut self, tick: u64) {
        let Some(player) = self.player else {
            tracing::warn!("boost requested without a player");
            return;
        };
        let duration = self.config.player.boost_duration;
        let Some(p) = self.player_components_mut() else {
            return;
        };
        if p.health.is_dead() || p.boost.is_some() {
            return;
        }
        p.boost = Some(crate::timer::Timer::new(duration));
        self.journal.record(tick, Event::BoostStarted { player });
    }

    fn apply_toggle(&mut self, deflector: EntityId, tick: u64) {
        let Some(d) = self.current.get(deflector).and_then(Entity::as_deflector) else {
            tracing::warn!(%deflector, "cannot toggle unknown deflector");
            return;
        };
        let turning_on = !d.deflector.active;
        let drained = self
            .current
            .get(d.deflector.owner)
            .and_then(Entity::as_player)
            .is_some_and(|p| p.energy.is_empty());
        if turning_on && drained {
            tracing::debug!(%deflector, "toggle refused, no energy");
            return;
        }
        if let Some(d) = self.deflector_mut(deflector) {
            d.deflector.active = turning_on;
            self.journal.record(
                tick,
                Event::DeflectorToggled {
                    deflector,
                    active: turning_on,
                },
            );
        }
    }

    fn deflector_mut(&mut self, id: EntityId) -> Option<&mut DeflectorComponents> {
        let d = self.current.get_mut(id).and_then(Entity::as_deflector_mut);
        if d.is_none() {
            tracing::warn!(deflector = %id, "unknown deflector");
        }
        d
    }

    fn player_components_mut(&mut self) -> Option<&mut PlayerComponents> {
        let id = self.player?;
        self.current.get_mut(id).and_then(Entity::as_player_mut)
    }

    /// Queues a movement direction for the player.
    pub fn set_move_direction(&mut self, direction: Vec2) {
        self.inputs.push(Input::Move { direction });
    }

    /// Queues a speed boost. Ignored while a boost is running.
    pub fn request_boost(&mut self) {
        self.inputs.push(Input::Boost);
    }

    /// Queues a deflector toggle. Switching on with no energy is refused.
    pub fn toggle_deflector(&mut self, deflector: EntityId) {
        self.inputs.push(Input::ToggleDeflector { deflector });
    }

    /// Queues a deflector mode change.
    pub fn set_deflector_mode(&mut self, deflector: EntityId, mode: DeflectorMode) {
        self.inputs.push(Input::SetDeflectorMode { deflector, mode });
    }

    /// Queues a deflector rotation by a scroll delta.
    pub fn rotate_deflector(&mut self, deflector: EntityId, delta: f32) {
        self.inputs.push(Input::RotateDeflector { deflector, delta });
    }

    /// Queues pointing a deflector at `point`.
    pub fn aim_deflector(&mut self, deflector: EntityId, point: Vec2) {
        self.inputs.push(Input::AimDeflector { deflector, point });
    }

    /// Queues a burst on every active emitter.
    pub fn fire_test_burst(&mut self) {
        self.inputs.push(Input::FireTestBurst);
    }

    /// Queues an arbitrary input.
    pub fn push_input(&mut self, input: Input) {
        self.inputs.push(input);
    }

    // =========================================================================
    // Spawning
    // =========================================================================

    /// Spawns the player. A simulation tracks one player; spawning another
    /// replaces the tracked one.
    pub fn spawn_player(&mut self, position: Vec2) -> EntityId {
        let id = self.current.spawn(EntityInner::Player(PlayerComponents::new(
            position,
            &self.config.combat,
            &self.config.player,
        )));
        if let Some(previous) = self.player.replace(id) {
            tracing::warn!(%previous, player = %id, "replacing tracked player");
        }
        id
    }

    /// Spawns an enemy with an inactive emitter.
    pub fn spawn_enemy(&mut self, position: Vec2, mode: EmitterMode) -> EntityId {
        self.current.spawn(EntityInner::Enemy(EnemyComponents::new(
            position,
            mode,
            &self.config.combat,
            &self.config.emitter,
        )))
    }

    /// Spawns an ally.
    pub fn spawn_ally(&mut self, position: Vec2) -> EntityId {
        self.current
            .spawn(EntityInner::Ally(AllyComponents::new(position, &self.config.combat)))
    }

    /// Spawns a deflector orbiting `owner`.
    ///
    /// # Errors
    ///
    /// - [`SimError::UnknownEntity`] if `owner` does not exist
    /// - [`SimError::WrongEntityKind`] if `owner` is not the player
    pub fn spawn_deflector(&mut self, owner: EntityId) -> SimResult<EntityId> {
        let entity = self.current.get(owner).ok_or(SimError::UnknownEntity(owner))?;
        if entity.tag() != EntityTag::Player {
            return Err(SimError::WrongEntityKind {
                id: owner,
                expected: "player",
            });
        }
        let position = entity.transform().position;
        Ok(self.current.spawn(EntityInner::Deflector(DeflectorComponents::new(
            owner,
            position,
            &self.config.deflector,
        ))))
    }

    /// Spawns a wall or box.
    pub fn spawn_obstacle(&mut self, position: Vec2, shape: Shape, kind: ObstacleKind) -> EntityId {
        self.current
            .spawn(EntityInner::Obstacle(ObstacleComponents::new(position, shape, kind)))
    }

    /// Spawns a wave and registers it as live.
    ///
    /// The direction is fixed at spawn; a zero direction fires along +X.
    pub fn spawn_projectile(
        &mut self,
        kind: ProjectileKind,
        origin: Vec2,
        direction: Vec2,
        faction: Faction,
        owner: Option<EntityId>,
    ) -> EntityId {
        let state = ProjectileState::new(kind, &self.config.projectile, direction, faction, owner);
        let id = self
            .current
            .spawn(EntityInner::Projectile(ProjectileComponents::new(origin, state)));
        self.journal.record(
            self.current.current_tick(),
            Event::ProjectileFired {
                projectile: id,
                source: owner,
                kind,
            },
        );
        id
    }

    /// Removes an entity from the arena and from any gate it belonged to.
    ///
    /// # Returns
    ///
    /// `true` if the entity existed.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        self.encounters.forget_member(id);
        if self.player == Some(id) {
            self.player = None;
        }
        self.current.despawn(id).is_some()
    }

    // =========================================================================
    // Encounters
    // =========================================================================

    /// Adds an armed encounter gate anchored at `anchor`.
    pub fn add_gate(&mut self, anchor: Vec2) -> GateId {
        self.encounters.add_gate(anchor)
    }

    /// Makes `enemy` a member of `gate`. Joining a gate that is already in
    /// battle activates the enemy's emitter.
    ///
    /// # Errors
    ///
    /// - [`SimError::UnknownGate`] if the gate does not exist
    /// - [`SimError::UnknownEntity`] if the enemy does not exist
    /// - [`SimError::WrongEntityKind`] if `enemy` is not an enemy
    pub fn add_gate_member(&mut self, gate: GateId, enemy: EntityId) -> SimResult<()> {
        let in_battle = self
            .encounters
            .gate(gate)
            .ok_or(SimError::UnknownGate(gate))?
            .is_battle_active();
        let entity = self
            .current
            .get_mut(enemy)
            .ok_or(SimError::UnknownEntity(enemy))?;
        let alive = entity.is_alive();
        let components = entity.as_enemy_mut().ok_or(SimError::WrongEntityKind {
            id: enemy,
            expected: "enemy",
        })?;
        components.gate = Some(gate);
        if in_battle && alive {
            components.emitter.activate();
        }
        self.encounters.add_member(gate, enemy)
    }

    /// Adds an unpaired exit at `position`, optionally owned by `gate`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownGate`] if `gate` does not exist.
    pub fn add_exit(&mut self, position: Vec2, gate: Option<GateId>) -> SimResult<ExitId> {
        self.encounters.add_exit(position, gate)
    }

    /// Pairs two exits.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Exit`] if either exit is unknown or `a == b`.
    pub fn link_exits(&mut self, a: ExitId, b: ExitId) -> SimResult<()> {
        Ok(self.encounters.link(a, b)?)
    }

    /// Mutable access to the encounter director for exit and gate setup.
    pub fn encounters_mut(&mut self) -> &mut Encounters {
        &mut self.encounters
    }

    /// Moves the player through `exit` to its partner.
    ///
    /// Takes effect immediately: the player is placed at the partner's
    /// arrival point, [`Event::ExitUsed`] is recorded, and the arrival gate
    /// starts its battle if it has not been cleared.
    ///
    /// # Errors
    ///
    /// - [`SimError::NoPlayer`] if there is no living player
    /// - [`SimError::Exit`] if the exit refuses
    pub fn use_exit(&mut self, exit: ExitId) -> SimResult<ExitTransit> {
        let player = self
            .player
            .filter(|id| self.current.get(*id).is_some_and(Entity::is_alive))
            .ok_or(SimError::NoPlayer)?;
        let transit = self.encounters.try_use_exit(exit)?;

        self.move_player(player, transit.destination);
        let tick = self.current.current_tick();
        tracing::info!(tick, from = %transit.from, to = %transit.to, "player used exit");
        self.journal.record(
            tick,
            Event::ExitUsed {
                exit: transit.from,
                destination: transit.to,
                player,
            },
        );
        self.encounters
            .on_player_arrived(&transit, &mut self.current, &mut self.journal);
        Ok(transit)
    }

    /// Forces a gate into the cleared state.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownGate`] if the gate does not exist.
    pub fn set_gate_cleared(&mut self, gate: GateId) -> SimResult<bool> {
        if self.encounters.gate(gate).is_none() {
            return Err(SimError::UnknownGate(gate));
        }
        Ok(self
            .encounters
            .set_cleared(gate, &mut self.current, &mut self.journal))
    }

    /// Resets a gate to not cleared, inactive, unlocked, and armed.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownGate`] if the gate does not exist.
    pub fn reset_gate(&mut self, gate: GateId) -> SimResult<()> {
        if self.encounters.reset(gate, &mut self.current, &mut self.journal) {
            Ok(())
        } else {
            Err(SimError::UnknownGate(gate))
        }
    }

    /// Diagnostics snapshot of a gate.
    #[must_use]
    pub fn gate_diagnostics(&self, gate: GateId) -> Option<GateDiagnostics> {
        self.encounters.diagnostics(gate, &self.current)
    }

    // =========================================================================
    // Stages
    // =========================================================================

    /// Replaces the stage sequence and activates its first stage.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownGate`] if a stage names a gate that does
    /// not exist.
    pub fn set_stages(&mut self, stages: Vec<Stage>) -> SimResult<()> {
        if let Some(gate) = stages
            .iter()
            .filter_map(|s| s.gate)
            .find(|g| self.encounters.gate(*g).is_none())
        {
            return Err(SimError::UnknownGate(gate));
        }
        let empty = stages.is_empty();
        self.stages = StageSequence::new(&self.config.progression, stages);
        if !empty {
            self.stages
                .go_to(0, &mut self.encounters, &self.current, &mut self.journal)?;
            self.place_player_at_stage();
        }
        Ok(())
    }

    /// Advances past the active stage.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Progression`] if the sequence is empty or the
    /// active stage's gate is not cleared.
    pub fn advance(&mut self) -> SimResult<AdvanceOutcome> {
        let outcome = self
            .stages
            .advance(&mut self.encounters, &self.current, &mut self.journal)?;
        if matches!(outcome, AdvanceOutcome::Advanced(_)) {
            self.place_player_at_stage();
        }
        Ok(outcome)
    }

    /// Activates stage `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Progression`] if `index` is out of range.
    pub fn go_to_stage(&mut self, index: usize) -> SimResult<()> {
        self.stages
            .go_to(index, &mut self.encounters, &self.current, &mut self.journal)?;
        self.place_player_at_stage();
        Ok(())
    }

    /// Resets and re-activates the active stage.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Progression`] if the sequence is empty.
    pub fn restart_stage(&mut self) -> SimResult<()> {
        self.stages
            .restart_current(&mut self.encounters, &mut self.current, &mut self.journal)?;
        self.place_player_at_stage();
        Ok(())
    }

    /// Resets every stage's gate and returns to the first stage, as when a
    /// run starts over.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Progression`] if the sequence is empty.
    pub fn reset_stages(&mut self) -> SimResult<()> {
        self.stages
            .reset_all(&mut self.encounters, &mut self.current, &mut self.journal)?;
        self.place_player_at_stage();
        Ok(())
    }

    /// The stage sequence.
    #[must_use]
    pub fn stages(&self) -> &StageSequence {
        &self.stages
    }

    fn place_player_at_stage(&mut self) {
        let Some(spawn) = self.stages.current_stage().and_then(|s| s.spawn_point) else {
            return;
        };
        match self.player {
            Some(player) => self.move_player(player, spawn),
            None => tracing::warn!(stage = self.stages.current(), "no player to place at stage spawn"),
        }
    }

    /// Teleports the player and carries its deflectors along.
    fn move_player(&mut self, player: EntityId, position: Vec2) {
        if let Some(entity) = self.current.get_mut(player) {
            entity.transform_mut().position = position;
        }
        self.current.update_spatial(player);

        let deflectors: Vec<EntityId> = self
            .current
            .entities_with_tag(EntityTag::Deflector)
            .filter(|e| e.as_deflector().is_some_and(|d| d.deflector.owner == player))
            .map(Entity::id)
            .collect();
        for id in deflectors {
            self.reanchor_deflector(id);
        }
    }

    fn reanchor_deflector(&mut self, id: EntityId) {
        let Some(owner) = self
            .current
            .get(id)
            .and_then(Entity::as_deflector)
            .and_then(|d| self.current.get(d.deflector.owner))
            .map(|o| o.transform().position)
        else {
            return;
        };
        if let Some(d) = self.current.get_mut(id).and_then(Entity::as_deflector_mut) {
            d.transform.position = d.deflector.position_around(owner);
            d.transform.heading = d.deflector.facing();
        }
        self.current.update_spatial(id);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Removes and returns every event recorded since the last call.
    pub fn take_events(&mut self) -> Vec<JournalEntry> {
        self.journal.drain()
    }

    /// Events recorded since the last [`take_events`](Self::take_events).
    #[must_use]
    pub fn pending_events(&self) -> &[JournalEntry] {
        self.journal.entries()
    }

    /// The tracked player, alive or dead.
    #[must_use]
    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// Position of the living player.
    #[must_use]
    pub fn player_position(&self) -> Option<Vec2> {
        let entity = self.current.get(self.player?)?;
        entity.is_alive().then(|| entity.transform().position)
    }

    /// Nearest living combat target of `faction`.
    #[must_use]
    pub fn nearest_target(&self, from: Vec2, faction: Faction) -> Option<EntityId> {
        self.current.nearest_target(from, faction, None)
    }

    /// The arena as of the last completed step.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.current
    }

    /// Direct access for scenario setup between steps. Bypasses the
    /// journal; nothing done here is reported as an event.
    #[must_use]
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.current
    }

    /// The encounter director.
    #[must_use]
    pub fn encounters(&self) -> &Encounters {
        &self.encounters
    }

    /// The configuration the simulation was built with.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of completed steps.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.current.current_tick()
    }

    /// Seed every plugin RNG is derived from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.master_seed
    }

    /// Bundles run each step. Register extra plugins here.
    #[must_use]
    pub fn plugins_mut(&mut self) -> &mut PluginRegistry {
        &mut self.plugins
    }

    /// Adds a custom resolver after the default pipeline.
    pub fn add_resolver(&mut self, resolver: Box<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    /// Length of the resolver pipeline.
    #[must_use]
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
