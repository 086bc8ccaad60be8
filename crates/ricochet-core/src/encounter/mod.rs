//! Encounter gates and the exits that connect them.
//!
//! A [`Gate`] locks a room while its battle runs. Battles start when the
//! player comes within `activation_distance` of the gate's anchor (sampled
//! every `proximity_interval` while the gate is armed) or arrives through an
//! exit that leads into the gate. During battle the gate counts its members
//! every `monitor_interval`; once none are left alive it clears, unlocks its
//! exits, and records [`Event::GateCleared`] exactly once.
//!
//! [`Encounters`] owns every gate and exit and applies their side effects to
//! the arena. The simulation runs it once per tick, after resolution.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use ricochet_core::arena::Arena;
//! use ricochet_core::config::EncounterConfig;
//! use ricochet_core::encounter::Encounters;
//! use ricochet_core::journal::EventJournal;
//!
//! let mut encounters = Encounters::new(&EncounterConfig::default());
//! let gate = encounters.add_gate(Vec2::ZERO);
//! let mut arena = Arena::new();
//! let mut journal = EventJournal::new();
//!
//! // Player waits next to the anchor for one proximity sample.
//! encounters.update(&mut arena, Some(Vec2::new(3.0, 0.0)), 0.25, &mut journal);
//! assert!(encounters.gate(gate).unwrap().is_battle_active());
//! ```

mod exit;
mod gate;

pub use exit::{ExitPoint, ExitTransit};
pub use gate::{Gate, GateState};

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::config::EncounterConfig;
use crate::entity::{Entity, EntityId};
use crate::error::{ExitError, SimError};
use crate::journal::EventJournal;
use crate::output::Event;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of an encounter gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GateId(u64);

impl GateId {
    /// Creates a gate ID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gate:{}", self.0)
    }
}

/// Identifier of an exit point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExitId(u64);

impl ExitId {
    /// Creates an exit ID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit:{}", self.0)
    }
}

/// Snapshot of a gate for debugging and HUDs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateDiagnostics {
    /// The gate.
    pub gate: GateId,
    /// Clear state.
    pub state: GateState,
    /// Whether the battle is running.
    pub battle_active: bool,
    /// Whether proximity monitoring is enabled.
    pub armed: bool,
    /// Members still alive.
    pub remaining_enemies: usize,
}

// =============================================================================
// Director
// =============================================================================

/// Owner of every gate and exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounters {
    config: EncounterConfig,
    gates: BTreeMap<GateId, Gate>,
    exits: BTreeMap<ExitId, ExitPoint>,
    next_gate: u64,
    next_exit: u64,
}

impl Encounters {
    /// Creates an empty director.
    #[must_use]
    pub fn new(config: &EncounterConfig) -> Self {
        Self {
            config: config.clone(),
            gates: BTreeMap::new(),
            exits: BTreeMap::new(),
            next_gate: 0,
            next_exit: 0,
        }
    }

    /// Adds an armed, inactive gate anchored at `anchor`.
    pub fn add_gate(&mut self, anchor: Vec2) -> GateId {
        let id = GateId::new(self.next_gate);
        self.next_gate += 1;
        self.gates.insert(id, Gate::new(id, anchor, &self.config));
        tracing::debug!(gate = %id, ?anchor, "gate added");
        id
    }

    /// Returns a gate by ID.
    #[must_use]
    pub fn gate(&self, id: GateId) -> Option<&Gate> {
        self.gates.get(&id)
    }

    /// Every gate, in ID order.
    pub fn gates(&self) -> impl Iterator<Item = &Gate> + '_ {
        self.gates.values()
    }

    /// Number of gates that have been cleared, whether or not a stage owns
    /// them.
    #[must_use]
    pub fn cleared_count(&self) -> usize {
        self.gates.values().filter(|g| g.is_cleared()).count()
    }

    /// Returns `true` if every gate is cleared. Vacuously true with no gates.
    #[must_use]
    pub fn all_cleared(&self) -> bool {
        self.gates.values().all(Gate::is_cleared)
    }

    /// Returns an exit by ID.
    #[must_use]
    pub fn exit(&self, id: ExitId) -> Option<&ExitPoint> {
        self.exits.get(&id)
    }

    /// Makes `enemy` a member of `gate`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownGate`] if the gate does not exist.
    pub fn add_member(&mut self, gate: GateId, enemy: EntityId) -> Result<(), SimError> {
        let g = self.gates.get_mut(&gate).ok_or(SimError::UnknownGate(gate))?;
        g.add_member(enemy);
        Ok(())
    }

    /// Removes `entity` from every gate's member list.
    pub fn forget_member(&mut self, entity: EntityId) {
        for gate in self.gates.values_mut() {
            gate.remove_member(entity);
        }
    }

    /// Adds an unpaired exit at `position`, optionally owned by `gate`.
    ///
    /// An exit added to a gate that is in battle starts out locked.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownGate`] if `gate` does not exist.
    pub fn add_exit(&mut self, position: Vec2, gate: Option<GateId>) -> Result<ExitId, SimError> {
        let id = ExitId::new(self.next_exit);
        let mut exit = ExitPoint::new(id, gate, position);
        if let Some(gate_id) = gate {
            let g = self.gates.get_mut(&gate_id).ok_or(SimError::UnknownGate(gate_id))?;
            g.add_exit(id);
            exit.locked = !g.exits_enterable();
        }
        self.next_exit += 1;
        self.exits.insert(id, exit);
        Ok(id)
    }

    /// Pairs two exits with each other.
    ///
    /// Any previous partner of either end is left unpaired, so pairs stay
    /// symmetric.
    ///
    /// # Errors
    ///
    /// Returns [`ExitError::UnknownExit`] if either exit does not exist, or
    /// [`ExitError::MissingPartner`] when asked to pair an exit with itself.
    pub fn link(&mut self, a: ExitId, b: ExitId) -> Result<(), ExitError> {
        if a == b {
            return Err(ExitError::MissingPartner(a));
        }
        for id in [a, b] {
            if !self.exits.contains_key(&id) {
                return Err(ExitError::UnknownExit(id));
            }
        }
        for id in [a, b] {
            let old = self.exits.get_mut(&id).and_then(|e| e.partner.take());
            if let Some(exit) = old.and_then(|old| self.exits.get_mut(&old)) {
                exit.partner = None;
            }
        }
        for (from, to) in [(a, b), (b, a)] {
            if let Some(exit) = self.exits.get_mut(&from) {
                exit.partner = Some(to);
            }
        }
        Ok(())
    }

    /// Sets the arrival offset of an exit.
    ///
    /// # Errors
    ///
    /// Returns [`ExitError::UnknownExit`] if the exit does not exist.
    pub fn set_arrival_offset(&mut self, id: ExitId, offset: Vec2) -> Result<(), ExitError> {
        let exit = self.exits.get_mut(&id).ok_or(ExitError::UnknownExit(id))?;
        exit.arrival_offset = offset;
        Ok(())
    }

    /// Enables or disables an exit.
    ///
    /// # Errors
    ///
    /// Returns [`ExitError::UnknownExit`] if the exit does not exist.
    pub fn set_exit_enabled(&mut self, id: ExitId, enabled: bool) -> Result<(), ExitError> {
        let exit = self.exits.get_mut(&id).ok_or(ExitError::UnknownExit(id))?;
        exit.enabled = enabled;
        Ok(())
    }

    /// Arms or disarms a gate's proximity trigger. Unknown gates are ignored.
    pub fn set_armed(&mut self, gate: GateId, armed: bool) {
        match self.gates.get_mut(&gate) {
            Some(g) => g.set_armed(armed),
            None => tracing::warn!(%gate, "cannot arm unknown gate"),
        }
    }

    /// Members of `gate` that exist and are alive.
    #[must_use]
    pub fn remaining_enemies(&self, gate: GateId, arena: &Arena) -> Option<usize> {
        let g = self.gates.get(&gate)?;
        Some(
            g.members()
                .filter(|id| arena.get(*id).is_some_and(Entity::is_alive))
                .count(),
        )
    }

    /// Diagnostics snapshot of one gate.
    #[must_use]
    pub fn diagnostics(&self, gate: GateId, arena: &Arena) -> Option<GateDiagnostics> {
        let g = self.gates.get(&gate)?;
        Some(GateDiagnostics {
            gate,
            state: g.state(),
            battle_active: g.is_battle_active(),
            armed: g.is_armed(),
            remaining_enemies: self.remaining_enemies(gate, arena).unwrap_or(0),
        })
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Starts a gate's battle: activates living members and locks its exits.
    ///
    /// # Returns
    ///
    /// `false` if the gate is unknown, cleared, or already in battle.
    pub fn start_battle(&mut self, gate: GateId, arena: &mut Arena, journal: &mut EventJournal) -> bool {
        let Some(g) = self.gates.get_mut(&gate) else {
            tracing::warn!(%gate, "cannot start battle at unknown gate");
            return false;
        };
        if !g.start_battle() {
            return false;
        }
        let members: Vec<EntityId> = g.members().collect();
        set_emitters_active(arena, &members, true);
        self.lock_exits(gate, true);

        let tick = arena.current_tick();
        tracing::info!(tick, %gate, members = members.len(), "battle started");
        journal.record(tick, Event::BattleStarted { gate });
        true
    }

    /// Marks a gate cleared without waiting for its members.
    ///
    /// # Returns
    ///
    /// `false` if the gate is unknown or already cleared.
    pub fn set_cleared(&mut self, gate: GateId, arena: &mut Arena, journal: &mut EventJournal) -> bool {
        let Some(g) = self.gates.get_mut(&gate) else {
            tracing::warn!(%gate, "cannot clear unknown gate");
            return false;
        };
        if !g.clear() {
            return false;
        }
        let members: Vec<EntityId> = g.members().collect();
        set_emitters_active(arena, &members, false);
        self.lock_exits(gate, false);

        let tick = arena.current_tick();
        tracing::info!(tick, %gate, "gate cleared");
        journal.record(tick, Event::GateCleared { gate });
        true
    }

    /// Restores a gate to its initial state.
    ///
    /// The gate becomes not cleared, inactive, unlocked, and armed. Member
    /// emitters stop and every live wave is purged.
    ///
    /// # Returns
    ///
    /// `false` if the gate is unknown.
    pub fn reset(&mut self, gate: GateId, arena: &mut Arena, journal: &mut EventJournal) -> bool {
        let Some(g) = self.gates.get_mut(&gate) else {
            tracing::warn!(%gate, "cannot reset unknown gate");
            return false;
        };
        g.reset();
        let members: Vec<EntityId> = g.members().collect();
        set_emitters_active(arena, &members, false);
        self.lock_exits(gate, false);

        let tick = arena.current_tick();
        let purged = arena.purge_projectiles().len();
        if purged > 0 {
            journal.record(tick, Event::ProjectilesPurged { count: purged });
        }
        tracing::info!(tick, %gate, purged, "gate reset");
        journal.record(tick, Event::GateReset { gate });
        true
    }

    fn lock_exits(&mut self, gate: GateId, locked: bool) {
        for exit in self.exits.values_mut().filter(|e| e.gate == Some(gate)) {
            exit.locked = locked;
        }
    }

    // =========================================================================
    // Per-tick update
    // =========================================================================

    /// Advances exit cooldowns, proximity samplers, and battle monitors.
    ///
    /// `player` is the living player's position, if there is one.
    pub fn update(&mut self, arena: &mut Arena, player: Option<Vec2>, dt: f32, journal: &mut EventJournal) {
        for exit in self.exits.values_mut() {
            exit.cooldown.tick(dt);
        }

        let ids: Vec<GateId> = self.gates.keys().copied().collect();
        for id in ids {
            let Some(g) = self.gates.get_mut(&id) else {
                continue;
            };

            if g.poll_proximity(dt) {
                let near = player.is_some_and(|p| p.distance(g.anchor) <= self.config.activation_distance);
                if near {
                    self.start_battle(id, arena, journal);
                    continue;
                }
            }

            let Some(g) = self.gates.get_mut(&id) else {
                continue;
            };
            if g.poll_monitor(dt) && self.remaining_enemies(id, arena) == Some(0) {
                self.set_cleared(id, arena, journal);
            }
        }
    }

    // =========================================================================
    // Exits
    // =========================================================================

    /// Attempts to travel through `exit`.
    ///
    /// On success both ends start their cooldown and the caller moves the
    /// player to [`ExitTransit::destination`], then calls
    /// [`on_player_arrived`](Self::on_player_arrived).
    ///
    /// # Errors
    ///
    /// Returns an [`ExitError`] naming the first check that failed:
    /// unknown exit, locked or in-battle gate, disabled end, cooldown, or
    /// missing partner.
    pub fn try_use_exit(&mut self, exit: ExitId) -> Result<ExitTransit, ExitError> {
        let from = self.exits.get(&exit).ok_or(ExitError::UnknownExit(exit))?;
        if self.gate_in_battle(from.gate).is_some() || from.locked {
            return Err(ExitError::Locked(exit));
        }
        if !from.enabled {
            return Err(ExitError::Disabled(exit));
        }
        if !from.is_ready() {
            return Err(ExitError::CoolingDown {
                exit,
                remaining: from.cooldown_remaining(),
            });
        }

        let partner_id = from.partner.ok_or(ExitError::MissingPartner(exit))?;
        let to = self.exits.get(&partner_id).ok_or(ExitError::MissingPartner(exit))?;
        if !to.enabled {
            return Err(ExitError::Disabled(partner_id));
        }
        if let Some(gate) = self.gate_in_battle(to.gate) {
            return Err(ExitError::PartnerInBattle { exit, gate });
        }
        if to.locked {
            return Err(ExitError::Locked(partner_id));
        }
        if !to.is_ready() {
            return Err(ExitError::CoolingDown {
                exit: partner_id,
                remaining: to.cooldown_remaining(),
            });
        }

        let transit = ExitTransit {
            from: exit,
            to: partner_id,
            destination: to.arrival_point(),
            gate: to.gate,
        };
        let cooldown = self.config.exit_cooldown;
        for id in [exit, partner_id] {
            if let Some(e) = self.exits.get_mut(&id) {
                e.cooldown.start(cooldown);
            }
        }
        tracing::debug!(from = %exit, to = %partner_id, destination = ?transit.destination, "exit used");
        Ok(transit)
    }

    /// Notifies the arrival gate that the player came through an exit, which
    /// starts its battle if it has not been cleared.
    pub fn on_player_arrived(&mut self, transit: &ExitTransit, arena: &mut Arena, journal: &mut EventJournal) {
        if let Some(gate) = transit.gate {
            self.start_battle(gate, arena, journal);
        }
    }

    fn gate_in_battle(&self, gate: Option<GateId>) -> Option<GateId> {
        let id = gate?;
        self.gates
            .get(&id)
            .filter(|g| g.is_battle_active())
            .map(Gate::id)
    }
}

/// Activates or deactivates the emitters of living `members`.
fn set_emitters_active(arena: &mut Arena, members: &[EntityId], active: bool) {
    for id in members {
        let Some(entity) = arena.get_mut(*id) else {
            tracing::warn!(entity = %id, "gate member missing from arena");
            continue;
        };
        if !entity.is_alive() {
            continue;
        }
        if let Some(enemy) = entity.as_enemy_mut() {
            if active {
                enemy.emitter.activate();
            } else {
                enemy.emitter.deactivate();
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
    use crate::config::{CombatConfig, EmitterConfig};
    use crate::emitter::EmitterMode;
    use crate::entity::{EnemyComponents, EntityInner};

    const DT: f32 = 0.125;

    struct Fixture {
        encounters: Encounters,
        arena: Arena,
        journal: EventJournal,
        gate: GateId,
        enemies: Vec<EntityId>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut encounters = Encounters::new(&EncounterConfig::default());
            let mut arena = Arena::new();
            let gate = encounters.add_gate(Vec2::new(20.0, 0.0));
            let mut enemies = Vec::new();
            for y in [-2.0, 2.0] {
                let id = arena.spawn(EntityInner::Enemy(EnemyComponents::new(
                    Vec2::new(20.0, y),
                    EmitterMode::Passive,
                    &CombatConfig::default(),
                    &EmitterConfig::default(),
                )));
                encounters.add_member(gate, id).unwrap();
                enemies.push(id);
            }
            Self {
                encounters,
                arena,
                journal: EventJournal::new(),
                gate,
                enemies,
            }
        }

        fn run(&mut self, player: Option<Vec2>, seconds: f32) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let ticks = (seconds / DT).round() as usize;
            for _ in 0..ticks {
                self.encounters
                    .update(&mut self.arena, player, DT, &mut self.journal);
            }
        }

        fn gate(&self) -> &Gate {
            self.encounters.gate(self.gate).unwrap()
        }

        fn kill_all(&mut self) {
            for id in &self.enemies {
                if let Some(h) = self.arena.get_mut(*id).and_then(Entity::health_mut) {
                    h.kill();
                }
            }
        }

        fn count(&self, event: &Event) -> usize {
            self.journal.count_matching(|e| e == event)
        }
    }

    mod id_tests {
        use super::*;

        #[test]
        fn ids_display_with_prefix() {
            assert_eq!(GateId::new(2).to_string(), "gate:2");
            assert_eq!(ExitId::new(5).to_string(), "exit:5");
            assert_eq!(ExitId::new(5).as_u64(), 5);
        }

        #[test]
        fn add_member_to_unknown_gate_fails() {
            let mut encounters = Encounters::new(&EncounterConfig::default());
            assert_eq!(
                encounters.add_member(GateId::new(9), EntityId::new(1)),
                Err(SimError::UnknownGate(GateId::new(9)))
            );
        }
    }

    mod proximity_tests {
        use super::*;

        #[test]
        fn far_player_does_not_trigger() {
            let mut f = Fixture::new();
            f.run(Some(Vec2::new(-20.0, 0.0)), 1.0);
            assert!(!f.gate().is_battle_active());
        }

        #[test]
        fn near_player_starts_battle_and_activates_members() {
            let mut f = Fixture::new();
            f.run(Some(Vec2::new(6.0, 0.0)), 0.25);
            assert!(f.gate().is_battle_active());
            assert_eq!(f.count(&Event::BattleStarted { gate: f.gate }), 1);
            for id in &f.enemies {
                assert!(f.arena.get(*id).and_then(Entity::as_enemy).unwrap().emitter.is_active());
            }
        }

        #[test]
        fn disarmed_gate_ignores_player() {
            let mut f = Fixture::new();
            f.encounters.set_armed(f.gate, false);
            f.run(Some(Vec2::new(20.0, 0.0)), 1.0);
            assert!(!f.gate().is_battle_active());
        }

        #[test]
        fn dead_player_does_not_trigger() {
            let mut f = Fixture::new();
            f.run(None, 1.0);
            assert!(!f.gate().is_battle_active());
        }
    }

    mod clear_tests {
        use super::*;

        #[test]
        fn clears_once_when_members_dead() {
            let mut f = Fixture::new();
            let exit = f.encounters.add_exit(Vec2::new(25.0, 0.0), Some(f.gate)).unwrap();
            f.run(Some(Vec2::new(20.0, 5.0)), 0.25);
            assert!(f.encounters.exit(exit).unwrap().locked);

            f.run(Some(Vec2::new(20.0, 5.0)), 1.0);
            assert_eq!(f.encounters.remaining_enemies(f.gate, &f.arena), Some(2));
            assert!(f.gate().is_battle_active());

            f.kill_all();
            f.run(Some(Vec2::new(20.0, 5.0)), 2.0);
            assert_eq!(f.gate().state(), GateState::Cleared);
            assert!(!f.encounters.exit(exit).unwrap().locked);
            assert_eq!(f.count(&Event::GateCleared { gate: f.gate }), 1);
        }

        #[test]
        fn missing_members_count_as_defeated() {
            let mut f = Fixture::new();
            f.run(Some(Vec2::new(20.0, 0.0)), 0.25);
            for id in f.enemies.clone() {
                f.arena.despawn(id);
            }
            f.run(Some(Vec2::new(20.0, 0.0)), 0.5);
            assert!(f.gate().is_cleared());
        }

        #[test]
        fn set_cleared_is_idempotent() {
            let mut f = Fixture::new();
            assert!(f.encounters.set_cleared(f.gate, &mut f.arena, &mut f.journal));
            assert!(!f.encounters.set_cleared(f.gate, &mut f.arena, &mut f.journal));
            assert_eq!(f.count(&Event::GateCleared { gate: f.gate }), 1);
        }

        #[test]
        fn cleared_count_spans_every_gate() {
            let mut f = Fixture::new();
            let loose = f.encounters.add_gate(Vec2::new(-50.0, 0.0));
            assert_eq!(f.encounters.cleared_count(), 0);
            assert!(!f.encounters.all_cleared());

            f.encounters.set_cleared(loose, &mut f.arena, &mut f.journal);
            assert_eq!(f.encounters.cleared_count(), 1);
            f.encounters.set_cleared(f.gate, &mut f.arena, &mut f.journal);
            assert!(f.encounters.all_cleared());

            f.encounters.reset(loose, &mut f.arena, &mut f.journal);
            assert_eq!(f.encounters.cleared_count(), 1);
        }

        #[test]
        fn reset_rearms_and_unlocks() {
            let mut f = Fixture::new();
            let exit = f.encounters.add_exit(Vec2::ZERO, Some(f.gate)).unwrap();
            f.run(Some(Vec2::new(20.0, 0.0)), 0.25);
            assert!(f.encounters.reset(f.gate, &mut f.arena, &mut f.journal));

            let diag = f.encounters.diagnostics(f.gate, &f.arena).unwrap();
            assert_eq!(diag.state, GateState::NotCleared);
            assert!(!diag.battle_active);
            assert!(diag.armed);
            assert_eq!(diag.remaining_enemies, 2);
            assert!(!f.encounters.exit(exit).unwrap().locked);
            assert!(!f.encounters.reset(GateId::new(42), &mut f.arena, &mut f.journal));
        }
    }

    mod exit_tests {
        use super::*;

        fn paired(f: &mut Fixture) -> (ExitId, ExitId) {
            let outside = f.encounters.add_exit(Vec2::new(-10.0, 0.0), None).unwrap();
            let inside = f.encounters.add_exit(Vec2::new(18.0, 0.0), Some(f.gate)).unwrap();
            f.encounters.link(outside, inside).unwrap();
            f.encounters.set_arrival_offset(inside, Vec2::new(0.0, 1.0)).unwrap();
            (outside, inside)
        }

        #[test]
        fn use_moves_to_partner_and_starts_battle() {
            let mut f = Fixture::new();
            let (outside, inside) = paired(&mut f);
            let transit = f.encounters.try_use_exit(outside).unwrap();
            assert_eq!(transit.to, inside);
            assert_eq!(transit.destination, Vec2::new(18.0, 1.0));
            assert_eq!(transit.gate, Some(f.gate));

            f.encounters.on_player_arrived(&transit, &mut f.arena, &mut f.journal);
            assert!(f.gate().is_battle_active());
        }

        #[test]
        fn cooldown_applies_to_both_ends() {
            let mut f = Fixture::new();
            let (outside, inside) = paired(&mut f);
            f.encounters.try_use_exit(outside).unwrap();
            assert!(matches!(
                f.encounters.try_use_exit(inside),
                Err(ExitError::CoolingDown { exit, .. }) if exit == inside
            ));
            f.run(None, 0.5);
            assert!(f.encounters.try_use_exit(inside).is_ok());
        }

        #[test]
        fn battle_refuses_both_directions() {
            let mut f = Fixture::new();
            let (outside, inside) = paired(&mut f);
            f.encounters.start_battle(f.gate, &mut f.arena, &mut f.journal);
            assert_eq!(f.encounters.try_use_exit(inside), Err(ExitError::Locked(inside)));
            assert_eq!(
                f.encounters.try_use_exit(outside),
                Err(ExitError::PartnerInBattle {
                    exit: outside,
                    gate: f.gate
                })
            );

            f.encounters.set_cleared(f.gate, &mut f.arena, &mut f.journal);
            assert!(f.encounters.try_use_exit(outside).is_ok());
        }

        #[test]
        fn disabled_and_unpaired_are_refused() {
            let mut f = Fixture::new();
            let (outside, inside) = paired(&mut f);
            f.encounters.set_exit_enabled(inside, false).unwrap();
            assert_eq!(f.encounters.try_use_exit(outside), Err(ExitError::Disabled(inside)));

            let lonely = f.encounters.add_exit(Vec2::ZERO, None).unwrap();
            assert_eq!(f.encounters.try_use_exit(lonely), Err(ExitError::MissingPartner(lonely)));
            assert_eq!(
                f.encounters.try_use_exit(ExitId::new(99)),
                Err(ExitError::UnknownExit(ExitId::new(99)))
            );
        }

        #[test]
        fn relinking_unpairs_the_old_partner() {
            let mut f = Fixture::new();
            let (outside, inside) = paired(&mut f);
            let elsewhere = f.encounters.add_exit(Vec2::new(40.0, 0.0), None).unwrap();
            f.encounters.link(outside, elsewhere).unwrap();

            assert_eq!(f.encounters.exit(outside).unwrap().partner, Some(elsewhere));
            assert_eq!(f.encounters.exit(elsewhere).unwrap().partner, Some(outside));
            assert_eq!(f.encounters.exit(inside).unwrap().partner, None);
            assert_eq!(f.encounters.try_use_exit(inside), Err(ExitError::MissingPartner(inside)));

            // Relinking the same pair keeps it intact.
            f.encounters.link(elsewhere, outside).unwrap();
            assert_eq!(f.encounters.exit(outside).unwrap().partner, Some(elsewhere));
            assert_eq!(f.encounters.exit(elsewhere).unwrap().partner, Some(outside));
        }

        #[test]
        fn link_rejects_unknown_and_self() {
            let mut f = Fixture::new();
            let exit = f.encounters.add_exit(Vec2::ZERO, None).unwrap();
            assert_eq!(f.encounters.link(exit, exit), Err(ExitError::MissingPartner(exit)));
            assert_eq!(
                f.encounters.link(exit, ExitId::new(7)),
                Err(ExitError::UnknownExit(ExitId::new(7)))
            );
            assert!(matches!(
                f.encounters.add_exit(Vec2::ZERO, Some(GateId::new(5))),
                Err(SimError::UnknownGate(_))
            ));
        }
    }
}
