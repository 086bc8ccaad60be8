//! Encounter gate state machine.
//!
//! ```text
//! NotCleared{inactive} --trigger--> NotCleared{battle} --members defeated--> Cleared
//!          ^                                                                    |
//!          +------------------------------- reset ------------------------------+
//! ```
//!
//! The gate itself only tracks state and timers. The
//! [`Encounters`](super::Encounters) director applies the side effects
//! (emitters, exit locks, events).

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::EncounterConfig;
use crate::entity::EntityId;
use crate::timer::RepeatingTimer;

use super::{ExitId, GateId};

/// Clear state of a gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateState {
    /// Members remain to be defeated.
    #[default]
    NotCleared,
    /// Every member has been defeated.
    Cleared,
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCleared => write!(f, "NotCleared"),
            Self::Cleared => write!(f, "Cleared"),
        }
    }
}

/// A room whose enemies must be defeated before its exits open again.
///
/// # Invariants
///
/// - `battle_active` implies `state == NotCleared`
/// - Exits are enterable iff `state == Cleared` or `!battle_active`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    id: GateId,
    state: GateState,
    battle_active: bool,
    armed: bool,
    /// Point the proximity trigger measures from.
    pub anchor: Vec2,
    members: BTreeSet<EntityId>,
    exits: BTreeSet<ExitId>,
    proximity: RepeatingTimer,
    monitor: RepeatingTimer,
}

impl Gate {
    /// Creates an inactive, armed gate at `anchor`.
    #[must_use]
    pub fn new(id: GateId, anchor: Vec2, config: &EncounterConfig) -> Self {
        Self {
            id,
            state: GateState::NotCleared,
            battle_active: false,
            armed: true,
            anchor,
            members: BTreeSet::new(),
            exits: BTreeSet::new(),
            proximity: RepeatingTimer::new(config.proximity_interval),
            monitor: RepeatingTimer::new(config.monitor_interval),
        }
    }

    /// The gate's ID.
    #[must_use]
    pub const fn id(&self) -> GateId {
        self.id
    }

    /// Current clear state.
    #[must_use]
    pub const fn state(&self) -> GateState {
        self.state
    }

    /// Returns `true` once cleared.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.state == GateState::Cleared
    }

    /// Returns `true` while the battle is running.
    #[must_use]
    pub const fn is_battle_active(&self) -> bool {
        self.battle_active
    }

    /// Returns `true` while proximity monitoring is enabled.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Returns `true` if the gate's exits may be used.
    #[must_use]
    pub fn exits_enterable(&self) -> bool {
        self.is_cleared() || !self.battle_active
    }

    /// Returns `true` if a trigger would start the battle.
    #[must_use]
    pub fn can_start_battle(&self) -> bool {
        !self.is_cleared() && !self.battle_active
    }

    /// Member enemies, in ID order.
    pub fn members(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter().copied()
    }

    /// Exits belonging to this gate, in ID order.
    pub fn exits(&self) -> impl Iterator<Item = ExitId> + '_ {
        self.exits.iter().copied()
    }

    pub(crate) fn add_member(&mut self, id: EntityId) -> bool {
        self.members.insert(id)
    }

    pub(crate) fn remove_member(&mut self, id: EntityId) -> bool {
        self.members.remove(&id)
    }

    pub(crate) fn add_exit(&mut self, id: ExitId) {
        self.exits.insert(id);
    }

    pub(crate) fn set_armed(&mut self, armed: bool) {
        if armed && !self.armed {
            self.proximity.reset();
        }
        self.armed = armed;
    }

    /// Enters battle. Returns `false` if the gate is cleared or already in
    /// battle.
    pub(crate) fn start_battle(&mut self) -> bool {
        if !self.can_start_battle() {
            return false;
        }
        self.battle_active = true;
        self.monitor.reset();
        true
    }

    /// Marks the gate cleared. Returns `false` if it already was.
    pub(crate) fn clear(&mut self) -> bool {
        if self.is_cleared() {
            return false;
        }
        self.state = GateState::Cleared;
        self.battle_active = false;
        true
    }

    /// Restores the initial state: not cleared, inactive, and armed.
    pub(crate) fn reset(&mut self) {
        self.state = GateState::NotCleared;
        self.battle_active = false;
        self.armed = true;
        self.proximity.reset();
        self.monitor.reset();
    }

    /// Advances the proximity sampler. Returns `true` when a sample is due.
    pub(crate) fn poll_proximity(&mut self, dt: f32) -> bool {
        self.armed && self.can_start_battle() && self.proximity.tick(dt) > 0
    }

    /// Advances the member monitor. Returns `true` when a count is due.
    pub(crate) fn poll_monitor(&mut self, dt: f32) -> bool {
        self.battle_active && self.monitor.tick(dt) > 0
    }
}
