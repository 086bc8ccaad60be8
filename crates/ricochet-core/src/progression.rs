//! Stage sequencing.
//!
//! A [`StageSequence`] walks the player through an ordered list of stages.
//! Exactly one stage is active at a time. Each stage owns at most one
//! encounter gate; advancing requires that gate to be cleared, and a stage
//! without a gate counts as clear.
//!
//! Activating a stage arms its gate and disarms every other stage's gate, so
//! only the active room reacts to the player's proximity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::config::ProgressionConfig;
use crate::encounter::{Encounters, Gate, GateId};
use crate::error::ProgressionError;
use crate::journal::EventJournal;
use crate::output::Event;
use crate::timer::Timer;

/// One unit of the sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Gate that must be cleared before the sequence moves on.
    pub gate: Option<GateId>,
    /// Where the player is placed when the stage activates.
    pub spawn_point: Option<Vec2>,
}

impl Stage {
    /// A stage guarded by `gate`.
    #[must_use]
    pub const fn with_gate(gate: GateId) -> Self {
        Self {
            gate: Some(gate),
            spawn_point: None,
        }
    }

    /// A stage with nothing to clear.
    #[must_use]
    pub const fn open() -> Self {
        Self {
            gate: None,
            spawn_point: None,
        }
    }

    /// Sets the player spawn point.
    #[must_use]
    pub const fn at(mut self, spawn_point: Vec2) -> Self {
        self.spawn_point = Some(spawn_point);
        self
    }
}

/// Result of a successful [`StageSequence::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceOutcome {
    /// The stage at this index is now active.
    Advanced(usize),
    /// The last stage was passed. Reported once.
    Completed,
    /// The sequence had already completed; nothing changed.
    AlreadyComplete,
}

/// Ordered list of stages with one active stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSequence {
    config: ProgressionConfig,
    stages: Vec<Stage>,
    current: usize,
    pending: Option<Timer>,
    complete: bool,
}

impl StageSequence {
    /// Creates a sequence. No stage is activated until
    /// [`go_to`](Self::go_to) is called.
    #[must_use]
    pub fn new(config: &ProgressionConfig, stages: Vec<Stage>) -> Self {
        Self {
            config: config.clone(),
            stages,
            current: 0,
            pending: None,
            complete: false,
        }
    }

    /// Index of the active stage.
    #[must_use]
    pub const fn current(&self) -> usize {
        self.current
    }

    /// The active stage, if there is one.
    #[must_use]
    pub fn current_stage(&self) -> Option<&Stage> {
        self.stages.get(self.current)
    }

    /// Number of stages.
    #[must_use]
    pub fn total(&self) -> usize {
        self.stages.len()
    }

    /// Every stage, in order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Returns `true` once the sequence ran past its last stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Returns `true` while an automatic advance is counting down.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns `true` if stage `index` has nothing left to clear.
    ///
    /// A stage whose gate no longer exists counts as clear.
    #[must_use]
    pub fn stage_cleared(&self, index: usize, encounters: &Encounters) -> bool {
        let Some(stage) = self.stages.get(index) else {
            return false;
        };
        match stage.gate {
            None => true,
            Some(id) => encounters.gate(id).map_or(true, Gate::is_cleared),
        }
    }

    /// Number of stages with nothing left to clear.
    #[must_use]
    pub fn cleared_count(&self, encounters: &Encounters) -> usize {
        (0..self.stages.len())
            .filter(|i| self.stage_cleared(*i, encounters))
            .count()
    }

    /// Returns `true` if every stage is clear.
    #[must_use]
    pub fn all_cleared(&self, encounters: &Encounters) -> bool {
        self.cleared_count(encounters) == self.stages.len()
    }

    /// Moves past the active stage.
    ///
    /// # Errors
    ///
    /// - [`ProgressionError::NoStages`] if the sequence is empty
    /// - [`ProgressionError::GateNotCleared`] if the active stage's gate is
    ///   still standing
    pub fn advance(
        &mut self,
        encounters: &mut Encounters,
        arena: &Arena,
        journal: &mut EventJournal,
    ) -> Result<AdvanceOutcome, ProgressionError> {
        if self.complete {
            return Ok(AdvanceOutcome::AlreadyComplete);
        }
        let stage = *self.stages.get(self.current).ok_or(ProgressionError::NoStages)?;
        if let Some(gate) = stage.gate {
            match encounters.gate(gate) {
                Some(g) if !g.is_cleared() => {
                    return Err(ProgressionError::GateNotCleared {
                        stage: self.current,
                        gate,
                    });
                }
                Some(_) => {}
                None => tracing::warn!(stage = self.current, %gate, "stage gate missing, treating as cleared"),
            }
        }

        self.pending = None;
        let next = self.current + 1;
        if next < self.stages.len() {
            self.activate(next, encounters, arena, journal);
            Ok(AdvanceOutcome::Advanced(next))
        } else {
            self.complete = true;
            for gate in self.stages.iter().filter_map(|s| s.gate) {
                encounters.set_armed(gate, false);
            }
            let tick = arena.current_tick();
            tracing::info!(tick, stages = self.stages.len(), "all stages complete");
            journal.record(tick, Event::AllStagesComplete);
            Ok(AdvanceOutcome::Completed)
        }
    }

    /// Activates stage `index`, regardless of what is cleared.
    ///
    /// Jumping to a stage also reopens a completed sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::UnknownStage`] if `index` is out of range.
    pub fn go_to(
        &mut self,
        index: usize,
        encounters: &mut Encounters,
        arena: &Arena,
        journal: &mut EventJournal,
    ) -> Result<(), ProgressionError> {
        if index >= self.stages.len() {
            return Err(ProgressionError::UnknownStage {
                index,
                len: self.stages.len(),
            });
        }
        self.activate(index, encounters, arena, journal);
        Ok(())
    }

    /// Resets the active stage's gate and activates the stage again.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::NoStages`] if the sequence is empty.
    pub fn restart_current(
        &mut self,
        encounters: &mut Encounters,
        arena: &mut Arena,
        journal: &mut EventJournal,
    ) -> Result<(), ProgressionError> {
        let stage = *self.stages.get(self.current).ok_or(ProgressionError::NoStages)?;
        if let Some(gate) = stage.gate {
            encounters.reset(gate, arena, journal);
        }
        self.activate(self.current, encounters, arena, journal);
        Ok(())
    }

    /// Resets every stage's gate and returns to the first stage.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::NoStages`] if the sequence is empty.
    pub fn reset_all(
        &mut self,
        encounters: &mut Encounters,
        arena: &mut Arena,
        journal: &mut EventJournal,
    ) -> Result<(), ProgressionError> {
        if self.stages.is_empty() {
            return Err(ProgressionError::NoStages);
        }
        for gate in self.stages.iter().filter_map(|s| s.gate) {
            encounters.reset(gate, arena, journal);
        }
        self.activate(0, encounters, arena, journal);
        Ok(())
    }

    /// Counts down to an automatic advance once the active stage is clear.
    ///
    /// Returns the outcome of the advance on the tick it happens.
    pub fn update(
        &mut self,
        dt: f32,
        encounters: &mut Encounters,
        arena: &Arena,
        journal: &mut EventJournal,
    ) -> Option<AdvanceOutcome> {
        if !self.config.auto_advance || self.complete || self.stages.is_empty() {
            return None;
        }

        if let Some(timer) = self.pending.as_mut() {
            if !timer.tick(dt) {
                return None;
            }
            self.pending = None;
            return match self.advance(encounters, arena, journal) {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    tracing::debug!(%err, "automatic advance cancelled");
                    None
                }
            };
        }

        if self.stage_cleared(self.current, encounters) {
            tracing::debug!(stage = self.current, delay = self.config.transition_delay, "stage clear, advancing soon");
            self.pending = Some(Timer::new(self.config.transition_delay));
        }
        None
    }

    fn activate(&mut self, index: usize, encounters: &mut Encounters, arena: &Arena, journal: &mut EventJournal) {
        self.current = index;
        self.complete = false;
        self.pending = None;
        for (i, stage) in self.stages.iter().enumerate() {
            if let Some(gate) = stage.gate {
                encounters.set_armed(gate, i == index);
            }
        }
        let tick = arena.current_tick();
        tracing::info!(tick, stage = index, "stage activated");
        journal.record(tick, Event::StageActivated { stage: index });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncounterConfig;

    struct Fixture {
        encounters: Encounters,
        arena: Arena,
        journal: EventJournal,
        gates: Vec<GateId>,
        sequence: StageSequence,
    }

    fn fixture(config: &ProgressionConfig) -> Fixture {
        let mut encounters = Encounters::new(&EncounterConfig::default());
        let gates: Vec<GateId> = (0..3)
            .map(|i| encounters.add_gate(Vec2::new(100.0 * i as f32, 0.0)))
            .collect();
        let stages = gates.iter().map(|g| Stage::with_gate(*g)).collect();
        let mut f = Fixture {
            encounters,
            arena: Arena::new(),
            journal: EventJournal::new(),
            gates,
            sequence: StageSequence::new(config, stages),
        };
        f.sequence
            .go_to(0, &mut f.encounters, &f.arena, &mut f.journal)
            .unwrap();
        f
    }

    fn manual() -> ProgressionConfig {
        ProgressionConfig {
            auto_advance: false,
            ..ProgressionConfig::default()
        }
    }

    impl Fixture {
        fn clear(&mut self, index: usize) {
            self.encounters
                .set_cleared(self.gates[index], &mut self.arena, &mut self.journal);
        }

        fn advance(&mut self) -> Result<AdvanceOutcome, ProgressionError> {
            self.sequence
                .advance(&mut self.encounters, &self.arena, &mut self.journal)
        }

        fn armed(&self, index: usize) -> bool {
            self.encounters.gate(self.gates[index]).unwrap().is_armed()
        }
    }

    mod activation_tests {
        use super::*;

        #[test]
        fn only_active_stage_is_armed() {
            let f = fixture(&manual());
            assert!(f.armed(0));
            assert!(!f.armed(1));
            assert!(!f.armed(2));
            assert_eq!(f.journal.count_matching(|e| *e == Event::StageActivated { stage: 0 }), 1);
        }

        #[test]
        fn go_to_out_of_range_fails() {
            let mut f = fixture(&manual());
            assert_eq!(
                f.sequence.go_to(3, &mut f.encounters, &f.arena, &mut f.journal),
                Err(ProgressionError::UnknownStage { index: 3, len: 3 })
            );
            f.sequence.go_to(2, &mut f.encounters, &f.arena, &mut f.journal).unwrap();
            assert!(f.armed(2));
            assert!(!f.armed(0));
        }
    }

    mod advance_tests {
        use super::*;

        #[test]
        fn rejected_until_gate_cleared() {
            let mut f = fixture(&manual());
            assert_eq!(
                f.advance(),
                Err(ProgressionError::GateNotCleared {
                    stage: 0,
                    gate: f.gates[0]
                })
            );
            f.clear(0);
            assert_eq!(f.advance(), Ok(AdvanceOutcome::Advanced(1)));
            assert_eq!(f.sequence.current(), 1);
            assert!(f.armed(1));
            assert!(!f.armed(0));
        }

        #[test]
        fn completes_once() {
            let mut f = fixture(&manual());
            for i in 0..3 {
                f.clear(i);
            }
            assert_eq!(f.advance(), Ok(AdvanceOutcome::Advanced(1)));
            assert_eq!(f.advance(), Ok(AdvanceOutcome::Advanced(2)));
            assert_eq!(f.advance(), Ok(AdvanceOutcome::Completed));
            assert_eq!(f.advance(), Ok(AdvanceOutcome::AlreadyComplete));
            assert!(f.sequence.is_complete());
            assert_eq!(f.journal.count_matching(|e| *e == Event::AllStagesComplete), 1);
            assert!(f.sequence.all_cleared(&f.encounters));
        }

        #[test]
        fn open_stages_advance_freely() {
            let mut sequence = StageSequence::new(&manual(), vec![Stage::open(), Stage::open()]);
            let mut encounters = Encounters::new(&EncounterConfig::default());
            let arena = Arena::new();
            let mut journal = EventJournal::new();
            assert_eq!(
                sequence.advance(&mut encounters, &arena, &mut journal),
                Ok(AdvanceOutcome::Advanced(1))
            );
            assert_eq!(sequence.cleared_count(&encounters), 2);
        }

        #[test]
        fn empty_sequence_has_no_stages() {
            let mut sequence = StageSequence::new(&manual(), Vec::new());
            let mut encounters = Encounters::new(&EncounterConfig::default());
            let mut arena = Arena::new();
            let mut journal = EventJournal::new();
            assert_eq!(
                sequence.advance(&mut encounters, &arena, &mut journal),
                Err(ProgressionError::NoStages)
            );
            assert_eq!(
                sequence.restart_current(&mut encounters, &mut arena, &mut journal),
                Err(ProgressionError::NoStages)
            );
        }

        #[test]
        fn missing_gate_counts_as_cleared() {
            let mut sequence = StageSequence::new(&manual(), vec![Stage::with_gate(GateId::new(9)), Stage::open()]);
            let mut encounters = Encounters::new(&EncounterConfig::default());
            let arena = Arena::new();
            let mut journal = EventJournal::new();
            assert_eq!(
                sequence.advance(&mut encounters, &arena, &mut journal),
                Ok(AdvanceOutcome::Advanced(1))
            );
        }
    }

    mod restart_tests {
        use super::*;

        #[test]
        fn restart_resets_active_gate() {
            let mut f = fixture(&manual());
            f.clear(0);
            f.sequence
                .restart_current(&mut f.encounters, &mut f.arena, &mut f.journal)
                .unwrap();
            assert!(!f.encounters.gate(f.gates[0]).unwrap().is_cleared());
            assert!(f.armed(0));
            assert_eq!(f.sequence.cleared_count(&f.encounters), 0);
        }

        #[test]
        fn reset_all_returns_to_first_stage() {
            let mut f = fixture(&manual());
            f.clear(0);
            f.clear(1);
            f.advance().unwrap();
            f.sequence
                .reset_all(&mut f.encounters, &mut f.arena, &mut f.journal)
                .unwrap();
            assert_eq!(f.sequence.current(), 0);
            assert_eq!(f.sequence.cleared_count(&f.encounters), 0);
        }
    }

    mod auto_advance_tests {
        use super::*;

        fn update(f: &mut Fixture, dt: f32) -> Option<AdvanceOutcome> {
            f.sequence.update(dt, &mut f.encounters, &f.arena, &mut f.journal)
        }

        #[test]
        fn waits_for_transition_delay() {
            let mut f = fixture(&ProgressionConfig::default());
            assert_eq!(update(&mut f, 0.5), None);
            assert!(!f.sequence.is_transitioning());

            f.clear(0);
            assert_eq!(update(&mut f, 0.5), None);
            assert!(f.sequence.is_transitioning());
            assert_eq!(update(&mut f, 1.0), None);
            assert_eq!(update(&mut f, 1.0), Some(AdvanceOutcome::Advanced(1)));
            assert!(!f.sequence.is_transitioning());
        }

        #[test]
        fn disabled_auto_advance_never_moves() {
            let mut f = fixture(&manual());
            f.clear(0);
            for _ in 0..10 {
                assert_eq!(update(&mut f, 1.0), None);
            }
            assert_eq!(f.sequence.current(), 0);
        }
    }
}
