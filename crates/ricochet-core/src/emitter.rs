//! Wave emitters: burst firing with optional roam/attack AI.
//!
//! [`EmitterState`] is a pure state machine. [`EmitterState::advance`] moves
//! it forward by one tick and returns the actions the owner should take
//! (fire a wave, steer); it never touches the world. The emitter plugin turns
//! those actions into outputs after resolving targets against the snapshot.
//!
//! # Modes
//!
//! - **Passive**: a burst every `burst_interval` seconds. The first burst
//!   comes one interval after activation.
//! - **AI**: roams around its anchor and, whenever the attack timer elapses,
//!   halts, fires one burst, and goes back to roaming.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use ricochet_core::config::EmitterConfig;
//! use ricochet_core::emitter::{EmitterAction, EmitterMode, EmitterState};
//!
//! let mut emitter = EmitterState::new(EmitterMode::Passive, Vec2::ZERO, &EmitterConfig::default());
//! emitter.activate();
//! emitter.start_burst();
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(1);
//! let actions = emitter.advance(1.0 / 60.0, Vec2::ZERO, &mut rng);
//! assert!(matches!(actions.as_slice(), [EmitterAction::Fire { .. }]));
//! assert!(emitter.is_firing());
//! ```

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::EmitterConfig;
use crate::entity::components::Faction;
use crate::projectile::ProjectileKind;
use crate::timer::{RepeatingTimer, Timer};

// =============================================================================
// Configuration Types
// =============================================================================

/// Whether the emitter only fires or also roams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmitterMode {
    /// Fire bursts on a fixed cadence.
    Passive,
    /// Roam, then stop and attack on a timer.
    Ai,
}

/// Phase of the AI state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiPhase {
    /// Moving between random points near the anchor.
    #[default]
    Roaming,
    /// Halted while a burst plays out.
    Attacking,
}

/// How the kind of each shot is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KindSelection {
    /// Always the same kind.
    Fixed(ProjectileKind),
    /// Standard, piercing, earthquake, repeating.
    Cycle {
        /// Index of the next kind in the cycle.
        next: usize,
    },
    /// Uniformly random per shot, from the seeded plugin RNG.
    Random,
}

impl Default for KindSelection {
    fn default() -> Self {
        Self::Fixed(ProjectileKind::Standard)
    }
}

/// Where a shot is aimed. Resolved against the world when the shot fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TargetSpec {
    /// The player.
    Player,
    /// The nearest living combat target of a faction.
    NearestOf(Faction),
    /// A fixed world point.
    Point(Vec2),
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self::Player
    }
}

/// What the emitter wants done this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmitterAction {
    /// Spawn one wave.
    Fire {
        /// Kind of wave to spawn.
        kind: ProjectileKind,
        /// Where to aim it.
        target: TargetSpec,
        /// Speed override, if configured.
        speed: Option<f32>,
    },
    /// Set the owner's velocity.
    Steer {
        /// Desired velocity.
        velocity: Vec2,
    },
}

// =============================================================================
// Burst
// =============================================================================

/// An in-flight burst of evenly spaced shots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Burst {
    shots_left: u32,
    until_next: f32,
}

// =============================================================================
// Emitter State
// =============================================================================

/// Firing and AI state carried by an enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterState {
    /// Passive or AI.
    pub mode: EmitterMode,
    /// Shot kind selection.
    pub selection: KindSelection,
    /// Target used when no per-kind override applies.
    pub target: TargetSpec,
    /// Per-kind target overrides.
    pub overrides: BTreeMap<ProjectileKind, TargetSpec>,
    /// Center of the roaming area.
    pub anchor: Vec2,
    active: bool,
    phase: AiPhase,
    roam_target: Option<Vec2>,
    repick: Timer,
    attack: RepeatingTimer,
    cadence: RepeatingTimer,
    burst: Option<Burst>,
    tuning: EmitterConfig,
}

impl EmitterState {
    /// Creates an inactive emitter anchored at `anchor`.
    #[must_use]
    pub fn new(mode: EmitterMode, anchor: Vec2, config: &EmitterConfig) -> Self {
        Self {
            mode,
            selection: KindSelection::default(),
            target: TargetSpec::default(),
            overrides: BTreeMap::new(),
            anchor,
            active: false,
            phase: AiPhase::Roaming,
            roam_target: None,
            repick: Timer::new(config.repick_interval),
            attack: RepeatingTimer::new(config.attack_interval()),
            cadence: RepeatingTimer::new(config.burst_interval),
            burst: None,
            tuning: config.clone(),
        }
    }

    /// Sets the kind selection (builder style).
    #[must_use]
    pub fn with_selection(mut self, selection: KindSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the default target (builder style).
    #[must_use]
    pub fn with_target(mut self, target: TargetSpec) -> Self {
        self.target = target;
        self
    }

    /// Overrides the target for one kind (builder style).
    #[must_use]
    pub fn with_override(mut self, kind: ProjectileKind, target: TargetSpec) -> Self {
        self.overrides.insert(kind, target);
        self
    }

    /// Returns `true` while the emitter may move and fire.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Current AI phase. Always `Roaming` for passive emitters.
    #[must_use]
    pub const fn phase(&self) -> AiPhase {
        self.phase
    }

    /// Returns `true` while a burst is in progress.
    #[must_use]
    pub const fn is_firing(&self) -> bool {
        self.burst.is_some()
    }

    /// Current roaming destination, if one has been picked.
    #[must_use]
    pub const fn roam_target(&self) -> Option<Vec2> {
        self.roam_target
    }

    /// Target for a shot of `kind`, honoring overrides.
    #[must_use]
    pub fn target_for(&self, kind: ProjectileKind) -> TargetSpec {
        self.overrides.get(&kind).copied().unwrap_or(self.target)
    }

    /// Enables movement and firing. Timers start from zero.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        self.cadence.reset();
        self.attack.reset();
        self.repick.reset();
        self.phase = AiPhase::Roaming;
    }

    /// Disables the emitter and cancels any in-flight burst.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.burst = None;
        self.phase = AiPhase::Roaming;
        self.roam_target = None;
    }

    /// Cancels the current burst without deactivating.
    pub fn stop_firing(&mut self) {
        self.burst = None;
        if self.phase == AiPhase::Attacking {
            self.phase = AiPhase::Roaming;
            self.repick.reset();
        }
    }

    /// Starts a burst now. Ignored while inactive or already firing.
    ///
    /// # Returns
    ///
    /// `true` if a burst was started.
    pub fn start_burst(&mut self) -> bool {
        if !self.active || self.burst.is_some() {
            return false;
        }
        self.burst = Some(Burst {
            shots_left: self.tuning.burst_size,
            until_next: 0.0,
        });
        true
    }

    /// Advances the emitter by `dt` seconds.
    ///
    /// # Arguments
    ///
    /// * `dt` - Tick length in seconds
    /// * `position` - Owner's current position
    /// * `rng` - Deterministic RNG for roaming points and random kinds
    ///
    /// # Returns
    ///
    /// Actions for this tick, in the order they should be applied.
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: f32, position: Vec2, rng: &mut R) -> Vec<EmitterAction> {
        let mut actions = Vec::new();
        if !self.active {
            if self.mode == EmitterMode::Ai {
                actions.push(EmitterAction::Steer { velocity: Vec2::ZERO });
            }
            return actions;
        }

        match self.mode {
            EmitterMode::Passive => {
                if self.burst.is_none() && self.cadence.tick(dt) > 0 {
                    self.start_burst();
                }
                self.progress_burst(dt, rng, &mut actions);
            }
            EmitterMode::Ai => self.advance_ai(dt, position, rng, &mut actions),
        }
        actions
    }

    fn advance_ai<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        position: Vec2,
        rng: &mut R,
        actions: &mut Vec<EmitterAction>,
    ) {
        if self.phase == AiPhase::Roaming && self.burst.is_none() && self.attack.tick(dt) > 0 {
            tracing::debug!(anchor = ?self.anchor, "emitter entering attack");
            self.phase = AiPhase::Attacking;
            self.start_burst();
        }

        match self.phase {
            AiPhase::Attacking => {
                actions.push(EmitterAction::Steer { velocity: Vec2::ZERO });
                self.progress_burst(dt, rng, actions);
                if self.burst.is_none() {
                    self.phase = AiPhase::Roaming;
                    self.repick.reset();
                }
            }
            AiPhase::Roaming => {
                // Test bursts can still play out while roaming.
                self.progress_burst(dt, rng, actions);
                let repick_due = self.repick.tick(dt);
                let arrived = self
                    .roam_target
                    .map_or(true, |t| t.distance(position) <= self.tuning.arrival_tolerance);
                if arrived || repick_due {
                    self.roam_target = Some(self.pick_roam_point(rng));
                    self.repick.reset();
                }
                let velocity = self.roam_target.map_or(Vec2::ZERO, |t| {
                    let offset = t - position;
                    if offset.length() <= self.tuning.arrival_tolerance {
                        Vec2::ZERO
                    } else {
                        offset.normalize_or_zero() * self.tuning.roam_speed
                    }
                });
                actions.push(EmitterAction::Steer { velocity });
            }
        }
    }

    fn progress_burst<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R, actions: &mut Vec<EmitterAction>) {
        let Some(mut burst) = self.burst else {
            return;
        };
        while burst.shots_left > 0 && burst.until_next <= 0.0 {
            let kind = self.next_kind(rng);
            actions.push(EmitterAction::Fire {
                kind,
                target: self.target_for(kind),
                speed: self.tuning.speed_override,
            });
            burst.shots_left -= 1;
            burst.until_next += self.tuning.shot_spacing;
        }
        burst.until_next -= dt;
        // The burst stays "firing" through the spacing after its last shot.
        self.burst = if burst.shots_left == 0 && burst.until_next <= 0.0 {
            None
        } else {
            Some(burst)
        };
    }

    fn next_kind<R: Rng + ?Sized>(&mut self, rng: &mut R) -> ProjectileKind {
        match &mut self.selection {
            KindSelection::Fixed(kind) => *kind,
            KindSelection::Cycle { next } => {
                let kind = ProjectileKind::ALL[*next % ProjectileKind::ALL.len()];
                *next = (*next + 1) % ProjectileKind::ALL.len();
                kind
            }
            KindSelection::Random => ProjectileKind::ALL[rng.gen_range(0..ProjectileKind::ALL.len())],
        }
    }

    fn pick_roam_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = self.tuning.roam_radius * rng.gen::<f32>().sqrt();
        self.anchor + Vec2::from_angle(angle) * distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 1.0 / 60.0;

    fn fires(actions: &[EmitterAction]) -> usize {
        actions
            .iter()
            .filter(|a| matches!(a, EmitterAction::Fire { .. }))
            .count()
    }

    fn run(emitter: &mut EmitterState, seconds: f32, rng: &mut ChaCha8Rng) -> usize {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ticks = (seconds / DT).round() as usize;
        (0..ticks)
            .map(|_| fires(&emitter.advance(DT, Vec2::ZERO, rng)))
            .sum()
    }

    mod burst_tests {
        use super::*;

        #[test]
        fn burst_fires_three_spaced_shots() {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let mut emitter = EmitterState::new(EmitterMode::Passive, Vec2::ZERO, &EmitterConfig::default());
            emitter.activate();
            assert!(emitter.start_burst());

            assert_eq!(fires(&emitter.advance(DT, Vec2::ZERO, &mut rng)), 1);
            assert_eq!(run(&mut emitter, 0.4, &mut rng), 0);
            assert_eq!(run(&mut emitter, 0.2, &mut rng), 1);
            assert_eq!(run(&mut emitter, 0.5, &mut rng), 1);
            assert_eq!(run(&mut emitter, 0.6, &mut rng), 0);
            assert!(!emitter.is_firing());
        }

        #[test]
        fn start_burst_is_guarded() {
            let mut emitter = EmitterState::new(EmitterMode::Passive, Vec2::ZERO, &EmitterConfig::default());
            assert!(!emitter.start_burst());
            emitter.activate();
            assert!(emitter.start_burst());
            assert!(!emitter.start_burst());
        }

        #[test]
        fn deactivate_cancels_burst() {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let mut emitter = EmitterState::new(EmitterMode::Passive, Vec2::ZERO, &EmitterConfig::default());
            emitter.activate();
            emitter.start_burst();
            emitter.advance(DT, Vec2::ZERO, &mut rng);
            emitter.deactivate();
            assert!(!emitter.is_firing());
            assert_eq!(run(&mut emitter, 5.0, &mut rng), 0);
        }

        #[test]
        fn stop_firing_keeps_emitter_active() {
            let mut emitter = EmitterState::new(EmitterMode::Passive, Vec2::ZERO, &EmitterConfig::default());
            emitter.activate();
            emitter.start_burst();
            emitter.stop_firing();
            assert!(!emitter.is_firing());
            assert!(emitter.is_active());
        }
    }

    mod passive_tests {
        use super::*;

        #[test]
        fn inactive_never_fires() {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let mut emitter = EmitterState::new(EmitterMode::Passive, Vec2::ZERO, &EmitterConfig::default());
            assert_eq!(run(&mut emitter, 10.0, &mut rng), 0);
        }

        #[test]
        fn first_burst_after_one_interval() {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let mut emitter = EmitterState::new(EmitterMode::Passive, Vec2::ZERO, &EmitterConfig::default());
            emitter.activate();
            assert_eq!(run(&mut emitter, 2.9, &mut rng), 0);
            assert_eq!(run(&mut emitter, 1.5, &mut rng), 3);
        }
    }

    mod ai_tests {
        use super::*;

        #[test]
        fn roams_within_radius() {
            let mut rng = ChaCha8Rng::seed_from_u64(9);
            let anchor = Vec2::new(10.0, -3.0);
            let mut emitter = EmitterState::new(EmitterMode::Ai, anchor, &EmitterConfig::default());
            emitter.activate();
            let actions = emitter.advance(DT, anchor, &mut rng);
            let target = emitter.roam_target().unwrap();
            assert!(target.distance(anchor) <= 4.0 + 1e-4);
            assert!(actions
                .iter()
                .any(|a| matches!(a, EmitterAction::Steer { .. })));
        }

        #[test]
        fn attacks_halt_then_resume() {
            let mut rng = ChaCha8Rng::seed_from_u64(3);
            let mut emitter = EmitterState::new(EmitterMode::Ai, Vec2::ZERO, &EmitterConfig::default());
            emitter.activate();

            // fire_rate 0.5 gives a two second attack interval
            assert_eq!(run(&mut emitter, 1.9, &mut rng), 0);
            let actions = emitter.advance(0.2, Vec2::ZERO, &mut rng);
            assert_eq!(emitter.phase(), AiPhase::Attacking);
            assert!(actions.contains(&EmitterAction::Steer { velocity: Vec2::ZERO }));
            assert_eq!(fires(&actions), 1);

            assert_eq!(run(&mut emitter, 1.5, &mut rng), 2);
            assert_eq!(emitter.phase(), AiPhase::Roaming);
        }

        #[test]
        fn unbounded_fire_rate_starts_one_burst_per_tick() {
            let mut rng = ChaCha8Rng::seed_from_u64(3);
            let config = EmitterConfig {
                fire_rate: f32::INFINITY,
                ..EmitterConfig::default()
            };
            let mut emitter = EmitterState::new(EmitterMode::Ai, Vec2::ZERO, &config);
            emitter.activate();
            let actions = emitter.advance(10.0, Vec2::ZERO, &mut rng);
            assert_eq!(emitter.phase(), AiPhase::Attacking);
            assert!(fires(&actions) <= 3);
        }

        #[test]
        fn inactive_ai_holds_still() {
            let mut rng = ChaCha8Rng::seed_from_u64(3);
            let mut emitter = EmitterState::new(EmitterMode::Ai, Vec2::ZERO, &EmitterConfig::default());
            let actions = emitter.advance(DT, Vec2::ZERO, &mut rng);
            assert_eq!(actions, vec![EmitterAction::Steer { velocity: Vec2::ZERO }]);
        }
    }

    mod selection_tests {
        use super::*;

        #[test]
        fn cycle_visits_every_kind() {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let mut emitter = EmitterState::new(EmitterMode::Passive, Vec2::ZERO, &EmitterConfig::default())
                .with_selection(KindSelection::Cycle { next: 0 });
            let kinds: Vec<_> = (0..4).map(|_| emitter.next_kind(&mut rng)).collect();
            assert_eq!(
                kinds,
                vec![
                    ProjectileKind::Standard,
                    ProjectileKind::Piercing,
                    ProjectileKind::Earthquake,
                    ProjectileKind::Standard
                ]
            );
        }

        #[test]
        fn random_is_seed_deterministic() {
            let pick = |seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut emitter =
                    EmitterState::new(EmitterMode::Passive, Vec2::ZERO, &EmitterConfig::default())
                        .with_selection(KindSelection::Random);
                (0..16).map(|_| emitter.next_kind(&mut rng)).collect::<Vec<_>>()
            };
            assert_eq!(pick(11), pick(11));
        }

        #[test]
        fn overrides_win_over_default_target() {
            let point = TargetSpec::Point(Vec2::new(1.0, 2.0));
            let emitter = EmitterState::new(EmitterMode::Passive, Vec2::ZERO, &EmitterConfig::default())
                .with_override(ProjectileKind::Piercing, point);
            assert_eq!(emitter.target_for(ProjectileKind::Piercing), point);
            assert_eq!(emitter.target_for(ProjectileKind::Standard), TargetSpec::Player);
        }
    }

    #[test]
    fn serialization_roundtrip() {
        let emitter = EmitterState::new(EmitterMode::Ai, Vec2::ONE, &EmitterConfig::default())
            .with_override(ProjectileKind::Earthquake, TargetSpec::NearestOf(Faction::Player));
        let json = serde_json::to_string(&emitter).unwrap();
        let back: EmitterState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, emitter);
    }
}
