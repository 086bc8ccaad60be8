//! Combat target state: health, death, and invincibility.
//!
//! [`HealthState`] is the single authority over a character's health. The
//! player, enemies, and allies all carry one. Health only changes through the
//! damage and heal operations, which keep it within `[0, max]` and make the
//! death transition happen exactly once.
//!
//! # Example
//!
//! ```
//! use ricochet_core::combat::{DamageOutcome, HealthState};
//!
//! let mut health = HealthState::new(100.0);
//! assert_eq!(health.apply_damage(30.0), DamageOutcome::Damaged { remaining: 70.0 });
//! assert_eq!(health.apply_damage(80.0), DamageOutcome::Killed);
//! assert_eq!(health.apply_damage(10.0), DamageOutcome::Ignored);
//! assert!(health.is_dead());
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::timer::Timer;

bitflags! {
    /// Status flags carried by a combat target.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusFlags: u8 {
        /// The target has died. Set once, cleared only by `revive`.
        const DEAD = 1 << 0;
        /// The target ignores all damage until the flag is cleared.
        const INVINCIBLE = 1 << 1;
    }
}

/// Result of a damage application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// The damage was rejected (dead, invincible, or inside a hit window).
    Ignored,
    /// Health was reduced and the target survived.
    Damaged {
        /// Health left after the hit.
        remaining: f32,
    },
    /// This hit killed the target. Only ever returned once per life.
    Killed,
}

impl DamageOutcome {
    /// Returns `true` if the damage changed the target's health.
    #[must_use]
    pub const fn landed(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Health and death state for a combat target.
///
/// # Invariants
///
/// - `0 <= current <= max`
/// - Once [`StatusFlags::DEAD`] is set, damage and heal are no-ops
/// - The transition to dead happens exactly once per life
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthState {
    current: f32,
    max: f32,
    flags: StatusFlags,
    /// Temporary invincibility after a non-lethal hit.
    window: Option<Timer>,
}

impl HealthState {
    /// Creates a full-health target.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self {
            current: max,
            max,
            flags: StatusFlags::empty(),
            window: None,
        }
    }

    /// Current health.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Maximum health.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Health as a fraction of max, in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    /// Current status flags.
    #[must_use]
    pub const fn flags(&self) -> StatusFlags {
        self.flags
    }

    /// Returns `true` once the target has died.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.flags.contains(StatusFlags::DEAD)
    }

    /// Returns `true` if the global invincibility flag is set.
    #[must_use]
    pub const fn is_invincible(&self) -> bool {
        self.flags.contains(StatusFlags::INVINCIBLE)
    }

    /// Returns `true` while a post-hit invincibility window is running.
    #[must_use]
    pub fn in_hit_window(&self) -> bool {
        self.window.is_some_and(|w| !w.is_finished())
    }

    /// Applies damage, respecting the post-hit window.
    ///
    /// No-op if the target is dead, globally invincible, or inside its hit
    /// window. Negative amounts are treated as zero.
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.in_hit_window() {
            return DamageOutcome::Ignored;
        }
        self.apply(amount)
    }

    /// Applies damage that ignores the post-hit window.
    ///
    /// Used for bounced waves, which must always land on a vulnerable
    /// target. Global invincibility and death still block it.
    pub fn apply_unblockable_damage(&mut self, amount: f32) -> DamageOutcome {
        self.apply(amount)
    }

    fn apply(&mut self, amount: f32) -> DamageOutcome {
        if self.is_dead() || self.is_invincible() {
            return DamageOutcome::Ignored;
        }
        self.current = (self.current - amount.max(0.0)).clamp(0.0, self.max);
        if self.current <= 0.0 {
            self.flags.insert(StatusFlags::DEAD);
            self.window = None;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Damaged {
                remaining: self.current,
            }
        }
    }

    /// Restores health, clamped to max. No-op once dead.
    ///
    /// # Returns
    ///
    /// The amount of health actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.is_dead() {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current - before
    }

    /// Kills the target regardless of health and invincibility.
    ///
    /// # Returns
    ///
    /// `true` if this call caused the death.
    pub fn kill(&mut self) -> bool {
        if self.is_dead() {
            return false;
        }
        self.current = 0.0;
        self.flags.insert(StatusFlags::DEAD);
        self.window = None;
        true
    }

    /// Sets or clears global invincibility.
    pub fn set_invincible(&mut self, invincible: bool) {
        self.flags.set(StatusFlags::INVINCIBLE, invincible);
    }

    /// Starts a post-hit invincibility window. Zero durations are ignored.
    pub fn start_hit_window(&mut self, duration: f32) {
        if duration > 0.0 && !self.is_dead() {
            self.window = Some(Timer::new(duration));
        }
    }

    /// Advances the hit window.
    pub fn tick(&mut self, dt: f32) {
        if let Some(window) = self.window.as_mut() {
            if window.tick(dt) {
                self.window = None;
            }
        }
    }

    /// Restores full health and clears death. Test and debug use only.
    pub fn revive(&mut self) {
        self.current = self.max;
        self.flags.remove(StatusFlags::DEAD);
        self.window = None;
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new(100.0)
    }
}
