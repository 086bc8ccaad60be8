//! Explicit timer objects carried on entity and encounter state.
//!
//! Every timed behavior in the simulation (burst spacing, roll animations,
//! invincibility windows, despawn delays, exit cooldowns, monitor polls) is
//! one of these values stored on its owner and advanced by the tick. Dropping
//! or resetting the owner cancels the timer; nothing outlives the state that
//! holds it.
//!
//! # Example
//!
//! ```
//! use ricochet_core::timer::{Cooldown, RepeatingTimer, Timer};
//!
//! let mut roll = Timer::new(0.5);
//! assert!(!roll.tick(0.25));
//! assert!(roll.tick(0.25));
//!
//! let mut poll = RepeatingTimer::new(0.5);
//! assert_eq!(poll.tick(1.2), 2);
//!
//! let mut cooldown = Cooldown::default();
//! cooldown.start(0.5);
//! assert!(!cooldown.is_ready());
//! cooldown.tick(0.5);
//! assert!(cooldown.is_ready());
//! ```

use serde::{Deserialize, Serialize};

// =============================================================================
// One-shot Timer
// =============================================================================

/// A one-shot countdown that finishes once `duration` seconds have elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    duration: f32,
    elapsed: f32,
}

impl Timer {
    /// Creates a timer that finishes after `duration` seconds.
    ///
    /// Negative durations are treated as zero, so the timer finishes on the
    /// first tick.
    #[must_use]
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Advances the timer by `dt` seconds.
    ///
    /// # Returns
    ///
    /// `true` if the timer is finished after this tick.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.is_finished()
    }

    /// Returns `true` once the full duration has elapsed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Seconds left before the timer finishes.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    /// Elapsed fraction in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        }
    }

    /// Returns the configured duration.
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }

    /// Restarts the countdown from zero.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

// =============================================================================
// Repeating Timer
// =============================================================================

/// A periodic timer that fires every `interval` seconds.
///
/// Used for interval-based polling (gate monitors, proximity sampling) and
/// for the emitter attack cadence. Large `dt` values fire multiple times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepeatingTimer {
    interval: f32,
    accumulated: f32,
}

impl RepeatingTimer {
    /// Creates a repeating timer.
    ///
    /// An interval that is not a positive finite number degenerates to
    /// firing once on every tick that advances time.
    #[must_use]
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            accumulated: 0.0,
        }
    }

    /// Advances the timer and returns how many times it fired.
    pub fn tick(&mut self, dt: f32) -> u32 {
        let dt = dt.max(0.0);
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return u32::from(dt > 0.0);
        }
        self.accumulated += dt;
        let mut fired = 0;
        while self.accumulated >= self.interval {
            self.accumulated -= self.interval;
            fired += 1;
        }
        fired
    }

    /// Returns the firing interval in seconds.
    #[must_use]
    pub const fn interval(&self) -> f32 {
        self.interval
    }

    /// Seconds until the next firing.
    #[must_use]
    pub fn until_next(&self) -> f32 {
        (self.interval - self.accumulated).max(0.0)
    }

    /// Discards accumulated time.
    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}

// =============================================================================
// Cooldown
// =============================================================================

/// A cooldown that is ready when no time remains.
///
/// Unlike [`Timer`], a cooldown starts out ready and is armed explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    remaining: f32,
}

impl Cooldown {
    /// Arms the cooldown for `duration` seconds.
    pub fn start(&mut self, duration: f32) {
        self.remaining = duration.max(0.0);
    }

    /// Advances the cooldown by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
    }

    /// Returns `true` when the cooldown has run out.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Seconds left on the cooldown.
    #[must_use]
    pub const fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Clears the cooldown immediately.
    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod timer_tests {
        use super::*;

        #[test]
        fn finishes_after_duration() {
            let mut timer = Timer::new(1.0);
            assert!(!timer.tick(0.4));
            assert!(!timer.tick(0.4));
            assert!(timer.tick(0.4));
            assert!(timer.is_finished());
            assert_eq!(timer.remaining(), 0.0);
        }

        #[test]
        fn zero_duration_finishes_immediately() {
            let mut timer = Timer::new(0.0);
            assert!(timer.is_finished());
            assert!(timer.tick(0.0));
            assert_eq!(timer.fraction(), 1.0);
        }

        #[test]
        fn negative_dt_is_ignored() {
            let mut timer = Timer::new(1.0);
            timer.tick(-5.0);
            assert_eq!(timer.remaining(), 1.0);
        }

        #[test]
        fn reset_restarts() {
            let mut timer = Timer::new(0.5);
            timer.tick(0.5);
            timer.reset();
            assert!(!timer.is_finished());
            assert!((timer.fraction() - 0.0).abs() < f32::EPSILON);
        }
    }

    mod repeating_timer_tests {
        use super::*;

        #[test]
        fn fires_once_per_interval() {
            let mut timer = RepeatingTimer::new(0.5);
            assert_eq!(timer.tick(0.3), 0);
            assert_eq!(timer.tick(0.3), 1);
            assert!((timer.until_next() - 0.4).abs() < 1e-5);
        }

        #[test]
        fn large_step_fires_multiple_times() {
            let mut timer = RepeatingTimer::new(0.25);
            assert_eq!(timer.tick(1.0), 4);
        }

        #[test]
        fn degenerate_interval_fires_once_per_tick() {
            for interval in [0.0, -1.0, f32::NAN] {
                let mut timer = RepeatingTimer::new(interval);
                assert_eq!(timer.tick(10.0), 1);
                assert_eq!(timer.tick(0.0), 0);
            }
        }
    }

    mod cooldown_tests {
        use super::*;

        #[test]
        fn default_is_ready() {
            assert!(Cooldown::default().is_ready());
        }

        #[test]
        fn start_and_expire() {
            let mut cooldown = Cooldown::default();
            cooldown.start(0.5);
            assert!(!cooldown.is_ready());
            cooldown.tick(0.25);
            assert!((cooldown.remaining() - 0.25).abs() < 1e-6);
            cooldown.tick(0.3);
            assert!(cooldown.is_ready());
            assert_eq!(cooldown.remaining(), 0.0);
        }

        #[test]
        fn serialization_roundtrip() {
            let mut cooldown = Cooldown::default();
            cooldown.start(1.5);
            let json = serde_json::to_string(&cooldown).unwrap();
            let back: Cooldown = serde_json::from_str(&json).unwrap();
            assert_eq!(back, cooldown);
        }
    }
}
