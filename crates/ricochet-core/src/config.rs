//! Simulation configuration.
//!
//! [`SimConfig`] groups every tunable constant of the simulation into nested
//! sections. All sections implement `Default` with the shipped game values and
//! are `#[serde(default)]`, so a partial document only needs to name the values
//! it overrides. Loading the document from disk is left to the caller.
//!
//! # Example
//!
//! ```
//! use ricochet_core::config::{EarthquakeVariant, SimConfig};
//!
//! let mut config = SimConfig::default();
//! config.projectile.earthquake_variant = EarthquakeVariant::PassThrough;
//! config.damage.bounced_wave = 80.0;
//!
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::projectile::ProjectileKind;

// =============================================================================
// Root
// =============================================================================

/// Root configuration for a [`Simulation`](crate::simulation::Simulation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed timestep in seconds.
    pub dt: f32,
    /// Projectile kinds and registry upkeep.
    pub projectile: ProjectileConfig,
    /// Damage amounts and hit policy.
    pub damage: DamagePolicy,
    /// Health pools, invincibility, and collider sizes.
    pub combat: CombatConfig,
    /// Emitter bursts and AI.
    pub emitter: EmitterConfig,
    /// Player-orbiting deflectors.
    pub deflector: DeflectorConfig,
    /// Player movement and energy.
    pub player: PlayerConfig,
    /// Encounter gates and exits.
    pub encounter: EncounterConfig,
    /// Stage sequence transitions.
    pub progression: ProgressionConfig,
    /// Walls, pushable and breakable boxes.
    pub obstacle: ObstacleConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            projectile: ProjectileConfig::default(),
            damage: DamagePolicy::default(),
            combat: CombatConfig::default(),
            emitter: EmitterConfig::default(),
            deflector: DeflectorConfig::default(),
            player: PlayerConfig::default(),
            encounter: EncounterConfig::default(),
            progression: ProgressionConfig::default(),
            obstacle: ObstacleConfig::default(),
        }
    }
}

impl SimConfig {
    /// Checks every section for values the simulation cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("dt", self.dt)?;
        self.projectile.validate()?;
        self.damage.validate()?;
        self.combat.validate()?;
        self.emitter.validate()?;
        self.deflector.validate()?;
        self.player.validate()?;
        self.encounter.validate()?;
        self.progression.validate()?;
        self.obstacle.validate()
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}

// =============================================================================
// Projectiles
// =============================================================================

/// Which of the two earthquake behaviors is in effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EarthquakeVariant {
    /// Rolls over deflectors on a timed roll, ignores enemies.
    #[default]
    RollOver,
    /// Passes through deflectors, kills enemies unconditionally and keeps going.
    PassThrough,
}

/// Motion and bounce tuning for one projectile kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindTuning {
    /// Travel speed in units per second.
    pub speed: f32,
    /// Seconds before the projectile expires.
    pub lifetime: f32,
    /// Maximum number of bounces.
    pub bounce_limit: u32,
    /// Speed multiplier applied on each bounce.
    pub damping: f32,
    /// Whether the projectile may hit allies.
    pub can_hit_allies: bool,
}

impl KindTuning {
    fn validate(&self, [speed, lifetime, damping]: [&'static str; 3]) -> Result<(), ConfigError> {
        positive(speed, self.speed)?;
        positive(lifetime, self.lifetime)?;
        unit(damping, self.damping)
    }
}

/// Projectile configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Standard wave tuning.
    pub standard: KindTuning,
    /// Piercing wave tuning.
    pub piercing: KindTuning,
    /// Earthquake wave tuning.
    pub earthquake: KindTuning,
    /// Earthquake behavior selection.
    pub earthquake_variant: EarthquakeVariant,
    /// Duration of the earthquake roll over a deflector, in seconds.
    pub roll_duration: f32,
    /// Initial collider radius of every wave.
    pub radius: f32,
    /// Collider radius growth in units per second.
    pub growth_rate: f32,
    /// Ticks between projectile registry sweeps.
    pub sweep_interval_ticks: u64,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            standard: KindTuning {
                speed: 5.0,
                lifetime: 5.0,
                bounce_limit: 3,
                damping: 0.8,
                can_hit_allies: false,
            },
            piercing: KindTuning {
                speed: 10.0,
                lifetime: 8.0,
                bounce_limit: 5,
                damping: 0.8,
                can_hit_allies: false,
            },
            earthquake: KindTuning {
                speed: 3.0,
                lifetime: 10.0,
                bounce_limit: 0,
                damping: 1.0,
                can_hit_allies: true,
            },
            earthquake_variant: EarthquakeVariant::default(),
            roll_duration: 0.5,
            radius: 0.25,
            growth_rate: 0.1,
            sweep_interval_ticks: 60,
        }
    }
}

impl ProjectileConfig {
    /// Returns the tuning for a projectile kind.
    #[must_use]
    pub const fn tuning(&self, kind: ProjectileKind) -> &KindTuning {
        match kind {
            ProjectileKind::Standard => &self.standard,
            ProjectileKind::Piercing => &self.piercing,
            ProjectileKind::Earthquake => &self.earthquake,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.standard.validate([
            "projectile.standard.speed",
            "projectile.standard.lifetime",
            "projectile.standard.damping",
        ])?;
        self.piercing.validate([
            "projectile.piercing.speed",
            "projectile.piercing.lifetime",
            "projectile.piercing.damping",
        ])?;
        self.earthquake.validate([
            "projectile.earthquake.speed",
            "projectile.earthquake.lifetime",
            "projectile.earthquake.damping",
        ])?;
        non_negative("projectile.roll_duration", self.roll_duration)?;
        positive("projectile.radius", self.radius)?;
        non_negative("projectile.growth_rate", self.growth_rate)?;
        if self.sweep_interval_ticks == 0 {
            return Err(ConfigError::ZeroCount {
                field: "projectile.sweep_interval_ticks",
            });
        }
        Ok(())
    }
}

// =============================================================================
// Damage
// =============================================================================

/// Damage amounts and the rules for when a hit lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamagePolicy {
    /// Damage from a wave that has not bounced.
    pub normal_wave: f32,
    /// Damage from a wave that has bounced at least once.
    pub bounced_wave: f32,
    /// Damage any wave deals to the player.
    pub player_hit: f32,
    /// Damage an ally-hitting wave deals to an ally.
    pub ally_hit: f32,
    /// When set, unbounced standard waves also hurt enemies (for
    /// `normal_wave` damage) and are consumed by the hit.
    pub unbounced_waves_hurt_enemies: bool,
    /// Clear every live projectile when the player is hit.
    pub purge_on_player_hit: bool,
}

impl Default for DamagePolicy {
    fn default() -> Self {
        Self {
            normal_wave: 30.0,
            bounced_wave: 100.0,
            player_hit: 100.0,
            ally_hit: 30.0,
            unbounced_waves_hurt_enemies: false,
            purge_on_player_hit: true,
        }
    }
}

impl DamagePolicy {
    /// Damage a wave deals to an enemy given how many times it has bounced.
    #[must_use]
    pub fn wave_damage(&self, bounce_count: u32) -> f32 {
        if bounce_count > 0 {
            self.bounced_wave
        } else {
            self.normal_wave
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("damage.normal_wave", self.normal_wave)?;
        non_negative("damage.bounced_wave", self.bounced_wave)?;
        non_negative("damage.player_hit", self.player_hit)?;
        non_negative("damage.ally_hit", self.ally_hit)
    }
}

// =============================================================================
// Combat Targets
// =============================================================================

/// Health pools, hit windows, and collider sizes for combat targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Enemy maximum health.
    pub enemy_max_health: f32,
    /// Player maximum health.
    pub player_max_health: f32,
    /// Ally maximum health.
    pub ally_max_health: f32,
    /// Invincibility window after a non-lethal unbounced hit, in seconds.
    pub invincibility_duration: f32,
    /// Delay between an enemy's death and its removal, in seconds.
    pub enemy_destroy_delay: f32,
    /// Collider radius of the player.
    pub player_radius: f32,
    /// Collider radius of enemies.
    pub enemy_radius: f32,
    /// Collider radius of allies.
    pub ally_radius: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            enemy_max_health: 100.0,
            player_max_health: 100.0,
            ally_max_health: 100.0,
            invincibility_duration: 0.1,
            enemy_destroy_delay: 0.5,
            player_radius: 0.5,
            enemy_radius: 0.5,
            ally_radius: 0.5,
        }
    }
}

impl CombatConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("combat.enemy_max_health", self.enemy_max_health)?;
        positive("combat.player_max_health", self.player_max_health)?;
        positive("combat.ally_max_health", self.ally_max_health)?;
        non_negative("combat.invincibility_duration", self.invincibility_duration)?;
        non_negative("combat.enemy_destroy_delay", self.enemy_destroy_delay)?;
        positive("combat.player_radius", self.player_radius)?;
        positive("combat.enemy_radius", self.enemy_radius)?;
        positive("combat.ally_radius", self.ally_radius)
    }
}

// =============================================================================
// Emitters
// =============================================================================

/// Burst and AI tuning shared by every emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Projectiles per burst.
    pub burst_size: u32,
    /// Seconds between shots inside a burst.
    pub shot_spacing: f32,
    /// Seconds between bursts for passive emitters.
    pub burst_interval: f32,
    /// AI attacks per second. Non-positive values use `fallback_interval`.
    pub fire_rate: f32,
    /// Attack interval used when `fire_rate` is not positive.
    pub fallback_interval: f32,
    /// Radius around the anchor in which roaming destinations are picked.
    pub roam_radius: f32,
    /// Roaming speed in units per second.
    pub roam_speed: f32,
    /// Seconds before a roaming destination is re-picked.
    pub repick_interval: f32,
    /// Distance at which a roaming destination counts as reached.
    pub arrival_tolerance: f32,
    /// Overrides the per-kind projectile speed when set.
    pub speed_override: Option<f32>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            burst_size: 3,
            shot_spacing: 0.5,
            burst_interval: 3.0,
            fire_rate: 0.5,
            fallback_interval: 3.0,
            roam_radius: 4.0,
            roam_speed: 2.0,
            repick_interval: 3.0,
            arrival_tolerance: 0.2,
            speed_override: None,
        }
    }
}

impl EmitterConfig {
    /// Seconds between AI attacks.
    ///
    /// Derived from `fire_rate` as `1 / fire_rate`, falling back to
    /// `fallback_interval` when the rate is zero or negative.
    #[must_use]
    pub fn attack_interval(&self) -> f32 {
        if self.fire_rate > 0.0 {
            1.0 / self.fire_rate
        } else {
            self.fallback_interval
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.burst_size == 0 {
            return Err(ConfigError::ZeroCount {
                field: "emitter.burst_size",
            });
        }
        finite("emitter.fire_rate", self.fire_rate)?;
        non_negative("emitter.shot_spacing", self.shot_spacing)?;
        positive("emitter.burst_interval", self.burst_interval)?;
        positive("emitter.fallback_interval", self.fallback_interval)?;
        non_negative("emitter.roam_radius", self.roam_radius)?;
        non_negative("emitter.roam_speed", self.roam_speed)?;
        positive("emitter.repick_interval", self.repick_interval)?;
        positive("emitter.arrival_tolerance", self.arrival_tolerance)?;
        if let Some(speed) = self.speed_override {
            positive("emitter.speed_override", speed)?;
        }
        Ok(())
    }
}

// =============================================================================
// Deflectors
// =============================================================================

/// Deflector orbit and interception tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeflectorConfig {
    /// Distance from the owner to the deflector center.
    pub orbit_radius: f32,
    /// Degrees of rotation per unit of scroll input.
    pub rotation_speed_degrees: f32,
    /// Collider radius of the deflector.
    pub collider_radius: f32,
    /// Strength of the outward push applied in reflect mode.
    pub bounce_force: f32,
    /// Whether new deflectors start active.
    pub start_active: bool,
}

impl Default for DeflectorConfig {
    fn default() -> Self {
        Self {
            orbit_radius: 5.0,
            rotation_speed_degrees: 360.0,
            collider_radius: 1.0,
            bounce_force: 10.0,
            start_active: false,
        }
    }
}

impl DeflectorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("deflector.orbit_radius", self.orbit_radius)?;
        positive("deflector.collider_radius", self.collider_radius)?;
        non_negative("deflector.bounce_force", self.bounce_force)
    }
}

// =============================================================================
// Player
// =============================================================================

/// Player movement and shield energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Normal movement speed.
    pub move_speed: f32,
    /// Movement speed while boosting.
    pub boosted_speed: f32,
    /// Boost duration in seconds.
    pub boost_duration: f32,
    /// Maximum shield energy.
    pub energy_max: f32,
    /// Energy drained per second per active deflector.
    pub energy_drain: f32,
    /// Energy regenerated per second while no deflector is active.
    pub energy_regen: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            boosted_speed: 15.0,
            boost_duration: 0.3,
            energy_max: 100.0,
            energy_drain: 20.0,
            energy_regen: 10.0,
        }
    }
}

impl PlayerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("player.move_speed", self.move_speed)?;
        non_negative("player.boosted_speed", self.boosted_speed)?;
        non_negative("player.boost_duration", self.boost_duration)?;
        non_negative("player.energy_max", self.energy_max)?;
        non_negative("player.energy_drain", self.energy_drain)?;
        non_negative("player.energy_regen", self.energy_regen)
    }
}

// =============================================================================
// Encounters & Progression
// =============================================================================

/// Encounter gate and exit timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Player distance to a gate anchor that starts the battle.
    pub activation_distance: f32,
    /// Seconds between proximity samples.
    pub proximity_interval: f32,
    /// Seconds between remaining-enemy polls during battle.
    pub monitor_interval: f32,
    /// Cooldown applied to both ends of an exit after use.
    pub exit_cooldown: f32,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            activation_distance: 15.0,
            proximity_interval: 0.25,
            monitor_interval: 0.5,
            exit_cooldown: 0.5,
        }
    }
}

impl EncounterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("encounter.activation_distance", self.activation_distance)?;
        positive("encounter.proximity_interval", self.proximity_interval)?;
        positive("encounter.monitor_interval", self.monitor_interval)?;
        non_negative("encounter.exit_cooldown", self.exit_cooldown)
    }
}

/// Stage sequence transition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Seconds between a stage clearing and the next stage activating.
    pub transition_delay: f32,
    /// Advance automatically once the active stage is clear.
    pub auto_advance: bool,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            transition_delay: 2.0,
            auto_advance: true,
        }
    }
}

impl ProgressionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("progression.transition_delay", self.transition_delay)
    }
}

/// Obstacle interaction tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// How far a pushable box slides when hit.
    pub push_distance: f32,
    /// Fraction of the slide completed per second.
    pub push_speed: f32,
    /// Waves slower than this do not push boxes.
    pub min_push_speed: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            push_distance: 5.0,
            push_speed: 1.0,
            min_push_speed: 0.1,
        }
    }
}

impl ObstacleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("obstacle.push_distance", self.push_distance)?;
        positive("obstacle.push_speed", self.push_speed)?;
        non_negative("obstacle.min_push_speed", self.min_push_speed)
    }
}
