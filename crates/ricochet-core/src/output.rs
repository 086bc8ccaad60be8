//! What plugins hand back to the simulation.
//!
//! An [`Output`] is one of three things. A [`Command`] asks for a structural
//! change such as spawning, redirecting or removing a wave. A [`Modifier`]
//! asks for a health change. An [`Event`] reports something that already
//! happened. Each kind has its own resolvers; see [`crate::resolver`].
//!
//! [`Event`] doubles as the public notification type. Resolvers and the
//! encounter director write events to the
//! [`EventJournal`](crate::journal::EventJournal) and callers drain it.
//!
//! Plugin results arrive wrapped in an [`OutputEnvelope`] that remembers
//! which plugin on which entity produced them, under which trace id, and in
//! what order. That triple is the sort key that keeps resolution stable no
//! matter how the parallel phase was scheduled.
//!
//! ```
//! use ricochet_core::entity::EntityId;
//! use ricochet_core::output::{
//!     Command, Output, OutputEnvelope, OutputKind, PluginId, PluginInstanceId, TraceId,
//! };
//!
//! let wave = EntityId::new(9);
//! let envelope = OutputEnvelope::new(
//!     Command::DestroyProjectile { target: wave }.into(),
//!     PluginInstanceId::new(wave, PluginId::new("projectile_contact")),
//!     TraceId::new(0xabc),
//!     30,
//!     1,
//! );
//! assert_eq!(envelope.kind(), OutputKind::Command);
//! assert!(envelope.output().as_command().is_some());
//! ```

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::deflector::DeflectorMode;
use crate::emitter::EmitterState;
use crate::encounter::{ExitId, GateId};
use crate::entity::components::{Faction, StatusFlags};
use crate::entity::{EntityId, EntityTag};
use crate::projectile::ProjectileKind;

// =============================================================================
// Identity
// =============================================================================

/// Name of a plugin, e.g. `"emitter"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginId(String);

impl PluginId {
    /// Wraps a plugin name.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// The plugin name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One plugin running on one entity. Displays as `plugin@entity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginInstanceId {
    entity_id: EntityId,
    plugin_id: PluginId,
}

impl PluginInstanceId {
    /// Pairs an entity with the plugin running on it.
    #[must_use]
    pub fn new(entity_id: EntityId, plugin_id: PluginId) -> Self {
        Self {
            entity_id,
            plugin_id,
        }
    }

    /// Entity the plugin ran on.
    #[must_use]
    pub const fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Plugin that ran.
    #[must_use]
    pub fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }
}

impl fmt::Display for PluginInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.plugin_id, self.entity_id)
    }
}

/// Hash of (seed, tick, entity, plugin slot).
///
/// Identifies one plugin invocation in logs and seeds that invocation's RNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(u64);

impl TraceId {
    /// Wraps a raw hash.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw hash.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// =============================================================================
// Output Categories
// =============================================================================

/// Structural changes to waves, characters, emitters and boxes.
///
/// Commands may be dropped by resolvers when their target no longer exists
/// (for example a wave destroyed earlier in the same tick).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Replace a character's velocity.
    SetVelocity {
        /// Player or ally
        target: EntityId,
        /// Units per second
        velocity: Vec2,
    },
    /// Replace an enemy's emitter state with its advanced copy.
    SyncEmitter {
        /// Enemy to update
        target: EntityId,
        /// Emitter state after this tick's advance
        emitter: Box<EmitterState>,
    },
    /// Spawn a wave.
    SpawnProjectile {
        /// Entity firing the wave
        source: EntityId,
        /// Kind of wave
        kind: ProjectileKind,
        /// Spawn position
        origin: Vec2,
        /// Fixed direction of travel
        direction: Vec2,
        /// Side the wave belongs to
        faction: Faction,
        /// Speed override; kind default when `None`
        speed: Option<f32>,
    },
    /// Replace a wave's motion after one or more reflections.
    RedirectProjectile {
        /// Wave to update
        target: EntityId,
        /// New unit direction
        direction: Vec2,
        /// New speed
        speed: f32,
        /// Bounce count after the reflections
        bounce_count: u32,
        /// Side the wave belongs to afterwards
        faction: Faction,
    },
    /// Record the set of entities a wave currently overlaps.
    SetContacts {
        /// Wave to update
        target: EntityId,
        /// Entities overlapped this tick
        contacts: BTreeSet<EntityId>,
    },
    /// Start a wave's roll animation.
    StartRoll {
        /// Wave to update
        target: EntityId,
    },
    /// Remove a wave after a terminal contact.
    DestroyProjectile {
        /// Wave to remove
        target: EntityId,
    },
    /// Remove every live wave.
    PurgeProjectiles {
        /// Entity whose contact triggered the purge
        source: EntityId,
    },
    /// Push a resting pushable box.
    PushObstacle {
        /// Box to push
        target: EntityId,
        /// Unit direction of the push
        direction: Vec2,
    },
    /// Remove a breakable box.
    BreakObstacle {
        /// Box to remove
        target: EntityId,
        /// Wave that broke it
        source: EntityId,
    },
}

/// Health changes routed to the combat resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    /// Wave or contact damage.
    ApplyDamage {
        /// Combat target
        target: EntityId,
        /// Entity that caused the damage, if any
        source: Option<EntityId>,
        /// Hit points to remove
        amount: f32,
        /// Whether the hit ignores the post-hit invincibility window
        bypass_window: bool,
    },
    /// Restore health on a combat target.
    ApplyHealing {
        /// Entity to heal
        target: EntityId,
        /// Hit points to restore, capped at max
        amount: f32,
    },
    /// Drop a combat target to zero regardless of windows and flags.
    Kill {
        /// Combat target
        target: EntityId,
        /// Entity that caused the kill, if any
        source: Option<EntityId>,
    },
    /// Toggle one of the target's status flags.
    SetStatusFlag {
        /// Combat target
        target: EntityId,
        /// Flag to change
        flag: StatusFlags,
        /// New value of the flag
        value: bool,
    },
}

impl Modifier {
    /// Returns the target entity for this modifier.
    #[must_use]
    pub const fn target(&self) -> EntityId {
        match self {
            Self::ApplyDamage { target, .. }
            | Self::ApplyHealing { target, .. }
            | Self::Kill { target, .. }
            | Self::SetStatusFlag { target, .. } => *target,
        }
    }
}

/// Something that happened, as recorded in the journal.
///
/// Events never change state. Plugins emit a few of them directly; most are
/// recorded by resolvers and the encounter director as they apply changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A wave was spawned.
    ProjectileFired {
        /// The new wave
        projectile: EntityId,
        /// Entity that fired it, if any
        source: Option<EntityId>,
        /// Kind of wave
        kind: ProjectileKind,
    },
    /// A wave touched something and the contact had consequences.
    ProjectileHit {
        /// The wave
        projectile: EntityId,
        /// What it touched
        target: EntityId,
        /// Kind of wave
        kind: ProjectileKind,
        /// Bounce count at the moment of contact
        bounce_count: u32,
    },
    /// A wave reflected off a deflector or wall.
    ProjectileBounced {
        /// The wave
        projectile: EntityId,
        /// Bounce count after the reflection
        bounce_count: u32,
    },
    /// A wave was removed by a terminal contact.
    ProjectileDestroyed {
        /// The wave
        projectile: EntityId,
    },
    /// A wave's lifetime ran out.
    ProjectileExpired {
        /// The wave
        projectile: EntityId,
    },
    /// Every live wave was removed at once.
    ProjectilesPurged {
        /// Number of waves removed
        count: usize,
    },
    /// Damage landed on a combat target.
    DamageApplied {
        /// Entity that caused the damage, if any
        source: Option<EntityId>,
        /// Entity that took the damage
        target: EntityId,
        /// Damage amount requested
        amount: f32,
        /// Health left afterwards
        remaining: f32,
    },
    /// A combat target died. Emitted exactly once per death.
    EntityDied {
        /// The entity that died
        entity: EntityId,
        /// Its tag
        tag: EntityTag,
        /// Entity that caused the death, if known
        killer: Option<EntityId>,
    },
    /// The player died.
    PlayerDied {
        /// The player entity
        player: EntityId,
    },
    /// A dead enemy was removed after its despawn delay.
    EntityRemoved {
        /// The removed entity
        entity: EntityId,
    },
    /// A deflector was switched on or off.
    DeflectorToggled {
        /// The deflector
        deflector: EntityId,
        /// Whether it is now active
        active: bool,
    },
    /// A deflector's mode changed.
    DeflectorModeChanged {
        /// The deflector
        deflector: EntityId,
        /// New mode
        mode: DeflectorMode,
    },
    /// The owner's energy ran out and all of their deflectors went inert.
    DeflectorDepleted {
        /// Owner of the drained pool
        owner: EntityId,
    },
    /// The player started a speed boost.
    BoostStarted {
        /// The player
        player: EntityId,
    },
    /// A pushable box started gliding.
    ObstaclePushed {
        /// The box
        obstacle: EntityId,
        /// Where it will come to rest
        destination: Vec2,
    },
    /// A breakable box was destroyed.
    ObstacleBroken {
        /// The box
        obstacle: EntityId,
    },
    /// A gate's battle started.
    BattleStarted {
        /// The gate
        gate: GateId,
    },
    /// A gate's members were all defeated.
    GateCleared {
        /// The gate
        gate: GateId,
    },
    /// A gate was reset to its initial state.
    GateReset {
        /// The gate
        gate: GateId,
    },
    /// The player travelled through a pair of exits.
    ExitUsed {
        /// Exit that was entered
        exit: ExitId,
        /// Exit the player arrived at
        destination: ExitId,
        /// The player
        player: EntityId,
    },
    /// A stage became the active stage.
    StageActivated {
        /// Index of the stage
        stage: usize,
    },
    /// The stage sequence ran past its last stage.
    AllStagesComplete,
}

// =============================================================================
// Output
// =============================================================================

/// Which resolvers an output is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    /// [`Command`]
    Command,
    /// [`Modifier`]
    Modifier,
    /// [`Event`]
    Event,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Command => "command",
            Self::Modifier => "modifier",
            Self::Event => "event",
        })
    }
}

/// A single plugin proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// Structural change.
    Command(Command),
    /// Health change.
    Modifier(Modifier),
    /// Notification.
    Event(Event),
}

impl Output {
    /// Routing key.
    #[must_use]
    pub const fn kind(&self) -> OutputKind {
        match self {
            Self::Command(_) => OutputKind::Command,
            Self::Modifier(_) => OutputKind::Modifier,
            Self::Event(_) => OutputKind::Event,
        }
    }

    /// Whether this is a health change.
    #[must_use]
    pub const fn is_modifier(&self) -> bool {
        matches!(self, Self::Modifier(_))
    }

    /// The command, if this is one.
    #[must_use]
    pub const fn as_command(&self) -> Option<&Command> {
        if let Self::Command(c) = self { Some(c) } else { None }
    }

    /// The modifier, if this is one.
    #[must_use]
    pub const fn as_modifier(&self) -> Option<&Modifier> {
        if let Self::Modifier(m) = self { Some(m) } else { None }
    }

    /// The event, if this is one.
    #[must_use]
    pub const fn as_event(&self) -> Option<&Event> {
        if let Self::Event(e) = self { Some(e) } else { None }
    }
}

impl From<Command> for Output {
    fn from(c: Command) -> Self {
        Self::Command(c)
    }
}

impl From<Modifier> for Output {
    fn from(m: Modifier) -> Self {
        Self::Modifier(m)
    }
}

impl From<Event> for Output {
    fn from(e: Event) -> Self {
        Self::Event(e)
    }
}

/// An [`Output`] tagged with where and when it came from.
///
/// The simulation sorts envelopes by entity, then plugin name, then
/// `sequence` before any resolver sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEnvelope {
    output: Output,
    source: PluginInstanceId,
    trace_id: TraceId,
    tick: u64,
    sequence: u32,
}

impl OutputEnvelope {
    /// Wraps `output`. `sequence` is its index in the plugin's result list.
    #[must_use]
    pub fn new(output: Output, source: PluginInstanceId, trace_id: TraceId, tick: u64, sequence: u32) -> Self {
        Self {
            output,
            source,
            trace_id,
            tick,
            sequence,
        }
    }

    /// The wrapped proposal.
    #[must_use]
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Plugin instance that produced it.
    #[must_use]
    pub fn source(&self) -> &PluginInstanceId {
        &self.source
    }

    /// Trace id of the producing invocation.
    #[must_use]
    pub const fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Tick the plugin ran on.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Position within the producing plugin's result list.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Routing key of the wrapped output.
    #[must_use]
    pub const fn kind(&self) -> OutputKind {
        self.output.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(wave: u64, sequence: u32) -> OutputEnvelope {
        let wave = EntityId::new(wave);
        OutputEnvelope::new(
            Modifier::ApplyDamage {
                target: EntityId::new(1),
                source: Some(wave),
                amount: 30.0,
                bypass_window: false,
            }
            .into(),
            PluginInstanceId::new(wave, PluginId::new("projectile_contact")),
            TraceId::new(0x2a),
            12,
            sequence,
        )
    }

    #[test]
    fn instance_names_plugin_and_entity() {
        let envelope = contact(6, 0);
        assert_eq!(envelope.source().to_string(), "projectile_contact@6");
        assert_eq!(envelope.source().entity_id(), EntityId::new(6));
        assert_eq!(envelope.source().plugin_id().as_str(), "projectile_contact");
        assert_eq!(envelope.trace_id().to_string(), "000000000000002a");
    }

    #[test]
    fn envelope_routes_by_wrapped_output() {
        let envelope = contact(6, 2);
        assert_eq!(envelope.kind(), OutputKind::Modifier);
        assert_eq!(envelope.tick(), 12);
        assert_eq!(envelope.sequence(), 2);
        assert!(envelope.output().is_modifier());
        assert!(envelope.output().as_command().is_none());
        assert!(matches!(
            envelope.output().as_modifier(),
            Some(Modifier::ApplyDamage { amount, .. }) if (*amount - 30.0).abs() < f32::EPSILON
        ));
    }

    #[test]
    fn events_and_commands_convert_into_outputs() {
        let fired: Output = Event::ProjectileFired {
            projectile: EntityId::new(4),
            source: None,
            kind: ProjectileKind::Earthquake,
        }
        .into();
        assert_eq!(fired.kind(), OutputKind::Event);
        assert!(fired.as_event().is_some());

        let purge: Output = Command::PurgeProjectiles { source: EntityId::new(0) }.into();
        assert_eq!(purge.kind().to_string(), "command");
    }

    #[test]
    fn wave_redirect_survives_json() {
        let cmd = Command::RedirectProjectile {
            target: EntityId::new(3),
            direction: Vec2::NEG_Y,
            speed: 4.0,
            bounce_count: 2,
            faction: Faction::Player,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(serde_json::from_str::<Command>(&json).unwrap(), cmd);
    }

    #[test]
    fn journal_events_survive_json() {
        let events = [
            Event::ExitUsed {
                exit: ExitId::new(1),
                destination: ExitId::new(2),
                player: EntityId::new(0),
            },
            Event::EntityDied {
                entity: EntityId::new(5),
                tag: EntityTag::Enemy,
                killer: None,
            },
            Event::GateCleared { gate: GateId::new(3) },
            Event::AllStagesComplete,
        ];
        let json = serde_json::to_string(&events).unwrap();
        let back: Vec<Event> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, events);
    }

    #[test]
    fn status_flag_modifier_survives_json() {
        let m = Modifier::SetStatusFlag {
            target: EntityId::new(1),
            flag: StatusFlags::INVINCIBLE,
            value: true,
        };
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(serde_json::from_str::<Modifier>(&json).unwrap(), m);
    }
}
