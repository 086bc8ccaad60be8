//! Error types for the simulation core.
//!
//! Nothing in the core is fatal. Explicit API calls that can be refused
//! (using an exit, advancing a stage, building a simulation from a bad config)
//! return one of these errors; everything else degrades to a logged no-op.

use thiserror::Error;

use crate::encounter::{ExitId, GateId};
use crate::entity::EntityId;

/// Top-level error for simulation setup and boundary calls.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// The referenced entity does not exist in the arena.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// The referenced entity exists but is not the expected kind.
    #[error("entity {id} is not a {expected}")]
    WrongEntityKind {
        /// The entity that was looked up.
        id: EntityId,
        /// Human-readable name of the expected kind.
        expected: &'static str,
    },

    /// The referenced gate does not exist.
    #[error("unknown gate: {0}")]
    UnknownGate(GateId),

    /// The call needs a living player and there is none.
    #[error("no living player")]
    NoPlayer,

    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Using an exit was refused.
    #[error(transparent)]
    Exit(#[from] ExitError),

    /// A progression call was refused.
    #[error(transparent)]
    Progression(#[from] ProgressionError),
}

/// Configuration validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A tuning value was NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NotFinite {
        /// Dotted path of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// A value that must be strictly positive was zero or negative.
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Dotted path of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// A value that must not be negative was negative.
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Dotted path of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// A factor that must lie in `[0, 1]` was out of range.
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// A count that must be at least one was zero.
    #[error("{field} must be at least 1")]
    ZeroCount {
        /// Dotted path of the offending field.
        field: &'static str,
    },
}

/// Reasons an exit point refuses to move the player.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExitError {
    /// No exit with this ID is registered.
    #[error("unknown exit: {0}")]
    UnknownExit(ExitId),

    /// The exit has no partner to send the player to.
    #[error("exit {0} has no partner")]
    MissingPartner(ExitId),

    /// One of the two endpoints is disabled.
    #[error("exit {0} is disabled")]
    Disabled(ExitId),

    /// The endpoint is locked by its gate's battle.
    #[error("exit {0} is locked")]
    Locked(ExitId),

    /// The partner endpoint's gate is in battle.
    #[error("exit {exit} leads into gate {gate}, which is in battle")]
    PartnerInBattle {
        /// The exit that was used.
        exit: ExitId,
        /// The gate on the far side.
        gate: GateId,
    },

    /// One of the endpoints is still cooling down from a previous use.
    #[error("exit {exit} is cooling down ({remaining:.2}s remaining)")]
    CoolingDown {
        /// The endpoint that is cooling down.
        exit: ExitId,
        /// Seconds left on the cooldown.
        remaining: f32,
    },
}

/// Reasons the stage sequence refuses an explicit transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressionError {
    /// The sequence has no stages.
    #[error("stage sequence is empty")]
    NoStages,

    /// The requested stage index is out of range.
    #[error("stage {index} out of range (sequence has {len} stages)")]
    UnknownStage {
        /// The requested index.
        index: usize,
        /// Number of stages in the sequence.
        len: usize,
    },

    /// The active stage's gate has not been cleared yet.
    #[error("stage {stage} cannot advance: gate {gate} is not cleared")]
    GateNotCleared {
        /// Index of the active stage.
        stage: usize,
        /// The gate blocking the advance.
        gate: GateId,
    },
}

/// Convenience alias for results carrying a [`SimError`].
pub type SimResult<T> = Result<T, SimError>;
