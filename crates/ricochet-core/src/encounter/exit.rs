//! Paired exit points.
//!
//! Using an exit moves the player to its partner. Both ends share a cooldown
//! so the arrival does not immediately bounce the player back.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::timer::Cooldown;

use super::{ExitId, GateId};

/// One end of an exit pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitPoint {
    id: ExitId,
    /// Gate the exit belongs to, if any.
    pub gate: Option<GateId>,
    /// Where the exit is.
    pub position: Vec2,
    /// Offset from `position` where arriving players are placed.
    pub arrival_offset: Vec2,
    /// The other end of the pair.
    pub partner: Option<ExitId>,
    /// Manually disabled exits refuse use.
    pub enabled: bool,
    /// Set by the owning gate while its battle runs.
    pub locked: bool,
    pub(crate) cooldown: Cooldown,
}

impl ExitPoint {
    /// Creates an unpaired, enabled exit.
    #[must_use]
    pub fn new(id: ExitId, gate: Option<GateId>, position: Vec2) -> Self {
        Self {
            id,
            gate,
            position,
            arrival_offset: Vec2::ZERO,
            partner: None,
            enabled: true,
            locked: false,
            cooldown: Cooldown::default(),
        }
    }

    /// The exit's ID.
    #[must_use]
    pub const fn id(&self) -> ExitId {
        self.id
    }

    /// Where a player arriving through this exit ends up.
    #[must_use]
    pub fn arrival_point(&self) -> Vec2 {
        self.position + self.arrival_offset
    }

    /// Returns `true` if the cooldown has run out.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown.is_ready()
    }

    /// Seconds left on the cooldown.
    #[must_use]
    pub const fn cooldown_remaining(&self) -> f32 {
        self.cooldown.remaining()
    }
}

/// A successful trip through an exit pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitTransit {
    /// Exit that was entered.
    pub from: ExitId,
    /// Exit the player arrives at.
    pub to: ExitId,
    /// Where the player is placed.
    pub destination: Vec2,
    /// Gate on the arrival side, if any.
    pub gate: Option<GateId>,
}
