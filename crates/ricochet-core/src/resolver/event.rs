//! Event resolver for plugin-emitted events.
//!
//! The `EventResolver` records event outputs in the
//! [`EventJournal`](crate::journal::EventJournal). Unlike other resolvers, it
//! does not mutate game state. It runs last, so plugin events such as
//! `ProjectileHit` follow the state-change events the earlier resolvers
//! recorded for the same tick.

use crate::arena::Arena;
use crate::journal::EventJournal;
use crate::output::{OutputEnvelope, OutputKind};

use super::Resolver;

/// Resolver that journals event outputs.
///
/// # Example
///
/// ```
/// use ricochet_core::resolver::EventResolver;
/// use ricochet_core::resolver::Resolver;
/// use ricochet_core::output::OutputKind;
///
/// let resolver = EventResolver::new();
/// assert!(resolver.handles().contains(&OutputKind::Event));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EventResolver;

impl EventResolver {
    /// Creates a new event resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Resolver for EventResolver {
    fn name(&self) -> &'static str {
        "event"
    }

    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Event]
    }

    fn resolve(
        &self,
        outputs: &[&OutputEnvelope],
        _current: &Arena,
        _next: &mut Arena,
        journal: &mut EventJournal,
    ) {
        for envelope in outputs {
            if let Some(event) = envelope.output().as_event() {
                journal.record(envelope.tick(), event.clone());
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
