//! Outbound event journal.
//!
//! Resolvers and the encounter director record [`Event`]s here as they apply
//! changes. The host drains the journal with
//! [`Simulation::take_events`](crate::simulation::Simulation::take_events).
//! Entries keep insertion order, which is deterministic because resolvers
//! process sorted outputs.

use serde::{Deserialize, Serialize};

use crate::output::Event;

/// One recorded event and the tick it happened on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Tick during which the event was recorded.
    pub tick: u64,
    /// The event.
    pub event: Event,
}

/// Append-only buffer of events awaiting collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventJournal {
    entries: Vec<JournalEntry>,
}

impl EventJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn record(&mut self, tick: u64, event: Event) {
        tracing::trace!(tick, ?event, "event recorded");
        self.entries.push(JournalEntry { tick, event });
    }

    /// Removes and returns every recorded entry, oldest first.
    pub fn drain(&mut self) -> Vec<JournalEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Entries recorded so far, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Number of entries awaiting collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there is nothing to collect.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose event satisfies `predicate`.
    pub fn count_matching(&self, mut predicate: impl FnMut(&Event) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.event)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::GateId;

    #[test]
    fn drain_empties_in_order() {
        let mut journal = EventJournal::new();
        journal.record(1, Event::GateCleared { gate: GateId::new(0) });
        journal.record(2, Event::AllStagesComplete);

        let drained = journal.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].tick, 1);
        assert_eq!(drained[1].event, Event::AllStagesComplete);
        assert!(journal.is_empty());
    }

    #[test]
    fn count_matching_filters() {
        let mut journal = EventJournal::new();
        journal.record(0, Event::AllStagesComplete);
        journal.record(0, Event::ProjectilesPurged { count: 2 });
        assert_eq!(
            journal.count_matching(|e| matches!(e, Event::ProjectilesPurged { .. })),
            1
        );
    }
}
