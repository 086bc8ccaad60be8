//! Resolvers turn sorted plugin outputs into changes on the next arena.
//!
//! Each resolver names the [`OutputKind`]s it wants and receives only those,
//! in the order the simulation sorted them. The pipeline runs front to back,
//! every tick, whether or not anything was routed to a stage, so stages with
//! per-tick work (motion, timers, expiry) can do it even in a quiet room.
//!
//! Two rules hold throughout. Anything that depends on how the tick started
//! is read from `current`. Anything that asks whether an entity still exists
//! is asked of `next`, because an earlier stage may have removed it this
//! tick; outputs aimed at a missing entity are dropped without complaint.
//!
//! | stage | handles | does |
//! |-------|---------|------|
//! | [`EmitterResolver`] | commands | stores advanced emitter state |
//! | [`ProjectileResolver`] | commands | spawns, redirects and removes waves; pushes and breaks boxes |
//! | [`CombatResolver`] | modifiers | damage, healing, kills, death reporting |
//! | [`LifecycleResolver`] | none | timers, wave expiry, corpse removal, deflector energy |
//! | [`PhysicsResolver`] | commands | velocities and motion |
//! | [`EventResolver`] | events | copies plugin events into the journal |

mod combat;
mod emitter;
mod event;
mod lifecycle;
mod physics;
mod projectile;

pub use combat::CombatResolver;
pub use emitter::EmitterResolver;
pub use event::EventResolver;
pub use lifecycle::LifecycleResolver;
pub use physics::{PhysicsResolver, FIXED_DT};
pub use projectile::ProjectileResolver;

use crate::arena::Arena;
use crate::config::SimConfig;
use crate::journal::EventJournal;
use crate::output::{OutputEnvelope, OutputKind};

/// One stage of the resolution pipeline.
///
/// ```
/// use ricochet_core::arena::Arena;
/// use ricochet_core::journal::EventJournal;
/// use ricochet_core::output::{OutputEnvelope, OutputKind};
/// use ricochet_core::resolver::Resolver;
///
/// /// Counts routed events without acting on them.
/// struct Census;
///
/// impl Resolver for Census {
///     fn name(&self) -> &'static str {
///         "census"
///     }
///
///     fn handles(&self) -> &[OutputKind] {
///         &[OutputKind::Event]
///     }
///
///     fn resolve(&self, outputs: &[&OutputEnvelope], _: &Arena, _: &mut Arena, _: &mut EventJournal) {
///         tracing::debug!(events = outputs.len(), "census");
///     }
/// }
///
/// assert_eq!(Census.handles(), &[OutputKind::Event]);
/// ```
pub trait Resolver: Send + Sync {
    /// Short label used in logs and debug output.
    fn name(&self) -> &'static str;

    /// Output kinds routed to this stage.
    fn handles(&self) -> &[OutputKind];

    /// Applies `outputs` to `next`. `current` is the arena plugins saw.
    fn resolve(
        &self,
        outputs: &[&OutputEnvelope],
        current: &Arena,
        next: &mut Arena,
        journal: &mut EventJournal,
    );
}

/// The stages every new simulation runs, in order.
#[must_use]
pub fn default_pipeline(config: &SimConfig) -> Vec<Box<dyn Resolver>> {
    vec![
        Box::new(EmitterResolver::new()),
        Box::new(ProjectileResolver::from_config(config)),
        Box::new(CombatResolver::from_config(config)),
        Box::new(LifecycleResolver::from_config(config)),
        Box::new(PhysicsResolver::from_config(config)),
        Box::new(EventResolver::new()),
    ]
}

#[cfg(test)]
pub(crate) fn make_envelope(
    output: crate::output::Output,
    source: crate::entity::EntityId,
) -> OutputEnvelope {
    use crate::output::{PluginId, PluginInstanceId, TraceId};
    OutputEnvelope::new(
        output,
        PluginInstanceId::new(source, PluginId::new("test")),
        TraceId::new(0),
        0,
        0,
    )
}
