//! Per-entity behaviour that proposes changes instead of making them.
//!
//! Each tick the simulation walks every live entity, looks up the plugins
//! bundled for its [`EntityTag`], and runs them against a read-only
//! [`WorldView`]. A plugin answers with a list of [`Output`]s. Nothing it
//! returns touches the arena until the resolvers get to it, so bundles for
//! different entities run side by side on the rayon pool.
//!
//! The view a plugin receives is narrowed to the [`ComponentKind`]s listed in
//! its [`PluginDeclaration`]. Asking for anything else yields `None`.
//!
//! ```
//! use std::sync::Arc;
//!
//! use ricochet_core::entity::EntityTag;
//! use ricochet_core::output::Output;
//! use ricochet_core::plugin::{
//!     ComponentKind, Plugin, PluginContext, PluginDeclaration, PluginId, PluginRegistry,
//! };
//! use ricochet_core::world_view::WorldView;
//!
//! struct Sentry(PluginDeclaration);
//!
//! impl Plugin for Sentry {
//!     fn declaration(&self) -> &PluginDeclaration {
//!         &self.0
//!     }
//!
//!     fn run(&self, _ctx: &PluginContext, _view: &WorldView) -> Vec<Output> {
//!         Vec::new()
//!     }
//! }
//!
//! let sentry = Sentry(PluginDeclaration {
//!     id: PluginId::new("sentry"),
//!     required_tags: vec![EntityTag::Ally],
//!     reads: vec![ComponentKind::Transform],
//!     emits: Vec::new(),
//! });
//!
//! let mut registry = PluginRegistry::new();
//! registry.register(EntityTag::Ally, Arc::new(sentry));
//! assert_eq!(registry.plugins_for(EntityTag::Ally).len(), 1);
//! assert!(registry.plugins_for(EntityTag::Enemy).is_empty());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::entity::{EntityId, EntityTag};
use crate::output::{Output, OutputKind, TraceId};
use crate::world_view::WorldView;

pub use crate::output::PluginId;

// =============================================================================
// Component Kind
// =============================================================================

/// A slice of entity state a plugin may ask the [`WorldView`] for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Position and heading.
    Transform,
    /// Character velocity.
    Physics,
    /// Hit points, invincibility window and status flags.
    Health,
    /// Wave kind, heading, bounce count and lifetime.
    Projectile,
    /// Fire mode, cooldown and pending shots.
    Emitter,
    /// Owner, orbit angle, mode and collider.
    Deflector,
    /// Shape and surface kind.
    Obstacle,
    /// Movement input and deflector energy.
    Player,
}

impl ComponentKind {
    /// Unscoped access, used by the simulation's own views.
    pub const ALL: [Self; 8] = [
        Self::Transform,
        Self::Physics,
        Self::Health,
        Self::Projectile,
        Self::Emitter,
        Self::Deflector,
        Self::Obstacle,
        Self::Player,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Transform => "Transform",
            Self::Physics => "Physics",
            Self::Health => "Health",
            Self::Projectile => "Projectile",
            Self::Emitter => "Emitter",
            Self::Deflector => "Deflector",
            Self::Obstacle => "Obstacle",
            Self::Player => "Player",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Plugin Declaration
// =============================================================================

/// What a plugin runs on, what it looks at, and what it may answer with.
#[derive(Debug, Clone)]
pub struct PluginDeclaration {
    /// Stable name; also the secondary sort key for outputs.
    pub id: PluginId,
    /// Entity tags the plugin is bundled under.
    pub required_tags: Vec<EntityTag>,
    /// Components the scoped [`WorldView`] will hand out.
    pub reads: Vec<ComponentKind>,
    /// Output kinds the plugin may return.
    pub emits: Vec<OutputKind>,
}

impl PluginDeclaration {
    /// Whether the plugin runs on `tag`.
    #[must_use]
    pub fn supports_tag(&self, tag: EntityTag) -> bool {
        self.required_tags.contains(&tag)
    }

    /// Whether `kind` is within the plugin's scoped view.
    #[must_use]
    pub fn reads_component(&self, kind: ComponentKind) -> bool {
        self.reads.contains(&kind)
    }

    /// Whether the plugin may return outputs of `kind`.
    #[must_use]
    pub fn emits_output(&self, kind: OutputKind) -> bool {
        self.emits.contains(&kind)
    }
}

// =============================================================================
// Plugin Context
// =============================================================================

/// Per-invocation inputs: which entity, which tick, and the trace id that
/// doubles as the RNG seed for this run.
///
/// ```
/// use ricochet_core::entity::EntityId;
/// use ricochet_core::output::TraceId;
/// use ricochet_core::plugin::PluginContext;
///
/// let ctx = PluginContext {
///     entity_id: EntityId::new(3),
///     tick: 12,
///     trace_id: TraceId::new(0xfeed),
///     dt: 1.0 / 60.0,
/// };
/// assert_eq!(ctx.tick, 12);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PluginContext {
    /// Entity the plugin runs for.
    pub entity_id: EntityId,
    /// Tick being computed.
    pub tick: u64,
    /// Causal trace id, also the RNG seed.
    pub trace_id: TraceId,
    /// Fixed step length in seconds.
    pub dt: f32,
}

// =============================================================================
// Plugin Trait
// =============================================================================

/// Behaviour attached to every entity carrying one of the declared tags.
///
/// `run` must be a pure function of its arguments. Randomness is drawn from
/// an RNG seeded with `ctx.trace_id` so replays stay identical regardless of
/// how rayon schedules the work.
pub trait Plugin: Send + Sync {
    /// Static description used for scoping and bundling.
    fn declaration(&self) -> &PluginDeclaration;

    /// Proposes outputs for `ctx.entity_id`.
    fn run(&self, ctx: &PluginContext, view: &WorldView) -> Vec<Output>;
}

// =============================================================================
// Plugin Registry
// =============================================================================

/// Plugin bundles keyed by entity tag.
#[derive(Default)]
pub struct PluginRegistry {
    bundles: HashMap<EntityTag, Vec<Arc<dyn Plugin>>>,
}

impl PluginRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `plugin` to the bundle for `tag`. Bundles run in
    /// registration order.
    pub fn register(&mut self, tag: EntityTag, plugin: Arc<dyn Plugin>) {
        self.bundles.entry(tag).or_default().push(plugin);
    }

    /// The bundle for `tag`, empty if nothing was registered.
    #[must_use]
    pub fn plugins_for(&self, tag: EntityTag) -> &[Arc<dyn Plugin>] {
        self.bundles.get(&tag).map_or(&[], Vec::as_slice)
    }

    /// Total plugins across every bundle. A plugin shared between two tags
    /// counts twice.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.bundles.values().map(Vec::len).sum()
    }

    /// True when no bundle holds a plugin.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registration_count() == 0
    }

    /// The bundles every new [`Simulation`](crate::simulation::Simulation)
    /// starts with: movement for the player, the emitter for enemies and
    /// contact handling for waves. Allies, deflectors and obstacles have no
    /// behaviour of their own.
    ///
    /// ```
    /// use ricochet_core::config::SimConfig;
    /// use ricochet_core::entity::EntityTag;
    /// use ricochet_core::plugin::PluginRegistry;
    ///
    /// let registry = PluginRegistry::default_bundles(&SimConfig::default());
    /// assert_eq!(registry.registration_count(), 3);
    /// assert!(registry.plugins_for(EntityTag::Deflector).is_empty());
    /// ```
    #[must_use]
    pub fn default_bundles(config: &SimConfig) -> Self {
        use crate::plugins::{EmitterPlugin, PlayerMotionPlugin, ProjectileContactPlugin};

        let mut registry = Self::new();
        registry.register(EntityTag::Player, Arc::new(PlayerMotionPlugin::new()));
        registry.register(EntityTag::Enemy, Arc::new(EmitterPlugin::new()));
        registry.register(EntityTag::Projectile, Arc::new(ProjectileContactPlugin::new(config)));
        registry
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self
            .bundles
            .iter()
            .map(|(tag, plugins)| (*tag, plugins.len()))
            .collect();
        tags.sort_unstable();
        f.debug_struct("PluginRegistry").field("bundles", &tags).finish()
    }
}
