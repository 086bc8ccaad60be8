//! The shipped plugin bundles, one per active entity kind.
//!
//! | plugin | runs on | proposes |
//! |--------|---------|----------|
//! | [`PlayerMotionPlugin`] | player | a velocity from the movement input |
//! | [`EmitterPlugin`] | enemies | the advanced emitter state and any waves fired this tick |
//! | [`ProjectileContactPlugin`] | waves | whatever the collision table says about this tick's contacts |
//!
//! [`PluginRegistry::default_bundles`](crate::plugin::PluginRegistry::default_bundles)
//! wires all three.

mod emitter;
mod player;
mod projectile;

pub use emitter::EmitterPlugin;
pub use player::PlayerMotionPlugin;
pub use projectile::ProjectileContactPlugin;
