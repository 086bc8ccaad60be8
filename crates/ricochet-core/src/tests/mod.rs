//! Test module for scenario, determinism, and property tests.
//!
//! These tests drive the full Entity-Plugin-Resolver pipeline through the
//! [`Simulation`](crate::simulation::Simulation) boundary:
//! - **Integration tests**: the combat and encounter scenarios end to end
//! - **Determinism tests**: same seed and inputs produce identical runs
//! - **Property tests**: invariants over arbitrary operation sequences
//!
//! # Test Structure
//!
//! - `integration.rs`: End-to-end scenarios
//! - `determinism.rs`: Replay checks
//! - `properties.rs`: `proptest` invariants
//! - `helpers.rs`: Setup utilities and accessors

mod helpers;

pub use helpers::*;
