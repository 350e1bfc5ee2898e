//! Shared test fixtures and utilities for Strider crates.
//!
//! Provides mock ground sensors with scripted or counted answers and
//! ready-made leg and rig builders standing on flat ground.

pub mod fixtures;
pub mod mocks;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{hexapod_rig, leg_at, quadruped_config, quadruped_rig};
pub use mocks::{CountingSensor, FixedSensor, ScriptedSensor, contact_at};
