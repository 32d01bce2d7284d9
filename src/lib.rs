//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-playback`). Host applications can
//! depend on `playback-workspace` and enable the documented features without
//! wiring each crate individually.

#[cfg(feature = "service")]
pub use core_service as service;

#[cfg(feature = "engine-only")]
pub use core_playback as playback;
