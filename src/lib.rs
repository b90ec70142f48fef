//! Workspace facade crate.
//!
//! This crate exposes shared feature flags that map to the individual
//! workspace crates (`core-decoder`, `core-runtime`). Host applications can
//! depend on `audio-range-workspace` and enable the documented decoder
//! features without wiring each crate individually.

#[cfg(feature = "core-decoder")]
pub use core_decoder as decoder;

#[cfg(feature = "core-runtime")]
pub use core_runtime as runtime;
