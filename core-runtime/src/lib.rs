//! # Core Runtime Module
//!
//! Provides the runtime infrastructure shared by the decoder crates:
//! - Logging and tracing initialisation
//! - Host log sinks that mirror tracing events into a platform logger
//!
//! ## Overview
//!
//! Decoding code only ever emits `tracing` events. Whether they end up on
//! stdout, as JSON lines, in the browser console, or in a host logger is decided
//! once at startup through [`logging::init_logging`].

pub mod error;
pub mod logging;
pub mod sink;

pub use error::{Error, Result};
