//! WASM-specific async implementations.
//!
//! Single-threaded replacements for the Tokio pieces re-exported on native
//! targets. Nothing here requires `Send`.

pub mod task;
