//! Runtime-agnostic async abstraction layer for the audio range decoder.
//!
//! This crate provides a unified async API that works across different runtime environments:
//! - Native platforms: Uses Tokio runtime
//! - WebAssembly: Uses browser's event loop with wasm-bindgen-futures
//!
//! # Architecture
//!
//! The crate uses conditional compilation (`#[cfg]`) to provide platform-specific
//! implementations while maintaining a consistent API surface. The decoder crates
//! depend on this crate instead of directly depending on tokio.
//!
//! # Modules
//!
//! - `task`: Task spawning and execution
//! - `sync`: Channels used to move messages between the caller and a decode worker
//! - `runtime`: Blocking entry point for synchronous callers
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::unbounded_channel;
//! use core_async::task;
//!
//! async fn example() {
//!     let (tx, mut rx) = unbounded_channel::<u32>();
//!     let handle = task::spawn(async move { rx.recv().await });
//!     let _ = tx.send(7);
//!     # let _ = handle;
//! }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;

// WASM-specific implementations
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use task::spawn;
