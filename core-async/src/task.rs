//! Task spawning abstractions.
//!
//! - On native platforms: Uses `tokio::task::spawn`
//! - On WASM: Uses `wasm_bindgen_futures::spawn_local` with an awaitable `JoinHandle`
//!
//! # Platform Differences
//!
//! ## Native (Tokio)
//! - `spawn`: Returns a `JoinHandle<T>` that can be awaited
//! - Tasks must be `Send` and may move between threads
//! - Spawning requires a running Tokio runtime
//!
//! ## WASM
//! - `spawn`: Returns an awaitable `JoinHandle<T>`
//! - Tasks must be `'static` but not `Send` (single-threaded)
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//!
//! async fn example() {
//!     let handle = task::spawn(async { 42 });
//!     let result = handle.await.unwrap();
//!     assert_eq!(result, 42);
//! }
//! ```

// ============================================================================
// Native Implementation (Tokio)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::task::{JoinError, JoinHandle};

#[cfg(not(target_arch = "wasm32"))]
/// Spawns a new asynchronous task using the Tokio runtime.
///
/// # Panics
///
/// Panics when called outside of a Tokio runtime, like `tokio::spawn`.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

// ============================================================================
// WASM Implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
pub use crate::wasm::task::{spawn, JoinError, JoinHandle};

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;
