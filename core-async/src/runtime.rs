//! Runtime utilities that abstract over the underlying async executor.
//!
//! On native targets we wrap Tokio's runtime primitives so that downstream
//! crates never need to depend on Tokio directly. WebAssembly has no way to
//! block the event loop, so only the handle lookup is shared there.

// ============================================================================
// Native Implementation (Tokio)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a fresh current-thread runtime.
///
/// Returns an error instead of panicking when the runtime cannot be built,
/// so callers on the logging path can degrade gracefully.
#[cfg(not(target_arch = "wasm32"))]
pub fn block_on<F>(future: F) -> std::io::Result<F::Output>
where
    F: std::future::Future,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

/// Returns `true` when called from inside a Tokio runtime.
#[cfg(not(target_arch = "wasm32"))]
pub fn in_runtime() -> bool {
    Handle::try_current().is_ok()
}

// ============================================================================
// WASM Implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
pub use wasm_bindgen_futures::spawn_local;

/// The browser event loop is always available on WASM.
#[cfg(target_arch = "wasm32")]
pub fn in_runtime() -> bool {
    true
}
