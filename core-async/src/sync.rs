//! Channel primitives.
//!
//! This module provides platform-agnostic message channels:
//! - On native platforms: Uses `tokio::sync` (async-aware, `Send + Sync`)
//! - On WASM: Wraps `futures::channel` so the same method names work
//!
//! # Platform Differences
//!
//! ## Native (Tokio)
//! - Senders can be moved to plain OS threads and used without a runtime
//! - Receivers are awaited from tasks spawned with [`crate::task::spawn`]
//!
//! ## WASM
//! - Single-threaded, nothing here is `Send`
//! - `UnboundedSender::send` maps onto `unbounded_send`
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{oneshot, unbounded_channel};
//!
//! async fn example() {
//!     let (tx, mut rx) = unbounded_channel();
//!     tx.send("hello").unwrap();
//!     assert_eq!(rx.recv().await, Some("hello"));
//!
//!     let (reply_tx, reply_rx) = oneshot::channel();
//!     let _ = reply_tx.send(42);
//!     assert_eq!(reply_rx.await.ok(), Some(42));
//! }
//! ```

// ============================================================================
// Native Implementation (Tokio)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::sync::{mpsc, oneshot};

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::sync::mpsc::{
    error::SendError, unbounded_channel, UnboundedReceiver, UnboundedSender,
};

// ============================================================================
// WASM Implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
pub use futures::channel::{mpsc, oneshot};

#[cfg(target_arch = "wasm32")]
/// Error returned when the receiving half has been dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendError<T>(pub T);

#[cfg(target_arch = "wasm32")]
impl<T> std::fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "channel closed")
    }
}

#[cfg(target_arch = "wasm32")]
/// Sending half of an unbounded channel.
pub struct UnboundedSender<T> {
    inner: futures::channel::mpsc::UnboundedSender<T>,
}

#[cfg(target_arch = "wasm32")]
impl<T> UnboundedSender<T> {
    /// Sends a value without waiting; fails only if the receiver is gone.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        self.inner
            .unbounded_send(value)
            .map_err(|err| SendError(err.into_inner()))
    }

    /// Returns `true` if the receiving half has been dropped.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

#[cfg(target_arch = "wasm32")]
impl<T> Clone for UnboundedSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
/// Receiving half of an unbounded channel.
pub struct UnboundedReceiver<T> {
    inner: futures::channel::mpsc::UnboundedReceiver<T>,
}

#[cfg(target_arch = "wasm32")]
impl<T> UnboundedReceiver<T> {
    /// Receives the next value, or `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<T> {
        use futures::StreamExt;
        self.inner.next().await
    }
}

#[cfg(target_arch = "wasm32")]
/// Creates an unbounded channel with the same surface as Tokio's.
pub fn unbounded_channel<T>() -> (UnboundedSender<T>, UnboundedReceiver<T>) {
    let (tx, rx) = futures::channel::mpsc::unbounded();
    (UnboundedSender { inner: tx }, UnboundedReceiver { inner: rx })
}
