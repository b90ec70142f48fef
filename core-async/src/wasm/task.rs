//! WASM task spawning with an awaitable `JoinHandle`.
//!
//! The spawned future runs on the browser event loop via
//! `wasm_bindgen_futures::spawn_local`; its output travels back through a
//! oneshot channel that the handle awaits.

use futures::channel::oneshot;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Returned when a spawned task never produced its output.
#[derive(Debug, Clone)]
pub struct JoinError;

impl JoinError {
    /// Always `true`: on WASM the only failure mode is a dropped task.
    pub fn is_cancelled(&self) -> bool {
        true
    }
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task was cancelled")
    }
}

impl std::error::Error for JoinError {}

/// A handle to a spawned task, mirroring `tokio::task::JoinHandle`.
pub struct JoinHandle<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> Future for JoinHandle<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| JoinError))
    }
}

/// Spawns a future onto the browser event loop.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    let (sender, receiver) = oneshot::channel();

    wasm_bindgen_futures::spawn_local(async move {
        let output = future.await;
        let _ = sender.send(output);
    });

    JoinHandle { receiver }
}
