//! # Worker Module
//!
//! Off-thread decoding. A [`DecoderWorker`] on the caller's side talks to a
//! [`WorkerHost`] on the worker's side through [`protocol`] envelopes.
//!
//! ## Transports
//!
//! - **Native**: [`ThreadTransport`] runs the host on a dedicated OS thread
//! - **WASM**: the host runs inside a Web Worker and envelopes cross
//!   `postMessage` as JSON (see the `wasm` module)

mod host;
pub mod protocol;
mod proxy;
#[cfg(not(target_arch = "wasm32"))]
mod thread;

pub use host::WorkerHost;
pub use protocol::{
    OpenRequest, RequestEnvelope, RequestId, ResponseEnvelope, WireError, WorkerOutcome,
    WorkerReply, WorkerRequest, UNCORRELATED_ID,
};
pub use proxy::DecoderWorker;
#[cfg(not(target_arch = "wasm32"))]
pub use thread::ThreadTransport;

use crate::error::Result;

#[cfg(test)]
use mockall::automock;

/// Delivers request envelopes to a worker.
///
/// Implementations must deliver envelopes in the order they are posted.
/// Responses flow back separately, through the channel handed to
/// [`DecoderWorker::connect`].
#[cfg_attr(test, automock)]
pub trait WorkerTransport {
    fn post(&self, envelope: RequestEnvelope) -> Result<()>;
}

#[cfg(not(target_arch = "wasm32"))]
pub type BoxedTransport = Box<dyn WorkerTransport + Send>;

#[cfg(target_arch = "wasm32")]
pub type BoxedTransport = Box<dyn WorkerTransport>;
