//! # Decoder Worker
//!
//! Async proxy for a decoder that lives behind a [`WorkerTransport`].
//!
//! Each call gets a fresh correlation id and a pending entry. A router task
//! reads responses off the channel and completes the matching entry, so
//! replies may be awaited in any order while the worker itself serves
//! requests in submission order.

use super::protocol::{
    OpenRequest, RequestEnvelope, RequestId, ResponseEnvelope, WorkerReply, WorkerRequest,
};
use super::BoxedTransport;
use crate::error::{DecoderError, Result};
use crate::types::{AudioMetadata, DecodeOptions, DecodeRequest, SampleBuffer};
use core_async::sync::{oneshot, UnboundedReceiver};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

type ReplySender = oneshot::Sender<Result<WorkerReply>>;
type ReplyReceiver = oneshot::Receiver<Result<WorkerReply>>;

/// Calls waiting for their response, keyed by correlation id.
#[derive(Default)]
struct PendingCalls {
    calls: Mutex<HashMap<RequestId, ReplySender>>,
}

impl PendingCalls {
    fn register(&self, id: RequestId) -> ReplyReceiver {
        let (tx, rx) = oneshot::channel();
        self.calls.lock().insert(id, tx);
        rx
    }

    fn forget(&self, id: RequestId) {
        self.calls.lock().remove(&id);
    }

    fn complete(&self, response: ResponseEnvelope) {
        // No call can be matched, so none may be left waiting on it.
        if response.is_uncorrelated() {
            let reason = match response.into_result() {
                Err(err) => err.to_string(),
                Ok(reply) => format!("uncorrelated {} reply", reply.kind()),
            };
            self.fail_all(&reason);
            return;
        }

        let id = response.id;
        let Some(reply) = self.calls.lock().remove(&id) else {
            warn!(id, "Dropping response with unknown correlation id");
            return;
        };

        if reply.send(response.into_result()).is_err() {
            trace!(id, "Caller stopped waiting before the reply arrived");
        }
    }

    fn fail_all(&self, reason: &str) {
        let drained: Vec<_> = self.calls.lock().drain().collect();
        if !drained.is_empty() {
            warn!(count = drained.len(), "Failing pending worker calls: {}", reason);
        }
        for (_, reply) in drained {
            let _ = reply.send(Err(DecoderError::Protocol(reason.to_string())));
        }
    }

    fn len(&self) -> usize {
        self.calls.lock().len()
    }
}

async fn route_responses(
    mut responses: UnboundedReceiver<ResponseEnvelope>,
    pending: Arc<PendingCalls>,
) {
    while let Some(response) = responses.recv().await {
        pending.complete(response);
    }
    pending.fail_all("worker terminated");
    debug!("Response router stopped");
}

async fn await_reply(reply: ReplyReceiver) -> Result<WorkerReply> {
    reply
        .await
        .map_err(|_| DecoderError::Protocol("worker terminated before replying".to_string()))?
}

fn unexpected_reply(expected: &str, reply: &WorkerReply) -> DecoderError {
    DecoderError::Protocol(format!(
        "expected {} reply, got {}",
        expected,
        reply.kind()
    ))
}

/// The proxy's half of a worker connection.
struct Connection {
    transport: Mutex<Option<BoxedTransport>>,
    pending: Arc<PendingCalls>,
    next_id: AtomicU64,
}

impl Connection {
    fn new(transport: BoxedTransport, responses: UnboundedReceiver<ResponseEnvelope>) -> Self {
        let pending = Arc::new(PendingCalls::default());
        // Detached: the router ends when the worker drops its response sender.
        let _router = core_async::task::spawn(route_responses(responses, Arc::clone(&pending)));

        Self {
            transport: Mutex::new(Some(transport)),
            pending,
            next_id: AtomicU64::new(1),
        }
    }

    /// Post `request` and return the receiver for its reply.
    ///
    /// The transport lock is held across id allocation and posting, so ids
    /// reach the worker in increasing order.
    fn submit(&self, request: WorkerRequest) -> Result<ReplyReceiver> {
        let transport = self.transport.lock();
        let Some(transport) = transport.as_ref() else {
            return Err(DecoderError::Disposed);
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let operation = request.operation();
        let reply = self.pending.register(id);

        if let Err(err) = transport.post(RequestEnvelope::new(id, request)) {
            self.pending.forget(id);
            return Err(err);
        }

        trace!(id, operation, "Request posted");
        Ok(reply)
    }

    fn is_closed(&self) -> bool {
        self.transport.lock().is_none()
    }

    fn dispose(&self) {
        let Some(transport) = self.transport.lock().take() else {
            return;
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        // Nobody awaits the acknowledgement; the entry keeps the reply from
        // being reported as unknown.
        drop(self.pending.register(id));

        match transport.post(RequestEnvelope::new(id, WorkerRequest::Dispose)) {
            Ok(()) => info!("Worker dispose requested"),
            Err(err) => {
                self.pending.forget(id);
                debug!("Worker already gone: {}", err);
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Async decoder running on a worker.
///
/// Metadata is fetched once during [`connect`](DecoderWorker::connect) and
/// cached. Decode calls may be issued concurrently; the worker answers them in
/// the order they were submitted. Dropping the proxy disposes the worker.
pub struct DecoderWorker {
    metadata: AudioMetadata,
    connection: Connection,
}

impl DecoderWorker {
    /// Open a decoder over an already running worker.
    ///
    /// `responses` must receive every [`ResponseEnvelope`] the worker
    /// produces. If the open request fails the worker is disposed.
    ///
    /// # Panics
    ///
    /// On native targets, panics when called outside a Tokio runtime.
    #[instrument(skip_all, fields(bytes = open.data.len()))]
    pub async fn connect(
        transport: BoxedTransport,
        responses: UnboundedReceiver<ResponseEnvelope>,
        open: OpenRequest,
    ) -> Result<Self> {
        let connection = Connection::new(transport, responses);

        let reply = connection.submit(WorkerRequest::Open(open))?;
        let metadata = match await_reply(reply).await? {
            WorkerReply::Metadata(metadata) => metadata,
            other => return Err(unexpected_reply("metadata", &other)),
        };

        info!(
            encoding = metadata.encoding(),
            sample_rate = metadata.sample_rate,
            channels = metadata.channel_count,
            "Decoder worker ready"
        );
        Ok(Self {
            metadata,
            connection,
        })
    }

    /// Start a worker thread and open `data` on it.
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn spawn(
        config: crate::config::DecoderConfig,
        data: bytes::Bytes,
        extension: Option<String>,
    ) -> Result<Self> {
        config.validate()?;

        let (responses_tx, responses_rx) = core_async::sync::unbounded_channel();
        let transport = super::ThreadTransport::spawn(&config.worker_thread_name, responses_tx)?;

        Self::connect(
            Box::new(transport),
            responses_rx,
            OpenRequest {
                config,
                data,
                extension,
            },
        )
        .await
    }

    pub fn metadata(&self) -> &AudioMetadata {
        &self.metadata
    }

    pub fn sample_rate(&self) -> u32 {
        self.metadata.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.metadata.channel_count
    }

    pub fn encoding(&self) -> &'static str {
        self.metadata.encoding()
    }

    pub fn duration(&self) -> f64 {
        self.metadata.duration
    }

    pub fn is_disposed(&self) -> bool {
        self.connection.is_closed()
    }

    /// Number of calls still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.connection.pending.len()
    }

    /// Decode a range on the worker.
    ///
    /// The request is posted before this returns, so the order in which
    /// futures are created is the order the worker serves them.
    pub fn get_audio_data(
        &self,
        start_seconds: f64,
        duration_seconds: f64,
        options: DecodeOptions,
    ) -> impl Future<Output = Result<SampleBuffer>> + Send + 'static {
        self.request(DecodeRequest::new(start_seconds, duration_seconds, options))
    }

    /// Decode a prepared request on the worker.
    pub fn request(&self, request: DecodeRequest) -> impl Future<Output = Result<SampleBuffer>> + Send + 'static {
        let submitted = request
            .validate()
            .and_then(|()| self.connection.submit(WorkerRequest::Decode(request)));

        async move {
            match await_reply(submitted?).await? {
                WorkerReply::Samples(buffer) => Ok(buffer),
                other => Err(unexpected_reply("samples", &other)),
            }
        }
    }

    /// Ask the worker to release its decoder and stop. Safe to call repeatedly.
    ///
    /// Calls already submitted are still answered; later calls fail with
    /// [`DecoderError::Disposed`].
    pub fn dispose(&self) {
        self.connection.dispose();
    }
}

impl std::fmt::Debug for DecoderWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderWorker")
            .field("metadata", &self.metadata)
            .field("disposed", &self.is_disposed())
            .field("pending", &self.pending_requests())
            .finish()
    }
}
