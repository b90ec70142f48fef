//! Native worker backed by a dedicated OS thread.

use super::host::WorkerHost;
use super::protocol::{RequestEnvelope, ResponseEnvelope};
use super::WorkerTransport;
use crate::error::{DecoderError, Result};
use core_async::sync::UnboundedSender;
use std::sync::mpsc;
use tracing::{debug, info};

/// Posts requests to a [`WorkerHost`] running on its own thread.
///
/// Dropping the transport closes the request channel, which stops the thread
/// once it has answered everything already queued.
pub struct ThreadTransport {
    requests: mpsc::Sender<RequestEnvelope>,
}

impl ThreadTransport {
    /// Start a named worker thread that answers on `responses`.
    pub fn spawn(name: &str, responses: UnboundedSender<ResponseEnvelope>) -> Result<Self> {
        let (requests, inbox) = mpsc::channel();

        std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_host(inbox, responses))?;

        info!(thread = name, "Decoder worker thread started");
        Ok(Self { requests })
    }
}

impl WorkerTransport for ThreadTransport {
    fn post(&self, envelope: RequestEnvelope) -> Result<()> {
        self.requests
            .send(envelope)
            .map_err(|_| DecoderError::Protocol("worker thread has exited".to_string()))
    }
}

fn run_host(inbox: mpsc::Receiver<RequestEnvelope>, responses: UnboundedSender<ResponseEnvelope>) {
    let mut host = WorkerHost::new();

    while let Ok(envelope) = inbox.recv() {
        let response = host.handle(envelope);
        if responses.send(response).is_err() {
            debug!("Response channel closed, stopping worker");
            break;
        }
        if host.is_closed() {
            break;
        }
    }

    debug!("Decoder worker thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::protocol::{WorkerReply, WorkerRequest};
    use core_async::sync::unbounded_channel;

    #[tokio::test]
    async fn test_thread_answers_in_order_and_stops_on_dispose() {
        let (tx, mut rx) = unbounded_channel();
        let transport = ThreadTransport::spawn("test-decoder-worker", tx).unwrap();

        transport
            .post(RequestEnvelope::new(1, WorkerRequest::Dispose))
            .unwrap();

        let response = rx.recv().await.unwrap();
        assert_eq!(response.id, 1);
        assert_eq!(response.into_result().unwrap(), WorkerReply::Disposed);

        // The thread exits after dispose and drops its response sender
        assert!(rx.recv().await.is_none());
    }
}
