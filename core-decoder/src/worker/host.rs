//! # Worker Host
//!
//! Worker-side dispatcher. Owns at most one [`DecoderHandle`] and answers
//! envelopes strictly in the order they arrive.

use super::protocol::{
    salvage_id, OpenRequest, RequestEnvelope, ResponseEnvelope, WorkerReply, WorkerRequest,
};
use crate::error::{DecoderError, Result};
use crate::handle::DecoderHandle;
use tracing::{debug, instrument, warn};

enum HostState {
    Idle,
    Open(DecoderHandle),
    Closed,
}

/// Dispatches worker requests to a decoder handle.
pub struct WorkerHost {
    state: HostState,
}

impl WorkerHost {
    pub fn new() -> Self {
        Self {
            state: HostState::Idle,
        }
    }

    /// Returns `true` once `dispose` has been handled.
    pub fn is_closed(&self) -> bool {
        matches!(self.state, HostState::Closed)
    }

    /// Handle one request and build its response.
    #[instrument(skip(self, envelope), fields(id = envelope.id, operation = envelope.request.operation()))]
    pub fn handle(&mut self, envelope: RequestEnvelope) -> ResponseEnvelope {
        let RequestEnvelope { id, request } = envelope;

        let result = match request {
            WorkerRequest::Open(open) => self.open(open),
            WorkerRequest::Decode(request) => match &mut self.state {
                HostState::Open(handle) => handle.decode(&request).map(WorkerReply::Samples),
                HostState::Idle => Err(DecoderError::Protocol("no decoder open".to_string())),
                HostState::Closed => Err(DecoderError::Disposed),
            },
            WorkerRequest::Dispose => {
                if let HostState::Open(mut handle) =
                    std::mem::replace(&mut self.state, HostState::Closed)
                {
                    handle.dispose();
                }
                Ok(WorkerReply::Disposed)
            }
        };

        if let Err(err) = &result {
            debug!("Request failed: {}", err);
        }
        ResponseEnvelope::new(id, result)
    }

    /// JSON entry point used by browser worker scripts.
    ///
    /// Unparseable input is answered with a `protocol` error under the id it
    /// carries, or [`UNCORRELATED_ID`](super::UNCORRELATED_ID) when no id can
    /// be read.
    pub fn handle_json(&mut self, message: &str) -> String {
        let response = match serde_json::from_str::<RequestEnvelope>(message) {
            Ok(envelope) => self.handle(envelope),
            Err(err) => {
                let id = salvage_id(message);
                warn!(id, "Malformed worker request: {}", err);
                ResponseEnvelope::protocol_error(id, format!("malformed request: {}", err))
            }
        };

        serde_json::to_string(&response).unwrap_or_else(|err| {
            warn!("Failed to serialise worker response: {}", err);
            format!(
                r#"{{"id":{},"outcome":{{"status":"error","body":{{"kind":"protocol","message":"unserialisable response"}}}}}}"#,
                response.id
            )
        })
    }

    fn open(&mut self, open: OpenRequest) -> Result<WorkerReply> {
        match self.state {
            HostState::Idle => {}
            HostState::Open(_) => {
                return Err(DecoderError::Protocol("decoder already open".to_string()))
            }
            HostState::Closed => return Err(DecoderError::Disposed),
        }

        let OpenRequest {
            config,
            data,
            extension,
        } = open;
        let handle = DecoderHandle::open(&config, data, extension.as_deref())?;
        let metadata = handle.metadata().clone();
        self.state = HostState::Open(handle);

        Ok(WorkerReply::Metadata(metadata))
    }
}

impl Default for WorkerHost {
    fn default() -> Self {
        Self::new()
    }
}
