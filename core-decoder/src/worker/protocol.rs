//! # Worker Protocol
//!
//! Request/response envelopes exchanged between a [`DecoderWorker`] and the
//! [`WorkerHost`] running on the other side of a channel or a browser
//! `postMessage` boundary. Every request carries a correlation id that its
//! response echoes back.
//!
//! JSON shape:
//!
//! ```text
//! {"id":3,"request":{"operation":"decode","payload":{"startSeconds":1.0,"durationSeconds":2.0}}}
//! {"id":3,"outcome":{"status":"result","body":{"kind":"samples","value":{...}}}}
//! {"id":4,"outcome":{"status":"error","body":{"kind":"disposed","message":""}}}
//! ```
//!
//! Samples travel as little-endian `f32` bytes, so NaN and infinities
//! survive the JSON hop. A message that cannot be tied to any request is
//! answered under [`UNCORRELATED_ID`].
//!
//! [`DecoderWorker`]: crate::worker::DecoderWorker
//! [`WorkerHost`]: crate::worker::WorkerHost

use crate::config::DecoderConfig;
use crate::error::{DecoderError, ErrorKind, Result};
use crate::types::{AudioMetadata, DecodeRequest, SampleBuffer};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Correlation id, unique and increasing per proxy.
pub type RequestId = u64;

/// Id of a response that belongs to no request. Proxies never issue it.
pub const UNCORRELATED_ID: RequestId = 0;

/// Best-effort read of the `id` field of a message that failed to parse.
pub(crate) fn salvage_id(message: &str) -> RequestId {
    serde_json::from_str::<serde_json::Value>(message)
        .ok()
        .and_then(|value| value.get("id").and_then(serde_json::Value::as_u64))
        .unwrap_or(UNCORRELATED_ID)
}

/// Payload of an `open` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRequest {
    #[serde(default)]
    pub config: DecoderConfig,
    pub data: Bytes,
    /// Optional file extension used as a format hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

/// Operations a worker understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", content = "payload", rename_all = "camelCase")]
pub enum WorkerRequest {
    Open(OpenRequest),
    Decode(DecodeRequest),
    Dispose,
}

impl WorkerRequest {
    pub fn operation(&self) -> &'static str {
        match self {
            WorkerRequest::Open(_) => "open",
            WorkerRequest::Decode(_) => "decode",
            WorkerRequest::Dispose => "dispose",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub id: RequestId,
    pub request: WorkerRequest,
}

impl RequestEnvelope {
    pub fn new(id: RequestId, request: WorkerRequest) -> Self {
        Self { id, request }
    }
}

/// Successful reply payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum WorkerReply {
    Metadata(AudioMetadata),
    Samples(SampleBuffer),
    Disposed,
}

impl WorkerReply {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerReply::Metadata(_) => "metadata",
            WorkerReply::Samples(_) => "samples",
            WorkerReply::Disposed => "disposed",
        }
    }
}

/// An error as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&DecoderError> for WireError {
    fn from(err: &DecoderError) -> Self {
        Self {
            kind: err.kind(),
            message: err.wire_message(),
        }
    }
}

impl From<WireError> for DecoderError {
    fn from(err: WireError) -> Self {
        DecoderError::from_wire(err.kind, err.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "body", rename_all = "camelCase")]
pub enum WorkerOutcome {
    Result(WorkerReply),
    Error(WireError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: RequestId,
    pub outcome: WorkerOutcome,
}

impl ResponseEnvelope {
    pub fn new(id: RequestId, result: Result<WorkerReply>) -> Self {
        let outcome = match result {
            Ok(reply) => WorkerOutcome::Result(reply),
            Err(err) => WorkerOutcome::Error(WireError::from(&err)),
        };
        Self { id, outcome }
    }

    pub fn protocol_error(id: RequestId, message: impl Into<String>) -> Self {
        Self {
            id,
            outcome: WorkerOutcome::Error(WireError {
                kind: ErrorKind::Protocol,
                message: message.into(),
            }),
        }
    }

    /// Parse a response received as text.
    ///
    /// Never fails: an unreadable message becomes a `protocol` error under
    /// the id it carries, or [`UNCORRELATED_ID`] when none can be read.
    pub fn from_json(message: &str) -> Self {
        match serde_json::from_str(message) {
            Ok(response) => response,
            Err(err) => {
                let id = salvage_id(message);
                warn!(id, "Malformed worker response: {}", err);
                Self::protocol_error(id, format!("malformed response: {}", err))
            }
        }
    }

    pub fn is_uncorrelated(&self) -> bool {
        self.id == UNCORRELATED_ID
    }

    pub fn into_result(self) -> Result<WorkerReply> {
        match self.outcome {
            WorkerOutcome::Result(reply) => Ok(reply),
            WorkerOutcome::Error(err) => Err(err.into()),
        }
    }
}
