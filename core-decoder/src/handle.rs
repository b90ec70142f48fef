//! # Decoder Handle
//!
//! Synchronous facade over one opened file.
//!
//! ```text
//! Created ──open──▶ Ready ◀──────▶ Decoding
//!                     │
//!                  dispose
//!                     ▼
//!                 Disposed
//! ```

use crate::config::DecoderConfig;
use crate::decoder::DecodeEngine;
use crate::error::{DecoderError, Result};
use crate::types::{AudioMetadata, DecodeOptions, DecodeRequest, SampleBuffer};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

/// Observable lifecycle state of a [`DecoderHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleStatus {
    Created,
    Ready,
    Decoding,
    Disposed,
}

impl HandleStatus {
    /// Returns `true` if no further decode calls will be served.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disposed)
    }
}

enum HandleState {
    Created,
    Ready(Box<DecodeEngine>),
    /// Engine is moved out for the duration of one decode call.
    Decoding,
    Disposed,
}

impl HandleState {
    fn status(&self) -> HandleStatus {
        match self {
            HandleState::Created => HandleStatus::Created,
            HandleState::Ready(_) => HandleStatus::Ready,
            HandleState::Decoding => HandleStatus::Decoding,
            HandleState::Disposed => HandleStatus::Disposed,
        }
    }
}

/// A decoder bound to one file.
///
/// Metadata is captured at open time and stays readable after
/// [`dispose`](DecoderHandle::dispose). Decoding runs on the caller's thread.
pub struct DecoderHandle {
    metadata: AudioMetadata,
    state: HandleState,
}

impl DecoderHandle {
    /// Open `data` and move to `Ready`.
    #[instrument(skip(config, data), fields(bytes = data.len()))]
    pub fn open(config: &DecoderConfig, data: Bytes, extension: Option<&str>) -> Result<Self> {
        config.validate()?;

        let mut state = HandleState::Created;
        debug!(status = ?state.status(), "Opening decoder");

        let engine = DecodeEngine::open(data, extension, config)?;
        let metadata = engine.metadata().clone();
        state = HandleState::Ready(Box::new(engine));

        Ok(Self { metadata, state })
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

    /// Lowercase codec identifier, e.g. `pcm_s16le` or `mp3`.
    pub fn encoding(&self) -> &'static str {
        self.metadata.encoding()
    }

    /// Total duration in seconds.
    pub fn duration(&self) -> f64 {
        self.metadata.duration
    }

    pub fn status(&self) -> HandleStatus {
        self.state.status()
    }

    pub fn is_disposed(&self) -> bool {
        self.status().is_terminal()
    }

    /// Decode `duration_seconds` starting at `start_seconds`.
    ///
    /// A negative duration decodes to the end of the file.
    pub fn decode_audio_data(
        &mut self,
        start_seconds: f64,
        duration_seconds: f64,
        options: DecodeOptions,
    ) -> Result<SampleBuffer> {
        self.decode(&DecodeRequest::new(start_seconds, duration_seconds, options))
    }

    /// Decode the whole file with default options.
    pub fn decode_all(&mut self) -> Result<SampleBuffer> {
        self.decode(&DecodeRequest::full())
    }

    /// Decode a prepared request.
    pub fn decode(&mut self, request: &DecodeRequest) -> Result<SampleBuffer> {
        let mut engine = match std::mem::replace(&mut self.state, HandleState::Decoding) {
            HandleState::Ready(engine) => engine,
            HandleState::Disposed => {
                self.state = HandleState::Disposed;
                return Err(DecoderError::Disposed);
            }
            HandleState::Created => {
                self.state = HandleState::Created;
                return Err(DecoderError::Decode("decoder is not open".to_string()));
            }
            HandleState::Decoding => {
                // Only reachable if an earlier decode panicked mid-call.
                error!("Decoder found mid-decode, treating it as unusable");
                self.state = HandleState::Disposed;
                return Err(DecoderError::Disposed);
            }
        };

        let result = engine.decode_range(request);
        self.state = HandleState::Ready(engine);
        result
    }

    /// Release the engine and the input buffer. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        match std::mem::replace(&mut self.state, HandleState::Disposed) {
            HandleState::Ready(engine) => {
                drop(engine);
                info!(encoding = self.encoding(), "Decoder disposed");
            }
            HandleState::Disposed => debug!("Decoder already disposed"),
            HandleState::Created | HandleState::Decoding => debug!("Decoder released"),
        }
    }
}

impl Drop for DecoderHandle {
    fn drop(&mut self) {
        if !self.is_disposed() {
            self.dispose();
        }
    }
}

impl std::fmt::Debug for DecoderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderHandle")
            .field("metadata", &self.metadata)
            .field("status", &self.status())
            .finish()
    }
}
