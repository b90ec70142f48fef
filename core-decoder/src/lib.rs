//! # Range Decoding Module
//!
//! Decodes an arbitrary time range of a compressed audio file into `f32` PCM
//! without decoding the whole file.
//!
//! ## Overview
//!
//! This module handles:
//! - Detecting the container and codec of an in-memory file
//! - Seeking to a start time and decoding only the requested window
//! - Downmixing to mono or keeping interleaved channels
//! - A synchronous [`DecoderHandle`] and an async [`DecoderWorker`] that runs
//!   the same decoder off the caller's thread
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core_decoder::{create_decoder, DecodeOptions, DecoderConfig};
//!
//! # fn example(bytes: Vec<u8>) -> core_decoder::Result<()> {
//! let mut decoder = create_decoder(DecoderConfig::default(), bytes)?;
//! let mono = decoder.decode_audio_data(12.0, 3.0, DecodeOptions::downmix())?;
//! assert_eq!(mono.channels(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod factory;
pub mod handle;
pub mod types;
pub mod worker;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

#[cfg(test)]
mod test_support;

pub use config::{DecoderConfig, SeekPrecision};
pub use error::{DecoderError, ErrorKind, Result};
pub use factory::create_decoder;
#[cfg(not(target_arch = "wasm32"))]
pub use factory::create_decoder_worker;
pub use handle::{DecoderHandle, HandleStatus};
pub use types::{
    AudioCodec, AudioInput, AudioMetadata, ContainerFormat, DecodeOptions, DecodeRequest,
    PcmFormat, SampleBuffer,
};
pub use worker::{DecoderWorker, WorkerHost, WorkerTransport};
