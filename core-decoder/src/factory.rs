//! Construction entry points.
//!
//! Both factories resolve the input to an owned buffer, inspect it and hand back
//! an object that is ready to decode.

use crate::config::DecoderConfig;
use crate::error::Result;
use crate::handle::DecoderHandle;
use crate::types::AudioInput;
use tracing::instrument;

/// Open a synchronous decoder. Blocks until the input is inspected.
///
/// # Example
///
/// ```rust,no_run
/// use core_decoder::{create_decoder, DecodeOptions, DecoderConfig};
/// use std::path::Path;
///
/// let mut decoder = create_decoder(DecoderConfig::default(), Path::new("song.flac"))?;
/// let samples = decoder.decode_audio_data(30.0, 5.0, DecodeOptions::default())?;
/// println!("{} frames", samples.frames());
/// decoder.dispose();
/// # Ok::<(), core_decoder::DecoderError>(())
/// ```
#[instrument(skip_all)]
pub fn create_decoder(config: DecoderConfig, input: impl Into<AudioInput>) -> Result<DecoderHandle> {
    let input = input.into();
    let extension = input.extension();
    let data = input.into_bytes()?;

    DecoderHandle::open(&config, data, extension.as_deref())
}

/// Open a decoder on a dedicated worker thread.
///
/// Resolves once the worker has inspected the input and reported its metadata.
/// Path inputs are read on the calling task before the worker starts.
#[cfg(not(target_arch = "wasm32"))]
#[instrument(skip_all)]
pub async fn create_decoder_worker(
    config: DecoderConfig,
    input: impl Into<AudioInput>,
) -> Result<crate::worker::DecoderWorker> {
    let input = input.into();
    let extension = input.extension();
    let data = input.into_bytes()?;

    crate::worker::DecoderWorker::spawn(config, data, extension).await
}
