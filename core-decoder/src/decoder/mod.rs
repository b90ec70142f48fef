//! # Audio Decoder Module
//!
//! Range decoding on top of the Symphonia library.
//!
//! ## Supported Formats
//!
//! | Format | Codec | Feature Flag | License | WASM Support |
//! |--------|-------|--------------|---------|--------------|
//! | MP3 | MPEG-1/2 Audio Layer III | `decoder-mp3` | Patents expired | ✅ |
//! | FLAC | Free Lossless Audio Codec | `decoder-flac` | BSD-3 | ✅ |
//! | Vorbis | Ogg Vorbis | `decoder-vorbis` | BSD-3 | ✅ |
//! | AAC | AAC-LC in ADTS or MP4 | `decoder-aac` | Patent-encumbered | ✅ |
//! | WAV | PCM, A-law, µ-law | `decoder-wav` | Public domain | ✅ |
//! | ALAC | Apple Lossless in MP4 | `decoder-alac` | Apache 2.0 | ✅ |
//!
//! Opus, MP1 and MP2 streams are identified but rejected as unsupported.
//!
//! ## Architecture
//!
//! 1. **FormatInspector**: sniffs magic bytes, opens the container, picks the
//!    audio track and validates its codec
//! 2. **DecodeEngine**: seeks, decodes packets sequentially and trims them to
//!    the requested frame range
//! 3. **SampleConverter**: normalises samples to `f32` and applies the
//!    downmix or interleave policy
//!
//! ## Threading Model
//!
//! The engine is `Send` but not shared: one engine per handle, driven from
//! one thread at a time.

mod engine;
mod inspector;
mod sample_converter;

pub use engine::DecodeEngine;
pub use inspector::{FormatInspector, InspectedStream};
pub use sample_converter::{ChannelPolicy, SampleConverter};

#[cfg(not(any(
    feature = "decoder-mp3",
    feature = "decoder-flac",
    feature = "decoder-vorbis",
    feature = "decoder-aac",
    feature = "decoder-alac",
    feature = "decoder-wav"
)))]
compile_error!(
    "No audio decoder feature is enabled. Enable one of: \
     'decoder-mp3', 'decoder-flac', 'decoder-vorbis', \
     'decoder-aac', 'decoder-alac', 'decoder-wav', or 'decoder-all'"
);
