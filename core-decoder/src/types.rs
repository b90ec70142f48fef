//! # Decoder Types
//!
//! Platform-agnostic data types shared by the engine, the handle and the
//! worker protocol.

use crate::error::{DecoderError, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Codec & Container
// ============================================================================

/// PCM sample layouts understood by the PCM codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcmFormat {
    S8,
    U8,
    S16Le,
    S16Be,
    U16Le,
    U16Be,
    S24Le,
    S24Be,
    U24Le,
    U24Be,
    S32Le,
    S32Be,
    U32Le,
    U32Be,
    F32Le,
    F32Be,
    F64Le,
    F64Be,
    Alaw,
    Mulaw,
}

impl PcmFormat {
    const ALL: [PcmFormat; 20] = [
        PcmFormat::S8,
        PcmFormat::U8,
        PcmFormat::S16Le,
        PcmFormat::S16Be,
        PcmFormat::U16Le,
        PcmFormat::U16Be,
        PcmFormat::S24Le,
        PcmFormat::S24Be,
        PcmFormat::U24Le,
        PcmFormat::U24Be,
        PcmFormat::S32Le,
        PcmFormat::S32Be,
        PcmFormat::U32Le,
        PcmFormat::U32Be,
        PcmFormat::F32Le,
        PcmFormat::F32Be,
        PcmFormat::F64Le,
        PcmFormat::F64Be,
        PcmFormat::Alaw,
        PcmFormat::Mulaw,
    ];

    /// Lowercase encoding identifier, e.g. `pcm_s16le`.
    pub fn encoding(&self) -> &'static str {
        match self {
            PcmFormat::S8 => "pcm_s8",
            PcmFormat::U8 => "pcm_u8",
            PcmFormat::S16Le => "pcm_s16le",
            PcmFormat::S16Be => "pcm_s16be",
            PcmFormat::U16Le => "pcm_u16le",
            PcmFormat::U16Be => "pcm_u16be",
            PcmFormat::S24Le => "pcm_s24le",
            PcmFormat::S24Be => "pcm_s24be",
            PcmFormat::U24Le => "pcm_u24le",
            PcmFormat::U24Be => "pcm_u24be",
            PcmFormat::S32Le => "pcm_s32le",
            PcmFormat::S32Be => "pcm_s32be",
            PcmFormat::U32Le => "pcm_u32le",
            PcmFormat::U32Be => "pcm_u32be",
            PcmFormat::F32Le => "pcm_f32le",
            PcmFormat::F32Be => "pcm_f32be",
            PcmFormat::F64Le => "pcm_f64le",
            PcmFormat::F64Be => "pcm_f64be",
            PcmFormat::Alaw => "pcm_alaw",
            PcmFormat::Mulaw => "pcm_mulaw",
        }
    }
}

/// Audio codec identified at open time.
///
/// The set is closed: anything else is rejected with
/// [`DecoderError::UnsupportedFormat`] before a handle exists.
/// Serialised as its [`encoding`](AudioCodec::encoding) string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AudioCodec {
    /// MPEG-1/2 Audio Layer 3
    Mp3,
    /// MPEG-1/2 Audio Layer 2
    Mp2,
    /// MPEG-1/2 Audio Layer 1
    Mp1,
    /// Advanced Audio Coding (AAC-LC)
    Aac,
    /// Free Lossless Audio Codec
    Flac,
    /// Ogg Vorbis
    Vorbis,
    /// Opus (identified, but no decoder ships for it)
    Opus,
    /// Apple Lossless Audio Codec
    Alac,
    /// Uncompressed or companded PCM
    Pcm(PcmFormat),
}

impl AudioCodec {
    /// Lowercase codec identifier (`"mp3"`, `"pcm_s16le"`, ...).
    pub fn encoding(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Mp2 => "mp2",
            AudioCodec::Mp1 => "mp1",
            AudioCodec::Aac => "aac",
            AudioCodec::Flac => "flac",
            AudioCodec::Vorbis => "vorbis",
            AudioCodec::Opus => "opus",
            AudioCodec::Alac => "alac",
            AudioCodec::Pcm(format) => format.encoding(),
        }
    }

    /// Returns `true` if this is a lossless codec.
    pub fn is_lossless(&self) -> bool {
        matches!(
            self,
            AudioCodec::Flac | AudioCodec::Alac | AudioCodec::Pcm(_)
        )
    }

    fn from_encoding(encoding: &str) -> Option<Self> {
        let codec = match encoding {
            "mp3" => AudioCodec::Mp3,
            "mp2" => AudioCodec::Mp2,
            "mp1" => AudioCodec::Mp1,
            "aac" => AudioCodec::Aac,
            "flac" => AudioCodec::Flac,
            "vorbis" => AudioCodec::Vorbis,
            "opus" => AudioCodec::Opus,
            "alac" => AudioCodec::Alac,
            other => {
                return PcmFormat::ALL
                    .iter()
                    .find(|format| format.encoding() == other)
                    .map(|format| AudioCodec::Pcm(*format))
            }
        };
        Some(codec)
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encoding())
    }
}

impl TryFrom<String> for AudioCodec {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        AudioCodec::from_encoding(&value).ok_or_else(|| format!("unknown encoding '{}'", value))
    }
}

impl From<AudioCodec> for String {
    fn from(codec: AudioCodec) -> Self {
        codec.encoding().to_string()
    }
}

/// Container format, identified from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Wav,
    Aiff,
    Caf,
    Mp3,
    Adts,
    Flac,
    Ogg,
    Mp4,
    Mkv,
    /// Magic not recognised, but a reader still accepted the stream.
    Unknown,
}

impl ContainerFormat {
    /// Identify the container from the leading bytes of a file.
    pub fn sniff(data: &[u8]) -> Self {
        if data.len() < 4 {
            return ContainerFormat::Unknown;
        }

        let tag = &data[0..4];
        let form = data.get(8..12);

        match tag {
            b"RIFF" | b"RF64" if form == Some(&b"WAVE"[..]) => ContainerFormat::Wav,
            b"FORM" if matches!(form, Some(b"AIFF") | Some(b"AIFC")) => ContainerFormat::Aiff,
            b"caff" => ContainerFormat::Caf,
            b"fLaC" => ContainerFormat::Flac,
            b"OggS" => ContainerFormat::Ogg,
            [0x1A, 0x45, 0xDF, 0xA3] => ContainerFormat::Mkv,
            _ if data.get(4..8) == Some(&b"ftyp"[..]) => ContainerFormat::Mp4,
            [b'I', b'D', b'3', _] => ContainerFormat::Mp3,
            // ADTS: 12-bit sync, layer bits always zero.
            [0xFF, b1, _, _] if b1 & 0xF6 == 0xF0 => ContainerFormat::Adts,
            // MPEG audio frame sync (11 bits) with a non-reserved layer.
            [0xFF, b1, _, _] if b1 & 0xE0 == 0xE0 && b1 & 0x06 != 0 => ContainerFormat::Mp3,
            _ => ContainerFormat::Unknown,
        }
    }

    /// File extension used as a format hint.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ContainerFormat::Wav => Some("wav"),
            ContainerFormat::Aiff => Some("aiff"),
            ContainerFormat::Caf => Some("caf"),
            ContainerFormat::Mp3 => Some("mp3"),
            ContainerFormat::Adts => Some("aac"),
            ContainerFormat::Flac => Some("flac"),
            ContainerFormat::Ogg => Some("ogg"),
            ContainerFormat::Mp4 => Some("m4a"),
            ContainerFormat::Mkv => Some("mkv"),
            ContainerFormat::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ContainerFormat::Unknown)
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Metadata snapshot captured once when a file is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetadata {
    /// Sample rate in Hz (always > 0)
    pub sample_rate: u32,
    /// Number of channels (always >= 1)
    pub channel_count: u16,
    /// Codec of the selected track
    #[serde(rename = "encoding")]
    pub codec: AudioCodec,
    /// Container the track was read from
    pub container: ContainerFormat,
    /// Total duration in seconds
    pub duration: f64,
    /// Bits per sample, when the container reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits_per_sample: Option<u32>,
}

impl AudioMetadata {
    pub fn encoding(&self) -> &'static str {
        self.codec.encoding()
    }

    /// Total frame count, `round(duration * sample_rate)`.
    pub fn total_frames(&self) -> u64 {
        (self.duration * self.sample_rate as f64).round() as u64
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Per-call decode options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeOptions {
    /// `false`: mean downmix to mono. `true`: interleaved, all channels.
    #[serde(default)]
    pub multi_channel: bool,
}

impl DecodeOptions {
    pub fn multi_channel() -> Self {
        Self {
            multi_channel: true,
        }
    }

    pub fn downmix() -> Self {
        Self::default()
    }
}

/// A time range to decode.
///
/// A negative `duration_seconds` (canonically `-1.0`) means "to the end".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeRequest {
    pub start_seconds: f64,
    pub duration_seconds: f64,
    #[serde(default)]
    pub options: DecodeOptions,
}

impl DecodeRequest {
    /// Duration value meaning "decode to the end of the file".
    pub const TO_END: f64 = -1.0;

    pub fn new(start_seconds: f64, duration_seconds: f64, options: DecodeOptions) -> Self {
        Self {
            start_seconds,
            duration_seconds,
            options,
        }
    }

    /// Whole file with default options.
    pub fn full() -> Self {
        Self::new(0.0, Self::TO_END, DecodeOptions::default())
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.start_seconds.is_finite() {
            return Err(DecoderError::InvalidRequest(format!(
                "start must be a finite number of seconds, got {}",
                self.start_seconds
            )));
        }
        if self.duration_seconds.is_nan() {
            return Err(DecoderError::InvalidRequest(
                "duration must be a number of seconds".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_end(&self) -> bool {
        self.duration_seconds < 0.0
    }
}

impl Default for DecodeRequest {
    fn default() -> Self {
        Self::full()
    }
}

// ============================================================================
// Output
// ============================================================================

/// `f32` samples as little-endian bytes. JSON has no NaN or infinity.
mod le_samples {
    use bytes::{BufMut, Bytes, BytesMut};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(samples: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        let mut bytes = BytesMut::with_capacity(samples.len() * 4);
        for sample in samples {
            bytes.put_f32_le(*sample);
        }
        bytes.freeze().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        let bytes = Bytes::deserialize(deserializer)?;
        if bytes.len() % 4 != 0 {
            return Err(D::Error::custom(format!(
                "sample payload of {} bytes is not whole f32 values",
                bytes.len()
            )));
        }
        Ok(bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }
}

/// Decoded PCM for one range request.
///
/// Samples are `f32` in `[-1.0, 1.0]`. When `channels > 1` they are
/// interleaved as `samples[frame * channels + channel]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleBuffer {
    #[serde(with = "le_samples")]
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
    start_seconds: f64,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32, start_seconds: f64) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            sample_rate,
            start_seconds,
        }
    }

    pub fn empty(channels: u16, sample_rate: u32, start_seconds: f64) -> Self {
        Self::new(Vec::new(), channels, sample_rate, start_seconds)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Timestamp of the first frame in the buffer.
    pub fn start_seconds(&self) -> f64 {
        self.start_seconds
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

impl AsRef<[f32]> for SampleBuffer {
    fn as_ref(&self) -> &[f32] {
        &self.samples
    }
}

// ============================================================================
// Input
// ============================================================================

/// Where the encoded audio comes from.
///
/// Either way it is read into one owned buffer when the decoder is created.
#[derive(Debug, Clone)]
pub enum AudioInput {
    Bytes(Bytes),
    Path(PathBuf),
}

impl AudioInput {
    /// Lowercase file extension, used as a format hint.
    pub fn extension(&self) -> Option<String> {
        match self {
            AudioInput::Path(path) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_ascii_lowercase()),
            AudioInput::Bytes(_) => None,
        }
    }

    /// Resolve the input into an owned byte buffer.
    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            AudioInput::Bytes(data) => Ok(data),
            AudioInput::Path(path) => Ok(Bytes::from(std::fs::read(&path)?)),
        }
    }
}

impl From<Bytes> for AudioInput {
    fn from(data: Bytes) -> Self {
        AudioInput::Bytes(data)
    }
}

impl From<Vec<u8>> for AudioInput {
    fn from(data: Vec<u8>) -> Self {
        AudioInput::Bytes(Bytes::from(data))
    }
}

impl From<&[u8]> for AudioInput {
    fn from(data: &[u8]) -> Self {
        AudioInput::Bytes(Bytes::copy_from_slice(data))
    }
}

impl From<PathBuf> for AudioInput {
    fn from(path: PathBuf) -> Self {
        AudioInput::Path(path)
    }
}

impl From<&Path> for AudioInput {
    fn from(path: &Path) -> Self {
        AudioInput::Path(path.to_path_buf())
    }
}
