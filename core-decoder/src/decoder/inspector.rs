//! # Format Inspector
//!
//! Identifies the container and codec of an in-memory file and opens a
//! symphonia format reader over it.

use crate::error::{DecoderError, Result};
use crate::types::{AudioCodec, ContainerFormat, PcmFormat};
use bytes::Bytes;
use std::io::Cursor;
use symphonia::core::codecs::{CodecParameters, CodecType, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, error, warn};

/// Result of a successful inspection.
///
/// The reader is positioned at the first packet.
pub struct InspectedStream {
    pub reader: Box<dyn FormatReader>,
    pub track_id: u32,
    pub codec_params: CodecParameters,
    pub codec: AudioCodec,
    pub container: ContainerFormat,
    pub sample_rate: u32,
}

/// Format inspector for in-memory audio.
pub struct FormatInspector;

impl FormatInspector {
    /// Build a format hint from the sniffed container and an optional
    /// caller-supplied file extension. The extension wins when both exist.
    pub fn hint(container: ContainerFormat, extension: Option<&str>) -> Hint {
        let mut hint = Hint::new();

        match extension.or_else(|| container.extension()) {
            Some(ext) => {
                debug!("Setting format hint extension: {}", ext);
                hint.with_extension(ext);
            }
            None => debug!("No extension hint, auto-detecting format"),
        }

        hint
    }

    /// Inspect `data`, select the audio track and validate its codec.
    pub fn inspect(
        data: &Bytes,
        extension: Option<&str>,
        options: &FormatOptions,
    ) -> Result<InspectedStream> {
        let sniffed = ContainerFormat::sniff(data);
        debug!(container = ?sniffed, bytes = data.len(), "Sniffed container");

        let hint = Self::hint(sniffed, extension);
        let reader = Self::open_reader(data, &hint, options, sniffed)?;

        if reader.tracks().is_empty() {
            return Err(DecoderError::UnsupportedFormat(
                "file contains no streams".to_string(),
            ));
        }

        let track = reader
            .default_track()
            .filter(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            .or_else(|| {
                reader
                    .tracks()
                    .iter()
                    .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            })
            .ok_or_else(|| {
                error!("No audio track found");
                DecoderError::UnsupportedFormat("file contains no audio stream".to_string())
            })?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let codec = Self::detect_codec(codec_params.codec).ok_or_else(|| {
            DecoderError::UnsupportedFormat(format!(
                "unsupported codec {:?}",
                codec_params.codec
            ))
        })?;
        Self::validate_codec_support(codec)?;

        let sample_rate = codec_params
            .sample_rate
            .filter(|rate| *rate > 0)
            .ok_or_else(|| DecoderError::CorruptFile("missing sample rate".to_string()))?;

        let container = if sniffed.is_known() {
            sniffed
        } else {
            Self::container_for_codec(codec)
        };

        debug!(
            track_id,
            %codec,
            ?container,
            sample_rate,
            channels = ?codec_params.channels.map(|c| c.count()),
            n_frames = ?codec_params.n_frames,
            "Inspected audio track"
        );

        Ok(InspectedStream {
            reader,
            track_id,
            codec_params,
            codec,
            container,
            sample_rate,
        })
    }

    /// Open a format reader over `data`.
    ///
    /// Used both for the initial inspection and to reopen a reader that cannot
    /// seek backwards.
    pub fn open_reader(
        data: &Bytes,
        hint: &Hint,
        options: &FormatOptions,
        container: ContainerFormat,
    ) -> Result<Box<dyn FormatReader>> {
        let source = Box::new(Cursor::new(data.clone())) as Box<dyn MediaSource>;
        let stream = MediaSourceStream::new(source, Default::default());

        symphonia::default::get_probe()
            .format(hint, stream, options, &MetadataOptions::default())
            .map(|detected| detected.format)
            .map_err(|err| Self::classify_open_error(err, container))
    }

    /// Map a reader error to the open error taxonomy.
    ///
    /// Recognised magic turns read failures into `CorruptFile`; otherwise the
    /// bytes were never audio we understand.
    fn classify_open_error(err: SymphoniaError, container: ContainerFormat) -> DecoderError {
        match err {
            SymphoniaError::Unsupported(what) => {
                warn!(?container, "No reader accepted the stream: {}", what);
                if container.is_known() {
                    DecoderError::UnsupportedFormat(format!(
                        "{:?} container is not supported by this build ({})",
                        container, what
                    ))
                } else {
                    DecoderError::UnsupportedFormat(format!("unrecognised audio format ({})", what))
                }
            }
            other if container.is_known() => {
                error!(?container, "Container headers unreadable: {}", other);
                DecoderError::CorruptFile(format!(
                    "{:?} headers are malformed or truncated: {}",
                    container, other
                ))
            }
            other => {
                warn!("Format detection failed on unrecognised data: {}", other);
                DecoderError::UnsupportedFormat(format!("unrecognised audio format ({})", other))
            }
        }
    }

    /// Detect audio codec from Symphonia codec type.
    ///
    /// Returns `None` for codecs outside the closed [`AudioCodec`] set.
    pub fn detect_codec(codec_type: CodecType) -> Option<AudioCodec> {
        use symphonia::core::codecs::*;

        let known = [
            (CODEC_TYPE_MP3, AudioCodec::Mp3),
            (CODEC_TYPE_MP2, AudioCodec::Mp2),
            (CODEC_TYPE_MP1, AudioCodec::Mp1),
            (CODEC_TYPE_AAC, AudioCodec::Aac),
            (CODEC_TYPE_FLAC, AudioCodec::Flac),
            (CODEC_TYPE_VORBIS, AudioCodec::Vorbis),
            (CODEC_TYPE_OPUS, AudioCodec::Opus),
            (CODEC_TYPE_ALAC, AudioCodec::Alac),
            (CODEC_TYPE_PCM_S8, AudioCodec::Pcm(PcmFormat::S8)),
            (CODEC_TYPE_PCM_U8, AudioCodec::Pcm(PcmFormat::U8)),
            (CODEC_TYPE_PCM_S16LE, AudioCodec::Pcm(PcmFormat::S16Le)),
            (CODEC_TYPE_PCM_S16BE, AudioCodec::Pcm(PcmFormat::S16Be)),
            (CODEC_TYPE_PCM_U16LE, AudioCodec::Pcm(PcmFormat::U16Le)),
            (CODEC_TYPE_PCM_U16BE, AudioCodec::Pcm(PcmFormat::U16Be)),
            (CODEC_TYPE_PCM_S24LE, AudioCodec::Pcm(PcmFormat::S24Le)),
            (CODEC_TYPE_PCM_S24BE, AudioCodec::Pcm(PcmFormat::S24Be)),
            (CODEC_TYPE_PCM_U24LE, AudioCodec::Pcm(PcmFormat::U24Le)),
            (CODEC_TYPE_PCM_U24BE, AudioCodec::Pcm(PcmFormat::U24Be)),
            (CODEC_TYPE_PCM_S32LE, AudioCodec::Pcm(PcmFormat::S32Le)),
            (CODEC_TYPE_PCM_S32BE, AudioCodec::Pcm(PcmFormat::S32Be)),
            (CODEC_TYPE_PCM_U32LE, AudioCodec::Pcm(PcmFormat::U32Le)),
            (CODEC_TYPE_PCM_U32BE, AudioCodec::Pcm(PcmFormat::U32Be)),
            (CODEC_TYPE_PCM_F32LE, AudioCodec::Pcm(PcmFormat::F32Le)),
            (CODEC_TYPE_PCM_F32BE, AudioCodec::Pcm(PcmFormat::F32Be)),
            (CODEC_TYPE_PCM_F64LE, AudioCodec::Pcm(PcmFormat::F64Le)),
            (CODEC_TYPE_PCM_F64BE, AudioCodec::Pcm(PcmFormat::F64Be)),
            (CODEC_TYPE_PCM_ALAW, AudioCodec::Pcm(PcmFormat::Alaw)),
            (CODEC_TYPE_PCM_MULAW, AudioCodec::Pcm(PcmFormat::Mulaw)),
        ];

        let codec = known
            .iter()
            .find(|(known_type, _)| *known_type == codec_type)
            .map(|(_, codec)| *codec);

        if codec.is_none() {
            warn!("Unknown codec type: {:?}", codec_type);
        }
        codec
    }

    /// Validate if a codec is supported by current feature flags.
    pub fn validate_codec_support(codec: AudioCodec) -> Result<()> {
        let (enabled, feature) = match codec {
            AudioCodec::Mp3 => (cfg!(feature = "decoder-mp3"), "decoder-mp3"),
            AudioCodec::Aac => (cfg!(feature = "decoder-aac"), "decoder-aac"),
            AudioCodec::Flac => (cfg!(feature = "decoder-flac"), "decoder-flac"),
            AudioCodec::Vorbis => (cfg!(feature = "decoder-vorbis"), "decoder-vorbis"),
            AudioCodec::Alac => (cfg!(feature = "decoder-alac"), "decoder-alac"),
            AudioCodec::Pcm(_) => (cfg!(feature = "decoder-wav"), "decoder-wav"),
            AudioCodec::Mp1 | AudioCodec::Mp2 | AudioCodec::Opus => {
                return Err(DecoderError::UnsupportedFormat(format!(
                    "no {} decoder is available",
                    codec
                )));
            }
        };

        if enabled {
            Ok(())
        } else {
            Err(DecoderError::UnsupportedFormat(format!(
                "{} decoder not enabled. Enable '{}' feature",
                codec, feature
            )))
        }
    }

    /// Codecs this build can decode.
    pub fn supported_codecs() -> Vec<AudioCodec> {
        [
            AudioCodec::Mp3,
            AudioCodec::Aac,
            AudioCodec::Flac,
            AudioCodec::Vorbis,
            AudioCodec::Alac,
            AudioCodec::Pcm(PcmFormat::S16Le),
        ]
        .into_iter()
        .filter(|codec| Self::validate_codec_support(*codec).is_ok())
        .collect()
    }

    fn container_for_codec(codec: AudioCodec) -> ContainerFormat {
        match codec {
            AudioCodec::Mp3 | AudioCodec::Mp2 | AudioCodec::Mp1 => ContainerFormat::Mp3,
            AudioCodec::Aac => ContainerFormat::Adts,
            _ => ContainerFormat::Unknown,
        }
    }
}
