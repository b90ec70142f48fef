//! # Decode Engine
//!
//! Owns an open format reader and codec decoder over one in-memory file and
//! decodes arbitrary time ranges from it.
//!
//! ```text
//! Bytes → MediaSourceStream → FormatReader → Decoder → SampleConverter → SampleBuffer
//! ```

use crate::config::{DecoderConfig, SeekPrecision};
use crate::decoder::inspector::{FormatInspector, InspectedStream};
use crate::decoder::sample_converter::{ChannelPolicy, SampleConverter};
use crate::error::{DecoderError, Result};
use crate::types::{AudioMetadata, ContainerFormat, DecodeRequest, SampleBuffer};
use bytes::Bytes;
use std::ops::Range;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::{Error as SymphoniaError, SeekErrorKind};
use symphonia::core::formats::{FormatOptions, FormatReader, Packet, SeekMode, SeekTo, SeekedTo};
use symphonia::core::units::{Time, TimeBase};
use tracing::{debug, error, info, instrument, warn};

/// Upper bound on frames reserved up front for one range.
const MAX_PREALLOCATED_FRAMES: u64 = 1 << 22;

/// A half-open range of frames, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameRange {
    pub start: u64,
    pub end: u64,
}

impl FrameRange {
    /// Convert a request into frame bounds clamped to the stream length.
    ///
    /// With an unknown length only the lower bound is clamped.
    pub fn resolve(request: &DecodeRequest, sample_rate: u32, total_frames: Option<u64>) -> Self {
        let rate = sample_rate as f64;
        let start_seconds = request.start_seconds.max(0.0);
        let to_frames = |seconds: f64| (seconds * rate).round() as u64;

        let start = to_frames(start_seconds);
        let end = if request.to_end() {
            u64::MAX
        } else {
            to_frames(start_seconds + request.duration_seconds)
        };

        match total_frames {
            Some(total) => Self {
                start: start.min(total),
                end: end.min(total),
            },
            None => Self { start, end },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// The frames of a decoded packet that fall inside the range, relative
    /// to the packet's first frame.
    pub fn window(&self, packet_start: u64, frames: usize) -> Option<Range<usize>> {
        let packet_end = packet_start + frames as u64;
        if packet_end <= self.start || packet_start >= self.end {
            return None;
        }
        let from = self.start.saturating_sub(packet_start) as usize;
        let to = (self.end.min(packet_end) - packet_start) as usize;
        Some(from..to)
    }
}

/// Where the reader ended up before decoding a range.
enum Position {
    Start,
    Seeked,
    PastEnd,
}

/// The format reader plus what is needed to recreate it.
struct Demuxer {
    data: Bytes,
    container: ContainerFormat,
    extension: Option<String>,
    options: FormatOptions,
    reader: Box<dyn FormatReader>,
    track_id: u32,
    at_start: bool,
}

impl Demuxer {
    /// Next packet of the selected track, `None` at end of stream.
    fn next_packet(&mut self) -> std::result::Result<Option<Packet>, SymphoniaError> {
        loop {
            self.at_start = false;
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(err))
                    if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!("Track list changed mid-stream, treating as end of stream");
                    return Ok(None);
                }
                Err(err) => return Err(err),
            };

            // Drop metadata revisions read alongside the packet
            while !self.reader.metadata().is_latest() {
                self.reader.metadata().pop();
            }

            if packet.track_id() == self.track_id {
                return Ok(Some(packet));
            }
        }
    }

    fn seek(&mut self, mode: SeekMode, seconds: f64) -> std::result::Result<SeekedTo, SymphoniaError> {
        self.at_start = false;
        self.reader.seek(
            mode,
            SeekTo::Time {
                time: Time::from(seconds),
                track_id: Some(self.track_id),
            },
        )
    }

    /// Return to the first packet, reopening the reader if it cannot seek.
    fn rewind(&mut self) -> Result<()> {
        if self.at_start {
            return Ok(());
        }

        let seeked = self.reader.seek(
            SeekMode::Accurate,
            SeekTo::TimeStamp {
                ts: 0,
                track_id: self.track_id,
            },
        );

        match seeked {
            Ok(_) => {
                self.at_start = true;
                debug!("Rewound reader to the first packet");
                Ok(())
            }
            Err(err) => {
                debug!("Rewind by seek failed ({}), reopening reader", err);
                self.reopen()
            }
        }
    }

    fn reopen(&mut self) -> Result<()> {
        let hint = FormatInspector::hint(self.container, self.extension.as_deref());
        self.reader =
            FormatInspector::open_reader(&self.data, &hint, &self.options, self.container)?;
        self.at_start = true;
        Ok(())
    }
}

/// Range decoder over one opened file.
///
/// The engine exclusively owns the input buffer, the format reader and the
/// codec decoder. Dropping it releases all three.
pub struct DecodeEngine {
    demuxer: Demuxer,
    decoder: Box<dyn Decoder>,
    time_base: Option<TimeBase>,
    total_frames: Option<u64>,
    metadata: AudioMetadata,
    seek_precision: SeekPrecision,
    max_consecutive_errors: usize,
}

impl DecodeEngine {
    /// Inspect `data` and prepare it for range decoding.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` if no reader or decoder accepts the data
    /// - `CorruptFile` if the headers are malformed or no audio can be decoded
    #[instrument(skip(data, config), fields(bytes = data.len()))]
    pub fn open(data: Bytes, extension: Option<&str>, config: &DecoderConfig) -> Result<Self> {
        let options = config.format_options();
        let InspectedStream {
            reader,
            track_id,
            codec_params,
            codec,
            container,
            sample_rate,
        } = FormatInspector::inspect(&data, extension, &options)?;

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|err| match err {
                SymphoniaError::Unsupported(what) => DecoderError::UnsupportedFormat(format!(
                    "no {} decoder available: {}",
                    codec, what
                )),
                other => {
                    error!("Failed to create decoder: {}", other);
                    DecoderError::CorruptFile(format!(
                        "cannot initialise {} decoder: {}",
                        codec, other
                    ))
                }
            })?;

        let mut engine = Self {
            demuxer: Demuxer {
                data,
                container,
                extension: extension.map(str::to_string),
                options,
                reader,
                track_id,
                at_start: true,
            },
            decoder,
            time_base: codec_params.time_base,
            total_frames: codec_params.n_frames,
            metadata: AudioMetadata {
                sample_rate,
                channel_count: codec_params
                    .channels
                    .map(|channels| channels.count() as u16)
                    .unwrap_or(0),
                codec,
                container,
                duration: 0.0,
                bits_per_sample: codec_params.bits_per_sample,
            },
            seek_precision: config.seek_mode,
            max_consecutive_errors: config.max_consecutive_errors,
        };

        // Channels might not be available until first decode (AAC/M4A)
        if engine.metadata.channel_count == 0 {
            engine.metadata.channel_count = engine.detect_channels()?;
        }

        if engine.total_frames.is_none() {
            if config.scan_duration {
                engine.total_frames = Some(engine.scan_frames()?);
            } else {
                warn!("Stream length unknown and duration scanning is disabled");
            }
        }

        engine.metadata.duration = engine
            .total_frames
            .map(|frames| frames as f64 / sample_rate as f64)
            .unwrap_or(0.0);

        info!(
            encoding = engine.metadata.encoding(),
            sample_rate,
            channels = engine.metadata.channel_count,
            duration = engine.metadata.duration,
            "Decoder opened"
        );

        Ok(engine)
    }

    pub fn metadata(&self) -> &AudioMetadata {
        &self.metadata
    }

    /// Stream length in frames, if known.
    pub fn total_frames(&self) -> Option<u64> {
        self.total_frames
    }

    /// Decode `request` into a sample buffer.
    ///
    /// Out-of-range requests yield an empty buffer. The first frame may come
    /// before the requested start by up to one codec frame when the container
    /// cannot place packets exactly.
    #[instrument(
        skip(self, request),
        fields(start = request.start_seconds, duration = request.duration_seconds)
    )]
    pub fn decode_range(&mut self, request: &DecodeRequest) -> Result<SampleBuffer> {
        request.validate()?;

        let sample_rate = self.metadata.sample_rate;
        let channels = self.metadata.channel_count;
        let policy = ChannelPolicy::from_multi_channel(request.options.multi_channel);
        let out_channels = policy.output_channels(channels);

        let range = FrameRange::resolve(request, sample_rate, self.total_frames);
        let range_start_seconds = range.start as f64 / sample_rate as f64;
        debug!(start_frame = range.start, end_frame = range.end, "Resolved range");

        if range.is_empty() {
            return Ok(SampleBuffer::empty(out_channels, sample_rate, range_start_seconds));
        }

        let seeked = match self.position_at(range.start)? {
            Position::Start => false,
            Position::Seeked => true,
            Position::PastEnd => {
                return Ok(SampleBuffer::empty(out_channels, sample_rate, range_start_seconds));
            }
        };

        let reserved = range.len().min(MAX_PREALLOCATED_FRAMES) as usize;
        let mut samples = Vec::with_capacity(reserved * out_channels as usize);
        let mut first_frame: Option<u64> = None;
        let mut attempted = 0usize;
        let mut usable = 0usize;
        let mut consecutive_errors = 0usize;

        loop {
            let packet = match self.demuxer.next_packet() {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(err) => {
                    consecutive_errors += 1;
                    check_error_budget(self.max_consecutive_errors, consecutive_errors, &err)?;
                    continue;
                }
            };

            let packet_start = self.ts_to_frame(packet.ts());
            if packet_start >= range.end {
                break;
            }

            attempted += 1;

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    consecutive_errors = 0;
                    usable += 1;

                    // Gapless trimming already happened inside the codec.
                    let packet_end = packet_start + decoded.frames() as u64;
                    let Some(window) = range.window(packet_start, decoded.frames()) else {
                        continue;
                    };
                    first_frame.get_or_insert(packet_start + window.start as u64);

                    SampleConverter::append_frames(
                        &decoded,
                        window,
                        channels,
                        policy,
                        &mut samples,
                    );

                    if packet_end >= range.end {
                        break;
                    }
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!("Decoder reset required, ending range early");
                    break;
                }
                Err(err @ SymphoniaError::DecodeError(_)) | Err(err @ SymphoniaError::IoError(_)) => {
                    consecutive_errors += 1;
                    warn!(
                        packet_ts = packet.ts(),
                        "Skipping corrupted packet (attempt {}/{}): {}",
                        consecutive_errors,
                        self.max_consecutive_errors,
                        err
                    );
                    check_error_budget(self.max_consecutive_errors, consecutive_errors, &err)?;
                }
                Err(err) => {
                    error!("Fatal decode error: {}", err);
                    return Err(DecoderError::Decode(format!("failed to decode packet: {}", err)));
                }
            }
        }

        if usable == 0 && (attempted > 0 || !seeked) {
            error!(attempted, "No decodable packets in requested range");
            return Err(DecoderError::Decode(format!(
                "no decodable audio from {:.3}s",
                range_start_seconds
            )));
        }

        let start_frame = first_frame.unwrap_or(range.start);
        debug!(
            frames = samples.len() / out_channels as usize,
            first_frame = start_frame,
            packets = usable,
            "Decoded range"
        );

        Ok(SampleBuffer::new(
            samples,
            out_channels,
            sample_rate,
            start_frame as f64 / sample_rate as f64,
        ))
    }

    /// Move the reader so the next packet covers `start_frame`.
    fn position_at(&mut self, start_frame: u64) -> Result<Position> {
        if start_frame == 0 {
            self.demuxer.rewind()?;
            self.decoder.reset();
            return Ok(Position::Start);
        }

        let seconds = start_frame as f64 / self.metadata.sample_rate as f64;
        match self.demuxer.seek(self.seek_precision.mode(), seconds) {
            Ok(seeked) => {
                debug!(
                    required_ts = seeked.required_ts,
                    actual_ts = seeked.actual_ts,
                    "Seeked"
                );
                self.decoder.reset();
                Ok(Position::Seeked)
            }
            Err(SymphoniaError::SeekError(SeekErrorKind::OutOfRange)) => {
                debug!("Seek target lies beyond the end of the stream");
                Ok(Position::PastEnd)
            }
            Err(err) => {
                warn!("Seek failed ({}), decoding forward from the beginning", err);
                self.demuxer.reopen()?;
                self.decoder.reset();
                Ok(Position::Start)
            }
        }
    }

    /// Decode packets until one yields a channel count, then rewind.
    fn detect_channels(&mut self) -> Result<u16> {
        let mut failures = 0usize;

        let channels = loop {
            let packet = match self.demuxer.next_packet() {
                Ok(Some(packet)) => packet,
                Ok(None) => {
                    return Err(DecoderError::CorruptFile(
                        "stream ended before any audio could be decoded".to_string(),
                    ))
                }
                Err(err) => {
                    failures += 1;
                    if failures > self.max_consecutive_errors {
                        return Err(DecoderError::CorruptFile(format!(
                            "unreadable packets while reading the channel layout: {}",
                            err
                        )));
                    }
                    continue;
                }
            };

            match self.decoder.decode(&packet) {
                Ok(decoded) => break decoded.spec().channels.count() as u16,
                Err(SymphoniaError::DecodeError(err)) => {
                    failures += 1;
                    if failures > self.max_consecutive_errors {
                        return Err(DecoderError::CorruptFile(format!(
                            "cannot decode any packet to read the channel layout: {}",
                            err
                        )));
                    }
                }
                Err(err) => {
                    return Err(DecoderError::CorruptFile(format!(
                        "failed to decode first packet: {}",
                        err
                    )))
                }
            }
        };

        self.demuxer.rewind()?;
        self.decoder.reset();

        if channels == 0 {
            return Err(DecoderError::CorruptFile("stream reports zero channels".to_string()));
        }

        debug!(channels, "Channel count detected from decoded audio");
        Ok(channels)
    }

    /// Sum packet spans without decoding to find the stream length, then rewind.
    fn scan_frames(&mut self) -> Result<u64> {
        let mut end_ts = 0u64;
        let mut packets = 0u64;

        loop {
            match self.demuxer.next_packet() {
                Ok(Some(packet)) => {
                    end_ts = end_ts.max(packet.ts().saturating_add(packet.dur()));
                    packets += 1;
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("Duration scan stopped early: {}", err);
                    break;
                }
            }
        }

        self.demuxer.rewind()?;

        let frames = self.ts_to_frame(end_ts);
        debug!(packets, frames, "Estimated stream length by scanning packets");
        Ok(frames)
    }

    fn ts_to_frame(&self, ts: u64) -> u64 {
        frames_for_timestamp(self.time_base, self.metadata.sample_rate, ts)
    }
}

fn check_error_budget(max: usize, consecutive_errors: usize, err: &SymphoniaError) -> Result<()> {
    if consecutive_errors > max {
        error!("Too many consecutive packet failures, stream may be corrupted");
        return Err(DecoderError::Decode(format!(
            "stream corruption after {} failed packets: {}",
            consecutive_errors, err
        )));
    }
    Ok(())
}

/// Convert a timestamp in `time_base` units to a frame index.
fn frames_for_timestamp(time_base: Option<TimeBase>, sample_rate: u32, ts: u64) -> u64 {
    match time_base {
        Some(tb) if tb.denom > 0 => {
            let frames = ts as u128 * tb.numer as u128 * sample_rate as u128 / tb.denom as u128;
            frames.min(u64::MAX as u128) as u64
        }
        _ => ts,
    }
}
