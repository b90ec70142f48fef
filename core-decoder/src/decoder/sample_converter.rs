//! # Sample Format Converter
//!
//! Converts decoded audio buffers to `f32` and applies the channel policy.

use std::ops::Range;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// How decoded channels are laid out in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPolicy {
    /// One value per frame: the mean of all channels.
    Downmix,
    /// All channels, interleaved in channel order.
    Interleave,
}

impl ChannelPolicy {
    pub fn from_multi_channel(multi_channel: bool) -> Self {
        if multi_channel {
            ChannelPolicy::Interleave
        } else {
            ChannelPolicy::Downmix
        }
    }

    /// Output channel count for a stream with `channels` channels.
    pub fn output_channels(&self, channels: u16) -> u16 {
        match self {
            ChannelPolicy::Downmix => 1,
            ChannelPolicy::Interleave => channels,
        }
    }
}

/// Sample converter that normalizes audio to f32.
///
/// Symphonia outputs planar buffers in the codec's native sample format
/// (u8 through f64). Integer formats are scaled by their maximum magnitude
/// so output lies in `[-1.0, 1.0]`.
pub struct SampleConverter;

impl SampleConverter {
    /// Append frames `frames` of `buffer` to `out`.
    ///
    /// `channels` is the channel count the caller expects. Buffers with fewer
    /// channels are padded with silence and extra channels are dropped, so the
    /// appended length is always `frames.len() * policy.output_channels(channels)`.
    pub fn append_frames(
        buffer: &AudioBufferRef<'_>,
        frames: Range<usize>,
        channels: u16,
        policy: ChannelPolicy,
        out: &mut Vec<f32>,
    ) {
        match buffer {
            AudioBufferRef::U8(buf) => Self::append_converted(buf, frames, channels, policy, out),
            AudioBufferRef::U16(buf) => Self::append_converted(buf, frames, channels, policy, out),
            AudioBufferRef::U24(buf) => Self::append_converted(buf, frames, channels, policy, out),
            AudioBufferRef::U32(buf) => Self::append_converted(buf, frames, channels, policy, out),
            AudioBufferRef::S8(buf) => Self::append_converted(buf, frames, channels, policy, out),
            AudioBufferRef::S16(buf) => Self::append_converted(buf, frames, channels, policy, out),
            AudioBufferRef::S24(buf) => Self::append_converted(buf, frames, channels, policy, out),
            AudioBufferRef::S32(buf) => Self::append_converted(buf, frames, channels, policy, out),
            AudioBufferRef::F32(buf) => Self::append_converted(buf, frames, channels, policy, out),
            AudioBufferRef::F64(buf) => Self::append_converted(buf, frames, channels, policy, out),
        }
    }

    fn append_converted<T>(
        buf: &AudioBuffer<T>,
        frames: Range<usize>,
        channels: u16,
        policy: ChannelPolicy,
        out: &mut Vec<f32>,
    ) where
        T: Sample + IntoSample<f32>,
    {
        let channels = channels.max(1) as usize;
        let frames = frames.start.min(buf.frames())..frames.end.min(buf.frames());
        let available = buf.spec().channels.count().min(channels);
        let planes: Vec<&[T]> = (0..available).map(|chan| buf.chan(chan)).collect();

        match policy {
            ChannelPolicy::Interleave => {
                out.reserve(frames.len() * channels);
                for frame in frames {
                    for chan in 0..channels {
                        let sample: f32 = match planes.get(chan) {
                            Some(plane) => plane[frame].into_sample(),
                            None => 0.0,
                        };
                        out.push(sample);
                    }
                }
            }
            ChannelPolicy::Downmix => {
                out.reserve(frames.len());
                for frame in frames {
                    let sum: f32 = planes
                        .iter()
                        .map(|plane| -> f32 { plane[frame].into_sample() })
                        .sum();
                    out.push(sum / channels as f32);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::audio::{Channels, SignalSpec};

    fn stereo_i16(left: &[i16], right: &[i16]) -> AudioBuffer<i16> {
        let spec = SignalSpec::new(8000, Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        let mut buf = AudioBuffer::<i16>::new(left.len() as u64, spec);
        buf.render_reserved(Some(left.len()));
        buf.chan_mut(0).copy_from_slice(left);
        buf.chan_mut(1).copy_from_slice(right);
        buf
    }

    #[test]
    fn test_interleave_keeps_channel_order() {
        let buf = stereo_i16(&[16384, 0], &[-16384, 8192]);
        let mut out = Vec::new();

        SampleConverter::append_frames(
            &AudioBufferRef::S16(std::borrow::Cow::Borrowed(&buf)),
            0..2,
            2,
            ChannelPolicy::Interleave,
            &mut out,
        );

        assert_eq!(out, vec![0.5, -0.5, 0.0, 0.25]);
    }

    #[test]
    fn test_downmix_is_channel_mean() {
        let buf = stereo_i16(&[16384, 8192], &[0, 8192]);
        let mut out = Vec::new();

        SampleConverter::append_frames(
            &AudioBufferRef::S16(std::borrow::Cow::Borrowed(&buf)),
            0..2,
            2,
            ChannelPolicy::Downmix,
            &mut out,
        );

        assert_eq!(out, vec![0.25, 0.25]);
    }

    #[test]
    fn test_frame_window_is_respected() {
        let buf = stereo_i16(&[1, 2, 3, 4], &[1, 2, 3, 4]);
        let mut out = Vec::new();

        SampleConverter::append_frames(
            &AudioBufferRef::S16(std::borrow::Cow::Borrowed(&buf)),
            1..3,
            2,
            ChannelPolicy::Downmix,
            &mut out,
        );

        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_missing_channels_are_zero_filled() {
        let spec = SignalSpec::new(8000, Channels::FRONT_LEFT);
        let mut buf = AudioBuffer::<f32>::new(2, spec);
        buf.render_reserved(Some(2));
        buf.chan_mut(0).copy_from_slice(&[0.5, -0.5]);
        let mut out = Vec::new();

        SampleConverter::append_frames(
            &AudioBufferRef::F32(std::borrow::Cow::Borrowed(&buf)),
            0..2,
            2,
            ChannelPolicy::Interleave,
            &mut out,
        );

        assert_eq!(out, vec![0.5, 0.0, -0.5, 0.0]);
    }

    #[test]
    fn test_extra_channels_are_dropped() {
        let buf = stereo_i16(&[16384], &[16384]);
        let mut out = Vec::new();

        SampleConverter::append_frames(
            &AudioBufferRef::S16(std::borrow::Cow::Borrowed(&buf)),
            0..1,
            1,
            ChannelPolicy::Interleave,
            &mut out,
        );

        assert_eq!(out, vec![0.5]);
    }

    #[test]
    fn test_policy_output_channels() {
        assert_eq!(ChannelPolicy::from_multi_channel(false).output_channels(6), 1);
        assert_eq!(ChannelPolicy::from_multi_channel(true).output_channels(6), 6);
    }
}
