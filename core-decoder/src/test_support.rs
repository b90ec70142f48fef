//! In-memory WAV fixtures for unit tests.

/// RIFF/WAVE container around interleaved sample bytes.
fn wav_container(
    format_tag: u16,
    bits: u16,
    sample_rate: u32,
    channels: u16,
    data: Vec<u8>,
) -> Vec<u8> {
    let block_align = channels as u32 * (bits as u32 / 8);
    let data_len = data.len() as u32;

    let mut out = Vec::with_capacity(44 + data.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&format_tag.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * block_align).to_le_bytes());
    out.extend_from_slice(&(block_align as u16).to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend(data);
    out
}

/// Build a 16-bit PCM WAV file; `sample(frame, channel)` supplies each value.
pub(crate) fn wav_bytes(
    sample_rate: u32,
    channels: u16,
    frames: usize,
    sample: impl Fn(usize, u16) -> i16,
) -> Vec<u8> {
    let mut data = Vec::with_capacity(frames * channels as usize * 2);
    for frame in 0..frames {
        for channel in 0..channels {
            data.extend_from_slice(&sample(frame, channel).to_le_bytes());
        }
    }
    wav_container(1, 16, sample_rate, channels, data)
}

/// Build a 32-bit IEEE float WAV file. Values are stored unchecked, so NaN
/// and infinities pass through.
pub(crate) fn float_wav_bytes(
    sample_rate: u32,
    channels: u16,
    frames: usize,
    sample: impl Fn(usize, u16) -> f32,
) -> Vec<u8> {
    let mut data = Vec::with_capacity(frames * channels as usize * 4);
    for frame in 0..frames {
        for channel in 0..channels {
            data.extend_from_slice(&sample(frame, channel).to_le_bytes());
        }
    }
    wav_container(3, 32, sample_rate, channels, data)
}

/// WAV whose first channel encodes the frame index; other channels are negated.
pub(crate) fn ramp_wav(sample_rate: u32, channels: u16, frames: usize) -> Vec<u8> {
    wav_bytes(sample_rate, channels, frames, |frame, channel| {
        let value = (frame % 16384) as i16;
        if channel == 0 {
            value
        } else {
            -value
        }
    })
}

/// Recover the frame index from a first-channel ramp sample.
pub(crate) fn ramp_frame(sample: f32) -> usize {
    (sample * 32768.0).round() as usize
}
