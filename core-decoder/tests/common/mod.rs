//! Shared fixtures: PCM WAV files generated in memory.

#![allow(dead_code)]

use std::f64::consts::PI;

/// 16-bit PCM WAV; `sample(frame, channel)` supplies each value.
pub fn wav(
    sample_rate: u32,
    channels: u16,
    frames: usize,
    sample: impl Fn(usize, u16) -> i16,
) -> Vec<u8> {
    let block_align = channels as u32 * 2;
    let data_len = frames as u32 * block_align;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * block_align).to_le_bytes());
    out.extend_from_slice(&(block_align as u16).to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    for frame in 0..frames {
        for channel in 0..channels {
            out.extend_from_slice(&sample(frame, channel).to_le_bytes());
        }
    }
    out
}

/// Sine tone, each channel at a different amplitude.
pub fn tone(sample_rate: u32, channels: u16, seconds: f64, frequency: f64) -> Vec<u8> {
    let frames = (sample_rate as f64 * seconds).round() as usize;
    wav(sample_rate, channels, frames, |frame, channel| {
        let t = frame as f64 / sample_rate as f64;
        let gain = 0.8 / (channel as f64 + 1.0);
        ((2.0 * PI * frequency * t).sin() * gain * i16::MAX as f64) as i16
    })
}

/// Channel 0 carries the frame index (mod 16384) so positions can be read
/// back from decoded samples.
pub fn ramp(sample_rate: u32, channels: u16, frames: usize) -> Vec<u8> {
    wav(sample_rate, channels, frames, |frame, channel| {
        let value = (frame % 16384) as i16;
        if channel == 0 {
            value
        } else {
            value / 2
        }
    })
}

/// Frame index encoded by a channel-0 ramp sample.
pub fn ramp_frame(sample: f32) -> usize {
    (sample * 32768.0).round() as usize
}

// ============================================================================
// Compressed fixtures
// ============================================================================

/// CRC-8 with polynomial 0x07, as used by FLAC frame headers.
fn crc8(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |mut crc, &byte| {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
        }
        crc
    })
}

/// CRC-16 with polynomial 0x8005, as used by FLAC frame footers.
fn crc16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u16, |mut crc, &byte| {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x8005 } else { crc << 1 };
        }
        crc
    })
}

/// FLAC's UTF-8 style frame number coding.
fn flac_frame_number(number: u32) -> Vec<u8> {
    if number < 0x80 {
        return vec![number as u8];
    }

    let mut tail = Vec::new();
    let mut rest = number;
    let mut lead_bits = 6;
    while rest >= 1 << lead_bits {
        tail.push(0x80 | (rest & 0x3f) as u8);
        rest >>= 6;
        lead_bits -= 1;
    }

    let marker = !(0xffu8 >> (tail.len() + 1));
    let mut out = vec![marker | rest as u8];
    out.extend(tail.iter().rev());
    out
}

/// Mono 16-bit FLAC holding a channel-0 ramp, stored as verbatim subframes.
///
/// Frames listed in `corrupt` keep valid checksums but carry a reserved
/// subframe type, so the demuxer delivers them and the codec rejects them.
pub fn flac(sample_rate: u32, frames: usize, block: u16, corrupt: &[usize]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"fLaC");

    // STREAMINFO, flagged as the last metadata block
    out.push(0x80);
    out.extend_from_slice(&34u32.to_be_bytes()[1..]);
    out.extend_from_slice(&block.to_be_bytes());
    out.extend_from_slice(&block.to_be_bytes());
    out.extend_from_slice(&[0; 6]);
    let packed: u64 = (sample_rate as u64) << 44 | 15u64 << 36 | frames as u64;
    out.extend_from_slice(&packed.to_be_bytes());
    out.extend_from_slice(&[0; 16]);

    for (index, first) in (0..frames).step_by(block as usize).enumerate() {
        let len = (frames - first).min(block as usize);

        let mut frame = vec![0xff, 0xf8, 0x70, 0x08];
        frame.extend(flac_frame_number(index as u32));
        frame.extend_from_slice(&(len as u16 - 1).to_be_bytes());
        frame.push(crc8(&frame));

        frame.push(if corrupt.contains(&index) { 0x04 } else { 0x02 });
        for position in first..first + len {
            frame.extend_from_slice(&((position % 16384) as i16).to_be_bytes());
        }

        let footer = crc16(&frame);
        frame.extend_from_slice(&footer.to_be_bytes());
        out.extend(frame);
    }
    out
}

/// Bytes in one 128 kbps, 44.1 kHz MPEG-1 Layer III frame.
const MP3_FRAME_LEN: usize = 417;

/// Samples produced by one MPEG-1 Layer III frame.
pub const MP3_FRAME_SAMPLES: u64 = 1152;

/// Silent mono MP3 led by an Info frame whose encoder tag reports `delay`
/// and `padding` samples. `delay` must be at least 529.
pub fn gapless_mp3(audio_frames: u32, delay: u32, padding: u32) -> Vec<u8> {
    const HEADER: [u8; 4] = [0xff, 0xfb, 0x90, 0xc4];
    const SIDE_INFO_LEN: usize = 17;

    let mut info = vec![0u8; MP3_FRAME_LEN];
    info[..4].copy_from_slice(&HEADER);
    let mut at = 4 + SIDE_INFO_LEN;
    let mut put = |bytes: &[u8]| {
        info[at..at + bytes.len()].copy_from_slice(bytes);
        at += bytes.len();
    };
    put(b"Info");
    put(&1u32.to_be_bytes());
    put(&audio_frames.to_be_bytes());
    put(b"Lavf58.76");
    // Revision, lowpass, peak, radio and audiophile gain, flags, bitrate
    put(&[0; 1 + 1 + 4 + 2 + 2 + 1 + 1]);
    let trim = (delay - 529) << 12 | (padding + 529);
    put(&trim.to_be_bytes()[1..]);

    let mut out = info;
    for _ in 0..audio_frames {
        out.extend_from_slice(&HEADER);
        out.extend_from_slice(&[0; MP3_FRAME_LEN - 4]);
    }
    out
}
