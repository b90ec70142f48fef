//! # Range Decoding Example
//!
//! Decodes a few windows of an audio file, first on the calling thread and
//! then through the worker proxy.
//!
//! Run with:
//! ```bash
//! # Synthetic two-second stereo tone
//! cargo run --example decode_range --package core-decoder
//!
//! # A real file, starting 30 seconds in
//! cargo run --example decode_range --package core-decoder -- song.mp3 30
//! ```

use core_decoder::{
    create_decoder, create_decoder_worker, AudioInput, DecodeOptions, DecoderConfig, Result,
};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::sink::LogLevel;
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Build a 16-bit stereo WAV holding a 440 Hz tone.
fn tone_wav(sample_rate: u32, seconds: f64) -> Vec<u8> {
    let frames = (sample_rate as f64 * seconds) as u32;
    let data_len = frames * 4;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 4).to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    for frame in 0..frames {
        let t = frame as f64 / sample_rate as f64;
        let value = ((2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.3 * i16::MAX as f64) as i16;
        // Right channel at half volume
        out.extend_from_slice(&value.to_le_bytes());
        out.extend_from_slice(&(value / 2).to_le_bytes());
    }
    out
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )
    .ok();

    let args: Vec<String> = env::args().collect();
    let input: AudioInput = match args.get(1) {
        Some(path) => PathBuf::from(path).into(),
        None => tone_wav(44_100, 2.0).into(),
    };
    let start = args
        .get(2)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.5);

    // Synchronous handle
    let mut decoder = create_decoder(DecoderConfig::default(), input.clone())?;
    info!(
        encoding = decoder.encoding(),
        sample_rate = decoder.sample_rate(),
        channels = decoder.channel_count(),
        duration = decoder.duration(),
        "Opened"
    );

    let mono = decoder.decode_audio_data(start, 1.0, DecodeOptions::downmix())?;
    let stereo = decoder.decode_audio_data(start, 1.0, DecodeOptions::multi_channel())?;
    info!(
        frames = mono.frames(),
        peak = peak(mono.samples()),
        "Downmixed window"
    );
    info!(
        frames = stereo.frames(),
        samples = stereo.len(),
        "Interleaved window"
    );
    decoder.dispose();

    // Worker proxy: both requests are in flight at once
    let worker = create_decoder_worker(DecoderConfig::default(), input).await?;
    let head = worker.get_audio_data(0.0, 0.25, DecodeOptions::downmix());
    let tail = worker.get_audio_data(start, -1.0, DecodeOptions::downmix());

    let (head, tail) = (head.await?, tail.await?);
    info!(
        head_frames = head.frames(),
        tail_frames = tail.frames(),
        "Worker windows decoded"
    );
    worker.dispose();

    Ok(())
}
