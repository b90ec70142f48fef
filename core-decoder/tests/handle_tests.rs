//! Decoder handle behaviour against generated WAV files.

mod common;

use core_decoder::{
    create_decoder, DecodeOptions, DecoderConfig, DecoderError, DecoderHandle, HandleStatus,
    SeekPrecision,
};

fn open(bytes: Vec<u8>) -> DecoderHandle {
    create_decoder(DecoderConfig::default(), bytes).expect("fixture should open")
}

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn test_metadata_matches_fixture() {
    let decoder = open(common::tone(44_100, 2, 1.5, 440.0));

    assert_eq!(decoder.sample_rate(), 44_100);
    assert_eq!(decoder.channel_count(), 2);
    assert_eq!(decoder.encoding(), "pcm_s16le");
    assert!((decoder.duration() - 1.5).abs() < 1e-6);
    assert_eq!(decoder.status(), HandleStatus::Ready);
}

// ============================================================================
// Range lengths
// ============================================================================

#[test]
fn test_full_range_covers_whole_file() {
    let mut decoder = open(common::tone(44_100, 2, 1.5, 440.0));
    let expected = (decoder.duration() * decoder.sample_rate() as f64).round() as i64;

    let mono = decoder.decode_all().unwrap();
    assert_eq!(mono.channels(), 1);
    assert!((mono.len() as i64 - expected).abs() <= 1);
}

#[test]
fn test_multi_channel_is_downmix_times_channels() {
    let mut decoder = open(common::tone(22_050, 3, 0.5, 220.0));

    let mono = decoder
        .decode_audio_data(0.1, 0.2, DecodeOptions::downmix())
        .unwrap();
    let multi = decoder
        .decode_audio_data(0.1, 0.2, DecodeOptions::multi_channel())
        .unwrap();

    assert_eq!(multi.channels(), 3);
    assert_eq!(multi.len(), mono.len() * 3);
    assert_eq!(multi.frames(), mono.frames());
}

#[test]
fn test_downmix_is_mean_of_channels() {
    let mut decoder = open(common::tone(16_000, 2, 0.25, 1000.0));

    let mono = decoder.decode_all().unwrap();
    let stereo = decoder
        .decode_audio_data(0.0, -1.0, DecodeOptions::multi_channel())
        .unwrap();

    for (i, value) in mono.samples().iter().enumerate() {
        let mean = (stereo.samples()[2 * i] + stereo.samples()[2 * i + 1]) / 2.0;
        assert!((value - mean).abs() < 1e-6, "frame {}: {} vs {}", i, value, mean);
    }
}

#[test]
fn test_range_past_end_is_empty() {
    let mut decoder = open(common::tone(8000, 1, 1.0, 440.0));

    let buffer = decoder
        .decode_audio_data(5.0, 1.0, DecodeOptions::default())
        .unwrap();
    assert!(buffer.is_empty());
    assert_eq!(buffer.sample_rate(), 8000);
}

#[test]
fn test_range_is_clamped_to_end() {
    let mut decoder = open(common::ramp(8000, 1, 8000));

    let buffer = decoder
        .decode_audio_data(0.75, 10.0, DecodeOptions::default())
        .unwrap();
    assert_eq!(buffer.len(), 2000);
}

#[test]
fn test_zero_duration_is_empty() {
    let mut decoder = open(common::ramp(8000, 1, 8000));

    let buffer = decoder
        .decode_audio_data(0.5, 0.0, DecodeOptions::default())
        .unwrap();
    assert!(buffer.is_empty());
}

// ============================================================================
// Positioning
// ============================================================================

#[test]
fn test_mid_range_covers_requested_window() {
    let mut decoder = open(common::ramp(8000, 2, 8000));

    let buffer = decoder
        .decode_audio_data(0.25, 0.1, DecodeOptions::multi_channel())
        .unwrap();

    assert_eq!(buffer.frames(), 800);
    assert!((buffer.start_seconds() - 0.25).abs() < 1e-9);

    let first = common::ramp_frame(buffer.samples()[0]);
    let last = common::ramp_frame(buffer.samples()[buffer.len() - 2]);
    assert_eq!(first, 2000);
    assert_eq!(last, 2799);
}

#[test]
fn test_backward_range_after_forward_range() {
    let mut decoder = open(common::ramp(8000, 1, 8000));

    let late = decoder
        .decode_audio_data(0.9, 0.05, DecodeOptions::default())
        .unwrap();
    let early = decoder
        .decode_audio_data(0.1, 0.05, DecodeOptions::default())
        .unwrap();

    assert_eq!(common::ramp_frame(late.samples()[0]), 7200);
    assert_eq!(common::ramp_frame(early.samples()[0]), 800);
}

#[test]
fn test_repeated_decodes_are_identical() {
    let mut decoder = open(common::tone(44_100, 2, 1.0, 440.0));

    let first = decoder
        .decode_audio_data(0.3, 0.4, DecodeOptions::multi_channel())
        .unwrap();
    let second = decoder
        .decode_audio_data(0.3, 0.4, DecodeOptions::multi_channel())
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_coarse_seek_still_trims_to_window() {
    let config = DecoderConfig::default().with_seek_mode(SeekPrecision::Coarse);
    let mut decoder = create_decoder(config, common::ramp(8000, 1, 8000)).unwrap();

    let buffer = decoder
        .decode_audio_data(0.5, 0.1, DecodeOptions::default())
        .unwrap();
    assert_eq!(buffer.len(), 800);
    assert_eq!(common::ramp_frame(buffer.samples()[0]), 4000);
}

// ============================================================================
// Errors and lifecycle
// ============================================================================

#[test]
fn test_unrecognised_bytes_are_unsupported() {
    let result = create_decoder(DecoderConfig::default(), b"ID4 definitely not audio".to_vec());

    let err = result.unwrap_err();
    assert!(matches!(err, DecoderError::UnsupportedFormat(_)));
    assert!(err.is_format_error());
}

#[test]
fn test_truncated_wav_is_corrupt() {
    let mut bytes = common::ramp(8000, 1, 100);
    bytes.truncate(20);

    let result = create_decoder(DecoderConfig::default(), bytes);
    assert!(matches!(result, Err(DecoderError::CorruptFile(_))));
}

#[test]
fn test_dispose_twice_then_decode_fails() {
    let mut decoder = open(common::tone(8000, 1, 0.5, 440.0));

    decoder.dispose();
    decoder.dispose();

    assert_eq!(decoder.status(), HandleStatus::Disposed);
    assert!(matches!(decoder.decode_all(), Err(DecoderError::Disposed)));
    assert_eq!(decoder.channel_count(), 1);
}

#[test]
fn test_invalid_request_leaves_handle_ready() {
    let mut decoder = open(common::tone(8000, 1, 0.5, 440.0));

    let err = decoder
        .decode_audio_data(f64::INFINITY, 1.0, DecodeOptions::default())
        .unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(decoder.status(), HandleStatus::Ready);
}
