//! Browser-side tests for the wasm bindings.

#![cfg(target_arch = "wasm32")]

mod common;

use core_decoder::wasm::{create_decoder, is_format_supported, JsWorkerHost};
use core_decoder::worker::{ResponseEnvelope, WorkerReply};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_decode_audio_data_returns_float32_array() {
    let mut decoder = create_decoder(common::ramp(8000, 2, 800), Some("clip.wav".to_string()))
        .unwrap_or_else(|_| panic!("fixture should open"));

    assert_eq!(decoder.sample_rate(), 8000);
    assert_eq!(decoder.channel_count(), 2);

    let mono = decoder
        .decode_audio_data(Some(0.0), Some(0.05), None)
        .unwrap_or_else(|_| panic!("decode should succeed"));
    assert_eq!(mono.length(), 400);

    let stereo = decoder
        .decode_audio_data(None, None, Some(true))
        .unwrap_or_else(|_| panic!("decode should succeed"));
    assert_eq!(stereo.length(), 1600);

    decoder.dispose();
    assert!(decoder.is_disposed());
    assert!(decoder.decode_audio_data(None, None, None).is_err());
}

#[wasm_bindgen_test]
fn test_worker_host_answers_json() {
    let mut host = JsWorkerHost::new();
    let reply = host.handle_message(r#"{"id":9,"request":{"operation":"dispose"}}"#);

    let parsed: ResponseEnvelope = serde_json::from_str(&reply).unwrap();
    assert_eq!(parsed.id, 9);
    assert_eq!(parsed.into_result().unwrap(), WorkerReply::Disposed);
    assert!(host.is_closed());
}

#[wasm_bindgen_test]
fn test_pcm_is_supported() {
    assert!(is_format_supported("pcm_s16le"));
    assert!(!is_format_supported("opus"));
}
