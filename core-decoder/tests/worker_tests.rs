//! Worker proxy behaviour over a real worker thread.

mod common;

use core_decoder::worker::{ResponseEnvelope, WorkerReply};
use core_decoder::{
    create_decoder, create_decoder_worker, DecodeOptions, DecoderConfig, DecoderError,
    DecoderWorker, WorkerHost,
};

async fn ramp_worker(channels: u16, frames: usize) -> DecoderWorker {
    create_decoder_worker(DecoderConfig::default(), common::ramp(8000, channels, frames))
        .await
        .expect("fixture should open")
}

#[tokio::test]
async fn test_worker_reports_metadata() {
    let worker = ramp_worker(2, 16_000).await;

    assert_eq!(worker.sample_rate(), 8000);
    assert_eq!(worker.channel_count(), 2);
    assert_eq!(worker.encoding(), "pcm_s16le");
    assert!((worker.duration() - 2.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_overlapping_calls_resolve_with_their_own_ranges() {
    let worker = ramp_worker(1, 16_000).await;

    let calls: Vec<_> = (0..8)
        .map(|i| worker.get_audio_data(i as f64 * 0.25, 0.05, DecodeOptions::default()))
        .collect();

    for (i, call) in calls.into_iter().enumerate() {
        let buffer = call.await.unwrap();
        assert_eq!(buffer.len(), 400);
        assert_eq!(common::ramp_frame(buffer.samples()[0]), i * 2000);
    }
    assert_eq!(worker.pending_requests(), 0);
}

#[tokio::test]
async fn test_worker_matches_sync_handle() {
    let bytes = common::tone(22_050, 2, 1.0, 330.0);
    let mut handle = create_decoder(DecoderConfig::default(), bytes.clone()).unwrap();
    let worker = create_decoder_worker(DecoderConfig::default(), bytes)
        .await
        .unwrap();

    let expected = handle
        .decode_audio_data(0.2, 0.3, DecodeOptions::multi_channel())
        .unwrap();
    let actual = worker
        .get_audio_data(0.2, 0.3, DecodeOptions::multi_channel())
        .await
        .unwrap();

    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_dispose_is_queued_behind_pending_work() {
    let worker = ramp_worker(1, 8000).await;

    let pending = worker.get_audio_data(0.0, -1.0, DecodeOptions::default());
    worker.dispose();

    let buffer = pending.await.unwrap();
    assert_eq!(buffer.len(), 8000);
    assert!(worker.is_disposed());
}

#[tokio::test]
async fn test_calls_after_dispose_fail_with_disposed() {
    let worker = ramp_worker(1, 8000).await;
    worker.dispose();
    worker.dispose();

    let result = worker
        .get_audio_data(0.0, 0.1, DecodeOptions::default())
        .await;
    assert!(matches!(result, Err(DecoderError::Disposed)));
    // Cached metadata is still readable
    assert_eq!(worker.sample_rate(), 8000);
}

#[tokio::test]
async fn test_invalid_request_leaves_worker_usable() {
    let worker = ramp_worker(1, 8000).await;

    let result = worker
        .get_audio_data(f64::NAN, 0.1, DecodeOptions::default())
        .await;
    assert!(matches!(result, Err(DecoderError::InvalidRequest(_))));

    // The worker keeps serving after a failed call
    let ok = worker
        .get_audio_data(0.0, 0.1, DecodeOptions::default())
        .await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn test_open_failure_rejects_construction() {
    let result = create_decoder_worker(DecoderConfig::default(), b"plain text".to_vec()).await;
    assert!(matches!(result, Err(DecoderError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn test_invalid_config_rejects_construction() {
    let config = DecoderConfig::default().with_worker_thread_name("");
    let result = create_decoder_worker(config, common::ramp(8000, 1, 100)).await;
    assert!(matches!(result, Err(DecoderError::InvalidConfig(_))));
}

#[test]
fn test_host_json_session() {
    let mut host = WorkerHost::new();
    let data: Vec<String> = common::ramp(8000, 1, 800)
        .iter()
        .map(|b| b.to_string())
        .collect();

    let open = format!(
        r#"{{"id":1,"request":{{"operation":"open","payload":{{"data":[{}]}}}}}}"#,
        data.join(",")
    );
    let reply: ResponseEnvelope = serde_json::from_str(&host.handle_json(&open)).unwrap();
    assert_eq!(reply.id, 1);
    assert!(matches!(reply.into_result(), Ok(WorkerReply::Metadata(_))));

    let decode = r#"{"id":2,"request":{"operation":"decode","payload":{"startSeconds":0.05,"durationSeconds":0.025}}}"#;
    let reply: ResponseEnvelope = serde_json::from_str(&host.handle_json(decode)).unwrap();
    match reply.into_result().unwrap() {
        WorkerReply::Samples(buffer) => {
            assert_eq!(buffer.len(), 200);
            assert_eq!(common::ramp_frame(buffer.samples()[0]), 400);
        }
        other => panic!("unexpected reply: {:?}", other),
    }

    let dispose = r#"{"id":3,"request":{"operation":"dispose"}}"#;
    let reply: ResponseEnvelope = serde_json::from_str(&host.handle_json(dispose)).unwrap();
    assert_eq!(reply.into_result().unwrap(), WorkerReply::Disposed);
    assert!(host.is_closed());

}
