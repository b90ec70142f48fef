//! WebAssembly bindings for core-decoder
//!
//! This module provides JavaScript/TypeScript-friendly bindings for range
//! decoding using wasm-bindgen.
//!
//! Two ways to use it from a page:
//!
//! - `createDecoder(bytes, filename?)` decodes on the calling thread
//! - `createDecoderWorker(scriptUrl, bytes, filename?)` moves decoding into a
//!   Web Worker whose script forwards every message to
//!   `JsWorkerHost.handleMessage` and posts the returned string back

use crate::config::DecoderConfig;
use crate::decoder::FormatInspector;
use crate::error::DecoderError;
use crate::handle::DecoderHandle;
use crate::types::{DecodeOptions, SampleBuffer};
use crate::worker::{
    DecoderWorker, OpenRequest, RequestEnvelope, ResponseEnvelope, WorkerHost, WorkerTransport,
    UNCORRELATED_ID,
};
use bytes::Bytes;
use js_sys::Float32Array;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, Worker};

/// Enable Rust logging to browser console
/// Call this once at startup to see tracing logs in DevTools
#[wasm_bindgen(js_name = enableConsoleLogging)]
pub fn enable_console_logging() {
    use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
    use core_runtime::sink::LogLevel;

    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();

    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    if init_logging(config).is_ok() {
        web_sys::console::log_1(&"Rust console logging enabled (tracing-wasm)".into());
    }
}

fn to_js_error(err: DecoderError) -> JsValue {
    let error = js_sys::Error::new(&err.to_string());
    error.set_name("DecoderError");

    let kind = serde_json::to_value(err.kind())
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default();
    let _ = js_sys::Reflect::set(&error, &"kind".into(), &kind.into());

    error.into()
}

fn filename_extension(filename: Option<&str>) -> Option<String> {
    filename
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn request_options(multi_channel: Option<bool>) -> DecodeOptions {
    if multi_channel.unwrap_or(false) {
        DecodeOptions::multi_channel()
    } else {
        DecodeOptions::downmix()
    }
}

fn to_float32_array(buffer: SampleBuffer) -> Float32Array {
    Float32Array::from(buffer.samples())
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Get the decoder module version
#[wasm_bindgen(js_name = decoderVersion)]
pub fn decoder_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Codecs this build can decode, as encoding identifiers
#[wasm_bindgen(js_name = supportedFormats)]
pub fn supported_formats() -> Vec<String> {
    FormatInspector::supported_codecs()
        .into_iter()
        .map(|codec| codec.encoding().to_string())
        .collect()
}

/// Check if a specific encoding is supported
#[wasm_bindgen(js_name = isFormatSupported)]
pub fn is_format_supported(format: &str) -> bool {
    supported_formats()
        .iter()
        .any(|f| f.eq_ignore_ascii_case(format))
}

// =============================================================================
// Synchronous Decoder - Exported to JavaScript
// =============================================================================

/// JavaScript-accessible decoder handle
#[wasm_bindgen]
pub struct JsDecoderHandle {
    inner: DecoderHandle,
}

/// Open a decoder over raw file bytes
///
/// # Arguments
///
/// * `data` - Raw audio file bytes (MP3, AAC, M4A, FLAC, WAV, etc.)
/// * `filename` - Optional filename for format hint (e.g., "song.m4a")
#[wasm_bindgen(js_name = createDecoder)]
pub fn create_decoder(data: Vec<u8>, filename: Option<String>) -> Result<JsDecoderHandle, JsValue> {
    let extension = filename_extension(filename.as_deref());
    let inner = DecoderHandle::open(&DecoderConfig::default(), Bytes::from(data), extension.as_deref())
        .map_err(to_js_error)?;

    Ok(JsDecoderHandle { inner })
}

#[wasm_bindgen]
impl JsDecoderHandle {
    #[wasm_bindgen(getter, js_name = sampleRate)]
    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    #[wasm_bindgen(getter, js_name = channelCount)]
    pub fn channel_count(&self) -> u16 {
        self.inner.channel_count()
    }

    #[wasm_bindgen(getter)]
    pub fn encoding(&self) -> String {
        self.inner.encoding().to_string()
    }

    /// Duration in seconds
    #[wasm_bindgen(getter)]
    pub fn duration(&self) -> f64 {
        self.inner.duration()
    }

    /// Full metadata as a plain object
    pub fn metadata(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.metadata()).map_err(JsValue::from)
    }

    /// Decode a range of the file
    ///
    /// `start` defaults to 0, a missing or negative `duration` decodes to the
    /// end, and `multiChannel` keeps interleaved channels instead of
    /// downmixing to mono.
    #[wasm_bindgen(js_name = decodeAudioData)]
    pub fn decode_audio_data(
        &mut self,
        start: Option<f64>,
        duration: Option<f64>,
        multi_channel: Option<bool>,
    ) -> Result<Float32Array, JsValue> {
        let buffer = self
            .inner
            .decode_audio_data(
                start.unwrap_or(0.0),
                duration.unwrap_or(-1.0),
                request_options(multi_channel),
            )
            .map_err(to_js_error)?;

        Ok(to_float32_array(buffer))
    }

    #[wasm_bindgen(js_name = isDisposed)]
    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    pub fn dispose(&mut self) {
        self.inner.dispose();
    }
}

// =============================================================================
// Worker Side - Exported to JavaScript
// =============================================================================

/// Dispatcher for use inside a Web Worker script
///
/// ```javascript
/// const host = new JsWorkerHost();
/// self.onmessage = (event) => {
///   self.postMessage(host.handleMessage(event.data));
///   if (host.isClosed()) self.close();
/// };
/// ```
#[wasm_bindgen]
pub struct JsWorkerHost {
    inner: WorkerHost,
}

#[wasm_bindgen]
impl JsWorkerHost {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: WorkerHost::new(),
        }
    }

    /// Handle one JSON request and return the JSON response
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&mut self, message: &str) -> String {
        self.inner.handle_json(message)
    }

    #[wasm_bindgen(js_name = isClosed)]
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

impl Default for JsWorkerHost {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Page Side - Exported to JavaScript
// =============================================================================

/// Posts JSON envelopes to a Web Worker.
struct WebWorkerTransport {
    worker: Worker,
    on_message: Option<Closure<dyn FnMut(MessageEvent)>>,
}

impl WebWorkerTransport {
    fn new(
        worker: Worker,
        responses: core_async::sync::UnboundedSender<ResponseEnvelope>,
    ) -> Self {
        let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let response = match event.data().as_string() {
                Some(json) => ResponseEnvelope::from_json(&json),
                None => {
                    warn!("Non-string worker message");
                    ResponseEnvelope::protocol_error(
                        UNCORRELATED_ID,
                        "worker sent a non-string message",
                    )
                }
            };
            let _ = responses.send(response);
        });
        worker.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        Self {
            worker,
            on_message: Some(on_message),
        }
    }
}

impl WorkerTransport for WebWorkerTransport {
    fn post(&self, envelope: RequestEnvelope) -> crate::error::Result<()> {
        let json = serde_json::to_string(&envelope)
            .map_err(|err| DecoderError::Protocol(format!("unserialisable request: {}", err)))?;

        self.worker
            .post_message(&JsValue::from_str(&json))
            .map_err(|err| DecoderError::Protocol(format!("postMessage failed: {:?}", err)))
    }
}

impl Drop for WebWorkerTransport {
    fn drop(&mut self) {
        // Replies to requests posted before dispose still arrive after the
        // proxy lets go of the transport; the worker script closes itself.
        if let Some(on_message) = self.on_message.take() {
            on_message.forget();
        }
    }
}

/// JavaScript-accessible decoder running in a Web Worker
#[wasm_bindgen]
pub struct JsDecoderWorker {
    inner: DecoderWorker,
}

/// Start `scriptUrl` as a Web Worker and open `data` on it
#[wasm_bindgen(js_name = createDecoderWorker)]
pub async fn create_decoder_worker(
    script_url: String,
    data: Vec<u8>,
    filename: Option<String>,
) -> Result<JsDecoderWorker, JsValue> {
    let worker = Worker::new(&script_url)?;
    let (responses_tx, responses_rx) = core_async::sync::unbounded_channel();
    let transport = WebWorkerTransport::new(worker, responses_tx);

    let open = OpenRequest {
        config: DecoderConfig::default(),
        data: Bytes::from(data),
        extension: filename_extension(filename.as_deref()),
    };
    let inner = DecoderWorker::connect(Box::new(transport), responses_rx, open)
        .await
        .map_err(to_js_error)?;

    info!(script = %script_url, "Web Worker decoder ready");
    Ok(JsDecoderWorker { inner })
}

#[wasm_bindgen]
impl JsDecoderWorker {
    #[wasm_bindgen(getter, js_name = sampleRate)]
    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    #[wasm_bindgen(getter, js_name = channelCount)]
    pub fn channel_count(&self) -> u16 {
        self.inner.channel_count()
    }

    #[wasm_bindgen(getter)]
    pub fn encoding(&self) -> String {
        self.inner.encoding().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn duration(&self) -> f64 {
        self.inner.duration()
    }

    /// Decode a range on the worker; resolves with a `Float32Array`
    #[wasm_bindgen(js_name = getAudioData)]
    pub fn get_audio_data(
        &self,
        start: Option<f64>,
        duration: Option<f64>,
        multi_channel: Option<bool>,
    ) -> js_sys::Promise {
        let pending = self.inner.get_audio_data(
            start.unwrap_or(0.0),
            duration.unwrap_or(-1.0),
            request_options(multi_channel),
        );

        wasm_bindgen_futures::future_to_promise(async move {
            let buffer = pending.await.map_err(to_js_error)?;
            Ok(to_float32_array(buffer).into())
        })
    }

    pub fn dispose(&self) {
        self.inner.dispose();
    }
}
