//! # Decoder Configuration
//!
//! Tunables for format detection, seeking and error tolerance.

use crate::error::{DecoderError, Result};
use serde::{Deserialize, Serialize};
use symphonia::core::formats::{FormatOptions, SeekMode};

/// How precisely range starts are located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeekPrecision {
    /// Seek to the packet containing the start timestamp.
    #[default]
    Accurate,
    /// Seek to the nearest cheap sync point, possibly further before the start.
    Coarse,
}

impl SeekPrecision {
    pub(crate) fn mode(&self) -> SeekMode {
        match self {
            SeekPrecision::Accurate => SeekMode::Accurate,
            SeekPrecision::Coarse => SeekMode::Coarse,
        }
    }
}

/// Decoder configuration.
///
/// Every field has a serde default, so `{}` deserialises to
/// [`DecoderConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoderConfig {
    /// Seek precision used for ranges that do not start at zero.
    ///
    /// Default: `Accurate`.
    #[serde(default)]
    pub seek_mode: SeekPrecision,

    /// Consecutive packet failures tolerated before a range decode fails.
    ///
    /// Default: 10.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: usize,

    /// Trim encoder delay and padding where the container reports them.
    ///
    /// Default: false.
    #[serde(default)]
    pub enable_gapless: bool,

    /// Count packets to find the duration when the header does not state it.
    ///
    /// Default: true.
    #[serde(default = "default_scan_duration")]
    pub scan_duration: bool,

    /// Name given to each worker thread.
    ///
    /// Default: `audio-range-worker`.
    #[serde(default = "default_worker_thread_name")]
    pub worker_thread_name: String,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            seek_mode: SeekPrecision::default(),
            max_consecutive_errors: default_max_consecutive_errors(),
            enable_gapless: false,
            scan_duration: default_scan_duration(),
            worker_thread_name: default_worker_thread_name(),
        }
    }
}

impl DecoderConfig {
    pub fn with_seek_mode(mut self, seek_mode: SeekPrecision) -> Self {
        self.seek_mode = seek_mode;
        self
    }

    pub fn with_max_consecutive_errors(mut self, max: usize) -> Self {
        self.max_consecutive_errors = max;
        self
    }

    pub fn with_gapless(mut self, enabled: bool) -> Self {
        self.enable_gapless = enabled;
        self
    }

    pub fn with_scan_duration(mut self, enabled: bool) -> Self {
        self.scan_duration = enabled;
        self
    }

    pub fn with_worker_thread_name(mut self, name: impl Into<String>) -> Self {
        self.worker_thread_name = name.into();
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.max_consecutive_errors == 0 {
            return Err(DecoderError::InvalidConfig(
                "max_consecutive_errors must be > 0".to_string(),
            ));
        }

        if self.worker_thread_name.trim().is_empty() {
            return Err(DecoderError::InvalidConfig(
                "worker_thread_name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub(crate) fn format_options(&self) -> FormatOptions {
        FormatOptions {
            enable_gapless: self.enable_gapless,
            ..Default::default()
        }
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_max_consecutive_errors() -> usize {
    10
}

fn default_scan_duration() -> bool {
    true
}

fn default_worker_thread_name() -> String {
    "audio-range-worker".to_string()
}
