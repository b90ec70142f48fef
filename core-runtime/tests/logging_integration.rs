//! Integration tests for logging system

use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::sink::{ConsoleLogger, LogLevel};
use core_runtime::Error;
use std::sync::Arc;

#[test]
fn test_logging_config_builder() {
    // Only one global subscriber per process, so most checks stay on the config.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_spans(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(config.enable_spans);
    assert!(config.logger_sink.is_none());
}

#[test]
fn test_custom_filter_overrides_defaults() {
    let config = LoggingConfig::default()
        .with_level(LogLevel::Error)
        .with_filter("core_decoder=trace");

    assert_eq!(config.filter_directives(), "core_decoder=trace");
}

#[test]
fn test_config_debug_hides_sink() {
    let config = LoggingConfig::default().with_logger_sink(Arc::new(ConsoleLogger::default()));
    let rendered = format!("{:?}", config);

    assert!(rendered.contains("LoggerSink { ... }"));
}

#[test]
fn test_init_logging_twice_fails() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    init_logging(config.clone()).expect("first initialization succeeds");

    let second = init_logging(config);
    assert!(matches!(second, Err(Error::Config(_))));
}
