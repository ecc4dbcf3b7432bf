//! Integration tests for logging system

use core_runtime::logging::{
    init_logging, is_tracing_enabled, set_tracing_enabled, LogFormat, LogLevel, LoggingConfig,
};

#[test]
fn test_logging_initialization() {
    // Only one global subscriber per process, so the second call must fail
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_spans(true);

    init_logging(config.clone()).unwrap();
    tracing::debug!(target: "core_decoder", "visible through the default filter");

    assert!(init_logging(config).is_err());
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}

#[test]
fn test_filter_configuration() {
    let config = LoggingConfig::default().with_filter("core_decoder=debug,symphonia=trace");

    assert_eq!(
        config.filter,
        Some("core_decoder=debug,symphonia=trace".to_string())
    );
}

#[test]
fn test_invalid_filter_is_rejected() {
    let config = LoggingConfig::default().with_filter("core_decoder=loud");
    assert!(init_logging(config).is_err());
}

#[test]
fn test_tracing_switch_round_trip() {
    set_tracing_enabled(false);
    assert!(!is_tracing_enabled());
    set_tracing_enabled(true);
    assert!(is_tracing_enabled());
}
