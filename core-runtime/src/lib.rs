//! # Core Runtime Module
//!
//! Provides the logging and tracing infrastructure shared by the decoder crates.
//!
//! ## Overview
//!
//! This crate installs the `tracing-subscriber` stack, owns the process-wide
//! tracing switch, and defines the runtime error type.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::{init_logging, is_tracing_enabled, set_tracing_enabled, LogFormat, LogLevel, LoggingConfig};
