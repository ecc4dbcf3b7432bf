//! Workspace facade crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates (`core-stream`, `core-decoder`, `core-runtime`) and re-exports them,
//! so host applications can depend on `pcm-stream-workspace` alone.
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `stream` (default) | [`stream`] and [`decoder`] |
//! | `tracing` | [`runtime`] logging setup |
//! | `decoder-*` | individual symphonia codecs |

#[cfg(feature = "core-runtime")]
pub use core_runtime as runtime;

#[cfg(feature = "core-decoder")]
pub use core_decoder as decoder;

#[cfg(feature = "core-stream")]
pub use core_stream as stream;

#[cfg(feature = "core-stream")]
pub use core_stream::{DecodeStage, DecoderStream, DecoderStreamOptions, StreamError};
