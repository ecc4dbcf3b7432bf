//! # Codec Engine
//!
//! Push-driven decoding of compressed audio into interleaved s16le PCM.
//!
//! ## Overview
//!
//! This crate provides:
//! - The [`CodecEngine`] trait driven by the stream transformation stage
//! - [`SymphoniaDecoder`], an engine backed by symphonia (feature-gated per codec)
//! - [`DecoderConfig`] carrying probe hints, gapless mode and the buffer bound
//! - [`StreamBuffer`], the rewindable byte buffer between `append()` and symphonia

pub mod config;
pub mod decoder;
pub mod error;
pub mod stream_buffer;
pub mod traits;

pub use config::DecoderConfig;
pub use decoder::{FormatDetector, PcmConverter, SymphoniaDecoder, PACKET_LOOKAHEAD, PROBE_LOOKAHEAD};
pub use error::{DecoderError, Result};
pub use stream_buffer::{StreamBuffer, StreamReader};
pub use traits::{AudioCodec, CodecEngine, DecodedSample, BYTES_PER_SAMPLE};
