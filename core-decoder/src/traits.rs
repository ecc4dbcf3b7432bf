//! # Codec Engine Traits
//!
//! This module defines the abstraction the transformation stage drives: a
//! push-based decoder that accepts arbitrarily split encoded bytes and hands
//! back decoded PCM whenever enough input has accumulated.
//!
//! ## Call Model
//!
//! - `append()` is called once per input chunk, in arrival order.
//! - `flush()` is called once the input has ended, to drain what is buffered.
//! - `finalize()` marks the end of input.
//! - `close()` releases all resources and must be called exactly once by the owner.
//!
//! Every call is synchronous. A call either returns a result or fails; there
//! is no partial progress to resume after a failure.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use core_decoder::{CodecEngine, DecodedSample};
//!
//! fn drain(engine: &mut impl CodecEngine, chunks: &[&[u8]]) -> core_decoder::Result<Vec<u8>> {
//!     let mut pcm = Vec::new();
//!     for chunk in chunks {
//!         if let Some(sample) = engine.append(chunk)? {
//!             pcm.extend_from_slice(&sample.data);
//!         }
//!     }
//!     if let Some(sample) = engine.flush()? {
//!         pcm.extend_from_slice(&sample.data);
//!     }
//!     engine.finalize()?;
//!     engine.close()?;
//!     Ok(pcm)
//! }
//! ```

use crate::error::Result;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Size of one interleaved PCM sample in bytes (signed 16-bit).
pub const BYTES_PER_SAMPLE: usize = 2;

// ============================================================================
// Audio Codec Types
// ============================================================================

/// Audio codecs the engine can identify.
///
/// Use [`AudioCodec::Other`] for codecs symphonia reports that have no
/// dedicated variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// MPEG-1 Audio Layer 3
    Mp3,
    /// Advanced Audio Coding (AAC/M4A)
    Aac,
    /// Free Lossless Audio Codec
    Flac,
    /// Ogg Vorbis
    Vorbis,
    /// Opus (low-latency codec)
    Opus,
    /// Waveform Audio File Format
    Wav,
    /// Apple Lossless Audio Codec
    Alac,
    /// Codec not recognized
    Unknown,
    /// Custom or proprietary codec
    Other(String),
}

impl AudioCodec {
    /// Returns `true` if this is a lossless codec.
    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioCodec::Flac | AudioCodec::Wav | AudioCodec::Alac)
    }
}

// ============================================================================
// Decoded Audio Data
// ============================================================================

/// The result of one decode call.
///
/// `data` holds interleaved signed 16-bit little-endian PCM. For stereo audio
/// the samples are ordered `[L0, R0, L1, R1, ...]`, two bytes each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSample {
    /// Number of interleaved channels (1 = mono, 2 = stereo, ...)
    pub channel_count: u32,
    /// Sample rate in Hz (e.g. 44100)
    pub sample_rate: u32,
    /// Interleaved s16le PCM bytes
    pub data: Bytes,
}

impl DecodedSample {
    /// Create a new decoded sample.
    pub fn new(channel_count: u32, sample_rate: u32, data: impl Into<Bytes>) -> Self {
        Self {
            channel_count,
            sample_rate,
            data: data.into(),
        }
    }

    /// Number of frames (one sample per channel) held in `data`.
    pub fn frames(&self) -> usize {
        if self.channel_count == 0 {
            return 0;
        }
        self.data.len() / (BYTES_PER_SAMPLE * self.channel_count as usize)
    }

    /// Playback duration of `data` at `sample_rate`.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::from_secs(0);
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Returns `true` if the sample carries no PCM bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ============================================================================
// Core Traits
// ============================================================================

/// A push-driven decoder turning encoded bytes into s16le PCM.
///
/// Implementations own all codec state. The caller feeds input with
/// [`append`](CodecEngine::append) in arrival order; chunk boundaries carry no
/// meaning and need not align with codec packets.
///
/// ## Contract
///
/// - Each call yields at most one [`DecodedSample`]; `Ok(None)` means more input
///   is needed before anything can be produced.
/// - After an error the decoder state is undefined; callers must not retry.
/// - `close()` is not required to be idempotent. Owners call it exactly once.
pub trait CodecEngine {
    /// Append encoded bytes, returning any PCM that became decodable.
    fn append(&mut self, chunk: &[u8]) -> Result<Option<DecodedSample>>;

    /// Decode everything currently buffered, treating it as complete.
    fn flush(&mut self) -> Result<Option<DecodedSample>>;

    /// Signal that no more input will arrive.
    fn finalize(&mut self) -> Result<()>;

    /// Release all resources held by the decoder.
    fn close(&mut self) -> Result<()>;
}

impl<E: CodecEngine + ?Sized> CodecEngine for Box<E> {
    fn append(&mut self, chunk: &[u8]) -> Result<Option<DecodedSample>> {
        (**self).append(chunk)
    }

    fn flush(&mut self) -> Result<Option<DecodedSample>> {
        (**self).flush()
    }

    fn finalize(&mut self) -> Result<()> {
        (**self).finalize()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

// ============================================================================
// Tests
// ============================================================================
