//! # Decoder Error Types
//!
//! Error types for the push-driven codec engine.

use thiserror::Error;

/// Errors that can occur while feeding, draining, or releasing a codec engine.
#[derive(Error, Debug)]
pub enum DecoderError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Decoder configuration failed validation.
    #[error("Invalid decoder configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Format/Codec Errors
    // ========================================================================
    /// Audio container is not recognized or cannot be parsed.
    #[error("Unsupported or invalid audio format: {0}")]
    InvalidFormat(String),

    /// Codec is not supported by the decoder.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// Container was recognized but holds no decodable audio track.
    #[error("Cannot decode audio format: {0}")]
    FormatNotDecodable(String),

    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// Error occurred during audio decoding.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Audio stream is corrupted or contains invalid data.
    #[error("Corrupted audio stream: {0}")]
    CorruptedStream(String),

    /// Channel layout or sample rate changed in the middle of a decode call.
    #[error("Signal format changed mid-decode: {0}")]
    FormatChanged(String),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Input was appended after the end of input was signalled.
    #[error("Decoder has been finalized")]
    Finalized,

    /// Operation attempted on a closed decoder.
    #[error("Decoder is closed")]
    Closed,

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DecoderError {
    /// Returns `true` if this error is related to audio format/codec issues.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DecoderError::InvalidFormat(_)
                | DecoderError::UnsupportedCodec(_)
                | DecoderError::FormatNotDecodable(_)
                | DecoderError::FormatChanged(_)
        )
    }

    /// Returns `true` if the decoder rejected the call because of its lifecycle state.
    pub fn is_state_error(&self) -> bool {
        matches!(self, DecoderError::Finalized | DecoderError::Closed)
    }
}

/// Result type for codec engine operations.
pub type Result<T> = std::result::Result<T, DecoderError>;
