//! # Stream Error Types
//!
//! Failures surfaced by the decode transformation stage, classified by the
//! phase that produced them.

use crate::stage::StageState;
use core_decoder::DecoderError;
use std::fmt;
use thiserror::Error;

/// Boxed error carried by decode failures (engine errors or callback errors).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Engine call that was running when a decode failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodePhase {
    /// Decoding an input chunk
    Append,
    /// Draining buffered input at end of input
    Flush,
}

impl fmt::Display for DecodePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodePhase::Append => write!(f, "append"),
            DecodePhase::Flush => write!(f, "flush"),
        }
    }
}

/// Errors surfaced to the consumer of a decode stage.
///
/// A consumer observes at most one of these per stage, after which output ends.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Options were invalid or the codec engine could not be created.
    #[error("Failed to construct decode stage: {0}")]
    Construction(String),

    /// The engine failed to decode, or the metadata callback failed.
    #[error("Decode failed during {phase}: {source}")]
    Decode {
        phase: DecodePhase,
        #[source]
        source: BoxError,
    },

    /// The engine rejected the end-of-input signal.
    #[error("Failed to finalize decoder: {0}")]
    Finalize(#[source] DecoderError),

    /// Releasing the engine failed and no earlier error was pending.
    #[error("Failed to close decoder: {0}")]
    Close(#[source] DecoderError),

    /// The upstream source of encoded bytes failed.
    #[error("Upstream source failed: {0}")]
    Upstream(#[from] std::io::Error),

    /// An operation was called in a state that does not permit it.
    #[error("Cannot {operation} while stage is {state}")]
    InvalidState {
        operation: &'static str,
        state: StageState,
    },
}

/// Coarse classification of a [`StreamError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Construction,
    Decode,
    Finalize,
    Close,
    Upstream,
    InvalidState,
}

impl StreamError {
    /// Wrap an engine or callback failure for the given phase.
    pub fn decode(phase: DecodePhase, source: impl Into<BoxError>) -> Self {
        StreamError::Decode {
            phase,
            source: source.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreamError::Construction(_) => ErrorKind::Construction,
            StreamError::Decode { .. } => ErrorKind::Decode,
            StreamError::Finalize(_) => ErrorKind::Finalize,
            StreamError::Close(_) => ErrorKind::Close,
            StreamError::Upstream(_) => ErrorKind::Upstream,
            StreamError::InvalidState { .. } => ErrorKind::InvalidState,
        }
    }

    /// Phase of a decode failure, if this is one.
    pub fn decode_phase(&self) -> Option<DecodePhase> {
        match self {
            StreamError::Decode { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

/// Result type for stage and stream operations.
pub type Result<T> = std::result::Result<T, StreamError>;
