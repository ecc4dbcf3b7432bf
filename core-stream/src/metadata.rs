//! Stream metadata learned from the first decoded sample.

use std::fmt;

/// Channel layout and sample rate of the decoded stream.
///
/// Starts out [`Unset`](StageMetadata::Unset) and is set once, from the first
/// sample the codec engine produces. Both values are known or neither is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StageMetadata {
    #[default]
    Unset,
    Set {
        channel_count: u32,
        sample_rate: u32,
    },
}

impl StageMetadata {
    /// Returns `true` once values have been recorded.
    pub fn is_set(&self) -> bool {
        matches!(self, StageMetadata::Set { .. })
    }

    /// Channel count, if set.
    pub fn channel_count(&self) -> Option<u32> {
        match self {
            StageMetadata::Set { channel_count, .. } => Some(*channel_count),
            StageMetadata::Unset => None,
        }
    }

    /// Sample rate in Hz, if set.
    pub fn sample_rate(&self) -> Option<u32> {
        match self {
            StageMetadata::Set { sample_rate, .. } => Some(*sample_rate),
            StageMetadata::Unset => None,
        }
    }

    /// Both values as a pair, if set.
    pub fn as_pair(&self) -> Option<(u32, u32)> {
        match self {
            StageMetadata::Set {
                channel_count,
                sample_rate,
            } => Some((*channel_count, *sample_rate)),
            StageMetadata::Unset => None,
        }
    }
}

impl fmt::Display for StageMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageMetadata::Unset => write!(f, "unknown"),
            StageMetadata::Set {
                channel_count,
                sample_rate,
            } => write!(f, "{}ch @ {} Hz", channel_count, sample_rate),
        }
    }
}

/// Read access to the stream properties of a decode stage.
///
/// The metadata callback receives the stage through this trait, so it can
/// read the same values it is handed as arguments.
pub trait AudioProperties {
    /// Current metadata, `Unset` until the first sample is decoded.
    fn metadata(&self) -> StageMetadata;

    fn channel_count(&self) -> Option<u32> {
        self.metadata().channel_count()
    }

    fn sample_rate(&self) -> Option<u32> {
        self.metadata().sample_rate()
    }
}
