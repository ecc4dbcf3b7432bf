//! # Decode Transformation Stage
//!
//! Synchronous state machine that sequences encoded chunks into codec engine
//! calls, splits each decode result into PCM output and stream metadata, and
//! drives the engine through its shutdown sequence.
//!
//! ## Lifecycle
//!
//! ```text
//! Open ──on_end_of_input──▶ Ended ──close──▶ Closed
//!   │                                           ▲
//!   └──────────── on_destroy / failure ─────────┘
//! ```
//!
//! The engine lives in an `Option` that is taken exactly once, by whichever
//! exit path runs first: normal close, an aborting failure, an external
//! destroy, or `Drop`.

use crate::error::{DecodePhase, Result, StreamError};
use crate::metadata::{AudioProperties, StageMetadata};
use crate::options::{DecoderStreamOptions, MetadataCallback};
use bytes::Bytes;
use core_decoder::{CodecEngine, DecodedSample, DecoderConfig, SymphoniaDecoder};
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

/// Lifecycle state of a [`DecodeStage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageState {
    /// Accepting input chunks
    Open,
    /// End of input processed, engine not yet released
    Ended,
    /// Engine released
    Closed,
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageState::Open => write!(f, "open"),
            StageState::Ended => write!(f, "ended"),
            StageState::Closed => write!(f, "closed"),
        }
    }
}

/// Decode transformation stage owning one codec engine for its lifetime.
///
/// # Example
///
/// ```rust,no_run
/// use core_stream::{DecodeStage, DecoderStreamOptions};
///
/// # fn example(chunks: Vec<Vec<u8>>) -> core_stream::Result<()> {
/// let options = DecoderStreamOptions::default()
///     .with_file_extension("ogg")
///     .on_metadata_detected(|_, channels, rate| {
///         println!("{channels}ch @ {rate} Hz");
///         Ok(())
///     });
/// let mut stage = DecodeStage::new(options)?;
///
/// for chunk in &chunks {
///     if let Some(pcm) = stage.on_chunk(chunk)? {
///         // write pcm downstream
///     }
/// }
/// let tail = stage.on_end_of_input()?;
/// stage.close()?;
/// # Ok(())
/// # }
/// ```
pub struct DecodeStage<E: CodecEngine = SymphoniaDecoder> {
    engine: Option<E>,
    state: StageState,
    errored: bool,
    metadata: StageMetadata,
    on_metadata_detected: Option<MetadataCallback>,
}

impl DecodeStage<SymphoniaDecoder> {
    /// Create a stage backed by the symphonia engine.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Construction`] if the options are invalid or the
    /// engine cannot be created.
    pub fn new(options: DecoderStreamOptions) -> Result<Self> {
        Self::with_engine(options, |config| SymphoniaDecoder::new(config.clone()))
    }
}

impl<E: CodecEngine> DecodeStage<E> {
    /// Create a stage around an engine built by `factory`.
    ///
    /// The options are validated before `factory` runs.
    pub fn with_engine<F>(options: DecoderStreamOptions, factory: F) -> Result<Self>
    where
        F: FnOnce(&DecoderConfig) -> core_decoder::Result<E>,
    {
        options.validate()?;

        let engine = factory(&options.decoder).map_err(|e| {
            error!("Failed to create codec engine: {}", e);
            StreamError::Construction(format!("failed to create codec engine: {}", e))
        })?;

        debug!(
            callback = options.on_metadata_detected.is_some(),
            "Decode stage created"
        );

        Ok(Self {
            engine: Some(engine),
            state: StageState::Open,
            errored: false,
            metadata: StageMetadata::Unset,
            on_metadata_detected: options.on_metadata_detected,
        })
    }

    /// Decode one chunk of encoded input.
    ///
    /// Returns the PCM that became available, if any. On failure the stage is
    /// marked errored and the engine is released before the error is returned.
    #[instrument(skip_all, fields(len = chunk.len()))]
    pub fn on_chunk(&mut self, chunk: &[u8]) -> Result<Option<Bytes>> {
        let decoded = self.accepting_engine("on_chunk")?.append(chunk);

        let result = decoded
            .map_err(|e| StreamError::decode(DecodePhase::Append, e))
            .and_then(|sample| self.process_sample(sample, DecodePhase::Append));

        result.map_err(|e| self.abort(e))
    }

    /// Drain the engine and signal end of input.
    ///
    /// Calls `flush` then `finalize`, returning whatever the flush produced.
    /// On success the stage moves to [`StageState::Ended`].
    #[instrument(skip_all)]
    pub fn on_end_of_input(&mut self) -> Result<Option<Bytes>> {
        let flushed = self.accepting_engine("on_end_of_input")?.flush();

        let output = match flushed
            .map_err(|e| StreamError::decode(DecodePhase::Flush, e))
            .and_then(|sample| self.process_sample(sample, DecodePhase::Flush))
        {
            Ok(output) => output,
            Err(e) => return Err(self.abort(e)),
        };

        let finalized = self.accepting_engine("on_end_of_input")?.finalize();
        if let Err(e) = finalized {
            return Err(self.abort(StreamError::Finalize(e)));
        }

        self.state = StageState::Ended;
        info!(metadata = %self.metadata, "End of input processed");

        Ok(output)
    }

    /// Release the engine, merging `reason` with any close failure.
    ///
    /// A present `reason` is returned as the error and a close failure is
    /// discarded. Without a reason, a close failure is returned as
    /// [`StreamError::Close`]. Only the first call releases the engine.
    #[instrument(skip_all, fields(reason = reason.is_some()))]
    pub fn on_destroy(&mut self, reason: Option<StreamError>) -> Result<()> {
        let closed = self.release();

        match (reason, closed) {
            (Some(reason), Err(close_err)) => {
                warn!("Discarding close failure after earlier error: {}", close_err);
                Err(reason)
            }
            (Some(reason), Ok(())) => Err(reason),
            (None, Err(close_err)) => {
                error!("Failed to close codec engine: {}", close_err);
                Err(StreamError::Close(close_err))
            }
            (None, Ok(())) => Ok(()),
        }
    }

    /// Release the engine without an error. Shorthand for `on_destroy(None)`.
    pub fn close(&mut self) -> Result<()> {
        self.on_destroy(None)
    }

    /// Mark the stage errored, release the engine and hand back `reason`.
    pub fn abort(&mut self, reason: StreamError) -> StreamError {
        self.errored = true;
        error!("Decode stage aborted: {}", reason);

        if let Err(close_err) = self.release() {
            warn!("Discarding close failure after earlier error: {}", close_err);
        }

        reason
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StageState {
        self.state
    }

    /// Returns `true` once a failure has aborted the stage.
    pub fn is_errored(&self) -> bool {
        self.errored
    }

    /// Returns `true` once the engine has been released.
    pub fn is_closed(&self) -> bool {
        self.state == StageState::Closed
    }

    /// Detected channel count, `None` until the first sample.
    pub fn channel_count(&self) -> Option<u32> {
        self.metadata.channel_count()
    }

    /// Detected sample rate in Hz, `None` until the first sample.
    pub fn sample_rate(&self) -> Option<u32> {
        self.metadata.sample_rate()
    }

    /// Detected stream metadata, [`StageMetadata::Unset`] until the first sample.
    pub fn metadata(&self) -> StageMetadata {
        self.metadata
    }

    fn accepting_engine(&mut self, operation: &'static str) -> Result<&mut E> {
        let state = self.state;

        if state != StageState::Open || self.errored {
            return Err(StreamError::InvalidState { operation, state });
        }

        self.engine
            .as_mut()
            .ok_or(StreamError::InvalidState { operation, state })
    }

    /// Record metadata from `sample` and return its PCM.
    fn process_sample(
        &mut self,
        sample: Option<DecodedSample>,
        phase: DecodePhase,
    ) -> Result<Option<Bytes>> {
        let Some(sample) = sample else {
            return Ok(None);
        };

        match self.metadata {
            StageMetadata::Unset => {
                self.metadata = StageMetadata::Set {
                    channel_count: sample.channel_count,
                    sample_rate: sample.sample_rate,
                };

                info!(
                    channels = sample.channel_count,
                    sample_rate = sample.sample_rate,
                    "Stream metadata detected"
                );

                if let Some(callback) = self.on_metadata_detected.take() {
                    callback(&*self, sample.channel_count, sample.sample_rate)
                        .map_err(|source| StreamError::Decode { phase, source })?;
                }
            }
            StageMetadata::Set {
                channel_count,
                sample_rate,
            } => {
                if channel_count != sample.channel_count || sample_rate != sample.sample_rate {
                    warn!(
                        expected = %self.metadata,
                        channels = sample.channel_count,
                        sample_rate = sample.sample_rate,
                        "Sample metadata differs from detected stream metadata"
                    );
                }
            }
        }

        debug!(bytes = sample.data.len(), ?phase, "Emitting PCM chunk");
        Ok(Some(sample.data))
    }

    /// Take and close the engine if this stage still owns one.
    fn release(&mut self) -> core_decoder::Result<()> {
        self.state = StageState::Closed;

        match self.engine.take() {
            Some(mut engine) => {
                let result = engine.close();
                if result.is_ok() {
                    debug!("Codec engine released");
                }
                result
            }
            None => Ok(()),
        }
    }
}

impl<E: CodecEngine> AudioProperties for DecodeStage<E> {
    fn metadata(&self) -> StageMetadata {
        self.metadata
    }
}

impl<E: CodecEngine> Drop for DecodeStage<E> {
    fn drop(&mut self) {
        if self.engine.is_some() {
            debug!(state = %self.state, "Releasing codec engine on drop");
            if let Err(e) = self.release() {
                warn!("Failed to close codec engine on drop: {}", e);
            }
        }
    }
}

impl<E: CodecEngine> fmt::Debug for DecodeStage<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeStage")
            .field("state", &self.state)
            .field("errored", &self.errored)
            .field("metadata", &self.metadata)
            .field("engine_owned", &self.engine.is_some())
            .finish_non_exhaustive()
    }
}
