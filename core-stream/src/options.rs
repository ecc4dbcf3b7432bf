//! # Stage Options
//!
//! Construction-time options for a decode stage: the codec engine
//! configuration plus the optional one-shot metadata notification.

use crate::error::{BoxError, Result, StreamError};
use crate::metadata::AudioProperties;
use core_decoder::DecoderConfig;
use std::fmt;

/// One-shot notification fired when the stream's channel count and sample
/// rate become known.
///
/// Called with the stage itself and the detected `(channel_count, sample_rate)`.
/// Returning an error fails the decode call that produced the first sample.
pub type MetadataCallback =
    Box<dyn FnOnce(&dyn AudioProperties, u32, u32) -> std::result::Result<(), BoxError> + Send>;

/// Options for [`DecodeStage`](crate::DecodeStage) and
/// [`DecoderStream`](crate::DecoderStream).
///
/// # Example
///
/// ```rust
/// use core_stream::DecoderStreamOptions;
///
/// let options = DecoderStreamOptions::default()
///     .with_file_extension("mp3")
///     .with_gapless(true)
///     .on_metadata_detected(|_stage, channels, rate| {
///         println!("{channels} channels at {rate} Hz");
///         Ok(())
///     });
/// assert!(options.validate().is_ok());
/// ```
#[derive(Default)]
pub struct DecoderStreamOptions {
    /// Configuration forwarded to the codec engine
    pub decoder: DecoderConfig,
    /// Fired once, before the first PCM chunk is emitted
    pub on_metadata_detected: Option<MetadataCallback>,
}

impl DecoderStreamOptions {
    /// Create options around an existing decoder configuration.
    pub fn new(decoder: DecoderConfig) -> Self {
        Self {
            decoder,
            on_metadata_detected: None,
        }
    }

    /// Enable or disable gapless trimming
    pub fn with_gapless(mut self, enable: bool) -> Self {
        self.decoder = self.decoder.with_gapless(enable);
        self
    }

    /// Set the file extension probe hint
    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Self {
        self.decoder = self.decoder.with_file_extension(extension);
        self
    }

    /// Set the MIME type probe hint
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.decoder = self.decoder.with_mime_type(mime_type);
        self
    }

    /// Set the engine's backpressure threshold in bytes
    pub fn with_high_water_mark(mut self, limit: u32) -> Self {
        self.decoder = self.decoder.with_high_water_mark(limit);
        self
    }

    /// Register the metadata-detected callback, replacing any earlier one.
    pub fn on_metadata_detected<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&dyn AudioProperties, u32, u32) -> std::result::Result<(), BoxError>
            + Send
            + 'static,
    {
        self.on_metadata_detected = Some(Box::new(callback));
        self
    }

    /// Validate the decoder configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Construction`] describing the first invalid option.
    pub fn validate(&self) -> Result<()> {
        self.decoder
            .validate()
            .map_err(|msg| StreamError::Construction(format!("invalid decoder options: {}", msg)))
    }
}

impl fmt::Debug for DecoderStreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderStreamOptions")
            .field("decoder", &self.decoder)
            .field(
                "on_metadata_detected",
                &self.on_metadata_detected.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}
