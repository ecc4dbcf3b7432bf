//! # Format Detection Module
//!
//! Builds probe hints from decoder configuration and classifies the codec of
//! the selected track.

use crate::config::DecoderConfig;
use crate::error::{DecoderError, Result};
use crate::traits::AudioCodec;
use symphonia::core::codecs::CodecType;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Format detector for audio streams.
///
/// The engine never sniffs formats itself; it forwards the configured
/// extension and MIME type to symphonia's probe as hints and lets the probe
/// identify the container.
pub struct FormatDetector;

impl FormatDetector {
    /// Create a probe hint from the configured extension and MIME type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use core_decoder::{DecoderConfig, FormatDetector};
    ///
    /// let config = DecoderConfig::default()
    ///     .with_file_extension("ogg")
    ///     .with_mime_type("audio/ogg");
    /// let hint = FormatDetector::hint_from_config(&config);
    /// ```
    pub fn hint_from_config(config: &DecoderConfig) -> Hint {
        let mut hint = Hint::new();

        if let Some(mime_type) = &config.mime_type {
            debug!("Setting probe hint MIME type: {}", mime_type);
            hint.mime_type(mime_type);
        }

        if let Some(extension) = &config.file_extension {
            debug!("Setting probe hint extension: {}", extension);
            hint.with_extension(extension);
        }

        if config.mime_type.is_none() && config.file_extension.is_none() {
            debug!("No format hints configured, probe will auto-detect");
        }

        hint
    }

    /// Detect audio codec from Symphonia codec type.
    pub fn detect_codec(codec_type: CodecType) -> AudioCodec {
        use symphonia::core::codecs::*;

        const PCM_CODECS: &[CodecType] = &[
            CODEC_TYPE_PCM_S16LE,
            CODEC_TYPE_PCM_S16BE,
            CODEC_TYPE_PCM_S24LE,
            CODEC_TYPE_PCM_S24BE,
            CODEC_TYPE_PCM_S32LE,
            CODEC_TYPE_PCM_S32BE,
            CODEC_TYPE_PCM_U8,
            CODEC_TYPE_PCM_F32LE,
            CODEC_TYPE_PCM_F32BE,
            CODEC_TYPE_PCM_F64LE,
            CODEC_TYPE_PCM_F64BE,
        ];

        if codec_type == CODEC_TYPE_MP3 {
            AudioCodec::Mp3
        } else if codec_type == CODEC_TYPE_AAC {
            AudioCodec::Aac
        } else if codec_type == CODEC_TYPE_FLAC {
            AudioCodec::Flac
        } else if codec_type == CODEC_TYPE_VORBIS {
            AudioCodec::Vorbis
        } else if codec_type == CODEC_TYPE_OPUS {
            AudioCodec::Opus
        } else if codec_type == CODEC_TYPE_ALAC {
            AudioCodec::Alac
        } else if PCM_CODECS.contains(&codec_type) {
            AudioCodec::Wav
        } else {
            warn!("Unknown codec type: {:?}", codec_type);
            AudioCodec::Unknown
        }
    }

    /// Validate if a codec is supported by current feature flags.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Codec is supported
    /// - `Err(DecoderError::UnsupportedCodec)` - Codec not enabled
    pub fn validate_codec_support(codec: &AudioCodec) -> Result<()> {
        let (enabled, feature) = match codec {
            AudioCodec::Mp3 => (cfg!(feature = "decoder-mp3"), "decoder-mp3"),
            AudioCodec::Flac => (cfg!(feature = "decoder-flac"), "decoder-flac"),
            AudioCodec::Vorbis => (cfg!(feature = "decoder-vorbis"), "decoder-vorbis"),
            AudioCodec::Opus => (cfg!(feature = "decoder-opus"), "decoder-opus"),
            AudioCodec::Aac => (cfg!(feature = "decoder-aac"), "decoder-aac"),
            AudioCodec::Wav => (cfg!(feature = "decoder-wav"), "decoder-wav"),
            AudioCodec::Alac => (cfg!(feature = "decoder-alac"), "decoder-alac"),
            AudioCodec::Unknown => {
                return Err(DecoderError::UnsupportedCodec(
                    "Unknown audio codec".to_string(),
                ))
            }
            AudioCodec::Other(name) => {
                return Err(DecoderError::UnsupportedCodec(format!(
                    "Unsupported codec: {}",
                    name
                )))
            }
        };

        if enabled {
            Ok(())
        } else {
            Err(DecoderError::UnsupportedCodec(format!(
                "{:?} decoder not enabled. Enable '{}' feature",
                codec, feature
            )))
        }
    }
}
