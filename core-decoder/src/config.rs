//! # Decoder Configuration
//!
//! Construction-time options for a codec engine.

use serde::{Deserialize, Serialize};

/// Configuration for a codec engine.
///
/// Exactly one configuration is bound to an engine for its whole lifetime. All
/// fields are optional hints; [`DecoderConfig::validate`] rejects values that
/// are present but malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoderConfig {
    /// Trim encoder delay and padding at the stream boundaries.
    ///
    /// Default: false.
    #[serde(default)]
    pub enable_gapless: bool,

    /// Container hint based on the file extension (e.g. `"mp3"`, `"ogg"`).
    #[serde(default)]
    pub file_extension: Option<String>,

    /// Container hint based on the MIME type (e.g. `"audio/ogg"`).
    #[serde(default)]
    pub mime_type: Option<String>,

    /// Maximum number of encoded bytes the decoder may hold before appends
    /// are rejected.
    ///
    /// Default: unbounded.
    #[serde(default)]
    pub high_water_mark: Option<u32>,
}

impl DecoderConfig {
    /// Enable or disable gapless trimming
    pub fn with_gapless(mut self, enable: bool) -> Self {
        self.enable_gapless = enable;
        self
    }

    /// Set the file extension hint
    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = Some(extension.into());
        self
    }

    /// Set the MIME type hint
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Set the backpressure threshold in bytes
    pub fn with_high_water_mark(mut self, limit: u32) -> Self {
        self.high_water_mark = Some(limit);
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.high_water_mark == Some(0) {
            return Err("high_water_mark must be > 0".to_string());
        }

        if let Some(extension) = &self.file_extension {
            if extension.is_empty() {
                return Err("file_extension cannot be empty".to_string());
            }

            if extension.starts_with('.') {
                return Err(format!(
                    "file_extension must not include the leading dot: {:?}",
                    extension
                ));
            }

            if extension.contains('/') || extension.contains('\\') {
                return Err(format!(
                    "file_extension must not contain path separators: {:?}",
                    extension
                ));
            }
        }

        if let Some(mime_type) = &self.mime_type {
            match mime_type.split_once('/') {
                Some((kind, subtype)) if !kind.is_empty() && !subtype.is_empty() => {}
                _ => {
                    return Err(format!(
                        "mime_type must have the form type/subtype: {:?}",
                        mime_type
                    ))
                }
            }
        }

        Ok(())
    }

    /// Backpressure threshold in bytes, if one is configured.
    pub fn buffer_limit(&self) -> Option<usize> {
        self.high_water_mark.map(|limit| limit as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DecoderConfig::default();
        assert!(!config.enable_gapless);
        assert!(config.file_extension.is_none());
        assert!(config.mime_type.is_none());
        assert!(config.high_water_mark.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_sets_every_field() {
        let config = DecoderConfig::default()
            .with_gapless(true)
            .with_file_extension("ogg")
            .with_mime_type("audio/ogg")
            .with_high_water_mark(16 * 1024);

        assert!(config.enable_gapless);
        assert_eq!(config.file_extension.as_deref(), Some("ogg"));
        assert_eq!(config.mime_type.as_deref(), Some("audio/ogg"));
        assert_eq!(config.buffer_limit(), Some(16 * 1024));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_high_water_mark() {
        let config = DecoderConfig::default().with_high_water_mark(0);
        assert_eq!(
            config.validate(),
            Err("high_water_mark must be > 0".to_string())
        );
    }

    #[test]
    fn rejects_malformed_extension() {
        assert!(DecoderConfig::default()
            .with_file_extension("")
            .validate()
            .is_err());
        assert!(DecoderConfig::default()
            .with_file_extension(".mp3")
            .validate()
            .is_err());
        assert!(DecoderConfig::default()
            .with_file_extension("music/mp3")
            .validate()
            .is_err());
    }

    #[test]
    fn rejects_malformed_mime_type() {
        for mime in ["audio", "audio/", "/ogg", ""] {
            let config = DecoderConfig::default().with_mime_type(mime);
            assert!(config.validate().is_err(), "{mime:?} should be rejected");
        }
    }

    #[test]
    fn deserializes_camel_case_option_bag() {
        let config: DecoderConfig = serde_json::from_str(
            r#"{"enableGapless": true, "fileExtension": "mp3", "highWaterMark": 4096}"#,
        )
        .unwrap();

        assert!(config.enable_gapless);
        assert_eq!(config.file_extension.as_deref(), Some("mp3"));
        assert_eq!(config.mime_type, None);
        assert_eq!(config.high_water_mark, Some(4096));
    }
}
