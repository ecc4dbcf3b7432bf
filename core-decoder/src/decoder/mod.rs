//! # Audio Decoder Module
//!
//! Push-driven audio decoding using the Symphonia library.
//!
//! ## Supported Formats
//!
//! | Format | Codec | Feature Flag |
//! |--------|-------|--------------|
//! | MP3 | MPEG-1/2 Audio Layer III | `decoder-mp3` |
//! | FLAC | Free Lossless Audio Codec | `decoder-flac` |
//! | Vorbis | Ogg Vorbis | `decoder-vorbis` |
//! | Opus | Opus in Ogg | `decoder-opus` |
//! | AAC | Advanced Audio Coding | `decoder-aac` |
//! | WAV | Waveform Audio | `decoder-wav` |
//! | ALAC | Apple Lossless | `decoder-alac` |
//!
//! ## Architecture
//!
//! Encoded chunks are pushed into a shared buffer that symphonia reads through
//! its usual three layers:
//!
//! ```text
//! append() → StreamBuffer → MediaSourceStream → FormatReader → Decoder → PcmConverter → DecodedSample
//! ```
//!
//! Output is always interleaved signed 16-bit little-endian PCM, whatever the
//! source sample format.

#[cfg(feature = "core-decoder")]
mod format_detector;

#[cfg(feature = "core-decoder")]
mod pcm_converter;

#[cfg(feature = "core-decoder")]
mod symphonia;

#[cfg(feature = "core-decoder")]
pub use self::symphonia::{SymphoniaDecoder, PACKET_LOOKAHEAD, PROBE_LOOKAHEAD};

#[cfg(feature = "core-decoder")]
pub use format_detector::FormatDetector;

#[cfg(feature = "core-decoder")]
pub use pcm_converter::PcmConverter;

#[cfg(not(feature = "core-decoder"))]
compile_error!(
    "Audio decoder feature is not enabled. Enable one of: \
     'decoder-mp3', 'decoder-flac', 'decoder-vorbis', 'decoder-opus', \
     'decoder-aac', 'decoder-wav', 'decoder-alac', or 'decoder-all'"
);
