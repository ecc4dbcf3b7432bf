//! # Decode Stream
//!
//! Turns a stream of encoded audio chunks, split at arbitrary boundaries, into
//! a stream of interleaved s16le PCM chunks.
//!
//! ## Overview
//!
//! - [`DecodeStage`] is the synchronous state machine: it feeds chunks to a
//!   [`CodecEngine`](core_decoder::CodecEngine), records the stream's channel
//!   count and sample rate from the first decoded sample, fires the one-shot
//!   metadata callback, and releases the engine exactly once.
//! - [`DecoderStream`] adapts a stage to [`futures::Stream`], pulling from the
//!   upstream only as fast as the consumer pulls PCM.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use core_stream::{DecoderStream, DecoderStreamOptions};
//! use futures::{stream, StreamExt};
//!
//! # async fn example(chunks: Vec<Bytes>) -> core_stream::Result<()> {
//! let options = DecoderStreamOptions::default()
//!     .with_mime_type("audio/mpeg")
//!     .on_metadata_detected(|_, channels, rate| {
//!         println!("{channels}ch @ {rate} Hz");
//!         Ok(())
//!     });
//!
//! let mut pcm = DecoderStream::new(stream::iter(chunks.into_iter().map(Ok)), options)?;
//! while let Some(chunk) = pcm.next().await {
//!     let chunk = chunk?;
//!     // hand chunk to the audio sink
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod metadata;
pub mod options;
pub mod stage;
pub mod stream;

pub use error::{BoxError, DecodePhase, ErrorKind, Result, StreamError};
pub use metadata::{AudioProperties, StageMetadata};
pub use options::{DecoderStreamOptions, MetadataCallback};
pub use stage::{DecodeStage, StageState};
pub use stream::DecoderStream;
