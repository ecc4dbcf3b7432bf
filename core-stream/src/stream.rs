//! # Decoder Stream
//!
//! Pull-based [`Stream`] adapter running a [`DecodeStage`] over an upstream
//! stream of encoded chunks.
//!
//! The upstream is only polled when the consumer polls and the previous chunk
//! produced no output, so encoded input is never requested faster than PCM is
//! drained.

use crate::error::{Result, StreamError};
use crate::metadata::StageMetadata;
use crate::options::DecoderStreamOptions;
use crate::stage::DecodeStage;
use bytes::{Bytes, BytesMut};
use core_decoder::{CodecEngine, DecoderConfig, SymphoniaDecoder};
use futures::stream::{FusedStream, Stream, StreamExt};
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tracing::debug;

/// Stream of PCM chunks decoded from an upstream stream of encoded chunks.
///
/// Yields `Ok(pcm)` for every non-empty PCM chunk. The stream ends either
/// cleanly (`None` after the engine is finalized and closed) or with exactly
/// one `Err`, after which it is fused.
///
/// # Example
///
/// ```rust,no_run
/// use bytes::Bytes;
/// use core_stream::{DecoderStream, DecoderStreamOptions};
/// use futures::stream;
///
/// # async fn example(chunks: Vec<Bytes>) -> core_stream::Result<()> {
/// let upstream = stream::iter(chunks.into_iter().map(Ok));
/// let mut decoded = DecoderStream::new(upstream, DecoderStreamOptions::default())?;
///
/// let pcm = decoded.collect_pcm().await?;
/// println!("{} bytes at {:?} Hz", pcm.len(), decoded.sample_rate());
/// # Ok(())
/// # }
/// ```
pub struct DecoderStream<S, E: CodecEngine = SymphoniaDecoder> {
    upstream: S,
    stage: DecodeStage<E>,
    /// Close failure waiting to be yielded after the final PCM chunk
    pending_error: Option<StreamError>,
    done: bool,
}

impl<S> DecoderStream<S, SymphoniaDecoder>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    /// Decode `upstream` with the symphonia engine.
    pub fn new(upstream: S, options: DecoderStreamOptions) -> Result<Self> {
        Ok(Self::from_stage(upstream, DecodeStage::new(options)?))
    }
}

impl<S, E> DecoderStream<S, E>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
    E: CodecEngine + Unpin,
{
    /// Decode `upstream` with an engine built by `factory`.
    pub fn with_engine<F>(upstream: S, options: DecoderStreamOptions, factory: F) -> Result<Self>
    where
        F: FnOnce(&DecoderConfig) -> core_decoder::Result<E>,
    {
        Ok(Self::from_stage(
            upstream,
            DecodeStage::with_engine(options, factory)?,
        ))
    }

    /// Wrap an already constructed stage.
    pub fn from_stage(upstream: S, stage: DecodeStage<E>) -> Self {
        Self {
            upstream,
            stage,
            pending_error: None,
            done: false,
        }
    }

    /// Cancel decoding from outside.
    ///
    /// Releases the engine and ends the stream. The merge policy of
    /// [`DecodeStage::on_destroy`] decides which error, if any, is returned.
    /// Without a `reason`, a close failure not yet yielded is returned here.
    pub fn destroy(&mut self, reason: Option<StreamError>) -> Result<()> {
        self.done = true;
        let pending = self.pending_error.take();

        match (self.stage.on_destroy(reason), pending) {
            (Ok(()), Some(err)) => Err(err),
            (result, _) => result,
        }
    }

    /// Drain the stream into one contiguous PCM buffer.
    pub async fn collect_pcm(&mut self) -> Result<BytesMut> {
        let mut pcm = BytesMut::new();

        while let Some(chunk) = self.next().await {
            pcm.extend_from_slice(&chunk?);
        }

        Ok(pcm)
    }

    /// Channel count of the decoded stream, once detected.
    pub fn channel_count(&self) -> Option<u32> {
        self.stage.channel_count()
    }

    /// Sample rate in Hz of the decoded stream, once detected.
    pub fn sample_rate(&self) -> Option<u32> {
        self.stage.sample_rate()
    }

    /// Stream metadata as recorded by the stage.
    pub fn metadata(&self) -> StageMetadata {
        self.stage.metadata()
    }

    /// The underlying decode stage.
    pub fn stage(&self) -> &DecodeStage<E> {
        &self.stage
    }

    /// Flush, finalize and close once the upstream has ended.
    fn finish(&mut self) -> Option<Result<Bytes>> {
        self.done = true;

        let output = match self.stage.on_end_of_input() {
            Ok(output) => output,
            Err(e) => return Some(Err(e)),
        };

        if let Err(e) = self.stage.close() {
            self.pending_error = Some(e);
        }

        match output {
            Some(pcm) if !pcm.is_empty() => Some(Ok(pcm)),
            _ => self.pending_error.take().map(Err),
        }
    }
}

impl<S, E> Stream for DecoderStream<S, E>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
    E: CodecEngine + Unpin,
{
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        if let Some(err) = this.pending_error.take() {
            return Poll::Ready(Some(Err(err)));
        }

        if this.done {
            return Poll::Ready(None);
        }

        loop {
            match ready!(Pin::new(&mut this.upstream).poll_next(cx)) {
                Some(Ok(chunk)) => match this.stage.on_chunk(&chunk) {
                    Ok(Some(pcm)) if !pcm.is_empty() => return Poll::Ready(Some(Ok(pcm))),
                    Ok(_) => continue,
                    Err(e) => {
                        this.done = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                Some(Err(e)) => {
                    debug!("Upstream failed: {}", e);
                    this.done = true;
                    let err = this.stage.abort(StreamError::Upstream(e));
                    return Poll::Ready(Some(Err(err)));
                }
                None => return Poll::Ready(this.finish()),
            }
        }
    }
}

impl<S, E> FusedStream for DecoderStream<S, E>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
    E: CodecEngine + Unpin,
{
    fn is_terminated(&self) -> bool {
        self.done && self.pending_error.is_none()
    }
}

impl<S, E: CodecEngine> std::fmt::Debug for DecoderStream<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderStream")
            .field("stage", &self.stage)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
