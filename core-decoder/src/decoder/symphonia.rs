//! Symphonia-backed push decoder.

use super::{FormatDetector, PcmConverter};
use crate::config::DecoderConfig;
use crate::error::{DecoderError, Result};
use crate::stream_buffer::StreamBuffer;
use crate::traits::{AudioCodec, CodecEngine, DecodedSample};
use bytes::BytesMut;
use std::fmt;
use symphonia::core::audio::SignalSpec;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions, ReadOnlySource};
use symphonia::core::meta::{Limit, MetadataOptions};
use symphonia::core::probe::ProbeResult;
use tracing::{debug, error, info, instrument, warn};

/// Unread bytes that must be buffered before a packet is read mid-stream.
///
/// A packet is only pulled while at least this many bytes are available, so
/// packets up to this size never straddle an input boundary.
pub const PACKET_LOOKAHEAD: usize = 32 * 1024;

/// Buffered bytes required before the container is probed mid-stream.
///
/// A failed mid-stream probe is retried once this many more bytes arrive.
pub const PROBE_LOOKAHEAD: usize = 16 * 1024;

/// Consecutive packet failures tolerated before decoding is abandoned.
const MAX_CONSECUTIVE_ERRORS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpMode {
    /// Input may continue; keep a lookahead margin in the buffer.
    Lookahead,
    /// Input is complete; decode until the buffer is exhausted.
    Drain,
}

#[allow(clippy::large_enum_variant)]
enum DecoderState {
    /// Container not identified yet.
    Pending,
    Decoding(Box<ActiveDecoder>),
    Closed,
}

/// Format reader and codec for the selected track.
struct ActiveDecoder {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    codec: AudioCodec,
}

impl ActiveDecoder {
    fn open(probed: ProbeResult) -> Result<Self> {
        let format_reader = probed.format;

        debug!(tracks = format_reader.tracks().len(), "Discovered tracks");

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                error!("No supported audio tracks found");
                DecoderError::FormatNotDecodable("No supported audio tracks".to_string())
            })?;

        let track_id = track.id;
        let codec = FormatDetector::detect_codec(track.codec_params.codec);
        FormatDetector::validate_codec_support(&codec)?;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| {
                error!("Failed to create decoder: {}", e);
                DecoderError::UnsupportedCodec(format!("Failed to create codec decoder: {}", e))
            })?;

        info!(
            track_id,
            codec = ?codec,
            lossless = codec.is_lossless(),
            "Selected track"
        );

        Ok(Self {
            format_reader,
            decoder,
            track_id,
            codec,
        })
    }
}

/// Push-driven decoder for any container/codec symphonia supports.
///
/// Bytes passed to [`append`](CodecEngine::append) accumulate in a shared
/// [`StreamBuffer`]. Once enough input is buffered the container is probed,
/// the first decodable track is selected, and packets are decoded whenever a
/// lookahead margin of unread input remains. [`flush`](CodecEngine::flush)
/// drops the margin and decodes everything that is left.
///
/// ## Usage Example
///
/// ```rust,no_run
/// use core_decoder::{CodecEngine, DecoderConfig, SymphoniaDecoder};
///
/// # fn example(chunks: Vec<Vec<u8>>) -> core_decoder::Result<()> {
/// let config = DecoderConfig::default().with_file_extension("mp3");
/// let mut decoder = SymphoniaDecoder::new(config)?;
///
/// for chunk in &chunks {
///     if let Some(sample) = decoder.append(chunk)? {
///         println!("{} frames at {} Hz", sample.frames(), sample.sample_rate);
///     }
/// }
/// let tail = decoder.flush()?;
/// decoder.finalize()?;
/// decoder.close()?;
/// # Ok(())
/// # }
/// ```
pub struct SymphoniaDecoder {
    config: DecoderConfig,
    buffer: StreamBuffer,
    state: DecoderState,
    converter: PcmConverter,
    /// End of input has been signalled
    finalized: bool,
    /// Unread bytes required before mid-stream packet reads
    lookahead: usize,
    /// Bytes between mid-stream probe attempts
    probe_step: usize,
    /// Retained size at which the next mid-stream probe is attempted
    next_probe_at: usize,
    /// Total frames produced so far
    frames_decoded: u64,
}

impl SymphoniaDecoder {
    /// Create a new decoder from the given configuration.
    ///
    /// No bytes are read until the first `append()`.
    ///
    /// # Errors
    ///
    /// Returns [`DecoderError::InvalidConfig`] if the configuration fails validation.
    #[instrument(skip_all)]
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate().map_err(DecoderError::InvalidConfig)?;

        // Half the mark leaves room for new input once a pump settles.
        let lookahead = config
            .buffer_limit()
            .map_or(PACKET_LOOKAHEAD, |limit| (limit / 2).clamp(1, PACKET_LOOKAHEAD));

        info!(
            gapless = config.enable_gapless,
            extension = ?config.file_extension,
            mime_type = ?config.mime_type,
            high_water_mark = ?config.high_water_mark,
            "Creating Symphonia decoder"
        );

        Ok(Self {
            buffer: StreamBuffer::new(),
            config,
            state: DecoderState::Pending,
            converter: PcmConverter::new(),
            finalized: false,
            lookahead,
            probe_step: PROBE_LOOKAHEAD.min(lookahead),
            next_probe_at: PROBE_LOOKAHEAD.min(lookahead),
            frames_decoded: 0,
        })
    }

    /// Configuration this decoder was built with.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Codec of the selected track, once the container has been identified.
    pub fn codec(&self) -> Option<&AudioCodec> {
        match &self.state {
            DecoderState::Decoding(active) => Some(&active.codec),
            _ => None,
        }
    }

    /// Returns `true` once the container has been identified.
    pub fn is_probed(&self) -> bool {
        matches!(self.state, DecoderState::Decoding(_))
    }

    /// Returns `true` after `close()`.
    pub fn is_closed(&self) -> bool {
        matches!(self.state, DecoderState::Closed)
    }

    /// Total frames decoded since creation.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Encoded bytes currently held in memory.
    pub fn buffered_bytes(&self) -> usize {
        self.buffer.retained()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(DecoderError::Closed);
        }
        Ok(())
    }

    /// Try to identify the container from the buffered bytes.
    ///
    /// Returns `Ok(true)` once a track decoder is ready.
    fn try_probe(&mut self, mode: PumpMode) -> Result<bool> {
        let retained = self.buffer.retained();

        if retained == 0 {
            return Ok(false);
        }

        if mode == PumpMode::Lookahead && retained < self.next_probe_at {
            return Ok(false);
        }

        debug!(retained, ?mode, "Probing container");

        self.buffer.rewind();
        let source = ReadOnlySource::new(self.buffer.reader());
        let mss = MediaSourceStream::new(Box::new(source), MediaSourceStreamOptions::default());

        let hint = FormatDetector::hint_from_config(&self.config);
        let format_options = FormatOptions {
            enable_gapless: self.config.enable_gapless,
            ..Default::default()
        };
        let metadata_options = MetadataOptions {
            limit_visual_bytes: Limit::Maximum(0),
            ..Default::default()
        };

        match symphonia::default::get_probe().format(&hint, mss, &format_options, &metadata_options)
        {
            Ok(probed) => {
                let active = ActiveDecoder::open(probed)?;
                self.state = DecoderState::Decoding(Box::new(active));
                Ok(true)
            }
            Err(e) if mode == PumpMode::Lookahead => {
                debug!(retained, error = %e, "Probe needs more data");
                self.buffer.rewind();
                self.next_probe_at = retained + self.probe_step;
                Ok(false)
            }
            Err(e) => {
                error!("Format probe failed: {}", e);
                Err(DecoderError::InvalidFormat(format!(
                    "Failed to probe format: {}",
                    e
                )))
            }
        }
    }

    /// Decode as many packets as `mode` allows into at most one sample.
    #[instrument(skip(self), level = "trace")]
    fn pump(&mut self, mode: PumpMode) -> Result<Option<DecodedSample>> {
        if matches!(self.state, DecoderState::Pending) && !self.try_probe(mode)? {
            return Ok(None);
        }

        let DecoderState::Decoding(active) = &mut self.state else {
            return Ok(None);
        };

        let mut pcm = BytesMut::new();
        let mut spec: Option<SignalSpec> = None;
        let mut consecutive_errors = 0;

        loop {
            if mode == PumpMode::Lookahead && self.buffer.unread() < self.lookahead {
                break;
            }

            let packet = match active.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // Buffered input exhausted
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    // Track list changed (rare, e.g., chained OGG streams)
                    warn!("Decoder reset required for track list change");
                    active.decoder.reset();
                    break;
                }
                Err(SymphoniaError::IoError(e)) => {
                    error!("I/O error reading packet: {}", e);
                    return Err(DecoderError::Io(e));
                }
                Err(e) => {
                    error!("Fatal format reader error: {}", e);
                    return Err(DecoderError::DecodingError(format!(
                        "Failed to read packet: {}",
                        e
                    )));
                }
            };

            // Consume any new metadata that was read with this packet
            while !active.format_reader.metadata().is_latest() {
                active.format_reader.metadata().pop();
            }

            if packet.track_id() != active.track_id {
                continue;
            }

            match active.decoder.decode(&packet) {
                Ok(decoded) => {
                    consecutive_errors = 0;

                    let decoded_spec = *decoded.spec();
                    match spec {
                        Some(current) if current != decoded_spec => {
                            return Err(DecoderError::FormatChanged(format!(
                                "{:?} != {:?}",
                                current, decoded_spec
                            )));
                        }
                        Some(_) => {}
                        None => spec = Some(decoded_spec),
                    }

                    let frames = self.converter.append_interleaved(decoded, &mut pcm);
                    self.frames_decoded += frames as u64;
                }
                Err(SymphoniaError::DecodeError(err)) => {
                    // Skip decode error - invalid codec data
                    consecutive_errors += 1;
                    warn!(
                        "Skipping packet with decode error (attempt {}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, err
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("Too many consecutive decode errors, codec may be incompatible");
                        return Err(DecoderError::DecodingError(format!(
                            "Decoder failure after {} failed packets: {}",
                            MAX_CONSECUTIVE_ERRORS, err
                        )));
                    }
                }
                Err(SymphoniaError::IoError(err)) => {
                    // Skip corrupted packet - I/O errors during decode
                    consecutive_errors += 1;
                    warn!(
                        "Skipping corrupted packet (I/O error, attempt {}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, err
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("Too many consecutive decode errors, stream may be corrupted");
                        return Err(DecoderError::CorruptedStream(format!(
                            "Stream corruption after {} failed packets",
                            MAX_CONSECUTIVE_ERRORS
                        )));
                    }
                }
                Err(e) => {
                    error!("Fatal decode error: {}", e);
                    return Err(DecoderError::DecodingError(format!(
                        "Failed to decode packet: {}",
                        e
                    )));
                }
            }
        }

        let released = self.buffer.compact();

        let Some(spec) = spec else {
            debug!(released, "No complete packets available");
            return Ok(None);
        };

        if pcm.is_empty() {
            return Ok(None);
        }

        let sample = DecodedSample::new(spec.channels.count() as u32, spec.rate, pcm.freeze());

        debug!(
            frames = sample.frames(),
            channels = sample.channel_count,
            sample_rate = sample.sample_rate,
            released,
            "Produced decoded sample"
        );

        Ok(Some(sample))
    }
}

impl CodecEngine for SymphoniaDecoder {
    #[instrument(skip_all, fields(len = chunk.len()))]
    fn append(&mut self, chunk: &[u8]) -> Result<Option<DecodedSample>> {
        self.ensure_open()?;

        if self.finalized {
            return Err(DecoderError::Finalized);
        }

        let retained = self.buffer.push(chunk);
        debug!(retained, "Appended encoded bytes");

        self.pump(PumpMode::Lookahead)
    }

    #[instrument(skip_all)]
    fn flush(&mut self) -> Result<Option<DecodedSample>> {
        self.ensure_open()?;

        debug!(buffered = self.buffer.retained(), "Flushing decoder");
        self.pump(PumpMode::Drain)
    }

    #[instrument(skip_all)]
    fn finalize(&mut self) -> Result<()> {
        self.ensure_open()?;

        if !self.finalized {
            self.finalized = true;
            debug!(frames = self.frames_decoded, "Decoder finalized");
        }

        Ok(())
    }

    #[instrument(skip_all)]
    fn close(&mut self) -> Result<()> {
        self.ensure_open()?;

        self.state = DecoderState::Closed;
        self.buffer.clear();

        info!(frames = self.frames_decoded, "Decoder closed");
        Ok(())
    }
}

impl fmt::Debug for SymphoniaDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymphoniaDecoder")
            .field("config", &self.config)
            .field("codec", &self.codec())
            .field("buffer", &self.buffer)
            .field("finalized", &self.finalized)
            .field("frames_decoded", &self.frames_decoded)
            .finish_non_exhaustive()
    }
}
