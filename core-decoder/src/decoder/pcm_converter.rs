//! # PCM Converter
//!
//! Converts decoded audio buffers into interleaved signed 16-bit little-endian
//! bytes.

use crate::traits::BYTES_PER_SAMPLE;
use bytes::{BufMut, Bytes, BytesMut};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer, SignalSpec};

/// Converter that normalizes audio to interleaved s16le bytes.
///
/// Symphonia outputs audio in various formats (u8, i16, i24, i32, f32, f64)
/// and planar layout. Symphonia's own sample conversion handles scaling and
/// clipping; this type interleaves the result and serializes it. The
/// intermediate sample buffer is reused while the signal spec and packet
/// capacity allow it.
#[derive(Default)]
pub struct PcmConverter {
    scratch: Option<SampleBuffer<i16>>,
    scratch_spec: Option<SignalSpec>,
}

impl PcmConverter {
    /// Create a converter with no scratch buffer allocated yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the interleaved s16le form of `decoded` to `out`.
    ///
    /// Returns the number of frames written.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let decoded = decoder.decode(&packet)?;
    /// let frames = converter.append_interleaved(decoded, &mut pcm);
    /// ```
    pub fn append_interleaved(&mut self, decoded: AudioBufferRef<'_>, out: &mut BytesMut) -> usize {
        let spec = *decoded.spec();
        let capacity = decoded.capacity();
        let frames = decoded.frames();

        let reusable = matches!(
            (&self.scratch, self.scratch_spec),
            (Some(scratch), Some(scratch_spec))
                if scratch_spec == spec && scratch.capacity() >= capacity * spec.channels.count()
        );

        if !reusable {
            self.scratch = Some(SampleBuffer::<i16>::new(capacity as u64, spec));
            self.scratch_spec = Some(spec);
        }

        let Some(scratch) = self.scratch.as_mut() else {
            return 0;
        };

        scratch.copy_interleaved_ref(decoded);
        Self::write_s16le(scratch.samples(), out);

        frames
    }

    /// Serialize samples as little-endian bytes into `out`.
    pub fn write_s16le(samples: &[i16], out: &mut BytesMut) {
        out.reserve(samples.len() * BYTES_PER_SAMPLE);
        for &sample in samples {
            out.put_i16_le(sample);
        }
    }

    /// Serialize samples as little-endian bytes.
    pub fn encode_s16le(samples: &[i16]) -> Bytes {
        let mut out = BytesMut::with_capacity(samples.len() * BYTES_PER_SAMPLE);
        Self::write_s16le(samples, &mut out);
        out.freeze()
    }
}
