//! Tests for the symphonia-backed codec engine
//!
//! Inputs are PCM WAV files generated in memory, so decoded output can be
//! compared byte for byte with the samples that were encoded.

use core_decoder::{
    AudioCodec, CodecEngine, DecodedSample, DecoderConfig, DecoderError, PcmConverter,
    SymphoniaDecoder,
};

fn pcm_samples(frames: usize, channels: u16) -> Vec<i16> {
    (0..frames * channels as usize)
        .map(|i| ((i * 31 + (i % channels as usize) * 7) % 2000) as i16 - 1000)
        .collect()
}

/// Build a canonical 44-byte-header s16le WAV file.
fn wav_file(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
    let data = PcmConverter::encode_s16le(samples);
    let block_align = channels * 2;
    let byte_rate = sample_rate * block_align as u32;

    let mut out = Vec::with_capacity(44 + data.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&data);
    out
}

/// Feed `input` in `chunk_size` pieces and collect every sample produced.
fn decode_in_chunks(
    config: DecoderConfig,
    input: &[u8],
    chunk_size: usize,
) -> Result<Vec<DecodedSample>, DecoderError> {
    let mut decoder = SymphoniaDecoder::new(config)?;
    let mut samples = Vec::new();

    for chunk in input.chunks(chunk_size) {
        samples.extend(decoder.append(chunk)?);
    }
    samples.extend(decoder.flush()?);
    decoder.finalize()?;
    decoder.close()?;

    Ok(samples)
}

fn concat(samples: &[DecodedSample]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.data.iter().copied()).collect()
}

#[test]
fn test_whole_file_decodes_to_original_pcm() {
    let pcm = pcm_samples(44100, 2);
    let wav = wav_file(&pcm, 2, 44100);

    let samples = decode_in_chunks(DecoderConfig::default(), &wav, wav.len()).unwrap();

    assert!(!samples.is_empty());
    for sample in &samples {
        assert_eq!(sample.channel_count, 2);
        assert_eq!(sample.sample_rate, 44100);
        assert!(!sample.is_empty());
    }
    assert_eq!(concat(&samples), PcmConverter::encode_s16le(&pcm));
}

#[test]
fn test_chunk_boundaries_do_not_change_output() {
    let pcm = pcm_samples(30000, 2);
    let wav = wav_file(&pcm, 2, 44100);
    let expected = PcmConverter::encode_s16le(&pcm);

    for chunk_size in [1, 997, 4096, wav.len()] {
        let samples = decode_in_chunks(DecoderConfig::default(), &wav, chunk_size)
            .unwrap_or_else(|e| panic!("chunk size {chunk_size} failed: {e}"));
        assert_eq!(
            concat(&samples),
            &expected[..],
            "output differs for chunk size {chunk_size}"
        );
    }
}

#[test]
fn test_large_input_produces_output_before_flush() {
    let pcm = pcm_samples(44100, 2);
    let wav = wav_file(&pcm, 2, 44100);

    let mut decoder = SymphoniaDecoder::new(DecoderConfig::default()).unwrap();
    let mut produced_early = 0;
    for chunk in wav.chunks(4096) {
        if let Some(sample) = decoder.append(chunk).unwrap() {
            produced_early += sample.data.len();
        }
    }

    assert!(decoder.is_probed());
    assert_eq!(decoder.codec(), Some(&AudioCodec::Wav));
    assert!(produced_early > 0);

    let tail = decoder.flush().unwrap().map_or(0, |s| s.data.len());
    assert_eq!(produced_early + tail, pcm.len() * 2);
    assert_eq!(decoder.frames_decoded(), 44100);
}

#[test]
fn test_mono_stream_reports_its_properties() {
    let pcm = pcm_samples(22050, 1);
    let wav = wav_file(&pcm, 1, 22050);

    let samples = decode_in_chunks(DecoderConfig::default(), &wav, 1500).unwrap();

    assert!(samples
        .iter()
        .all(|s| s.channel_count == 1 && s.sample_rate == 22050));
    let total_frames: usize = samples.iter().map(DecodedSample::frames).sum();
    assert_eq!(total_frames, 22050);
}

#[test]
fn test_hints_and_gapless_are_accepted() {
    let pcm = pcm_samples(4000, 2);
    let wav = wav_file(&pcm, 2, 48000);
    let config = DecoderConfig::default()
        .with_gapless(true)
        .with_file_extension("wav")
        .with_mime_type("audio/wav");

    let samples = decode_in_chunks(config, &wav, 512).unwrap();
    assert_eq!(concat(&samples), PcmConverter::encode_s16le(&pcm));
}

#[test]
fn test_bounded_buffer_streams_within_limit() {
    let pcm = pcm_samples(44100, 2);
    let wav = wav_file(&pcm, 2, 44100);
    let config = DecoderConfig::default().with_high_water_mark(64 * 1024);

    let samples = decode_in_chunks(config, &wav, 4096).unwrap();
    assert_eq!(concat(&samples), PcmConverter::encode_s16le(&pcm));
}

#[test]
fn test_high_water_mark_does_not_depend_on_chunking() {
    let pcm = pcm_samples(20000, 2);
    let wav = wav_file(&pcm, 2, 44100);
    let expected = PcmConverter::encode_s16le(&pcm);
    let config = DecoderConfig::default().with_high_water_mark(16 * 1024);

    for chunk_size in [1024, 64 * 1024, wav.len()] {
        let samples = decode_in_chunks(config.clone(), &wav, chunk_size).unwrap();
        assert_eq!(concat(&samples), expected, "chunk size {chunk_size}");
    }
}

#[test]
fn test_oversized_chunk_settles_below_high_water_mark() {
    let pcm = pcm_samples(20000, 2);
    let wav = wav_file(&pcm, 2, 44100);
    let mut decoder =
        SymphoniaDecoder::new(DecoderConfig::default().with_high_water_mark(16 * 1024)).unwrap();

    let head = decoder.append(&wav).unwrap().expect("pcm before flush");
    assert!(decoder.is_probed());
    assert!(decoder.buffered_bytes() < 16 * 1024);

    let mut samples = vec![head];
    samples.extend(decoder.flush().unwrap());
    assert_eq!(concat(&samples), PcmConverter::encode_s16le(&pcm));
}

#[test]
fn test_truncated_header_is_a_format_error() {
    let wav = wav_file(&pcm_samples(100, 2), 2, 44100);

    let err = decode_in_chunks(DecoderConfig::default(), &wav[..20], 20).unwrap_err();
    assert!(err.is_format_error(), "unexpected error: {err}");
}

#[test]
fn test_append_after_finalize_fails() {
    let wav = wav_file(&pcm_samples(100, 2), 2, 44100);
    let mut decoder = SymphoniaDecoder::new(DecoderConfig::default()).unwrap();

    decoder.append(&wav).unwrap();
    decoder.flush().unwrap();
    decoder.finalize().unwrap();

    let err = decoder.append(&wav).unwrap_err();
    assert!(matches!(err, DecoderError::Finalized));
    assert!(err.is_state_error());
}

#[test]
fn test_second_close_fails() {
    let mut decoder = SymphoniaDecoder::new(DecoderConfig::default()).unwrap();

    decoder.close().unwrap();
    assert_eq!(decoder.buffered_bytes(), 0);

    let err = decoder.close().unwrap_err();
    assert!(matches!(err, DecoderError::Closed));
}

#[test]
fn test_close_mid_stream_releases_buffer() {
    let wav = wav_file(&pcm_samples(1000, 2), 2, 44100);
    let mut decoder = SymphoniaDecoder::new(DecoderConfig::default()).unwrap();

    decoder.append(&wav[..1000]).unwrap();
    assert_eq!(decoder.buffered_bytes(), 1000);

    decoder.close().unwrap();
    assert!(decoder.is_closed());
    assert_eq!(decoder.buffered_bytes(), 0);
}
