//! Tests for the decode stage state machine
//!
//! The codec engine is replaced with a mockall double so close calls can be
//! counted exactly on every exit path.

use bytes::Bytes;
use core_decoder::{CodecEngine, DecodedSample, DecoderError};
use core_stream::{
    AudioProperties, DecodePhase, DecodeStage, DecoderStreamOptions, ErrorKind, StageMetadata, StageState,
    StreamError,
};
use mockall::mock;
use parking_lot::Mutex;
use std::error::Error as _;
use std::sync::Arc;

mock! {
    pub Engine {}

    impl CodecEngine for Engine {
        fn append(&mut self, chunk: &[u8]) -> core_decoder::Result<Option<DecodedSample>>;
        fn flush(&mut self) -> core_decoder::Result<Option<DecodedSample>>;
        fn finalize(&mut self) -> core_decoder::Result<()>;
        fn close(&mut self) -> core_decoder::Result<()>;
    }
}

const N: usize = 4096;

fn stereo_sample() -> DecodedSample {
    DecodedSample::new(2, 44100, vec![7u8; N])
}

fn build(engine: MockEngine, options: DecoderStreamOptions) -> DecodeStage<MockEngine> {
    DecodeStage::with_engine(options, |_| Ok(engine)).unwrap()
}

/// Engine whose first append yields one stereo sample and nothing after.
fn first_append_engine(appends: usize) -> MockEngine {
    let mut engine = MockEngine::new();
    let mut calls = 0;
    engine.expect_append().times(appends).returning(move |_| {
        calls += 1;
        if calls == 1 {
            Ok(Some(stereo_sample()))
        } else {
            Ok(None)
        }
    });
    engine
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Metadata(u32, u32),
    Output(usize),
    End,
}

#[test]
fn test_three_chunks_emit_metadata_then_one_output() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let callback_events = Arc::clone(&events);

    let mut engine = first_append_engine(3);
    engine.expect_flush().times(1).returning(|| Ok(None));
    engine.expect_finalize().times(1).returning(|| Ok(()));
    engine.expect_close().times(1).returning(|| Ok(()));

    let options = DecoderStreamOptions::default().on_metadata_detected(move |_, channels, rate| {
        callback_events.lock().push(Event::Metadata(channels, rate));
        Ok(())
    });
    let mut stage = build(engine, options);

    for chunk in [&b"one"[..], b"two", b"three"] {
        if let Some(pcm) = stage.on_chunk(chunk).unwrap() {
            events.lock().push(Event::Output(pcm.len()));
        }
    }
    if let Some(pcm) = stage.on_end_of_input().unwrap() {
        events.lock().push(Event::Output(pcm.len()));
    }
    stage.close().unwrap();
    events.lock().push(Event::End);

    assert_eq!(
        *events.lock(),
        vec![Event::Metadata(2, 44100), Event::Output(N), Event::End]
    );
    assert_eq!(stage.state(), StageState::Closed);
    assert!(!stage.is_errored());
}

#[test]
fn test_accessors_before_and_after_detection() {
    let mut engine = MockEngine::new();
    let mut calls = 0;
    engine.expect_append().times(3).returning(move |_| {
        calls += 1;
        match calls {
            1 => Ok(None),
            2 => Ok(Some(DecodedSample::new(1, 22050, vec![0u8; 10]))),
            _ => Ok(Some(DecodedSample::new(2, 48000, vec![0u8; 10]))),
        }
    });
    engine.expect_close().times(1).returning(|| Ok(()));

    let mut stage = build(engine, DecoderStreamOptions::default());

    stage.on_chunk(b"header").unwrap();
    assert_eq!(stage.channel_count(), None);
    assert_eq!(stage.sample_rate(), None);
    assert_eq!(stage.metadata(), StageMetadata::Unset);

    stage.on_chunk(b"frame").unwrap();
    assert_eq!(stage.channel_count(), Some(1));
    assert_eq!(stage.sample_rate(), Some(22050));

    // A later sample reporting different values does not change the metadata
    stage.on_chunk(b"frame").unwrap();
    assert_eq!(stage.metadata().as_pair(), Some((1, 22050)));
}

#[test]
fn test_callback_fires_once_and_matches_properties() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);

    let mut engine = MockEngine::new();
    engine
        .expect_append()
        .times(4)
        .returning(|_| Ok(Some(stereo_sample())));
    engine.expect_close().times(1).returning(|| Ok(()));

    let options = DecoderStreamOptions::default().on_metadata_detected(move |stage, channels, rate| {
        recorded.lock().push((
            channels,
            rate,
            stage.channel_count(),
            stage.sample_rate(),
        ));
        Ok(())
    });
    let mut stage = build(engine, options);

    for _ in 0..4 {
        assert!(stage.on_chunk(b"x").unwrap().is_some());
    }

    assert_eq!(*calls.lock(), vec![(2, 44100, Some(2), Some(44100))]);
}

#[test]
fn test_callback_failure_is_a_decode_error() {
    let mut engine = first_append_engine(1);
    engine.expect_close().times(1).returning(|| Ok(()));

    let options = DecoderStreamOptions::default()
        .on_metadata_detected(|_, _, _| Err("sink rejected format".into()));
    let mut stage = build(engine, options);

    let err = stage.on_chunk(b"x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(err.decode_phase(), Some(DecodePhase::Append));
    assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("sink rejected format"));

    assert!(stage.is_errored());
    assert!(stage.is_closed());
    // Metadata was recorded before the callback ran
    assert_eq!(stage.metadata().as_pair(), Some((2, 44100)));
}

#[test]
fn test_close_once_on_normal_completion() {
    let mut engine = MockEngine::new();
    engine.expect_append().times(1).returning(|_| Ok(None));
    engine.expect_flush().times(1).returning(|| Ok(Some(stereo_sample())));
    engine.expect_finalize().times(1).returning(|| Ok(()));
    engine.expect_close().times(1).returning(|| Ok(()));

    let mut stage = build(engine, DecoderStreamOptions::default());
    assert!(stage.on_chunk(b"x").unwrap().is_none());
    assert_eq!(stage.on_end_of_input().unwrap(), Some(Bytes::from(vec![7u8; N])));
    stage.close().unwrap();
    drop(stage);
}

#[test]
fn test_close_once_on_decode_failure() {
    let mut engine = MockEngine::new();
    engine
        .expect_append()
        .times(1)
        .returning(|_| Err(DecoderError::CorruptedStream("bad frame".into())));
    engine.expect_close().times(1).returning(|| Ok(()));

    let mut stage = build(engine, DecoderStreamOptions::default());

    let err = stage.on_chunk(b"x").unwrap_err();
    assert_eq!(err.decode_phase(), Some(DecodePhase::Append));
    assert!(stage.is_errored());

    // No further chunk processing after an error
    let err = stage.on_chunk(b"y").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let err = stage.on_end_of_input().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    stage.on_destroy(None).unwrap();
    drop(stage);
}

#[test]
fn test_flush_failure_is_a_flush_decode_error() {
    let mut engine = MockEngine::new();
    engine
        .expect_flush()
        .times(1)
        .returning(|| Err(DecoderError::InvalidFormat("no sync".into())));
    engine.expect_finalize().never();
    engine.expect_close().times(1).returning(|| Ok(()));

    let mut stage = build(engine, DecoderStreamOptions::default());

    let err = stage.on_end_of_input().unwrap_err();
    assert_eq!(err.decode_phase(), Some(DecodePhase::Flush));
    assert!(stage.is_closed());
}

#[test]
fn test_finalize_failure_is_a_finalize_error() {
    let mut engine = MockEngine::new();
    engine.expect_flush().times(1).returning(|| Ok(None));
    engine
        .expect_finalize()
        .times(1)
        .returning(|| Err(DecoderError::Internal("trailer".into())));
    engine.expect_close().times(1).returning(|| Ok(()));

    let mut stage = build(engine, DecoderStreamOptions::default());

    let err = stage.on_end_of_input().unwrap_err();
    assert!(matches!(err, StreamError::Finalize(DecoderError::Internal(_))));
    assert_eq!(stage.state(), StageState::Closed);
}

#[test]
fn test_close_once_on_destroy_without_error() {
    let mut engine = MockEngine::new();
    engine.expect_close().times(1).returning(|| Ok(()));

    let mut stage = build(engine, DecoderStreamOptions::default());
    stage.on_destroy(None).unwrap();
    stage.on_destroy(None).unwrap();
    assert_eq!(stage.state(), StageState::Closed);
    assert!(!stage.is_errored());
}

#[test]
fn test_close_once_on_destroy_with_error() {
    let mut engine = MockEngine::new();
    engine.expect_close().times(1).returning(|| Ok(()));

    let mut stage = build(engine, DecoderStreamOptions::default());
    let reason = StreamError::Upstream(std::io::Error::other("socket closed"));

    let err = stage.on_destroy(Some(reason)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upstream);
    drop(stage);
}

#[test]
fn test_destroy_reason_wins_over_close_failure() {
    let mut engine = MockEngine::new();
    engine
        .expect_close()
        .times(1)
        .returning(|| Err(DecoderError::Internal("E2".into())));

    let mut stage = build(engine, DecoderStreamOptions::default());
    let err = stage
        .on_destroy(Some(StreamError::Construction("E1".into())))
        .unwrap_err();

    assert!(matches!(err, StreamError::Construction(ref msg) if msg == "E1"));
}

#[test]
fn test_close_failure_surfaces_without_reason() {
    let mut engine = MockEngine::new();
    engine
        .expect_close()
        .times(1)
        .returning(|| Err(DecoderError::Internal("E2".into())));

    let mut stage = build(engine, DecoderStreamOptions::default());
    let err = stage.on_destroy(None).unwrap_err();

    assert!(matches!(err, StreamError::Close(DecoderError::Internal(ref msg)) if msg == "E2"));
    assert!(stage.is_closed());
}

#[test]
fn test_decode_failure_keeps_first_error_when_close_fails() {
    let mut engine = MockEngine::new();
    engine
        .expect_append()
        .times(1)
        .returning(|_| Err(DecoderError::DecodingError("E1".into())));
    engine
        .expect_close()
        .times(1)
        .returning(|| Err(DecoderError::Internal("E2".into())));

    let mut stage = build(engine, DecoderStreamOptions::default());
    let err = stage.on_chunk(b"x").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(err.to_string().contains("E1"));
}

#[test]
fn test_drop_closes_unreleased_engine() {
    let mut engine = MockEngine::new();
    engine.expect_append().times(1).returning(|_| Ok(None));
    engine.expect_close().times(1).returning(|| Ok(()));

    let mut stage = build(engine, DecoderStreamOptions::default());
    stage.on_chunk(b"partial").unwrap();
    drop(stage);
}
