// Integration tests for the transcription pipeline
//
// The engines are stubbed out: the diarizer replays a fixed set of turns and
// the transcriber is scripted per call. This exercises the orchestration
// itself - ordering, per-segment failure capture, and scratch-file cleanup.

use anyhow::Result;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use turnscribe::diarization::{DiarizationEngine, SpeechTurn};
use turnscribe::pipeline::{Pipeline, PipelineError};
use turnscribe::transcription::TranscriptionEngine;

const SAMPLE_RATE: u32 = 16000;

fn write_test_wav(path: &Path, seconds: f64) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    let frames = (seconds * SAMPLE_RATE as f64) as usize;
    for i in 0..frames {
        let t = i as f32 / SAMPLE_RATE as f32;
        let sample = ((t * 330.0 * std::f32::consts::TAU).sin() * 6000.0) as i16;
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

struct StubDiarizer {
    turns: Vec<SpeechTurn>,
}

impl DiarizationEngine for StubDiarizer {
    fn diarize(&self, _source: &Path) -> Result<Vec<SpeechTurn>> {
        Ok(self.turns.clone())
    }
}

struct BrokenDiarizer;

impl DiarizationEngine for BrokenDiarizer {
    fn diarize(&self, _source: &Path) -> Result<Vec<SpeechTurn>> {
        anyhow::bail!("segmentation model rejected the waveform")
    }
}

/// Transcriber that numbers its calls and optionally fails on one of them.
struct ScriptedTranscriber {
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
}

impl ScriptedTranscriber {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on_call: None,
        }
    }

    fn failing_on(call: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on_call: Some(call),
        }
    }
}

impl TranscriptionEngine for ScriptedTranscriber {
    fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_call == Some(call) {
            anyhow::bail!("decoder exploded");
        }
        // The clip must be a complete, parseable WAV
        let reader = hound::WavReader::new(Cursor::new(audio))?;
        Ok(format!("utterance-{} ({} samples)", call, reader.len()))
    }
}

fn three_turns() -> Vec<SpeechTurn> {
    vec![
        SpeechTurn::new("SPEAKER_00", 0.0, 3.0),
        SpeechTurn::new("SPEAKER_01", 3.0, 7.0),
        SpeechTurn::new("SPEAKER_00", 7.0, 10.0),
    ]
}

#[test]
fn test_process_preserves_diarization_order() -> Result<()> {
    let source_dir = TempDir::new()?;
    let scratch_dir = TempDir::new()?;
    let source = source_dir.path().join("meeting.wav");
    write_test_wav(&source, 10.0)?;

    let turns = three_turns();
    let pipeline = Pipeline::new(
        Arc::new(StubDiarizer { turns: turns.clone() }),
        Arc::new(ScriptedTranscriber::new()),
    )
    .with_scratch_dir(scratch_dir.path());

    let result = pipeline.process(&source, None).unwrap();

    assert_eq!(result.segments.len(), 3);
    for (i, (segment, turn)) in result.segments.iter().zip(&turns).enumerate() {
        assert_eq!(segment.speaker, turn.speaker_id);
        assert_eq!(segment.start, turn.start);
        assert_eq!(segment.end, turn.end);
        assert!(
            segment.transcription.starts_with(&format!("utterance-{}", i)),
            "Segments must follow diarization emission order: {}",
            segment.transcription
        );
    }

    Ok(())
}

#[test]
fn test_one_failed_segment_does_not_abort_siblings() -> Result<()> {
    let source_dir = TempDir::new()?;
    let scratch_dir = TempDir::new()?;
    let source = source_dir.path().join("meeting.wav");
    write_test_wav(&source, 10.0)?;

    let pipeline = Pipeline::new(
        Arc::new(StubDiarizer { turns: three_turns() }),
        Arc::new(ScriptedTranscriber::failing_on(1)),
    )
    .with_scratch_dir(scratch_dir.path());

    let result = pipeline.process(&source, None).unwrap();

    assert_eq!(result.segments.len(), 3);
    assert!(result.segments[0].transcription.starts_with("utterance-0"));
    assert!(
        result.segments[1]
            .transcription
            .starts_with("Error processing segment: "),
        "Got: {}",
        result.segments[1].transcription
    );
    assert!(result.segments[2].transcription.starts_with("utterance-2"));

    Ok(())
}

#[test]
fn test_no_scratch_files_survive_processing() -> Result<()> {
    let source_dir = TempDir::new()?;
    let scratch_dir = TempDir::new()?;
    let source = source_dir.path().join("meeting.wav");
    write_test_wav(&source, 10.0)?;

    // Success path
    let pipeline = Pipeline::new(
        Arc::new(StubDiarizer { turns: three_turns() }),
        Arc::new(ScriptedTranscriber::new()),
    )
    .with_scratch_dir(scratch_dir.path());
    pipeline.process(&source, None).unwrap();
    assert_eq!(std::fs::read_dir(scratch_dir.path())?.count(), 0);

    // Partial-failure path
    let pipeline = Pipeline::new(
        Arc::new(StubDiarizer { turns: three_turns() }),
        Arc::new(ScriptedTranscriber::failing_on(0)),
    )
    .with_scratch_dir(scratch_dir.path());
    pipeline.process(&source, None).unwrap();
    assert_eq!(std::fs::read_dir(scratch_dir.path())?.count(), 0);

    Ok(())
}

#[test]
fn test_speaker_cap_filters_segments() -> Result<()> {
    let source_dir = TempDir::new()?;
    let scratch_dir = TempDir::new()?;
    let source = source_dir.path().join("meeting.wav");
    write_test_wav(&source, 10.0)?;

    // SPEAKER_00: 6s, SPEAKER_01: 3s, SPEAKER_02: 1s
    let turns = vec![
        SpeechTurn::new("SPEAKER_00", 0.0, 3.0),
        SpeechTurn::new("SPEAKER_01", 3.0, 6.0),
        SpeechTurn::new("SPEAKER_02", 6.0, 7.0),
        SpeechTurn::new("SPEAKER_00", 7.0, 10.0),
    ];

    let pipeline = Pipeline::new(
        Arc::new(StubDiarizer { turns }),
        Arc::new(ScriptedTranscriber::new()),
    )
    .with_scratch_dir(scratch_dir.path());

    let result = pipeline.process(&source, Some(2)).unwrap();

    let speakers: Vec<&str> = result
        .segments
        .iter()
        .map(|s| s.speaker.as_str())
        .collect();
    assert_eq!(speakers, vec!["SPEAKER_00", "SPEAKER_01", "SPEAKER_00"]);

    Ok(())
}

#[test]
fn test_diarization_failure_is_fatal() -> Result<()> {
    let source_dir = TempDir::new()?;
    let source = source_dir.path().join("meeting.wav");
    write_test_wav(&source, 2.0)?;

    let pipeline = Pipeline::new(
        Arc::new(BrokenDiarizer),
        Arc::new(ScriptedTranscriber::new()),
    );

    match pipeline.process(&source, None) {
        Err(PipelineError::Diarization(e)) => {
            assert!(e.to_string().contains("segmentation model"));
        }
        other => panic!("Expected diarization failure, got {:?}", other.map(|r| r.segments.len())),
    }

    Ok(())
}

#[test]
fn test_unreadable_source_fails_at_segmentation() -> Result<()> {
    let scratch_dir = TempDir::new()?;

    let pipeline = Pipeline::new(
        Arc::new(StubDiarizer { turns: three_turns() }),
        Arc::new(ScriptedTranscriber::new()),
    )
    .with_scratch_dir(scratch_dir.path());

    let result = pipeline.process(Path::new("/nonexistent/meeting.wav"), None);
    assert!(matches!(result, Err(PipelineError::Segmentation(_))));

    Ok(())
}

#[test]
fn test_empty_diarization_yields_empty_transcript() -> Result<()> {
    let source_dir = TempDir::new()?;
    let source = source_dir.path().join("silence.wav");
    write_test_wav(&source, 1.0)?;

    let pipeline = Pipeline::new(
        Arc::new(StubDiarizer { turns: Vec::new() }),
        Arc::new(ScriptedTranscriber::new()),
    );

    let result = pipeline.process(&source, None).unwrap();
    assert!(result.segments.is_empty());

    Ok(())
}
