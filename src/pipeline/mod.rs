//! The transcription pipeline: diarize, select speakers, segment, transcribe.

mod orchestrator;
mod selector;

pub use orchestrator::{Pipeline, PipelineError};
pub use selector::select_speakers;

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One speaker-attributed piece of the transcript.
///
/// `transcription` always holds text: either recognized speech or a
/// human-readable error marker for a segment that failed to transcribe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub speaker: String,
    pub start: f64,
    pub end: f64,
    pub transcription: String,
}

/// Ordered, speaker-attributed transcript of one recording.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub segments: Vec<TranscriptSegment>,
}

impl TranscriptionResult {
    /// Plain-text rendering, one line per segment.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            let _ = writeln!(
                out,
                "{} [{:.2}-{:.2}]: {}",
                segment.speaker, segment.start, segment.end, segment.transcription
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_has_one_line_per_segment() {
        let result = TranscriptionResult {
            segments: vec![
                TranscriptSegment {
                    speaker: "SPEAKER_00".to_string(),
                    start: 0.0,
                    end: 3.5,
                    transcription: "hello".to_string(),
                },
                TranscriptSegment {
                    speaker: "SPEAKER_01".to_string(),
                    start: 3.5,
                    end: 4.0,
                    transcription: "hi".to_string(),
                },
            ],
        };

        let text = result.to_plain_text();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("SPEAKER_00 [0.00-3.50]: hello"));
    }

    #[test]
    fn result_serializes_with_segments_key() {
        let result = TranscriptionResult::default();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("segments").unwrap().as_array().unwrap().is_empty());
    }
}
