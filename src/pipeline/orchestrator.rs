use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::selector::select_speakers;
use super::{TranscriptSegment, TranscriptionResult};
use crate::audio::{AudioSegmenter, SegmentClip};
use crate::diarization::DiarizationEngine;
use crate::transcription::TranscriptionEngine;

/// Fatal pipeline failure. A single segment's transcription error is not
/// fatal and is captured in the result instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Diarization failed: {0:#}")]
    Diarization(anyhow::Error),
    #[error("Audio segmentation failed: {0:#}")]
    Segmentation(anyhow::Error),
}

/// Sequences diarization, speaker selection, segmentation, and per-segment
/// transcription into a speaker-attributed transcript.
pub struct Pipeline {
    diarizer: Arc<dyn DiarizationEngine>,
    transcriber: Arc<dyn TranscriptionEngine>,
    segmenter: AudioSegmenter,
}

impl Pipeline {
    pub fn new(
        diarizer: Arc<dyn DiarizationEngine>,
        transcriber: Arc<dyn TranscriptionEngine>,
    ) -> Self {
        Self {
            diarizer,
            transcriber,
            segmenter: AudioSegmenter::new(),
        }
    }

    /// Use a dedicated scratch directory for segment clips.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.segmenter = AudioSegmenter::with_scratch_dir(dir);
        self
    }

    /// Process one recording end to end.
    ///
    /// Segments are transcribed strictly sequentially, in diarization
    /// emission order, and that order is preserved in the result. A failed
    /// transcription is recorded in-band as
    /// `Error processing segment: <message>` without aborting the request.
    pub fn process(
        &self,
        source: &Path,
        speaker_cap: Option<usize>,
    ) -> Result<TranscriptionResult, PipelineError> {
        info!("Processing {}", source.display());

        let turns = self
            .diarizer
            .diarize(source)
            .map_err(PipelineError::Diarization)?;
        info!("Diarization produced {} turns", turns.len());

        let turns = select_speakers(turns, speaker_cap);

        let clips = self
            .segmenter
            .segment(source, &turns)
            .map_err(PipelineError::Segmentation)?;

        let total = clips.len();
        let mut segments = Vec::with_capacity(total);

        for (i, (turn, clip)) in clips.into_iter().enumerate() {
            info!(
                "Transcribing segment {}/{} ({} [{:.2}-{:.2}])",
                i + 1,
                total,
                turn.speaker_id,
                turn.start,
                turn.end
            );

            let transcription = match self.transcribe_clip(&clip) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Segment {}/{} failed: {:#}", i + 1, total, e);
                    format!("Error processing segment: {:#}", e)
                }
            };

            segments.push(TranscriptSegment {
                speaker: turn.speaker_id,
                start: turn.start,
                end: turn.end,
                transcription,
            });
            // clip dropped here, removing its scratch file
        }

        info!("Assembled transcript with {} segments", segments.len());

        Ok(TranscriptionResult { segments })
    }

    fn transcribe_clip(&self, clip: &SegmentClip) -> anyhow::Result<String> {
        let audio_bytes = clip.read_bytes()?;
        self.transcriber.transcribe(&audio_bytes)
    }
}
