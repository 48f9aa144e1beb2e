//! Speaker diarization boundary.
//!
//! The engine is a black box behind [`DiarizationEngine`]: a full recording
//! goes in, speech turns attributed to speakers come out. The production
//! backend wraps pyannote segmentation + speaker-embedding models.

mod pyannote;

pub use pyannote::{DiarizationConfig, PyannoteDiarizer};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One contiguous interval attributed to a single speaker.
///
/// `end > start >= 0`. Turns from an engine are not guaranteed sorted or
/// non-overlapping across speakers, and several turns may share a speaker id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechTurn {
    pub speaker_id: String,
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
}

impl SpeechTurn {
    pub fn new(speaker_id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            start,
            end,
        }
    }

    /// Talk time of this turn in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Black-box speech segmentation engine.
pub trait DiarizationEngine: Send + Sync {
    /// Partition the recording at `source` into per-speaker turns.
    fn diarize(&self, source: &Path) -> Result<Vec<SpeechTurn>>;
}
