use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::file::AudioFile;
use crate::diarization::SpeechTurn;

/// A per-turn audio clip materialized on disk.
///
/// The clip exclusively belongs to the request that created it; the backing
/// file is removed when the clip is dropped, on every exit path.
pub struct SegmentClip {
    path: PathBuf,
}

impl SegmentClip {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        fs::read(&self.path)
            .with_context(|| format!("Failed to read segment clip: {}", self.path.display()))
    }
}

impl Drop for SegmentClip {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "Failed to remove segment clip {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// Cuts a source recording into one WAV clip per speech turn.
pub struct AudioSegmenter {
    scratch_dir: PathBuf,
}

impl AudioSegmenter {
    pub fn new() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
        }
    }

    pub fn with_scratch_dir(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Clip the source audio once per turn, preserving input order.
    ///
    /// Turn boundaries are truncated to millisecond resolution before being
    /// mapped to sample frames. Any single extraction failure aborts the
    /// whole call.
    pub fn segment(
        &self,
        source: &Path,
        turns: &[SpeechTurn],
    ) -> Result<Vec<(SpeechTurn, SegmentClip)>> {
        let audio = AudioFile::open(source)?;

        info!(
            "Segmenting {} into {} speaker turns",
            source.display(),
            turns.len()
        );

        turns
            .iter()
            .map(|turn| {
                let clip = self
                    .clip_turn(&audio, turn)
                    .with_context(|| {
                        format!(
                            "Failed to extract turn {} [{:.2}-{:.2}]",
                            turn.speaker_id, turn.start, turn.end
                        )
                    })?;
                Ok((turn.clone(), clip))
            })
            .collect()
    }

    fn clip_turn(&self, audio: &AudioFile, turn: &SpeechTurn) -> Result<SegmentClip> {
        let start_ms = (turn.start * 1000.0) as u64;
        let end_ms = (turn.end * 1000.0) as u64;

        let start_frame = (start_ms * audio.sample_rate as u64 / 1000) as usize;
        let end_frame = (end_ms * audio.sample_rate as u64 / 1000) as usize;

        let total_frames = audio.frame_count();
        if start_frame >= total_frames {
            bail!(
                "Turn starts at frame {} but the stream has only {} frames",
                start_frame,
                total_frames
            );
        }
        let end_frame = end_frame.min(total_frames);

        let channels = audio.channels.max(1) as usize;
        let clip_samples = &audio.samples[start_frame * channels..end_frame * channels];

        let filename = format!("{}_{}.wav", Uuid::new_v4(), turn.speaker_id);
        let path = self.scratch_dir.join(filename);

        let spec = hound::WavSpec {
            channels: audio.channels,
            sample_rate: audio.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(&path, spec)
            .with_context(|| format!("Failed to create clip file: {}", path.display()))?;
        for &sample in clip_samples {
            writer
                .write_sample(sample)
                .context("Failed to write clip sample")?;
        }
        writer.finalize().context("Failed to finalize clip file")?;

        debug!(
            "Wrote clip for {} [{}-{}ms] to {}",
            turn.speaker_id,
            start_ms,
            end_ms,
            path.display()
        );

        Ok(SegmentClip { path })
    }
}

impl Default for AudioSegmenter {
    fn default() -> Self {
        Self::new()
    }
}
