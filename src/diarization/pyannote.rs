use anyhow::{anyhow, Context, Result};
use pyannote_rs::{EmbeddingExtractor, EmbeddingManager};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::{DiarizationEngine, SpeechTurn};
use crate::audio::AudioFile;

/// Diarization configuration artifact.
///
/// Loaded from a TOML file; model paths given relative to the artifact are
/// resolved against its directory, so the result is usable from any working
/// directory.
#[derive(Debug, Clone, Deserialize)]
pub struct DiarizationConfig {
    /// Path to the segmentation model (segmentation-3.0.onnx)
    pub segmentation_model: PathBuf,
    /// Path to the speaker embedding model (wespeaker CAM++)
    pub embedding_model: PathBuf,
    /// Maximum number of speakers to track per recording
    #[serde(default = "default_max_speakers")]
    pub max_speakers: usize,
    /// Similarity threshold for clustering embeddings into speakers
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

fn default_max_speakers() -> usize {
    10
}

fn default_similarity_threshold() -> f32 {
    0.5
}

impl DiarizationConfig {
    /// Load the artifact and resolve model paths to absolute paths.
    pub fn load(path: &Path) -> Result<Self> {
        let path = path
            .canonicalize()
            .with_context(|| format!("Diarization config not found: {}", path.display()))?;

        info!("Loading diarization config from {}", path.display());

        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_path()))
            .build()
            .with_context(|| format!("Failed to read diarization config: {}", path.display()))?;
        let mut cfg: DiarizationConfig = settings
            .try_deserialize()
            .context("Invalid diarization config")?;

        let base = path.parent().unwrap_or(Path::new("."));
        cfg.segmentation_model = absolutize(base, &cfg.segmentation_model);
        cfg.embedding_model = absolutize(base, &cfg.embedding_model);

        Ok(cfg)
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Diarization engine backed by pyannote segmentation and speaker embeddings.
///
/// Speaker ids are assigned per recording by clustering segment embeddings;
/// they carry no identity across calls.
pub struct PyannoteDiarizer {
    config: DiarizationConfig,
    // pyannote-rs computes embeddings through &mut self
    extractor: Mutex<EmbeddingExtractor>,
}

impl PyannoteDiarizer {
    pub fn load(config: DiarizationConfig) -> Result<Self> {
        info!("Initializing diarization engine");
        debug!("Segmentation model: {:?}", config.segmentation_model);
        debug!("Embedding model: {:?}", config.embedding_model);

        if !config.segmentation_model.exists() {
            return Err(anyhow!(
                "Segmentation model not found: {:?}",
                config.segmentation_model
            ));
        }
        if !config.embedding_model.exists() {
            return Err(anyhow!(
                "Embedding model not found: {:?}",
                config.embedding_model
            ));
        }

        // pyannote-rs uses eyre, convert to anyhow
        let extractor = EmbeddingExtractor::new(&config.embedding_model)
            .map_err(|e| anyhow!("Failed to create embedding extractor: {}", e))?;

        info!("Diarization engine initialized");

        Ok(Self {
            config,
            extractor: Mutex::new(extractor),
        })
    }
}

impl DiarizationEngine for PyannoteDiarizer {
    fn diarize(&self, source: &Path) -> Result<Vec<SpeechTurn>> {
        let audio = AudioFile::open(source)?;
        let samples = audio.to_mono();

        info!(
            "Running diarization on {} samples at {} Hz",
            samples.len(),
            audio.sample_rate
        );

        let segments_iter = pyannote_rs::get_segments(
            &samples,
            audio.sample_rate,
            &self.config.segmentation_model,
        )
        .map_err(|e| anyhow!("Failed to run segmentation: {}", e))?;

        let mut extractor = self
            .extractor
            .lock()
            .map_err(|_| anyhow!("Embedding extractor lock poisoned"))?;
        // Clustering state is scoped to this recording
        let mut clusters = EmbeddingManager::new(self.config.max_speakers);

        let mut turns = Vec::new();
        for segment_result in segments_iter {
            let segment = match segment_result {
                Ok(seg) => seg,
                Err(e) => {
                    warn!("Failed to process speech segment: {}", e);
                    continue;
                }
            };

            let embedding: Vec<f32> = match extractor.compute(&segment.samples) {
                Ok(iter) => iter.collect(),
                Err(e) => {
                    warn!("Failed to compute embedding for segment: {}", e);
                    continue;
                }
            };

            let speaker_id = match clusters
                .search_speaker(embedding, self.config.similarity_threshold)
            {
                Some(idx) => format!("SPEAKER_{:02}", idx),
                None => {
                    warn!(
                        "Max speakers ({}) reached, segment left unattributed",
                        self.config.max_speakers
                    );
                    "SPEAKER_XX".to_string()
                }
            };

            turns.push(SpeechTurn::new(speaker_id, segment.start, segment.end));
        }

        info!("Diarization complete: {} turns", turns.len());

        Ok(turns)
    }
}
