use anyhow::Result;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::TranscriptionEngine;
use crate::audio::{wav_bytes_to_whisper_input, WHISPER_SAMPLE_RATE};

#[derive(Error, Debug)]
pub enum WhisperError {
    #[error("Whisper model not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("Failed to initialize Whisper: {0}")]
    Init(String),
    #[error("Error during transcription: {0}")]
    Transcription(String),
}

/// Whisper model configuration.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to the ggml model file
    pub model_path: PathBuf,
    /// Language hint (None = auto-detect)
    pub language: Option<String>,
    /// Translate output to English
    pub translate: bool,
    /// Number of inference threads
    pub n_threads: i32,
}

impl WhisperConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        let n_threads = std::thread::available_parallelism()
            .map(|p| p.get() as i32)
            .unwrap_or(4);

        Self {
            model_path: model_path.into(),
            language: None,
            translate: false,
            n_threads,
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}

/// Transcription engine backed by whisper.cpp.
pub struct WhisperTranscriber {
    ctx: WhisperContext,
    config: WhisperConfig,
}

impl WhisperTranscriber {
    /// Load the model from disk. GPU inference is used when the crate is
    /// built with an acceleration feature, CPU otherwise.
    pub fn load(config: WhisperConfig) -> Result<Self, WhisperError> {
        if !config.model_path.exists() {
            return Err(WhisperError::ModelNotFound(config.model_path.clone()));
        }

        info!(
            "Loading Whisper model from {} ({} threads, gpu: {})",
            config.model_path.display(),
            config.n_threads,
            crate::models::accelerated_build()
        );

        let ctx_params = WhisperContextParameters {
            use_gpu: crate::models::accelerated_build(),
            ..Default::default()
        };

        let model_path = config
            .model_path
            .to_str()
            .ok_or_else(|| WhisperError::Init("Model path is not valid UTF-8".to_string()))?;
        let ctx = WhisperContext::new_with_params(model_path, ctx_params)
            .map_err(|e| WhisperError::Init(format!("Failed to load model: {}", e)))?;

        info!("Whisper model loaded");

        Ok(Self { ctx, config })
    }

    /// Run inference on mono 16kHz samples.
    fn transcribe_samples(&self, samples: &[f32]) -> Result<String, WhisperError> {
        debug!(
            "Transcribing {} samples ({:.2}s of audio)",
            samples.len(),
            samples.len() as f64 / WHISPER_SAMPLE_RATE as f64
        );

        // Greedy sampling; beam search is 2-3x slower
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.config.n_threads);
        params.set_translate(self.config.translate);
        match &self.config.language {
            Some(lang) => params.set_language(Some(lang)),
            None => params.set_language(Some("auto")),
        }
        params.set_token_timestamps(false);
        params.set_suppress_non_speech_tokens(true);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_print_special(false);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| WhisperError::Transcription(format!("Failed to create state: {}", e)))?;

        state
            .full(params, samples)
            .map_err(|e| WhisperError::Transcription(format!("Inference failed: {}", e)))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| WhisperError::Transcription(format!("Failed to get segments: {}", e)))?;

        let mut text = String::new();
        for i in 0..num_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| WhisperError::Transcription(format!("Failed to get text: {}", e)))?;
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(segment);
        }

        debug!("Transcription produced {} characters", text.len());

        Ok(text)
    }
}

impl TranscriptionEngine for WhisperTranscriber {
    fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let samples = wav_bytes_to_whisper_input(audio)?;
        Ok(self.transcribe_samples(&samples)?)
    }
}
