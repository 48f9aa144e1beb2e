//! Process-wide model lifecycle management.
//!
//! Both engine handles are expensive to load, so they are created lazily on
//! first demand and cached for the life of the process. Concurrent first
//! loads are serialized by the cells; a failed load is reported to the
//! caller and retried on the next request instead of being cached.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::ModelsConfig;
use crate::diarization::{DiarizationConfig, PyannoteDiarizer};
use crate::transcription::{WhisperConfig, WhisperTranscriber};

/// Whether this binary was built with a GPU acceleration feature.
pub fn accelerated_build() -> bool {
    cfg!(any(feature = "cuda", feature = "metal"))
}

/// Compute device the engines run on.
pub fn device() -> &'static str {
    if cfg!(feature = "cuda") {
        "cuda"
    } else if cfg!(feature = "metal") {
        "metal"
    } else {
        "cpu"
    }
}

/// Introspection snapshot for the debug endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub whisper_loaded: bool,
    pub diarization_loaded: bool,
    pub accelerated: bool,
    pub device: &'static str,
}

/// Owns the two lazily-initialized engine singletons.
pub struct ModelManager {
    settings: ModelsConfig,
    transcriber: OnceCell<Arc<WhisperTranscriber>>,
    diarizer: OnceCell<Arc<PyannoteDiarizer>>,
}

impl ModelManager {
    pub fn new(settings: ModelsConfig) -> Self {
        Self {
            settings,
            transcriber: OnceCell::new(),
            diarizer: OnceCell::new(),
        }
    }

    /// Get the transcription handle, loading the model on first use.
    pub fn transcriber(&self) -> Result<Arc<WhisperTranscriber>> {
        self.transcriber
            .get_or_try_init(|| {
                info!("Initializing Whisper model (first request)");
                let config = WhisperConfig::new(&self.settings.whisper_model_path)
                    .with_language(self.settings.language.clone());
                let transcriber =
                    WhisperTranscriber::load(config).context("Whisper model loading failed")?;
                Ok(Arc::new(transcriber))
            })
            .cloned()
    }

    /// Get the diarization handle, loading the pipeline on first use.
    pub fn diarizer(&self) -> Result<Arc<PyannoteDiarizer>> {
        self.diarizer
            .get_or_try_init(|| {
                info!("Initializing diarization pipeline (first request)");
                let config =
                    DiarizationConfig::load(Path::new(&self.settings.diarization_config_path))
                        .context("Diarization pipeline loading failed")?;
                let diarizer = PyannoteDiarizer::load(config)
                    .context("Diarization pipeline loading failed")?;
                Ok(Arc::new(diarizer))
            })
            .cloned()
    }

    /// Load both handles eagerly.
    pub fn preload(&self) -> Result<()> {
        self.transcriber()?;
        self.diarizer()?;
        Ok(())
    }

    /// Report which handles are loaded and on what device.
    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            whisper_loaded: self.transcriber.get().is_some(),
            diarization_loaded: self.diarizer.get().is_some(),
            accelerated: accelerated_build(),
            device: device(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_settings() -> ModelsConfig {
        ModelsConfig {
            whisper_model_path: "/nonexistent/ggml-base.bin".to_string(),
            language: None,
            diarization_config_path: "/nonexistent/diarization.toml".to_string(),
        }
    }

    #[test]
    fn failed_load_is_reported_and_not_cached() {
        let manager = ModelManager::new(missing_settings());

        assert!(manager.transcriber().is_err());
        assert!(manager.diarizer().is_err());

        // A failed load leaves the handle unloaded so the next call retries
        let status = manager.status();
        assert!(!status.whisper_loaded);
        assert!(!status.diarization_loaded);

        assert!(manager.transcriber().is_err());
    }

    #[test]
    fn status_reports_device() {
        let manager = ModelManager::new(missing_settings());
        let status = manager.status();
        assert_eq!(status.accelerated, accelerated_build());
        assert_eq!(status.device, device());
    }

    #[test]
    fn concurrent_first_access_yields_one_error_each() {
        let manager = Arc::new(ModelManager::new(missing_settings()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || manager.transcriber().is_err())
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert!(!manager.status().whisper_loaded);
    }
}
