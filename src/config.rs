use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub models: ModelsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Model locations and inference settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Path to the ggml whisper model file
    pub whisper_model_path: String,
    /// Language hint for transcription (None = auto-detect)
    #[serde(default)]
    pub language: Option<String>,
    /// Path to the diarization configuration artifact (TOML)
    pub diarization_config_path: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
