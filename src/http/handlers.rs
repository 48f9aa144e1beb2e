use super::state::AppState;
use crate::pipeline::Pipeline;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Uploaded file spooled to the scratch directory, removed on drop.
struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    fn write(filename: &str, contents: &[u8]) -> std::io::Result<Self> {
        // Keep only the final path component of client-supplied names
        let filename = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        let path = std::env::temp_dir().join(format!("{}_{}", Uuid::new_v4(), filename));
        fs::write(&path, contents)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove upload {}: {}", self.path.display(), e);
            }
        }
    }
}

/// POST /api/inference/
/// Transcribe an uploaded recording with speaker attribution.
///
/// Multipart form fields: `audio_file` (required), `num_speakers` (optional
/// integer; unparsable values are ignored).
pub async fn api_inference(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut num_speakers: Option<usize> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Invalid multipart body: {}", e),
                    }),
                )
                    .into_response();
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio_file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((filename, bytes.to_vec())),
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(ErrorResponse {
                                error: format!("Failed to read uploaded file: {}", e),
                            }),
                        )
                            .into_response();
                    }
                }
            }
            "num_speakers" => {
                // Invalid values are treated as absent
                num_speakers = field
                    .text()
                    .await
                    .ok()
                    .and_then(|v| v.trim().parse::<usize>().ok());
            }
            other => {
                warn!("Ignoring unknown form field: {}", other);
            }
        }
    }

    let Some((filename, contents)) = upload.filter(|(name, _)| !name.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No file uploaded".to_string(),
            }),
        )
            .into_response();
    };

    info!("Processing file: {}", filename);

    let saved = match TempUpload::write(&filename, &contents) {
        Ok(saved) => saved,
        Err(e) => {
            error!("Failed to spool upload: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Error processing file: {}", e),
                }),
            )
                .into_response();
        }
    };

    // The pipeline is CPU-bound; keep it off the async workers
    let models = state.models.clone();
    let result = tokio::task::spawn_blocking(move || {
        let diarizer = models.diarizer()?;
        let transcriber = models.transcriber()?;
        let pipeline = Pipeline::new(diarizer, transcriber);
        let result = pipeline.process(saved.path(), num_speakers)?;
        drop(saved);
        Ok::<_, anyhow::Error>(result)
    })
    .await;

    match result {
        Ok(Ok(result)) => {
            info!("File processing completed successfully");
            (StatusCode::OK, Json(result)).into_response()
        }
        Ok(Err(e)) => {
            error!("Error processing file: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Error processing file: {:#}", e),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Pipeline task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Error processing file: pipeline task failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /
/// Service banner
pub async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Speech-to-text API is running",
        "usage": "POST /api/inference/ with an audio_file",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /debug/models
/// Report which models are loaded and on what device
pub async fn debug_models(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.models.status();
    Json(serde_json::json!({
        "status": "ok",
        "models": status,
    }))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
