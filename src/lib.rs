pub mod audio;
pub mod config;
pub mod diarization;
pub mod http;
pub mod models;
pub mod pipeline;
pub mod transcription;

pub use audio::{AudioFile, AudioSegmenter, SegmentClip};
pub use config::Config;
pub use diarization::{DiarizationEngine, PyannoteDiarizer, SpeechTurn};
pub use http::{create_router, AppState};
pub use models::{ModelManager, ModelStatus};
pub use pipeline::{
    select_speakers, Pipeline, PipelineError, TranscriptSegment, TranscriptionResult,
};
pub use transcription::{TranscriptionEngine, WhisperTranscriber};
