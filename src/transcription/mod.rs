//! Speech-to-text boundary.
//!
//! The engine is a black box behind [`TranscriptionEngine`]: raw audio bytes
//! for one speaker clip go in, recognized text comes out. The production
//! backend wraps whisper.cpp.

mod whisper;

pub use whisper::{WhisperConfig, WhisperError, WhisperTranscriber};

use anyhow::Result;

/// Black-box speech-to-text engine.
pub trait TranscriptionEngine: Send + Sync {
    /// Transcribe one clip. `audio` holds a complete audio container
    /// (a WAV clip produced by the segmenter).
    fn transcribe(&self, audio: &[u8]) -> Result<String>;
}
