pub mod file;
pub mod segmenter;

pub use file::{
    downmix_to_mono, resample_to_whisper_rate, wav_bytes_to_whisper_input, AudioFile,
    WHISPER_SAMPLE_RATE,
};
pub use segmenter::{AudioSegmenter, SegmentClip};
