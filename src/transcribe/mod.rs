// Speech-to-text collaborators
//
// Each backend runs an external tool against a media file and hands back
// the result as a Track:
// - Autosub: autosub writes an SRT straight from the media file
// - WhisperCpp: ffmpeg extracts audio, whisper-cli writes the SRT

pub mod autosub;
pub mod command;
pub mod whisper_cpp;

use async_trait::async_trait;
use std::path::Path;

use crate::config::{TranscriberBackend, TranscriberConfig};
use crate::error::Result;
use crate::track::Track;

/// Produces a reference track from a media file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, media_path: &Path) -> Result<Track>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    pub fn create_transcriber(config: TranscriberConfig) -> Box<dyn Transcriber> {
        match config.backend {
            TranscriberBackend::Autosub => Box::new(autosub::AutosubTranscriber::new(config)),
            TranscriberBackend::WhisperCpp => Box::new(whisper_cpp::WhisperCppTranscriber::new(config)),
        }
    }
}
