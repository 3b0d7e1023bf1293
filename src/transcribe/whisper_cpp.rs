use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::config::TranscriberConfig;
use crate::error::{Result, SubalignError};
use crate::subtitle::read_srt;
use crate::track::Track;
use super::Transcriber;
use super::command::{extract_audio, ToolCommand};

/// Transcription through whisper.cpp's `whisper-cli`
pub struct WhisperCppTranscriber {
    config: TranscriberConfig,
}

impl WhisperCppTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    /// whisper-cli appends `.srt` to the `-of` base path
    fn build_command(&self, model_path: &str, audio_path: &Path, output_base: &Path) -> ToolCommand {
        ToolCommand::new(&self.config.binary_path, "whisper.cpp transcription")
            .arg("-m")
            .arg(model_path)
            .arg("-f")
            .path(audio_path)
            .arg("-osrt")
            .arg("-of")
            .path(output_base)
            .optional("-l", self.config.language.as_deref())
    }
}

#[async_trait]
impl Transcriber for WhisperCppTranscriber {
    async fn transcribe(&self, media_path: &Path) -> Result<Track> {
        if !media_path.exists() {
            return Err(SubalignError::FileNotFound(media_path.display().to_string()));
        }
        let model_path = self.config.model_path.as_deref().ok_or_else(|| {
            SubalignError::Config("whisper.cpp backend requires transcriber.model_path".to_string())
        })?;

        let temp_dir = tempfile::tempdir()
            .map_err(|e| SubalignError::Transcriber(format!("Failed to create temp directory: {}", e)))?;
        let audio_path = temp_dir.path().join("audio.wav");
        let output_base = temp_dir.path().join("transcript");

        info!("Extracting audio from {}", media_path.display());
        extract_audio(&self.config.ffmpeg_path, media_path, &audio_path)
            .execute()
            .await?;

        info!("Transcribing with whisper.cpp model {}", model_path);
        self.build_command(model_path, &audio_path, &output_base)
            .execute()
            .await?;

        let srt_path = output_base.with_extension("srt");
        if !srt_path.exists() {
            return Err(SubalignError::Transcriber(
                "whisper-cli finished without writing a subtitle file".to_string(),
            ));
        }

        read_srt(&srt_path).await
    }
}
