use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::config::TranscriberConfig;
use crate::error::{Result, SubalignError};
use crate::subtitle::read_srt;
use crate::track::Track;
use super::Transcriber;
use super::command::ToolCommand;

/// Transcription through the `autosub` command line tool
pub struct AutosubTranscriber {
    config: TranscriberConfig,
}

impl AutosubTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    fn build_command(&self, media_path: &Path, output_path: &Path) -> ToolCommand {
        let language = self.config.language.as_deref();

        ToolCommand::new(&self.config.binary_path, "autosub transcription")
            .arg("-o")
            .path(output_path)
            .optional("-S", language)
            .optional("-D", language)
            .path(media_path)
    }
}

#[async_trait]
impl Transcriber for AutosubTranscriber {
    async fn transcribe(&self, media_path: &Path) -> Result<Track> {
        if !media_path.exists() {
            return Err(SubalignError::FileNotFound(media_path.display().to_string()));
        }
        info!("Generating reference subtitles with autosub: {}", media_path.display());

        let temp_dir = tempfile::tempdir()
            .map_err(|e| SubalignError::Transcriber(format!("Failed to create temp directory: {}", e)))?;
        let output_path = temp_dir.path().join("generated.srt");

        self.build_command(media_path, &output_path).execute().await?;

        if !output_path.exists() {
            return Err(SubalignError::Transcriber(
                "autosub finished without writing a subtitle file".to_string(),
            ));
        }

        read_srt(&output_path).await
    }
}
