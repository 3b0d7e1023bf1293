use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SubalignError};

/// External tool invocation used by the transcribers
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl ToolCommand {
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add a path argument
    pub fn path<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add `flag value` when the value is present
    pub fn optional<S: Into<String>>(self, flag: &str, value: Option<S>) -> Self {
        match value {
            Some(value) => self.arg(flag).arg(value),
            None => self,
        }
    }

    /// Run the command, failing with its stderr on a non-zero exit
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing {}: {} {:?}", self.description, self.binary_path, self.args);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| SubalignError::Transcriber(format!(
                "Failed to execute {}: {}",
                self.binary_path, e
            )))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubalignError::Transcriber(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Build the ffmpeg call that extracts 16 kHz mono PCM for whisper
pub fn extract_audio(ffmpeg_path: &str, media_path: &Path, audio_path: &Path) -> ToolCommand {
    ToolCommand::new(ffmpeg_path, "Audio extraction")
        .arg("-i")
        .path(media_path)
        .arg("-vn")
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-ar")
        .arg("16000")
        .arg("-ac")
        .arg("1")
        .arg("-y")
        .path(audio_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_audio_arguments() {
        let cmd = extract_audio("ffmpeg", Path::new("/m/movie.mkv"), Path::new("/tmp/a.wav"));
        assert_eq!(cmd.binary_path, "ffmpeg");
        assert_eq!(
            cmd.args,
            vec!["-i", "/m/movie.mkv", "-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1", "-y", "/tmp/a.wav"]
        );
    }

    #[test]
    fn test_optional_argument() {
        let with = ToolCommand::new("tool", "test").optional("-l", Some("en"));
        let without = ToolCommand::new("tool", "test").optional::<String>("-l", None);
        assert_eq!(with.args, vec!["-l", "en"]);
        assert!(without.args.is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary_is_transcriber_error() {
        let err = ToolCommand::new("/nonexistent/tool-binary", "Missing tool")
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(err, SubalignError::Transcriber(_)));
    }
}
