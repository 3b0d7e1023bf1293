use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, SubalignError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub matcher: MatchConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub transcriber: TranscriberConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Maximum distance in seconds between two cue starts to be compared
    pub max_time_diff: f64,
    /// Normalized text must be longer than this many characters
    pub min_text_length: usize,
    /// Minimum fuzzy ratio (0-100) for a candidate
    pub min_score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Maximum residual (seconds) for an observation to count as an inlier
    pub residual_threshold: f64,
    /// Observations drawn per candidate line
    pub min_samples: usize,
    /// Candidate lines evaluated per run
    pub max_trials: usize,
    /// Independent runs averaged into the final model
    pub runs: usize,
    /// Attempts per run before giving up
    pub max_attempts: u32,
    /// Fixed seed for reproducible sampling
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriberBackend {
    /// autosub: writes an SRT directly from the media file
    Autosub,
    /// whisper.cpp CLI, fed with audio extracted by ffmpeg
    WhisperCpp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    pub backend: TranscriberBackend,
    /// Path to the transcriber binary (autosub or whisper-cli)
    pub binary_path: String,
    /// Model file passed to whisper-cli
    pub model_path: Option<String>,
    /// Spoken language hint
    pub language: Option<String>,
    /// Path to ffmpeg, used for audio extraction
    pub ffmpeg_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Ollama endpoint URL
    pub endpoint: String,
    /// LLM model to use for translation
    pub model: String,
    /// Maximum retries for failed translations
    pub max_retries: u32,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_time_diff: 600.0,
            min_text_length: 10,
            min_score: 70,
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            residual_threshold: 1.0,
            min_samples: 3,
            max_trials: 100,
            runs: 5,
            max_attempts: 3,
            seed: None,
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            backend: TranscriberBackend::Autosub,
            binary_path: "autosub".to_string(),
            model_path: None,
            language: None,
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            max_retries: 3,
            timeout_secs: 300,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubalignError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubalignError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubalignError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.matcher.max_time_diff >= 0.0) {
            return Err(SubalignError::Config(format!(
                "max_time_diff must be non-negative, got {}",
                self.matcher.max_time_diff
            )));
        }
        if self.matcher.min_score > 100 {
            return Err(SubalignError::Config(format!(
                "min_score must be within 0-100, got {}",
                self.matcher.min_score
            )));
        }
        if !(self.estimator.residual_threshold >= 0.0) {
            return Err(SubalignError::Config(format!(
                "residual_threshold must be non-negative, got {}",
                self.estimator.residual_threshold
            )));
        }
        if self.estimator.min_samples < 2 {
            return Err(SubalignError::Config(
                "min_samples must be at least 2 to determine a line".to_string(),
            ));
        }
        if self.estimator.runs == 0 || self.estimator.max_attempts == 0 || self.estimator.max_trials == 0 {
            return Err(SubalignError::Config(
                "runs, max_attempts and max_trials must all be positive".to_string(),
            ));
        }
        if self.transcriber.backend == TranscriberBackend::WhisperCpp && self.transcriber.model_path.is_none() {
            return Err(SubalignError::Config(
                "whisper.cpp backend requires transcriber.model_path".to_string(),
            ));
        }
        Ok(())
    }
}
