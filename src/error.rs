use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubalignError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Insufficient data: {matches} usable correspondences between the tracks")]
    InsufficientData { matches: usize },

    #[error("Regression fit failed after {attempts} attempts: {reason}")]
    RegressionFit { attempts: u32, reason: String },

    #[error("Invalid cue #{index}: {reason}")]
    InvalidCue { index: usize, reason: String },

    #[error("Subtitle format error: {0}")]
    Subtitle(String),

    #[error("Transcription error: {0}")]
    Transcriber(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, SubalignError>;
