use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, SubalignError};
use crate::track::{Cue, Track};
use super::{language_name, Translator};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Translator backed by an Ollama `/api/generate` endpoint
pub struct OllamaTranslator {
    client: Client,
    config: TranslateConfig,
}

impl OllamaTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Translate one piece of text, retrying on failure
    pub async fn translate_text(&self, text: &str, target_language: &str) -> Result<String> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.request_translation(text, target_language).await {
                Ok(translation) => return Ok(translation),
                Err(e) => {
                    debug!("Translation attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SubalignError::Translation("no attempt made".to_string())))
    }

    async fn request_translation(&self, text: &str, target_language: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: build_prompt(text, target_language),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));
        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SubalignError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubalignError::Translation(format!(
                "Ollama API error {}: {}", status, error_text
            )));
        }

        let generated: GenerateResponse = response.json().await
            .map_err(|e| SubalignError::Translation(format!("Failed to parse response: {}", e)))?;

        parse_translation(&generated.response)
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate_track(&self, track: &Track, target_language: &str) -> Result<Track> {
        info!("Translating {} cues to {}", track.len(), target_language);

        let mut cues: Vec<Cue> = Vec::with_capacity(track.len());
        let mut attempted = 0;
        let mut failures = 0;
        let mut last_error = None;

        for cue in track {
            let source = cue.lines.join(" ");
            if source.trim().is_empty() {
                cues.push(cue.clone());
                continue;
            }

            attempted += 1;
            match self.translate_text(&source, target_language).await {
                Ok(translation) => {
                    debug!("Cue {}: {} -> {}", cue.id, source, translation);
                    cues.push(cue.with_lines(translation.lines().map(str::to_string).collect()));
                }
                Err(e) => {
                    // Keep original text on failure
                    warn!("Cue {} left untranslated: {}", cue.id, e);
                    failures += 1;
                    last_error = Some(e);
                    cues.push(cue.clone());
                }
            }
        }

        // An untranslated reference cannot match anything; report the outage itself
        if attempted > 0 && failures == attempted {
            let cause = last_error.map(|e| e.to_string()).unwrap_or_default();
            return Err(SubalignError::Translation(format!(
                "none of the {} cues could be translated to {}: {}",
                attempted, target_language, cause
            )));
        }

        if failures > 0 {
            warn!("{} of {} cues could not be translated", failures, track.len());
        }

        Ok(Track::new(cues))
    }
}

fn build_prompt(text: &str, target_language: &str) -> String {
    let name = language_name(target_language);
    format!(
        "You are a professional subtitle translator.\n\
         \n\
         CRITICAL: You must translate the text to {} ONLY. Do not translate to any other language.\n\
         The target language is: {} (language code: {})\n\
         \n\
         Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
         Do not include any explanations, alternatives, or text in other languages.\n\
         \n\
         Text to translate: \"{}\"\n",
        name, name, target_language, name, text
    )
}

/// Extract the translation from the model's raw answer
fn parse_translation(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SubalignError::Translation("Empty translation received".to_string()));
    }

    if let Ok(result) = serde_json::from_str::<TranslationResult>(raw) {
        let text = result.text.trim();
        if text.is_empty() {
            return Err(SubalignError::Translation("Empty translation received".to_string()));
        }
        return Ok(text.to_string());
    }

    // Fall back to the first line that is not model chatter
    raw.lines()
        .map(str::trim)
        .find(|line| {
            !line.is_empty()
                && !line.starts_with("Here ")
                && !line.starts_with("Translation:")
                && !(line.starts_with("**") && line.ends_with("**"))
        })
        .map(|line| line.trim_matches('"').to_string())
        .ok_or_else(|| SubalignError::Translation(format!("Unusable translation: {}", raw)))
}
