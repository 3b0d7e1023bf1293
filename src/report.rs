use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::estimator::AffineModel;
use crate::matcher::Match;

/// One correspondence as seen by the drift model, ready for plotting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPoint {
    pub score: u8,
    pub input_id: u32,
    pub sync_id: u32,
    pub input_start: f64,
    pub sync_start: f64,
    /// Observed offset (input - sync)
    pub offset: f64,
    /// Offset predicted by the model at `input_start`
    pub fitted_offset: f64,
    pub residual: f64,
    pub input_text: String,
    pub sync_text: String,
}

/// Diagnostic summary of one synchronization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub generated_at: DateTime<Utc>,
    pub model: AffineModel,
    pub input_cues: usize,
    pub sync_cues: usize,
    pub match_count: usize,
    pub points: Vec<MatchPoint>,
}

impl DiagnosticsReport {
    pub fn new(matches: &[Match<'_>], model: AffineModel, input_cues: usize, sync_cues: usize) -> Self {
        let points = matches
            .iter()
            .map(|m| {
                let offset = m.offset();
                let fitted_offset = model.offset_at(m.input.start);
                MatchPoint {
                    score: m.score,
                    input_id: m.input.id,
                    sync_id: m.sync.id,
                    input_start: m.input.start,
                    sync_start: m.sync.start,
                    offset,
                    fitted_offset,
                    residual: offset - fitted_offset,
                    input_text: m.input.text(),
                    sync_text: m.sync.text(),
                }
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            model,
            input_cues,
            sync_cues,
            match_count: matches.len(),
            points,
        }
    }

    /// Points whose residual stays within `threshold` seconds
    pub fn inlier_count(&self, threshold: f64) -> usize {
        self.points.iter().filter(|p| p.residual.abs() <= threshold).count()
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        info!("Diagnostics report written to {}", path.display());
        Ok(())
    }
}
