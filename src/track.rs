use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SubalignError};
use crate::normalize::normalize_lines;

/// One timed subtitle entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub id: u32,
    /// Start time in seconds, may be negative until sanitized
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    pub lines: Vec<String>,
    /// Derived from `lines`, used for fuzzy comparison
    pub normalized: String,
}

impl Cue {
    pub fn new(id: u32, start: f64, end: f64, lines: Vec<String>) -> Self {
        let normalized = normalize_lines(&lines);
        Self {
            id,
            start,
            end,
            lines,
            normalized,
        }
    }

    /// Convenience constructor for single-line cues
    pub fn from_text(id: u32, start: f64, end: f64, text: &str) -> Self {
        Self::new(id, start, end, text.lines().map(str::to_string).collect())
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Copy of this cue with new timings, text untouched
    pub fn retimed(&self, start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            ..self.clone()
        }
    }

    /// Copy of this cue with replacement text lines
    pub fn with_lines(&self, lines: Vec<String>) -> Self {
        Self::new(self.id, self.start, self.end, lines)
    }

    /// Reject cues whose timings cannot be used for alignment
    pub fn validate(&self, index: usize) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(SubalignError::InvalidCue {
                index,
                reason: format!("non-finite timing {} --> {}", self.start, self.end),
            });
        }

        if self.end < self.start {
            return Err(SubalignError::InvalidCue {
                index,
                reason: format!("ends before it starts ({} --> {})", self.start, self.end),
            });
        }

        Ok(())
    }
}

/// Ordered sequence of cues, in read order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub cues: Vec<Cue>,
}

impl Track {
    pub fn new(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    /// Build a track, skipping cues that fail validation
    pub fn from_cues_lenient(cues: Vec<Cue>) -> Self {
        let cues = cues
            .into_iter()
            .enumerate()
            .filter_map(|(index, cue)| match cue.validate(index + 1) {
                Ok(()) => Some(cue),
                Err(e) => {
                    warn!("Skipping cue: {}", e);
                    None
                }
            })
            .collect();

        Self { cues }
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }
}

impl FromIterator<Cue> for Track {
    fn from_iter<I: IntoIterator<Item = Cue>>(iter: I) -> Self {
        Self {
            cues: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a Cue;
    type IntoIter = std::slice::Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}
