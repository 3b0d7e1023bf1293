use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::MatchConfig;
use crate::track::{Cue, Track};

/// A correspondence between an input cue and a sync cue
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Match<'a> {
    /// Fuzzy ratio, 0-100
    pub score: u8,
    pub input: &'a Cue,
    pub sync: &'a Cue,
}

impl Match<'_> {
    /// Observed offset between the two tracks at this point
    pub fn offset(&self) -> f64 {
        self.input.start - self.sync.start
    }
}

/// Similarity of two strings on a 0-100 scale.
///
/// Based on the insertion/deletion edit distance, so
/// `ratio = 1 - distance / (len_a + len_b)`, which equals
/// `2 * lcs / (len_a + len_b)`. Symmetric in its arguments.
pub fn fuzzy_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    let distance = total - 2 * lcs_len(&a, &b);
    let ratio = 1.0 - distance as f64 / total.max(1) as f64;

    (ratio * 100.0).round() as u8
}

/// Longest common subsequence length, two-row dynamic programming
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Correlate two tracks, keeping only unambiguous correspondences.
///
/// An input cue is matched only when exactly one sync cue within
/// `max_time_diff` scores at least `min_score`. Cues with several
/// candidates are dropped even if one of them scores higher.
pub fn find_matches<'a>(input: &'a Track, sync: &'a Track, config: &MatchConfig) -> Vec<Match<'a>> {
    info!(
        "Matching {} input cues against {} sync cues (max diff {}s, min length {}, min score {})",
        input.len(),
        sync.len(),
        config.max_time_diff,
        config.min_text_length,
        config.min_score
    );

    let matches: Vec<Match<'a>> = input
        .cues
        .par_iter()
        .filter(|cue| cue.normalized.chars().count() > config.min_text_length)
        .filter_map(|cue| match_cue(cue, sync, config))
        .collect();

    info!("Found {} unambiguous matches", matches.len());
    matches
}

fn match_cue<'a>(cue: &'a Cue, sync: &'a Track, config: &MatchConfig) -> Option<Match<'a>> {
    let mut candidates = sync
        .iter()
        .filter(|candidate| (candidate.start - cue.start).abs() <= config.max_time_diff)
        .filter_map(|candidate| {
            let score = fuzzy_ratio(&cue.normalized, &candidate.normalized);
            (score >= config.min_score).then_some(Match {
                score,
                input: cue,
                sync: candidate,
            })
        });

    let first = candidates.next()?;
    let others = candidates.count();
    if others > 0 {
        debug!(
            "Cue {} is ambiguous: {} candidates at or above {}",
            cue.id,
            others + 1,
            config.min_score
        );
        return None;
    }

    Some(first)
}
