use tracing::{debug, info};

use crate::estimator::AffineModel;
use crate::track::{Cue, Track};

/// Undo the fitted drift on every cue, returning a new track.
///
/// The intercept is removed first, then the remainder is scaled by
/// `1 - coefficient`. Swapping the two steps gives different timings.
pub fn apply(track: &Track, model: &AffineModel) -> Track {
    track
        .iter()
        .map(|cue| cue.retimed(correct_time(cue.start, model), correct_time(cue.end, model)))
        .collect()
}

fn correct_time(time: f64, model: &AffineModel) -> f64 {
    let shifted = time - model.intercept;
    shifted - shifted * model.coefficient
}

/// Repair boundary artifacts left by the correction.
///
/// Cues ending at or before zero are dropped, negative starts are clamped
/// to zero and ids are renumbered from 1 in the surviving order.
pub fn sanitize(track: Track) -> Track {
    let before = track.len();

    let cues: Vec<Cue> = track
        .cues
        .into_iter()
        .filter(|cue| cue.end > 0.0)
        .enumerate()
        .map(|(index, mut cue)| {
            if cue.start < 0.0 {
                debug!("Clamping cue {} start {:.3} to 0", cue.id, cue.start);
                cue.start = 0.0;
            }
            cue.id = index as u32 + 1;
            cue
        })
        .collect();

    if cues.len() < before {
        info!("Dropped {} cues that ended before zero", before - cues.len());
    }

    Track::new(cues)
}
