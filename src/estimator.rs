use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EstimatorConfig;
use crate::error::{Result, SubalignError};
use crate::matcher::Match;

/// Drift between two tracks: `offset(t) = coefficient * t + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineModel {
    pub coefficient: f64,
    pub intercept: f64,
}

impl AffineModel {
    pub fn new(coefficient: f64, intercept: f64) -> Self {
        Self { coefficient, intercept }
    }

    /// Predicted offset (input minus sync) at input time `t`
    pub fn offset_at(&self, t: f64) -> f64 {
        self.coefficient * t + self.intercept
    }
}

/// One `(input start, input start - sync start)` pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
}

impl From<&Match<'_>> for Observation {
    fn from(m: &Match<'_>) -> Self {
        Self {
            x: m.input.start,
            y: m.offset(),
        }
    }
}

/// Best consensus seen during a RANSAC run
struct Consensus {
    inliers: Vec<usize>,
    sse: f64,
}

/// Robust affine drift estimation (RANSAC, averaged over several runs)
pub struct DriftEstimator {
    config: EstimatorConfig,
}

impl DriftEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn fit(&self, matches: &[Match<'_>]) -> Result<AffineModel> {
        let observations: Vec<Observation> = matches.iter().map(Observation::from).collect();
        self.fit_observations(&observations)
    }

    pub fn fit_observations(&self, observations: &[Observation]) -> Result<AffineModel> {
        if observations.len() < 2 {
            return Err(SubalignError::InsufficientData {
                matches: observations.len(),
            });
        }

        let runs = self.config.runs.max(1);
        info!(
            "Fitting drift model on {} observations ({} runs, threshold {}s)",
            observations.len(),
            runs,
            self.config.residual_threshold
        );

        let models = (0..runs)
            .into_par_iter()
            .map(|run| self.fit_run(observations, run))
            .collect::<Result<Vec<_>>>()?;

        let count = models.len() as f64;
        let model = AffineModel {
            coefficient: models.iter().map(|m| m.coefficient).sum::<f64>() / count,
            intercept: models.iter().map(|m| m.intercept).sum::<f64>() / count,
        };

        info!(
            "Drift model: coefficient={:.6}, intercept={:.3}s",
            model.coefficient, model.intercept
        );
        Ok(model)
    }

    /// A single robust fit, retried a bounded number of times
    fn fit_run(&self, observations: &[Observation], run: usize) -> Result<AffineModel> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(run as u64)),
            None => StdRng::from_entropy(),
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut last_reason = String::new();

        for attempt in 1..=max_attempts {
            match ransac(observations, &self.config, &mut rng) {
                Ok(model) => {
                    debug!(
                        "Run {} converged on attempt {}: coefficient={:.6}, intercept={:.3}",
                        run, attempt, model.coefficient, model.intercept
                    );
                    return Ok(model);
                }
                Err(reason) => {
                    debug!("Run {} attempt {} failed: {}", run, attempt, reason);
                    last_reason = reason.to_string();
                }
            }
        }

        Err(SubalignError::RegressionFit {
            attempts: max_attempts,
            reason: last_reason,
        })
    }
}

fn ransac(
    observations: &[Observation],
    config: &EstimatorConfig,
    rng: &mut StdRng,
) -> std::result::Result<AffineModel, &'static str> {
    let n = observations.len();
    let sample_size = config.min_samples.clamp(2, n);
    let mut best: Option<Consensus> = None;

    for _ in 0..config.max_trials {
        let subset: Vec<Observation> = sample(rng, n, sample_size)
            .iter()
            .map(|i| observations[i])
            .collect();

        let Some(candidate) = least_squares(&subset) else {
            continue;
        };

        let consensus = consensus(observations, &candidate, config.residual_threshold);
        if consensus.inliers.len() < 2 {
            continue;
        }

        let improves = best.as_ref().map_or(true, |b| {
            consensus.inliers.len() > b.inliers.len()
                || (consensus.inliers.len() == b.inliers.len() && consensus.sse < b.sse)
        });

        if improves {
            let everything = consensus.inliers.len() == n;
            best = Some(consensus);
            if everything {
                break;
            }
        }
    }

    let best = best.ok_or("no candidate line reached consensus")?;
    let inliers: Vec<Observation> = best.inliers.iter().map(|&i| observations[i]).collect();

    least_squares(&inliers).ok_or("inlier set is degenerate")
}

fn consensus(observations: &[Observation], model: &AffineModel, threshold: f64) -> Consensus {
    let mut inliers = Vec::new();
    let mut sse = 0.0;

    for (i, obs) in observations.iter().enumerate() {
        let residual = obs.y - model.offset_at(obs.x);
        if residual.abs() <= threshold {
            inliers.push(i);
            sse += residual * residual;
        }
    }

    Consensus { inliers, sse }
}

/// Ordinary least squares line; `None` when x has no spread
fn least_squares(points: &[Observation]) -> Option<AffineModel> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|p| (p.x - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|p| (p.x - mean_x) * (p.y - mean_y)).sum();

    if sxx <= 1e-12 {
        return None;
    }

    let coefficient = sxy / sxx;
    let intercept = mean_y - coefficient * mean_x;

    (coefficient.is_finite() && intercept.is_finite()).then_some(AffineModel {
        coefficient,
        intercept,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Cue;
    use rand::Rng;

    fn seeded() -> DriftEstimator {
        DriftEstimator::new(EstimatorConfig {
            seed: Some(42),
            ..EstimatorConfig::default()
        })
    }

    /// Input/sync cue pairs for the given `(input start, sync start)` pairs
    fn cue_pairs(starts: &[(f64, f64)]) -> Vec<(Cue, Cue)> {
        starts
            .iter()
            .enumerate()
            .map(|(i, &(input, sync))| {
                let text = format!("spoken line number {}", i);
                (
                    Cue::from_text(i as u32 + 1, input, input + 2.0, &text),
                    Cue::from_text(i as u32 + 1, sync, sync + 2.0, &text),
                )
            })
            .collect()
    }

    fn as_matches(pairs: &[(Cue, Cue)]) -> Vec<Match<'_>> {
        pairs
            .iter()
            .map(|(input, sync)| Match {
                score: 100,
                input,
                sync,
            })
            .collect()
    }

    fn drifted(c: f64, b: f64, count: usize) -> Vec<(f64, f64)> {
        (0..count)
            .map(|i| {
                let x = 20.0 + i as f64 * 45.0;
                (x, x - (c * x + b))
            })
            .collect()
    }

    #[test]
    fn test_empty_matches_is_insufficient() {
        let err = seeded().fit(&[]).unwrap_err();
        assert!(matches!(err, SubalignError::InsufficientData { matches: 0 }));
    }

    #[test]
    fn test_single_match_is_insufficient() {
        let pairs = cue_pairs(&[(10.0, 8.0)]);
        let err = seeded().fit(&as_matches(&pairs)).unwrap_err();
        assert!(matches!(err, SubalignError::InsufficientData { matches: 1 }));
    }

    #[test]
    fn test_identity_fit() {
        let starts: Vec<(f64, f64)> = (0..20).map(|i| (i as f64 * 7.5, i as f64 * 7.5)).collect();
        let pairs = cue_pairs(&starts);

        let model = seeded().fit(&as_matches(&pairs)).unwrap();
        assert!(model.coefficient.abs() < 1e-3);
        assert!(model.intercept.abs() < 1e-3);
    }

    #[test]
    fn test_drift_recovery() {
        let pairs = cue_pairs(&drifted(0.02, 3.5, 60));

        let model = seeded().fit(&as_matches(&pairs)).unwrap();
        assert!((model.coefficient - 0.02).abs() < 1e-2);
        assert!((model.intercept - 3.5).abs() < 0.5);
    }

    #[test]
    fn test_outlier_tolerance() {
        let mut starts = drifted(0.02, 3.5, 60);
        let mut rng = StdRng::seed_from_u64(7);
        for (x, sync) in starts.iter_mut().step_by(5) {
            let shift = rng.gen_range(20.0..300.0) * if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            *sync = *x + shift;
        }
        let pairs = cue_pairs(&starts);

        let model = seeded().fit(&as_matches(&pairs)).unwrap();
        assert!((model.coefficient - 0.02).abs() < 1e-2);
        assert!((model.intercept - 3.5).abs() < 0.5);
    }

    #[test]
    fn test_ten_pairs_with_scale_and_offset() {
        let starts: Vec<(f64, f64)> = (0..10)
            .map(|i| {
                let x = 100.0 + i as f64 * 60.0;
                (x, (x - 5.0) / 1.01)
            })
            .collect();
        let pairs = cue_pairs(&starts);

        let model = seeded().fit(&as_matches(&pairs)).unwrap();
        assert!((model.coefficient - 0.01 / 1.01).abs() < 1e-3);
        assert!((model.intercept - 5.0 / 1.01).abs() < 0.05);
    }

    #[test]
    fn test_unseeded_fit_is_stable_on_clean_data() {
        let pairs = cue_pairs(&drifted(-0.001, 12.0, 30));
        let model = DriftEstimator::new(EstimatorConfig::default())
            .fit(&as_matches(&pairs))
            .unwrap();
        assert!((model.coefficient + 0.001).abs() < 1e-4);
        assert!((model.intercept - 12.0).abs() < 0.01);
    }

    #[test]
    fn test_degenerate_data_exhausts_attempts() {
        // All observations share the same input time, so no line exists
        let pairs = cue_pairs(&[(50.0, 40.0), (50.0, 41.0), (50.0, 42.0), (50.0, 43.0)]);

        let err = seeded().fit(&as_matches(&pairs)).unwrap_err();
        match err {
            SubalignError::RegressionFit { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_least_squares_exact_line() {
        let points: Vec<Observation> = (0..5)
            .map(|i| Observation {
                x: i as f64,
                y: 2.0 * i as f64 + 1.0,
            })
            .collect();
        let model = least_squares(&points).unwrap();
        assert!((model.coefficient - 2.0).abs() < 1e-12);
        assert!((model.intercept - 1.0).abs() < 1e-12);
        assert!(least_squares(&points[..1]).is_none());
    }
}
