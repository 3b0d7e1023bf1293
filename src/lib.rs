//! Subalign - Automatic Subtitle Synchronization
//!
//! Aligns a subtitle track to a reference timeline (another subtitle, a
//! transcription of the media, or a translation of either) by matching
//! cue text, fitting a robust affine drift model and correcting every cue.

pub mod cli;
pub mod config;
pub mod correct;
pub mod error;
pub mod estimator;
pub mod matcher;
pub mod normalize;
pub mod report;
pub mod subtitle;
pub mod track;
pub mod transcribe;
pub mod translate;
pub mod workflow;

pub use estimator::{AffineModel, DriftEstimator};
pub use matcher::{find_matches, Match};
pub use track::{Cue, Track};
pub use workflow::{align, Alignment};
