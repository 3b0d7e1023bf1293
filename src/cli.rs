use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::MatchConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronize a subtitle file against a reference subtitle or a media file
    Sync {
        /// Subtitle file to synchronize
        #[arg(short, long)]
        subtitle: PathBuf,

        /// Reference subtitle file with correct timings
        #[arg(short, long, conflicts_with = "media", required_unless_present = "media")]
        reference: Option<PathBuf>,

        /// Media file to transcribe as the reference
        #[arg(short, long)]
        media: Option<PathBuf>,

        /// Output path for the synchronized subtitle
        #[arg(short, long)]
        output: PathBuf,

        /// Translate the reference into this language before matching (code such as en, ja, fr)
        #[arg(short, long)]
        translate_to: Option<String>,

        /// Write a JSON diagnostics report for plotting
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Synchronize every media file in a directory with its same-name subtitle
    Batch {
        /// Directory containing media and subtitle files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output directory for synchronized subtitles
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Translate the transcriptions into this language before matching (code such as en, ja, fr)
        #[arg(short, long)]
        translate_to: Option<String>,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Show the cue correspondences between two subtitle files
    Matches {
        /// Subtitle file to synchronize
        #[arg(short, long)]
        subtitle: PathBuf,

        /// Reference subtitle file
        #[arg(short, long)]
        reference: PathBuf,

        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "subalign.toml")]
        output: PathBuf,
    },
}

/// Matching thresholds that override the configuration file
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ThresholdArgs {
    /// Maximum distance in seconds between cues to compare
    #[arg(long)]
    pub max_time_diff: Option<f64>,

    /// Minimum normalized text length for a cue to be matched
    #[arg(long)]
    pub min_text_length: Option<usize>,

    /// Minimum fuzzy score (0-100) for a candidate
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub min_score: Option<u8>,
}

impl ThresholdArgs {
    pub fn apply_to(&self, matcher: &mut MatchConfig) {
        if let Some(max_time_diff) = self.max_time_diff {
            matcher.max_time_diff = max_time_diff;
        }
        if let Some(min_text_length) = self.min_text_length {
            matcher.min_text_length = min_text_length;
        }
        if let Some(min_score) = self.min_score {
            matcher.min_score = min_score;
        }
    }
}
