//! Subalign - Automatic Subtitle Synchronization
//!
//! Command line entry point: loads configuration, sets up logging and
//! dispatches to the synchronization workflow.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subalign::cli::{Args, Commands};
use subalign::config::Config;
use subalign::matcher::find_matches;
use subalign::report::DiagnosticsReport;
use subalign::subtitle::read_srt;
use subalign::workflow::{SyncSource, Workflow};

const DEFAULT_CONFIG: &str = "subalign.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = setup_logging(args.verbose)?;
    info!("Starting Subalign - Automatic Subtitle Synchronization");

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG);
                Config::from_file(DEFAULT_CONFIG)?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Sync { subtitle, reference, media, output, translate_to, report, thresholds } => {
            thresholds.apply_to(&mut config.matcher);

            let source = match (reference, media) {
                (Some(reference), _) => SyncSource::Subtitle(reference),
                (None, Some(media)) => SyncSource::Media(media),
                (None, None) => anyhow::bail!("Provide a reference subtitle with --reference or a media file with --media"),
            };

            let workflow = Workflow::new(config)?;
            let alignment = workflow
                .sync_file(&subtitle, &source, &output, translate_to.as_deref(), report.as_deref())
                .await?;

            println!(
                "Wrote synchronized subtitle file to {} (coefficient {:.6}, intercept {:.3}s, {} matches)",
                output.display(),
                alignment.model.coefficient,
                alignment.model.intercept,
                alignment.report.match_count
            );
        }
        Commands::Batch { input_dir, output_dir, translate_to, thresholds } => {
            thresholds.apply_to(&mut config.matcher);

            let workflow = Workflow::new(config)?;
            let summary = workflow
                .process_directory(&input_dir, output_dir.as_deref(), translate_to.as_deref())
                .await?;

            println!(
                "Synchronized {} files ({} failed, {} without subtitles)",
                summary.synced, summary.failed, summary.skipped
            );
        }
        Commands::Matches { subtitle, reference, json, thresholds } => {
            thresholds.apply_to(&mut config.matcher);
            config.validate()?;

            let input = read_srt(&subtitle).await?;
            let sync = read_srt(&reference).await?;
            let matches = find_matches(&input, &sync, &config.matcher);

            if json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else {
                print_matches_table(&matches, &config);
            }
        }
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    info!("Subalign completed successfully");
    Ok(())
}

fn print_matches_table(matches: &[subalign::Match<'_>], config: &Config) {
    if matches.is_empty() {
        println!("No unambiguous matches found.");
        return;
    }

    println!("\n{:<6} {:>12} {:>12} {:>10}  {:<40}", "Score", "Input", "Reference", "Offset", "Text");
    println!("{}", "-".repeat(86));
    for m in matches {
        let mut text = m.input.normalized.clone();
        if text.chars().count() > 40 {
            text = text.chars().take(37).collect::<String>() + "...";
        }
        println!(
            "{:<6} {:>12} {:>12} {:>10.3}  {:<40}",
            m.score,
            subalign::subtitle::format_timestamp(m.input.start),
            subalign::subtitle::format_timestamp(m.sync.start),
            m.offset(),
            text
        );
    }

    // Preview the model the sync command would fit
    match subalign::DriftEstimator::new(config.estimator.clone()).fit(matches) {
        Ok(model) => {
            let report = DiagnosticsReport::new(matches, model, 0, 0);
            println!(
                "\n{} matches, {} within {}s of the fitted line (coefficient {:.6}, intercept {:.3}s)",
                matches.len(),
                report.inlier_count(config.estimator.residual_threshold),
                config.estimator.residual_threshold,
                model.coefficient,
                model.intercept
            );
        }
        Err(e) => println!("\n{} matches, no drift model: {}", matches.len(), e),
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".subalign").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "subalign.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("subalign.log").display());

    Ok(guard)
}
