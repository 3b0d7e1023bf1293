use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::correct::{apply, sanitize};
use crate::error::{Result, SubalignError};
use crate::estimator::{AffineModel, DriftEstimator};
use crate::matcher::find_matches;
use crate::report::DiagnosticsReport;
use crate::subtitle::{read_srt, write_srt};
use crate::track::Track;
use crate::transcribe::{Transcriber, TranscriberFactory};
use crate::translate::{OllamaTranslator, Translator};

const MEDIA_EXTENSIONS: [&str; 8] = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v"];

/// Where the reference timeline comes from
#[derive(Debug, Clone)]
pub enum SyncSource {
    /// An existing subtitle file with trusted timings
    Subtitle(PathBuf),
    /// A media file to transcribe
    Media(PathBuf),
}

/// Result of aligning one track to another
#[derive(Debug, Clone)]
pub struct Alignment {
    pub model: AffineModel,
    /// Corrected and sanitized track, ready to be written
    pub track: Track,
    pub report: DiagnosticsReport,
}

/// Counts from a directory run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub synced: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Align `input` to the timeline of `sync`.
///
/// The input track is left untouched; the corrected copy is returned
/// alongside the model and diagnostics.
pub fn align(input: &Track, sync: &Track, config: &Config) -> Result<Alignment> {
    let matches = find_matches(input, sync, &config.matcher);
    if matches.is_empty() {
        return Err(SubalignError::InsufficientData { matches: 0 });
    }

    let model = DriftEstimator::new(config.estimator.clone()).fit(&matches)?;
    let report = DiagnosticsReport::new(&matches, model, input.len(), sync.len());
    info!(
        "{} of {} matches agree with the model within {}s",
        report.inlier_count(config.estimator.residual_threshold),
        report.match_count,
        config.estimator.residual_threshold
    );

    let track = sanitize(apply(input, &model));

    Ok(Alignment { model, track, report })
}

pub struct Workflow {
    config: Config,
    transcriber: Box<dyn Transcriber>,
    translator: Box<dyn Translator>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let transcriber = TranscriberFactory::create_transcriber(config.transcriber.clone());
        let translator = Box::new(OllamaTranslator::new(config.translate.clone())?);

        Ok(Self {
            config,
            transcriber,
            translator,
        })
    }

    /// Build a workflow around caller-provided collaborators
    pub fn with_components(
        config: Config,
        transcriber: Box<dyn Transcriber>,
        translator: Box<dyn Translator>,
    ) -> Self {
        Self {
            config,
            transcriber,
            translator,
        }
    }

    /// Load the reference track, translating it when a language is given
    pub async fn load_reference(&self, source: &SyncSource, translate_to: Option<&str>) -> Result<Track> {
        let track = match source {
            SyncSource::Subtitle(path) => read_srt(path).await?,
            SyncSource::Media(path) => {
                if !path.exists() {
                    return Err(SubalignError::FileNotFound(path.display().to_string()));
                }
                let transcript = self.transcriber.transcribe(path).await?;
                // Speech-to-text tools occasionally emit cues that end before they start
                Track::from_cues_lenient(transcript.cues)
            }
        };
        info!("Reference track has {} cues", track.len());

        match translate_to {
            Some(language) => self.translator.translate_track(&track, language).await,
            None => Ok(track),
        }
    }

    /// Synchronize one subtitle file and write the corrected copy
    pub async fn sync_file(
        &self,
        subtitle_path: &Path,
        source: &SyncSource,
        output_path: &Path,
        translate_to: Option<&str>,
        report_path: Option<&Path>,
    ) -> Result<Alignment> {
        info!("Synchronizing subtitle file: {}", subtitle_path.display());

        let input = read_srt(subtitle_path).await?;
        let reference = self.load_reference(source, translate_to).await?;

        let alignment = align(&input, &reference, &self.config)?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        write_srt(&alignment.track, output_path).await?;

        if let Some(report_path) = report_path {
            alignment.report.save(report_path).await?;
        }

        info!(
            "Wrote synchronized subtitle file to {} ({} cues)",
            output_path.display(),
            alignment.track.len()
        );
        Ok(alignment)
    }

    /// Synchronize every media file in a directory that has a same-stem `.srt` next to it
    pub async fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        translate_to: Option<&str>,
    ) -> Result<BatchSummary> {
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(SubalignError::Config("Input path is not a directory".to_string()));
        }

        let output_dir = output_dir.unwrap_or(input_dir);
        fs::create_dir_all(output_dir).await?;

        let media_files = find_media_files(input_dir);
        info!("Found {} media files to process", media_files.len());

        let progress = ProgressBar::new(media_files.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
            progress.set_style(style.progress_chars("#>-"));
        }

        let mut summary = BatchSummary::default();
        for media_path in media_files {
            progress.set_message(file_label(&media_path));

            let subtitle_path = media_path.with_extension("srt");
            if !subtitle_path.exists() {
                warn!("No subtitle next to {}, skipping", media_path.display());
                summary.skipped += 1;
                progress.inc(1);
                continue;
            }

            let output_path = output_dir.join(format!("{}.synced.srt", file_stem(&media_path)));
            let source = SyncSource::Media(media_path.clone());

            match self.sync_file(&subtitle_path, &source, &output_path, translate_to, None).await {
                Ok(_) => {
                    info!("Successfully processed: {}", media_path.display());
                    summary.synced += 1;
                }
                Err(e) => {
                    warn!("Failed to process {}: {}", media_path.display(), e);
                    summary.failed += 1;
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        info!(
            "Batch finished: {} synced, {} failed, {} skipped",
            summary.synced, summary.failed, summary.skipped
        );
        Ok(summary)
    }
}

fn find_media_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .collect();

    files.sort();
    files
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::format_srt;
    use crate::track::Cue;
    use crate::transcribe::MockTranscriber;
    use crate::translate::MockTranslator;

    const COEFFICIENT: f64 = 0.001;
    const INTERCEPT: f64 = 2.0;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.matcher.max_time_diff = 20.0;
        config.estimator.seed = Some(1);
        config
    }

    /// Cues one minute apart so each only sees its own counterpart
    fn input_track() -> Track {
        (0..30)
            .map(|i| {
                let start = 30.0 + i as f64 * 60.0;
                Cue::from_text(i + 1, start, start + 2.5, &format!("this is spoken line number {}", i))
            })
            .collect()
    }

    /// The same cues on a drifted clock
    fn reference_track() -> Track {
        input_track()
            .iter()
            .map(|cue| {
                let shift = |t: f64| t - (COEFFICIENT * t + INTERCEPT);
                cue.retimed(shift(cue.start), shift(cue.end))
            })
            .collect()
    }

    fn unused_collaborators(config: Config) -> Workflow {
        Workflow::with_components(
            config,
            Box::new(MockTranscriber::new()),
            Box::new(MockTranslator::new()),
        )
    }

    #[test]
    fn test_align_recovers_model_and_keeps_input() {
        let input = input_track();
        let reference = reference_track();
        let snapshot = input.clone();

        let alignment = align(&input, &reference, &test_config()).unwrap();

        assert!((alignment.model.coefficient - COEFFICIENT).abs() < 1e-4);
        assert!((alignment.model.intercept - INTERCEPT).abs() < 0.01);
        assert_eq!(alignment.report.match_count, 30);
        assert_eq!(input, snapshot);

        for (corrected, expected) in alignment.track.iter().zip(reference.iter()) {
            assert!((corrected.start - expected.start).abs() < 0.01);
            assert!((corrected.end - expected.end).abs() < 0.01);
        }
    }

    #[test]
    fn test_align_identity() {
        let input = input_track();
        let alignment = align(&input, &input.clone(), &test_config()).unwrap();

        assert!(alignment.model.coefficient.abs() < 1e-3);
        assert!(alignment.model.intercept.abs() < 1e-3);
        for (corrected, original) in alignment.track.iter().zip(input.iter()) {
            assert!((corrected.start - original.start).abs() < 1e-3);
            assert!((corrected.end - original.end).abs() < 1e-3);
        }
    }

    #[test]
    fn test_align_without_matches_is_insufficient() {
        let input = input_track();
        let unrelated: Track = (0..5)
            .map(|i| Cue::from_text(i + 1, i as f64 * 60.0, i as f64 * 60.0 + 2.0, "zzzz qqqq xxxx"))
            .collect();

        let err = align(&input, &unrelated, &test_config()).unwrap_err();
        assert!(matches!(err, SubalignError::InsufficientData { matches: 0 }));
    }

    #[tokio::test]
    async fn test_sync_file_against_subtitle_reference() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("movie.srt");
        let reference_path = dir.path().join("reference.srt");
        let output_path = dir.path().join("out").join("movie.synced.srt");
        let report_path = dir.path().join("report.json");
        std::fs::write(&input_path, format_srt(&input_track())).unwrap();
        std::fs::write(&reference_path, format_srt(&reference_track())).unwrap();

        let workflow = unused_collaborators(test_config());
        let alignment = workflow
            .sync_file(
                &input_path,
                &SyncSource::Subtitle(reference_path),
                &output_path,
                None,
                Some(&report_path),
            )
            .await
            .unwrap();

        let written = read_srt(&output_path).await.unwrap();
        assert_eq!(written.len(), 30);
        assert_eq!(written.cues[0].id, 1);
        assert!((written.cues[0].start - alignment.track.cues[0].start).abs() < 1e-3);
        assert!(report_path.exists());
    }

    #[tokio::test]
    async fn test_sync_file_transcribes_and_translates_media() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("movie.srt");
        let media_path = dir.path().join("movie.mkv");
        let output_path = dir.path().join("movie.synced.srt");
        std::fs::write(&input_path, format_srt(&input_track())).unwrap();
        std::fs::write(&media_path, b"not really a video").unwrap();

        let mut transcriber = MockTranscriber::new();
        transcriber
            .expect_transcribe()
            .times(1)
            .returning(|_| {
                // Transcribed in another language: text differs until translated
                Ok(reference_track()
                    .iter()
                    .map(|cue| cue.with_lines(vec![format!("#{}", cue.id)]))
                    .collect())
            });

        let mut translator = MockTranslator::new();
        translator
            .expect_translate_track()
            .withf(|_, language| language == "en")
            .times(1)
            .returning(|_, _| Ok(reference_track()));

        let workflow = Workflow::with_components(test_config(), Box::new(transcriber), Box::new(translator));
        let alignment = workflow
            .sync_file(&input_path, &SyncSource::Media(media_path), &output_path, Some("en"), None)
            .await
            .unwrap();

        assert!((alignment.model.intercept - INTERCEPT).abs() < 0.01);
        assert!(output_path.exists());
    }

    #[tokio::test]
    async fn test_load_reference_drops_invalid_transcribed_cues() {
        let dir = tempfile::tempdir().unwrap();
        let media_path = dir.path().join("movie.mp4");
        std::fs::write(&media_path, b"").unwrap();

        let mut transcriber = MockTranscriber::new();
        transcriber.expect_transcribe().returning(|_| {
            Ok(Track::new(vec![
                Cue::from_text(1, 1.0, 2.0, "first line heard"),
                Cue::from_text(2, 9.0, 3.0, "backwards"),
                Cue::from_text(3, 10.0, 12.0, "third line heard"),
            ]))
        });

        let workflow = Workflow::with_components(test_config(), Box::new(transcriber), Box::new(MockTranslator::new()));
        let reference = workflow.load_reference(&SyncSource::Media(media_path), None).await.unwrap();

        let ids: Vec<u32> = reference.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_sync_file_reports_translation_outage() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("movie.srt");
        let reference_path = dir.path().join("reference.srt");
        std::fs::write(&input_path, format_srt(&input_track())).unwrap();
        std::fs::write(&reference_path, format_srt(&reference_track())).unwrap();

        let translator = OllamaTranslator::new(crate::config::TranslateConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            max_retries: 1,
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();

        let workflow = Workflow::with_components(test_config(), Box::new(MockTranscriber::new()), Box::new(translator));
        let err = workflow
            .sync_file(
                &input_path,
                &SyncSource::Subtitle(reference_path),
                &dir.path().join("o.srt"),
                Some("en"),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SubalignError::Translation(_)));
    }

    #[tokio::test]
    async fn test_sync_file_surfaces_transcriber_errors() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("movie.srt");
        let media_path = dir.path().join("movie.mp4");
        std::fs::write(&input_path, format_srt(&input_track())).unwrap();
        std::fs::write(&media_path, b"").unwrap();

        let mut transcriber = MockTranscriber::new();
        transcriber
            .expect_transcribe()
            .returning(|_| Err(SubalignError::Transcriber("autosub failed".to_string())));

        let workflow = Workflow::with_components(test_config(), Box::new(transcriber), Box::new(MockTranslator::new()));
        let err = workflow
            .sync_file(&input_path, &SyncSource::Media(media_path), &dir.path().join("o.srt"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SubalignError::Transcriber(_)));
    }

    #[tokio::test]
    async fn test_process_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("synced");
        std::fs::write(dir.path().join("a.mp4"), b"").unwrap();
        std::fs::write(dir.path().join("a.srt"), format_srt(&input_track())).unwrap();
        std::fs::write(dir.path().join("b.mkv"), b"").unwrap();
        std::fs::write(dir.path().join("c.webm"), b"").unwrap();
        std::fs::write(dir.path().join("c.srt"), format_srt(&input_track())).unwrap();

        let mut transcriber = MockTranscriber::new();
        transcriber.expect_transcribe().times(2).returning(|path| {
            if path.extension().is_some_and(|ext| ext == "mp4") {
                Ok(reference_track())
            } else {
                Err(SubalignError::Transcriber("no speech found".to_string()))
            }
        });

        let workflow = Workflow::with_components(test_config(), Box::new(transcriber), Box::new(MockTranslator::new()));
        let summary = workflow.process_directory(dir.path(), Some(&out), None).await.unwrap();

        assert_eq!(summary, BatchSummary { synced: 1, failed: 1, skipped: 1 });
        assert!(out.join("a.synced.srt").exists());
        assert!(!out.join("c.synced.srt").exists());
    }

    #[tokio::test]
    async fn test_process_directory_rejects_files() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let workflow = unused_collaborators(test_config());
        let err = workflow.process_directory(file.path(), None, None).await.unwrap_err();
        assert!(matches!(err, SubalignError::Config(_)));
    }

    #[test]
    fn test_find_media_files_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.MKV", "a.mp4", "notes.txt", "a.srt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let names: Vec<String> = find_media_files(dir.path()).iter().map(|p| file_label(p)).collect();
        assert_eq!(names, vec!["a.mp4", "b.MKV"]);
    }
}
