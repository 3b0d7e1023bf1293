use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{Result, SubalignError};
use crate::track::{Cue, Track};

/// Read an SRT file into a track
pub async fn read_srt<P: AsRef<Path>>(path: P) -> Result<Track> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SubalignError::FileNotFound(path.display().to_string()));
    }

    let is_srt = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"));
    if !is_srt {
        return Err(SubalignError::UnsupportedFormat(format!(
            "{} is not an SRT file",
            path.display()
        )));
    }

    info!("Reading SRT file: {}", path.display());
    let bytes = fs::read(path).await?;
    let content = String::from_utf8_lossy(&bytes);

    let track = parse_srt(&content)?;
    info!("Read {} cues from {}", track.len(), path.display());
    Ok(track)
}

/// Write a track as an SRT file
pub async fn write_srt<P: AsRef<Path>>(track: &Track, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    fs::write(output_path, format_srt(track)).await?;

    info!("SRT file generated successfully");
    Ok(())
}

/// Parse SRT content. Blocks with broken timings are skipped.
pub fn parse_srt(content: &str) -> Result<Track> {
    let content = content.trim_start_matches('\u{feff}').replace('\r', "");
    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut index = 0;

    for line in content.lines().chain(std::iter::once("")) {
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }
        if block.is_empty() {
            continue;
        }

        index += 1;
        match parse_block(index, &block) {
            Ok(cue) => cues.push(cue),
            Err(e) => warn!("Skipping cue: {}", e),
        }
        block.clear();
    }

    if cues.is_empty() && index > 0 {
        return Err(SubalignError::Subtitle(format!(
            "none of the {} blocks could be parsed",
            index
        )));
    }

    debug!("Parsed {} of {} SRT blocks", cues.len(), index);
    Ok(Track::new(cues))
}

fn parse_block(index: usize, block: &[&str]) -> Result<Cue> {
    let invalid = |reason: String| SubalignError::InvalidCue { index, reason };

    // Some files omit the counter line; accept a timing line in first position
    let (id, timing_at) = match block[0].trim().parse::<u32>() {
        Ok(id) => (id, 1),
        Err(_) if block[0].contains("-->") => (index as u32, 0),
        Err(_) => return Err(invalid(format!("bad cue number '{}'", block[0].trim()))),
    };

    let timing = block
        .get(timing_at)
        .ok_or_else(|| invalid("missing timing line".to_string()))?;

    let (start, end) = timing
        .split_once("-->")
        .ok_or_else(|| invalid(format!("bad timing line '{}'", timing)))?;

    // Position hints may follow the end time ("00:00:02,000 X1:...")
    let end = end.split_whitespace().next().unwrap_or_default();

    let start = parse_timestamp(start).map_err(|e| invalid(e.to_string()))?;
    let end = parse_timestamp(end).map_err(|e| invalid(e.to_string()))?;

    let lines = block[timing_at + 1..].iter().map(|l| l.to_string()).collect();
    let cue = Cue::new(id, start, end, lines);
    cue.validate(index)?;
    Ok(cue)
}

/// Parse `HH:MM:SS,mmm` (or with `.`) into seconds
pub fn parse_timestamp(text: &str) -> Result<f64> {
    let bad = || SubalignError::Subtitle(format!("bad timestamp '{}'", text.trim()));

    let normalized = text.trim().replace(',', ".");
    let mut parts = normalized.split(':');

    let (hours, minutes, seconds) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(m), Some(s), None) => (h, m, s),
        _ => return Err(bad()),
    };

    let hours: u64 = hours.parse().map_err(|_| bad())?;
    let minutes: u64 = minutes.parse().map_err(|_| bad())?;
    let seconds: f64 = seconds.parse().map_err(|_| bad())?;

    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return Err(bad());
    }

    let whole = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60))
        .ok_or_else(bad)?;

    Ok(whole as f64 + seconds)
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm)
pub fn format_timestamp(seconds: f64) -> String {
    let total_milliseconds = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

pub fn format_srt(track: &Track) -> String {
    let mut srt_content = String::new();

    for cue in track {
        srt_content.push_str(&format!(
            "{}\n{} --> {}\n",
            cue.id,
            format_timestamp(cue.start),
            format_timestamp(cue.end)
        ));
        for line in &cue.lines {
            srt_content.push_str(line);
            srt_content.push('\n');
        }
        srt_content.push('\n');
    }

    srt_content
}
