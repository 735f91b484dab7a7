//! Transcript export: plain text, SubRip subtitles, and JSON.
//!
//! Produced once per session, at shutdown, from the aggregated final results.
//! Formats are bit-exact contracts — see the renderer tests.

use crate::error::{LavalierError, Result};
use crate::stt::model::AlignedResult;
use std::fs;
use std::path::{Path, PathBuf};

/// Convert seconds to `MM:SS` (minutes are not wrapped at an hour).
pub fn format_timestamp(secs: f64) -> String {
    let total = secs.max(0.0);
    let minutes = (total / 60.0).floor() as u64;
    let seconds = (total % 60.0).floor() as u64;
    format!("{:02}:{:02}", minutes, seconds)
}

/// Convert seconds to the SubRip timestamp form `HH:MM:SS,mmm`.
pub fn format_srt_timestamp(secs: f64) -> String {
    let total = secs.max(0.0);
    let hours = (total / 3600.0).floor() as u64;
    let minutes = ((total % 3600.0) / 60.0).floor() as u64;
    let seconds = (total % 60.0).floor() as u64;
    let millis = (total.fract() * 1000.0) as u64;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// One exportable transcript format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Subtitle,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Subtitle => "srt",
            ExportFormat::Json => "json",
        }
    }
}

/// Parse an output-format selector: `all` or a comma-separated subset of
/// `txt`, `srt`, `json`. Case-insensitive; duplicates collapse.
pub fn parse_formats(selector: &str) -> Result<Vec<ExportFormat>> {
    let mut formats = Vec::new();
    for part in selector.split(',') {
        let part = part.trim().to_lowercase();
        let parsed = match part.as_str() {
            "" => continue,
            "all" => {
                return Ok(vec![
                    ExportFormat::Text,
                    ExportFormat::Subtitle,
                    ExportFormat::Json,
                ]);
            }
            "txt" => ExportFormat::Text,
            "srt" => ExportFormat::Subtitle,
            "json" => ExportFormat::Json,
            other => {
                return Err(LavalierError::ConfigInvalidValue {
                    key: "output.formats".to_string(),
                    message: format!("unknown format '{}' (expected txt/srt/json/all)", other),
                });
            }
        };
        if !formats.contains(&parsed) {
            formats.push(parsed);
        }
    }
    if formats.is_empty() {
        return Err(LavalierError::ConfigInvalidValue {
            key: "output.formats".to_string(),
            message: "no formats selected".to_string(),
        });
    }
    Ok(formats)
}

/// Render the plain-text transcript: one line per sentence.
pub fn render_text(results: &[AlignedResult]) -> String {
    let mut out = String::new();
    for result in results {
        for sentence in &result.sentences {
            out.push_str(&format!(
                "[{} - {}] {}\n",
                format_timestamp(sentence.start),
                format_timestamp(sentence.end),
                sentence.text
            ));
        }
    }
    out
}

/// Render the SubRip transcript: sequential 1-based cues.
pub fn render_subtitles(results: &[AlignedResult]) -> String {
    let mut out = String::new();
    let mut index = 1u32;
    for result in results {
        for sentence in &result.sentences {
            out.push_str(&format!(
                "{}\n{} --> {}\n{}\n\n",
                index,
                format_srt_timestamp(sentence.start),
                format_srt_timestamp(sentence.end),
                sentence.text
            ));
            index += 1;
        }
    }
    out
}

/// Render the structured transcript as pretty-printed JSON.
pub fn render_json(results: &[AlignedResult]) -> Result<String> {
    serde_json::to_string_pretty(results).map_err(|e| LavalierError::Export {
        message: format!("JSON serialization failed: {}", e),
    })
}

/// Write the session transcript in each requested format.
///
/// Files land in `dir` as `transcription_<YYYYMMDD_HHMMSS>.<ext>`. An empty
/// session writes nothing. Returns the written paths.
pub fn save_transcripts(
    results: &[AlignedResult],
    dir: &Path,
    formats: &[ExportFormat],
    quiet: bool,
) -> Result<Vec<PathBuf>> {
    if results.is_empty() {
        if !quiet {
            eprintln!("No transcriptions to save.");
        }
        return Ok(Vec::new());
    }

    fs::create_dir_all(dir)?;

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let base = dir.join(format!("transcription_{}", stamp));

    let mut written = Vec::new();
    for format in formats {
        let path = base.with_extension(format.extension());
        let contents = match format {
            ExportFormat::Text => render_text(results),
            ExportFormat::Subtitle => render_subtitles(results),
            ExportFormat::Json => render_json(results)?,
        };
        fs::write(&path, contents)?;
        if !quiet {
            eprintln!("Saved transcript to {}", path.display());
        }
        written.push(path);
    }

    Ok(written)
}
