//! Answer-bank loader.
//!
//! The bank is a directory of newline-delimited JSON files. Each line is one
//! record with at least `q` (question) and `ans` (answer letter); other
//! fields are ignored. A bad line is reported and skipped, never fatal.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::AnswerRecord;
use crate::error::{QuizError, Result};

/// Records read from one or more files, plus the lines that were skipped.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<AnswerRecord>,
    pub skipped: Vec<QuizError>,
}

impl LoadReport {
    fn merge(&mut self, other: LoadReport) {
        self.records.extend(other.records);
        self.skipped.extend(other.skipped);
    }
}

/// Parses one file's contents. Blank lines are ignored.
pub fn parse_json_lines(path: &Path, contents: &[u8]) -> LoadReport {
    let contents = contents.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(contents);
    let mut report = LoadReport::default();

    for (index, raw) in contents.split(|&b| b == b'\n').enumerate() {
        let line_no = index + 1;
        let malformed = |reason: String| QuizError::MalformedRecord {
            path: path.to_path_buf(),
            line: line_no,
            reason,
        };

        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                report.skipped.push(malformed(e.to_string()));
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<AnswerRecord>(line) {
            Ok(record) => report.records.push(record),
            Err(e) => report.skipped.push(malformed(e.to_string())),
        }
    }

    for err in &report.skipped {
        warn!("Error parsing JSON on line: {}", err);
    }
    report
}

/// Loads a single answer-bank file.
pub fn load_file(path: &Path) -> Result<LoadReport> {
    let contents = fs::read(path)?;
    Ok(parse_json_lines(path, &contents))
}

/// Loads every file below `dir`, recursively, in sorted path order.
///
/// Unreadable files are logged and skipped. A missing directory is an error.
pub fn load_dir(dir: &Path) -> Result<LoadReport> {
    let mut files = Vec::new();
    collect_files(dir, &mut files)?;
    files.sort();

    let mut report = LoadReport::default();
    for file in &files {
        match load_file(file) {
            Ok(file_report) => report.merge(file_report),
            Err(e) => warn!("Skipping answer file {}: {}", file.display(), e),
        }
    }

    info!(
        "Loaded {} answer records from {} files ({} lines skipped)",
        report.records.len(),
        files.len(),
        report.skipped.len()
    );
    Ok(report)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
