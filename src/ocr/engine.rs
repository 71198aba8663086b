use anyhow::{anyhow, Context, Result};
use image::{ImageBuffer, Luma};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;
use super::{Polygon, TextItem};

/// Tesseract page segmentation mode: a single uniform block of text.
const PAGE_SEGMENTATION_MODE: &str = "6";

/// Runs the Tesseract CLI on a preprocessed grayscale image.
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: PathBuf,
    language: String,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths, language: &str) -> Self {
        Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
            language: language.to_string(),
        }
    }

    /// Recognizes text lines in `img`. Coordinates are in `img` pixels.
    pub fn recognize_lines(&self, img: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Result<Vec<TextItem>> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        // Tesseract writes to stdout when the output base is "stdout"
        let output = Command::new(&self.executable)
            .arg(temp_input.path())
            .arg("stdout")
            .arg("--tessdata-dir")
            .arg(&self.tessdata)
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(PAGE_SEGMENTATION_MODE)
            .arg("tsv")
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(parse_tsv_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// A word read from one TSV row.
struct TsvWord {
    text: String,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    confidence: f32,
}

/// Parses Tesseract TSV output into one item per text line, in scan order.
///
/// Words are grouped by (block, paragraph, line); the line polygon is the
/// bounding box of its words.
pub(super) fn parse_tsv_output(tsv: &str) -> Vec<TextItem> {
    let mut lines: BTreeMap<(i32, i32, i32), Vec<TsvWord>> = BTreeMap::new();

    // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
    //             left, top, width, height, conf, text
    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // Level 5 = word
        if fields[0].parse::<i32>().unwrap_or(-1) != 5 {
            continue;
        }

        let text = fields[11].trim();
        let confidence: f32 = fields[10].parse().unwrap_or(-1.0);
        if text.is_empty() || confidence < 0.0 {
            continue;
        }

        let num = |i: usize| fields[i].parse::<i32>().unwrap_or(0);
        let key = (num(2), num(3), num(4));
        let (left, top) = (num(6), num(7));
        lines.entry(key).or_default().push(TsvWord {
            text: text.to_string(),
            left,
            top,
            right: left + num(8),
            bottom: top + num(9),
            confidence,
        });
    }

    lines
        .into_values()
        .map(|words| {
            let left = words.iter().map(|w| w.left).min().unwrap_or(0);
            let top = words.iter().map(|w| w.top).min().unwrap_or(0);
            let right = words.iter().map(|w| w.right).max().unwrap_or(0);
            let bottom = words.iter().map(|w| w.bottom).max().unwrap_or(0);
            let confidence =
                words.iter().map(|w| w.confidence).sum::<f32>() / words.len() as f32;
            TextItem {
                text: join_words(words.iter().map(|w| w.text.as_str())),
                polygon: rect_polygon(left, top, right, bottom),
                confidence,
            }
        })
        .collect()
}

/// Joins words, inserting a space only between two ASCII-alphanumeric words.
///
/// Tesseract splits CJK text into single-character "words"; gluing them back
/// keeps phrases such as "开始答题" intact for substring tests.
fn join_words<'a>(words: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in words {
        let prev_ascii = out.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
        let next_ascii = word.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
        if prev_ascii && next_ascii {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Corner points clockwise from the top-left.
pub(super) fn rect_polygon(left: i32, top: i32, right: i32, bottom: i32) -> Polygon {
    [(left, top), (right, top), (right, bottom), (left, bottom)]
}
