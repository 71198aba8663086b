//! Text recognition for captured regions.
//!
//! [`TextRecognizer`] is the engine seam; [`Recognizer`] wraps one engine
//! per session and never fails: engine errors and empty detections both
//! come back as an empty result.

pub mod engine;
#[cfg(test)]
pub mod fake;
pub mod preprocess;
pub mod setup;

pub use engine::TesseractEngine;
pub use preprocess::{normalize_text, prepare_for_ocr};
pub use setup::ensure_tesseract;

use image::RgbaImage;
use tracing::{debug, warn};

use crate::error::{QuizError, Result};

/// Four corner points, clockwise from the top-left, in capture pixels.
pub type Polygon = [(i32, i32); 4];

/// One recognized piece of text and where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub polygon: Polygon,
    pub confidence: f32,
}

/// Results of one recognition call, in scan order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognizedText {
    items: Vec<TextItem>,
}

impl RecognizedText {
    pub fn new(items: Vec<TextItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[TextItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All strings concatenated in scan order.
    pub fn concat(&self) -> String {
        self.items.iter().map(|item| item.text.as_str()).collect()
    }
}

/// An OCR engine. Calls are blocking and must not overlap.
pub trait TextRecognizer: Send {
    fn recognize(&self, img: &RgbaImage) -> Result<RecognizedText>;
}

/// Tesseract-backed recognizer.
pub struct TesseractRecognizer {
    engine: TesseractEngine,
    upscale: u32,
}

impl TesseractRecognizer {
    /// Locates Tesseract and the language model, downloading the model if needed.
    pub fn new(language: &str, upscale: u32) -> anyhow::Result<Self> {
        let paths = ensure_tesseract(language)?;
        Ok(Self {
            engine: TesseractEngine::new(paths, language),
            upscale: upscale.max(1),
        })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, img: &RgbaImage) -> Result<RecognizedText> {
        let prepared = prepare_for_ocr(img, self.upscale);
        let lines = self
            .engine
            .recognize_lines(&prepared)
            .map_err(|e| QuizError::recognition(format!("{:#}", e)))?;

        // Map polygons back from the upscaled image to capture pixels
        let scale = self.upscale as i32;
        let items = lines
            .into_iter()
            .map(|mut item| {
                for point in item.polygon.iter_mut() {
                    *point = (point.0 / scale, point.1 / scale);
                }
                item
            })
            .collect();
        Ok(RecognizedText::new(items))
    }
}

/// Session-owned wrapper around one engine instance.
pub struct Recognizer {
    engine: Box<dyn TextRecognizer>,
}

impl Recognizer {
    pub fn new(engine: Box<dyn TextRecognizer>) -> Self {
        Self { engine }
    }

    /// Recognizes `img`; engine failures degrade to an empty result.
    pub fn recognize(&self, img: &RgbaImage) -> RecognizedText {
        if img.width() == 0 || img.height() == 0 {
            return RecognizedText::default();
        }
        match self.engine.recognize(img) {
            Ok(text) => {
                debug!(items = text.items().len(), "recognized {:?}", text.concat());
                text
            }
            Err(e) => {
                warn!("{}", e);
                RecognizedText::default()
            }
        }
    }

    /// Simple mode: every recognized string joined in scan order.
    pub fn recognize_text(&self, img: &RgbaImage) -> String {
        self.recognize(img).concat()
    }
}
