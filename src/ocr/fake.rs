//! Scripted recognizer for controller tests.

use image::RgbaImage;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use super::{RecognizedText, TextItem, TextRecognizer};
use crate::error::Result;

/// Returns canned text keyed by capture dimensions.
///
/// Each key holds a queue of answers; the last answer repeats once the
/// queue is down to one entry. Unknown sizes recognize nothing.
#[derive(Clone, Default)]
pub struct ScriptedRecognizer {
    script: Arc<Mutex<HashMap<(u32, u32), VecDeque<String>>>>,
    calls: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `texts` for captures of `size`.
    pub fn script(&self, size: (u32, u32), texts: &[&str]) -> &Self {
        self.script
            .lock()
            .unwrap()
            .entry(size)
            .or_default()
            .extend(texts.iter().map(|t| t.to_string()));
        self
    }

    /// Capture sizes seen so far, in call order.
    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, img: &RgbaImage) -> Result<RecognizedText> {
        let size = img.dimensions();
        self.calls.lock().unwrap().push(size);

        let mut script = self.script.lock().unwrap();
        let text = match script.get_mut(&size) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        Ok(match text {
            Some(text) if !text.is_empty() => RecognizedText::new(vec![TextItem {
                text,
                polygon: [(0, 0), (size.0 as i32, 0), (size.0 as i32, size.1 as i32), (0, size.1 as i32)],
                confidence: 95.0,
            }]),
            _ => RecognizedText::default(),
        })
    }
}
