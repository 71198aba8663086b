//! Configuration types for the quiz assistant.
//!
//! Loads settings from config.json at startup. Provides the target window
//! title, screen regions as window fractions, answer positions, the
//! matching threshold and every controller delay.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

use crate::answers::DEFAULT_MATCH_THRESHOLD;
use crate::capture::{RelativePoint, RelativeRect};
use crate::error::{QuizError, Result};

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<AssistantConfig> = OnceLock::new();

/// Complete assistant configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Substring of the game window's title
    pub window_title: String,
    /// Where the question text is shown
    pub question_region: RelativeRect,
    /// Where the "开始答题" / "确定" button label is shown
    pub confirm_region: RelativeRect,
    /// Click position for answer A
    pub answer_a: RelativePoint,
    /// Click position for answer B
    pub answer_b: RelativePoint,
    /// Minimum fuzzy score (0-100) accepted as a match
    pub match_threshold: u32,
    /// Wait after clicking the start button
    pub start_settle_ms: u64,
    /// Wait after clicking an answer
    pub answer_delay_ms: u64,
    /// Extra wait when nothing actionable was seen
    pub idle_delay_ms: u64,
    /// Wait between ticks
    pub poll_interval_ms: u64,
    /// Granularity of interruptible sleeps
    pub sleep_slice_ms: u64,
    /// Wait after restoring focus before grabbing the screen
    pub focus_settle_ms: u64,
    /// Time between mouse down and mouse up
    pub click_hold_ms: u64,
    /// How long stop() waits for the worker before abandoning it
    pub stop_grace_ms: u64,
    /// Abort if the start button was never seen within this long
    pub start_check_timeout_ms: u64,
    /// Answer-bank directory, relative to the executable unless absolute
    pub data_dir: String,
    /// Tesseract language model
    pub ocr_language: String,
    /// Upscale factor applied before recognition
    pub ocr_upscale: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            window_title: "咸鱼之王".to_string(),
            question_region: RelativeRect::new(0.02, 0.13, 0.75, 0.25),
            confirm_region: RelativeRect::new(0.3, 0.785, 0.7, 0.87),
            answer_a: RelativePoint::new(0.3, 0.8),
            answer_b: RelativePoint::new(0.7, 0.8),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            start_settle_ms: 3000,
            answer_delay_ms: 3000,
            idle_delay_ms: 500,
            poll_interval_ms: 1000,
            sleep_slice_ms: 100,
            focus_settle_ms: 100,
            click_hold_ms: 100,
            stop_grace_ms: 1000,
            start_check_timeout_ms: 10_000,
            data_dir: "data".to_string(),
            ocr_language: "chi_sim".to_string(),
            ocr_upscale: 2,
        }
    }
}

impl AssistantConfig {
    /// Checks fractions, delays and the threshold.
    pub fn validate(&self) -> Result<()> {
        if self.window_title.trim().is_empty() {
            return Err(QuizError::config("window_title must not be empty"));
        }
        for (name, region) in [
            ("question_region", &self.question_region),
            ("confirm_region", &self.confirm_region),
        ] {
            if !region.is_valid() {
                return Err(QuizError::config(format!(
                    "{} must satisfy 0 <= left < right <= 1 and 0 <= top < bottom <= 1",
                    name
                )));
            }
        }
        for (name, point) in [("answer_a", &self.answer_a), ("answer_b", &self.answer_b)] {
            if !point.is_valid() {
                return Err(QuizError::config(format!("{} must lie within [0, 1]", name)));
            }
        }
        if self.match_threshold > 100 {
            return Err(QuizError::config("match_threshold must be at most 100"));
        }
        if self.sleep_slice_ms == 0 {
            return Err(QuizError::config("sleep_slice_ms must be greater than 0"));
        }
        if self.ocr_language.trim().is_empty() {
            return Err(QuizError::config("ocr_language must not be empty"));
        }
        Ok(())
    }

    pub fn start_settle(&self) -> Duration {
        Duration::from_millis(self.start_settle_ms)
    }

    pub fn answer_delay(&self) -> Duration {
        Duration::from_millis(self.answer_delay_ms)
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn sleep_slice(&self) -> Duration {
        Duration::from_millis(self.sleep_slice_ms)
    }

    pub fn focus_settle(&self) -> Duration {
        Duration::from_millis(self.focus_settle_ms)
    }

    pub fn click_hold(&self) -> Duration {
        Duration::from_millis(self.click_hold_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub fn start_check_timeout(&self) -> Duration {
        Duration::from_millis(self.start_check_timeout_ms)
    }
}

/// Reads and validates one config file.
pub fn read_config_file(path: &Path) -> Result<AssistantConfig> {
    let contents = fs::read_to_string(path)?;
    let config: AssistantConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from `path`, falling back to defaults on any problem.
pub fn load_config(path: &Path) -> AssistantConfig {
    info!("Looking for config at: {}", path.display());

    if !path.exists() {
        info!("config.json not found. Using default config.");
        return AssistantConfig::default();
    }

    match read_config_file(path) {
        Ok(config) => {
            info!("Config loaded from config.json");
            config
        }
        Err(e) => {
            warn!("Failed to load config.json: {}. Using defaults.", e);
            AssistantConfig::default()
        }
    }
}

fn config_location() -> std::path::PathBuf {
    let beside_exe = crate::paths::get_config_path();
    if beside_exe.exists() {
        beside_exe
    } else {
        Path::new("config.json").to_path_buf()
    }
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config(&config_location()));
}

/// Returns the global configuration, loading it on first use.
pub fn get_config() -> &'static AssistantConfig {
    CONFIG.get_or_init(|| load_config(&config_location()))
}
