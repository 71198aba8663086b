//! Logging setup: stdout plus `logs/quiz_assistant.log`.

use chrono::Local;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::paths;

pub const LOG_FILE_NAME: &str = "quiz_assistant.log";

/// Local wall-clock timestamps, `HH:MM:SS.mmm`.
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default `info` level.
///
/// If the log file cannot be opened, logging continues on stdout only.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let file = paths::ensure_directories()
        .and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(paths::get_logs_dir().join(LOG_FILE_NAME))
        })
        .ok();

    let file_layer = file.map(|file| {
        fmt::layer()
            .with_timer(LocalTime)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_timer(LocalTime))
        .with(file_layer)
        .try_init()
        .ok();
}

/// Routes panics through `tracing` so they land in the log file too.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        tracing::error!("PANIC: {}{}", msg, location);
    }));
}
