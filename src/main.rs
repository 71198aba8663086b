//! Quiz Assistant
//!
//! A Windows desktop tool that watches the 咸鱼之王 quiz screen, reads each
//! question with OCR, looks it up in a local answer bank and clicks the
//! matching answer without moving the real cursor.

// Hide console window on Windows for GUI mode
#![windows_subsystem = "windows"]
#![cfg_attr(not(windows), allow(dead_code))]

mod answers;
mod automation;
mod capture;
mod desktop;
mod error;
mod gui;
mod logging;
mod ocr;
mod paths;

use anyhow::Result;
use tracing::info;

use automation::AssistantConfig;

fn main() -> Result<()> {
    logging::install_panic_hook();
    logging::init_logging();

    // Load configuration
    automation::init_config();
    let config = automation::get_config().clone();
    info!(
        "Target window: {}, answer bank: {}",
        config.window_title,
        paths::resolve_data_dir(&config.data_dir).display()
    );

    run(config)
}

#[cfg(windows)]
fn run(config: AssistantConfig) -> Result<()> {
    info!("Starting GUI application...");
    match gui::run_gui(config) {
        Ok(()) => {
            info!("GUI application exited normally");
            Ok(())
        }
        Err(e) => {
            tracing::error!("GUI error: {}", e);
            Err(anyhow::anyhow!("GUI error: {}", e))
        }
    }
}

#[cfg(not(windows))]
fn run(_config: AssistantConfig) -> Result<()> {
    tracing::error!("This tool drives a Windows game window and only runs on Windows");
    anyhow::bail!("unsupported platform")
}
