//! The eframe application driving a [`QuizRunner`].

use anyhow::{Context, Result};
use std::sync::mpsc::Receiver;
use std::time::Duration;
use tracing::{info, warn};

use eframe::egui::{self, Vec2};

use super::render;
use super::state::{GuiState, SessionStatus};
use crate::answers::{self, AnswerIndex};
use crate::automation::config::AssistantConfig;
use crate::automation::events::{create_event_queue, SessionEvent};
use crate::automation::runner::{Backend, QuizRunner};
use crate::desktop::Win32Desktop;
use crate::ocr::TesseractRecognizer;
use crate::paths;

const WINDOW_TITLE: &str = "臭咸鱼答题助手v1.0";

/// Builds the real backend: Win32 desktop, Tesseract and the answer bank.
///
/// Runs on the worker thread, so the model download and bank load do not
/// block the UI.
pub fn build_backend(config: &AssistantConfig) -> Result<Backend> {
    let data_dir = paths::resolve_data_dir(&config.data_dir);
    let report = answers::load_dir(&data_dir)
        .with_context(|| format!("无法读取题库目录 {}", data_dir.display()))?;
    let answers = AnswerIndex::new(report.records, config.match_threshold);

    let recognizer = TesseractRecognizer::new(&config.ocr_language, config.ocr_upscale)
        .context("OCR 初始化失败")?;

    Ok(Backend {
        desktop: Box::new(Win32Desktop),
        recognizer: Box::new(recognizer),
        answers,
    })
}

/// Main GUI application struct.
pub struct GuiApp {
    state: GuiState,
    runner: QuizRunner,
    events: Receiver<SessionEvent>,
}

impl GuiApp {
    /// Create a new GUI application instance.
    pub fn new(cc: &eframe::CreationContext<'_>, config: AssistantConfig) -> Self {
        // Configure fonts to support Chinese
        Self::setup_fonts(&cc.egui_ctx);

        let (sink, events) = create_event_queue();
        Self {
            state: GuiState::default(),
            runner: QuizRunner::new(config, sink),
            events,
        }
    }

    /// Setup fonts with Chinese support.
    fn setup_fonts(ctx: &egui::Context) {
        let mut fonts = egui::FontDefinitions::default();

        // Common Simplified Chinese fonts on Windows: Microsoft YaHei, SimHei, SimSun
        let font_paths = [
            "C:\\Windows\\Fonts\\msyh.ttc",
            "C:\\Windows\\Fonts\\simhei.ttf",
            "C:\\Windows\\Fonts\\simsun.ttc",
        ];

        let Some((font_path, font_data)) = font_paths
            .iter()
            .find_map(|path| std::fs::read(path).ok().map(|data| (path, data)))
        else {
            warn!("Could not load a Chinese font. Text may not display correctly.");
            return;
        };

        fonts.font_data.insert(
            "chinese_font".to_owned(),
            egui::FontData::from_owned(font_data).into(),
        );
        for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
            fonts
                .families
                .entry(family)
                .or_default()
                .insert(0, "chinese_font".to_owned());
        }
        info!("Loaded Chinese font from: {}", font_path);

        ctx.set_fonts(fonts);
    }

    /// Drain worker events into the log and status.
    fn poll_events(&mut self) {
        for event in self.events.try_iter() {
            self.state.apply(event);
        }
        // Worker gone without a Finished event (e.g. it was abandoned)
        if self.state.status.is_running() && !self.runner.is_running() {
            self.state.status = SessionStatus::Idle;
        }
    }

    /// Handle start button click.
    fn handle_start(&mut self) {
        if self.runner.start(build_backend) {
            self.state.status = SessionStatus::Running;
            info!("GUI: Started quiz session");
        }
    }

    /// Handle stop button click.
    fn handle_stop(&mut self) {
        let result = self.runner.stop();
        info!("GUI: Stop requested ({:?})", result);
        self.poll_events();
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();

        // Closing the window stops a running session
        if ctx.input(|i| i.viewport().close_requested()) && self.runner.is_running() {
            self.handle_stop();
        }

        // Request repaint while running so log lines show up promptly
        if self.state.status.is_running() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(8.0);
            let (start_clicked, stop_clicked) = render::render_controls(ui, &self.state);
            if start_clicked {
                self.handle_start();
            }
            if stop_clicked {
                self.handle_stop();
            }
            ui.add_space(4.0);
            render::render_help_link(ui, &self.state.status);
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            render::render_log(ui, &self.state.log);
        });
    }
}

/// Run the GUI application.
/// This function blocks until the window is closed.
pub fn run_gui(config: AssistantConfig) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(Vec2::new(300.0, 400.0))
            .with_resizable(false)
            .with_title(WINDOW_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(GuiApp::new(cc, config)))),
    )
}
