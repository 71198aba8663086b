//! GUI rendering functions.
//!
//! Contains UI layout and component rendering logic.

use eframe::egui::{self, RichText, Vec2};

use super::state::{GuiState, LogView, SessionStatus, HELP_URL};

/// Render the read-only log view, scrolled to the newest line.
pub fn render_log(ui: &mut egui::Ui, log: &LogView) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for line in log.lines() {
                ui.label(RichText::new(line).size(13.0));
            }
        });
}

/// Render the start/stop buttons.
/// Returns (start_clicked, stop_clicked).
pub fn render_controls(ui: &mut egui::Ui, state: &GuiState) -> (bool, bool) {
    let is_running = state.status.is_running();
    let button_size = Vec2::new((ui.available_width() - 10.0) / 2.0, 40.0);

    let mut start_clicked = false;
    let mut stop_clicked = false;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 10.0;

        // Start button - disabled while running
        let start = egui::Button::new(RichText::new("开始答题").size(14.0)).min_size(button_size);
        if ui.add_enabled(!is_running, start).clicked() {
            start_clicked = true;
        }

        // Stop button - enabled only while running
        let stop = egui::Button::new(RichText::new("停止答题").size(14.0)).min_size(button_size);
        if ui.add_enabled(is_running, stop).clicked() {
            stop_clicked = true;
        }
    });

    (start_clicked, stop_clicked)
}

/// Render the help link under the buttons.
pub fn render_help_link(ui: &mut egui::Ui, status: &SessionStatus) {
    ui.horizontal(|ui| {
        ui.add_space(5.0);
        ui.hyperlink_to("帮助文档及交流群", HELP_URL);
        if status.is_running() {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.spinner();
            });
        }
    });
}
