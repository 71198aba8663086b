//! GUI application state management.
//!
//! Tracks the session status and the bounded log view fed by worker events.

use chrono::Local;
use std::collections::VecDeque;

use crate::automation::events::{SessionEvent, SessionOutcome};

/// Oldest lines are dropped beyond this.
pub const MAX_LOG_LINES: usize = 1000;

/// Help document and community link.
pub const HELP_URL: &str = "https://docs.qq.com/doc/DS1RzUFhnaFZoYXV3";

/// Session status for display in GUI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    /// Not running, ready to start
    #[default]
    Idle,
    /// A worker is answering
    Running,
    /// The last session ended
    Finished(SessionOutcome),
}

impl SessionStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Read-only log with a line cap and `[HH:MM:SS]` timestamps.
#[derive(Debug, Default)]
pub struct LogView {
    lines: VecDeque<String>,
}

impl LogView {
    pub fn push(&mut self, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        for line in message.lines().filter(|l| !l.trim().is_empty()) {
            if self.lines.len() == MAX_LOG_LINES {
                self.lines.pop_front();
            }
            self.lines.push_back(format!("[{}] {}", timestamp, line));
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// GUI application state.
#[derive(Debug, Default)]
pub struct GuiState {
    pub status: SessionStatus,
    pub log: LogView,
}

impl GuiState {
    /// Applies one worker event to the log and status.
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Info(line) => self.log.push(&line),
            SessionEvent::Fatal(line) => self.log.push(&format!("错误: {}", line)),
            SessionEvent::Finished(outcome) => {
                // The controller already logged its own terminal lines
                if matches!(outcome, SessionOutcome::Cancelled | SessionOutcome::Forced) {
                    self.log.push(&outcome.to_string());
                }
                self.status = SessionStatus::Finished(outcome);
            }
        }
    }
}
