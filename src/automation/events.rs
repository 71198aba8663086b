//! Event channel from the quiz worker to the host.
//!
//! Uses a std::sync::mpsc channel: the worker thread sends progress lines and
//! the final outcome, the GUI drains them each frame.

use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};
use tracing::{error, info};

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The "确定" dialog appeared: the quiz round is over.
    Stopped,
    /// The start button was never seen: not on the quiz screen.
    WrongScreen,
    /// The start button was still there after clicking it.
    StartUnresponsive,
    /// The user asked to stop.
    Cancelled,
    /// The worker did not finish within the stop grace period and was abandoned.
    Forced,
    /// Fatal error: the window was lost, the backend failed to start, or the worker panicked.
    Failed(String),
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::Stopped => write!(f, "检测到确定按钮，停止运行"),
            SessionOutcome::WrongScreen => write!(f, "请在咸鱼大冲关界面启动"),
            SessionOutcome::StartUnresponsive => write!(f, "答题按钮点击无响应，停止运行"),
            SessionOutcome::Cancelled => write!(f, "已停止答题"),
            SessionOutcome::Forced => write!(f, "答题线程未及时退出，已强制停止"),
            SessionOutcome::Failed(msg) => write!(f, "{}", msg),
        }
    }
}

/// One message from the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A progress line for the log view.
    Info(String),
    /// An error line for the log view.
    Fatal(String),
    /// The session is over.
    Finished(SessionOutcome),
}

/// Sending half held by the worker.
///
/// Every line is also written to the tracing log. A dropped receiver is not
/// an error: the host may already be gone.
#[derive(Clone, Debug)]
pub struct EventSink {
    sender: Sender<SessionEvent>,
}

impl EventSink {
    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        let _ = self.sender.send(SessionEvent::Info(message));
    }

    pub fn fatal(&self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        let _ = self.sender.send(SessionEvent::Fatal(message));
    }

    pub fn finished(&self, outcome: SessionOutcome) {
        info!("session finished: {:?}", outcome);
        let _ = self.sender.send(SessionEvent::Finished(outcome));
    }
}

/// Creates a new event queue.
///
/// The channel is unbounded; events queue up until the host drains them.
pub fn create_event_queue() -> (EventSink, Receiver<SessionEvent>) {
    let (sender, receiver) = channel();
    (EventSink { sender }, receiver)
}
