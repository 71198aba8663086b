//! Quiz runner - control surface for the answering worker.
//!
//! Spawns the worker thread, builds the backend inside it, runs the state
//! machine and reports the outcome through the event sink. Stopping is
//! cooperative first; a worker that ignores the flag past the grace period
//! is abandoned.

use anyhow::Result;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

use crate::answers::AnswerIndex;
use crate::automation::config::AssistantConfig;
use crate::automation::events::{EventSink, SessionOutcome};
use crate::automation::state::{panic_message, QuizController};
use crate::automation::stop::StopSignal;
use crate::desktop::Desktop;
use crate::ocr::{Recognizer, TextRecognizer};

/// Everything one session needs, built on the worker thread.
pub struct Backend {
    pub desktop: Box<dyn Desktop>,
    pub recognizer: Box<dyn TextRecognizer>,
    pub answers: AnswerIndex,
}

/// How a stop request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopResult {
    /// No session was running.
    NotRunning,
    /// The worker finished within the grace period.
    Graceful,
    /// The worker was abandoned after the grace period.
    Forced,
}

struct Worker {
    stop: StopSignal,
    handle: JoinHandle<()>,
    done: Receiver<()>,
    abandoned: Arc<AtomicBool>,
}

/// Starts and stops quiz sessions. At most one session runs at a time.
pub struct QuizRunner {
    config: AssistantConfig,
    events: EventSink,
    worker: Option<Worker>,
}

impl QuizRunner {
    pub fn new(config: AssistantConfig, events: EventSink) -> Self {
        Self {
            config,
            events,
            worker: None,
        }
    }

    /// Checks if a session is currently running.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Starts a session in a background thread.
    ///
    /// `build` runs on the worker thread and creates the backend. Returns
    /// `false` without doing anything if a session is already running.
    pub fn start<F>(&mut self, build: F) -> bool
    where
        F: FnOnce(&AssistantConfig) -> Result<Backend> + Send + 'static,
    {
        if self.is_running() {
            return false;
        }
        if let Some(previous) = self.worker.take() {
            let _ = previous.handle.join();
        }

        let stop = StopSignal::new();
        let abandoned = Arc::new(AtomicBool::new(false));
        let (done_tx, done) = channel();

        let config = self.config.clone();
        let events = self.events.clone();
        let worker_stop = stop.clone();
        let worker_abandoned = abandoned.clone();

        let handle = thread::spawn(move || {
            let outcome = run_session(build, &config, worker_stop, &events);
            if !worker_abandoned.load(Ordering::SeqCst) {
                events.finished(outcome);
            }
            let _ = done_tx.send(());
        });

        info!("Quiz worker started");
        self.worker = Some(Worker {
            stop,
            handle,
            done,
            abandoned,
        });
        true
    }

    /// Requests the session to stop and waits up to the grace period.
    ///
    /// A worker that has not finished by then is detached. It still
    /// observes the stop flag and delivers no further input.
    pub fn stop(&mut self) -> StopResult {
        let Some(worker) = self.worker.take() else {
            return StopResult::NotRunning;
        };
        if worker.handle.is_finished() {
            let _ = worker.handle.join();
            return StopResult::NotRunning;
        }

        worker.stop.request_stop();
        match worker.done.recv_timeout(self.config.stop_grace()) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = worker.handle.join();
                StopResult::Graceful
            }
            Err(RecvTimeoutError::Timeout) => {
                worker.abandoned.store(true, Ordering::SeqCst);
                warn!(
                    "Quiz worker did not stop within {:?}, abandoning it",
                    self.config.stop_grace()
                );
                self.events.finished(SessionOutcome::Forced);
                StopResult::Forced
            }
        }
    }
}

impl Drop for QuizRunner {
    fn drop(&mut self) {
        if let Some(worker) = &self.worker {
            worker.stop.request_stop();
        }
    }
}

/// Worker-thread body: build the backend, then run the controller.
fn run_session<F>(
    build: F,
    config: &AssistantConfig,
    stop: StopSignal,
    events: &EventSink,
) -> SessionOutcome
where
    F: FnOnce(&AssistantConfig) -> Result<Backend>,
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| -> Result<SessionOutcome> {
        let backend = build(config)?;
        if stop.is_stopped() {
            return Ok(SessionOutcome::Cancelled);
        }
        let recognizer = Recognizer::new(backend.recognizer);
        let mut controller = QuizController::new(
            backend.desktop.as_ref(),
            &recognizer,
            &backend.answers,
            config,
            stop.clone(),
            events.clone(),
        );
        Ok(controller.run())
    }));

    match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            let message = format!("启动失败: {:#}", e);
            events.fatal(message.clone());
            SessionOutcome::Failed(message)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            events.fatal(message.clone());
            SessionOutcome::Failed(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::{AnswerRecord, DEFAULT_MATCH_THRESHOLD};
    use crate::automation::events::{create_event_queue, SessionEvent};
    use crate::capture::Rect;
    use crate::desktop::fake::FakeDesktop;
    use crate::ocr::fake::ScriptedRecognizer;
    use std::time::{Duration, Instant};

    const CONFIRM_SIZE: (u32, u32) = (400, 85);

    fn test_config() -> AssistantConfig {
        AssistantConfig {
            start_settle_ms: 0,
            answer_delay_ms: 0,
            idle_delay_ms: 0,
            poll_interval_ms: 20,
            sleep_slice_ms: 10,
            focus_settle_ms: 0,
            click_hold_ms: 0,
            stop_grace_ms: 1000,
            start_check_timeout_ms: 60_000,
            ..AssistantConfig::default()
        }
    }

    fn fake_backend(confirm_text: &'static str) -> impl FnOnce(&AssistantConfig) -> Result<Backend> + Send + 'static {
        move |_config| {
            let script = ScriptedRecognizer::new();
            script.script(CONFIRM_SIZE, &[confirm_text]);
            Ok(Backend {
                desktop: Box::new(FakeDesktop::new("咸鱼之王", Rect::new(0, 0, 1000, 1000))),
                recognizer: Box::new(script),
                answers: AnswerIndex::new(
                    vec![AnswerRecord::new("问题一", "A")],
                    DEFAULT_MATCH_THRESHOLD,
                ),
            })
        }
    }

    fn wait_finished(receiver: &Receiver<SessionEvent>) -> (Vec<SessionEvent>, SessionOutcome) {
        let mut seen = Vec::new();
        loop {
            match receiver.recv_timeout(Duration::from_secs(5)).unwrap() {
                SessionEvent::Finished(outcome) => return (seen, outcome),
                event => seen.push(event),
            }
        }
    }

    fn wait_idle(runner: &QuizRunner) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while runner.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_session_runs_to_outcome() {
        let (events, receiver) = create_event_queue();
        let mut runner = QuizRunner::new(test_config(), events);
        assert!(runner.start(fake_backend("确定")));

        let (_, outcome) = wait_finished(&receiver);
        assert_eq!(outcome, SessionOutcome::Stopped);
        wait_idle(&runner);
        assert_eq!(runner.stop(), StopResult::NotRunning);
    }

    #[test]
    fn test_start_is_idempotent_and_stop_is_graceful() {
        let (events, receiver) = create_event_queue();
        let mut runner = QuizRunner::new(test_config(), events);

        assert!(runner.start(fake_backend("")));
        assert!(runner.is_running());
        assert!(!runner.start(fake_backend("")));

        thread::sleep(Duration::from_millis(50));
        let started = Instant::now();
        assert_eq!(runner.stop(), StopResult::Graceful);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!runner.is_running());

        let (_, outcome) = wait_finished(&receiver);
        assert_eq!(outcome, SessionOutcome::Cancelled);
    }

    #[test]
    fn test_unresponsive_worker_is_abandoned() {
        let (events, receiver) = create_event_queue();
        let mut runner = QuizRunner::new(
            AssistantConfig {
                stop_grace_ms: 50,
                ..test_config()
            },
            events,
        );

        assert!(runner.start(|config: &AssistantConfig| {
            // Ignores the stop flag for a while, like a long OCR call
            thread::sleep(Duration::from_millis(500));
            fake_backend("")(config)
        }));
        thread::sleep(Duration::from_millis(20));

        assert_eq!(runner.stop(), StopResult::Forced);
        assert!(!runner.is_running());

        let (_, outcome) = wait_finished(&receiver);
        assert_eq!(outcome, SessionOutcome::Forced);
        // The abandoned worker reports nothing further
        thread::sleep(Duration::from_millis(700));
        assert!(receiver
            .try_iter()
            .all(|e| !matches!(e, SessionEvent::Finished(_))));
    }

    #[test]
    fn test_build_error_is_fatal_event() {
        let (events, receiver) = create_event_queue();
        let mut runner = QuizRunner::new(test_config(), events);
        assert!(runner.start(|_config: &AssistantConfig| {
            Err(anyhow::anyhow!("tesseract not found"))
        }));

        let (seen, outcome) = wait_finished(&receiver);
        assert_eq!(
            seen,
            vec![SessionEvent::Fatal("启动失败: tesseract not found".to_string())]
        );
        assert!(matches!(outcome, SessionOutcome::Failed(_)));
    }

    #[test]
    fn test_panicking_build_is_contained() {
        let (events, receiver) = create_event_queue();
        let mut runner = QuizRunner::new(test_config(), events);
        assert!(runner.start(|_config: &AssistantConfig| -> Result<Backend> {
            panic!("model load crashed")
        }));

        let (_, outcome) = wait_finished(&receiver);
        assert_eq!(
            outcome,
            SessionOutcome::Failed("model load crashed".to_string())
        );

        // A new session can start after the failed one
        wait_idle(&runner);
        assert!(runner.start(fake_backend("确定")));
        let (_, outcome) = wait_finished(&receiver);
        assert_eq!(outcome, SessionOutcome::Stopped);
    }
}
