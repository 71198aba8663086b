//! Quiz state machine.
//!
//! The controller sequences through: AwaitingStartButton → Answering →
//! (Stopped | Aborted). Every tick re-locates the window, reads the button
//! label under the confirm region and, once answering, reads the question
//! and clicks the matching answer. All waits go through the stop signal.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::answers::AnswerIndex;
use crate::automation::config::AssistantConfig;
use crate::automation::events::{EventSink, SessionOutcome};
use crate::automation::input::{answer_point, InputSynthesizer};
use crate::automation::stop::StopSignal;
use crate::capture::geometry::{is_blank, Rect};
use crate::capture::{RegionCapturer, WindowLocator};
use crate::desktop::{Desktop, WindowHandle};
use crate::error::Result;
use crate::ocr::{normalize_text, Recognizer};

/// Label of the button that starts a quiz round.
pub const START_LABEL: &str = "开始答题";
/// Label of the dialog button shown when the round is over.
pub const CONFIRM_LABEL: &str = "确定";

/// What the confirm region currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLabel {
    Start,
    Confirm,
    Neither,
}

impl ButtonLabel {
    /// Classifies OCR text by substring. The start label wins over the confirm label.
    pub fn classify(text: &str) -> Self {
        if text.contains(START_LABEL) {
            ButtonLabel::Start
        } else if text.contains(CONFIRM_LABEL) {
            ButtonLabel::Confirm
        } else {
            ButtonLabel::Neither
        }
    }
}

/// Why the controller gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The start button was never seen in time.
    WrongScreen,
    /// The start button was still showing after it was clicked.
    StartUnresponsive,
}

/// Controller states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    /// Waiting for "开始答题" (initial state)
    AwaitingStartButton,
    /// Reading questions and clicking answers
    Answering,
    /// The "确定" dialog appeared
    Stopped,
    /// Progress is impossible on this screen
    Aborted(AbortReason),
}

impl QuizState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuizState::Stopped | QuizState::Aborted(_))
    }
}

impl fmt::Display for QuizState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizState::AwaitingStartButton => write!(f, "Awaiting start button"),
            QuizState::Answering => write!(f, "Answering"),
            QuizState::Stopped => write!(f, "Stopped"),
            QuizState::Aborted(AbortReason::WrongScreen) => write!(f, "Aborted: wrong screen"),
            QuizState::Aborted(AbortReason::StartUnresponsive) => {
                write!(f, "Aborted: start button unresponsive")
            }
        }
    }
}

/// Per-session bookkeeping owned by the controller.
#[derive(Debug, Clone)]
pub struct RunState {
    pub start_clicked: bool,
    pub start_found_ever: bool,
    pub started_at: Instant,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            start_clicked: false,
            start_found_ever: false,
            started_at: Instant::now(),
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Keep polling after waiting this long.
    Continue(Duration),
    /// The session is over.
    Done(SessionOutcome),
}

/// Drives one quiz session against a desktop, a recognizer and an answer bank.
pub struct QuizController<'a> {
    desktop: &'a dyn Desktop,
    recognizer: &'a Recognizer,
    answers: &'a AnswerIndex,
    config: &'a AssistantConfig,
    stop: StopSignal,
    events: EventSink,
    state: QuizState,
    run: RunState,
}

impl<'a> QuizController<'a> {
    pub fn new(
        desktop: &'a dyn Desktop,
        recognizer: &'a Recognizer,
        answers: &'a AnswerIndex,
        config: &'a AssistantConfig,
        stop: StopSignal,
        events: EventSink,
    ) -> Self {
        Self {
            desktop,
            recognizer,
            answers,
            config,
            stop,
            events,
            state: QuizState::AwaitingStartButton,
            run: RunState::new(),
        }
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    /// Runs ticks until the session ends or a stop is requested.
    ///
    /// Errors and panics inside a tick are logged and retried after the poll
    /// wait; only a lost window ends the session early.
    pub fn run(&mut self) -> SessionOutcome {
        loop {
            if self.stop.is_stopped() {
                return SessionOutcome::Cancelled;
            }

            let step = match panic::catch_unwind(AssertUnwindSafe(|| self.tick())) {
                Ok(Ok(step)) => step,
                Ok(Err(e)) if e.is_fatal() => {
                    let message = e.to_string();
                    self.events.fatal(message.clone());
                    Step::Done(SessionOutcome::Failed(message))
                }
                Ok(Err(e)) => {
                    self.events.info(format!("错误: {}", e));
                    Step::Continue(self.config.poll_interval())
                }
                Err(payload) => {
                    self.events.info(format!("错误: {}", panic_message(payload.as_ref())));
                    Step::Continue(self.config.poll_interval())
                }
            };

            match step {
                Step::Done(outcome) => return outcome,
                Step::Continue(wait) => {
                    if !self.wait(wait) {
                        return SessionOutcome::Cancelled;
                    }
                }
            }
        }
    }

    /// Advances the state machine by one observation.
    pub fn tick(&mut self) -> Result<Step> {
        if self.stop.is_stopped() {
            return Ok(Step::Done(SessionOutcome::Cancelled));
        }
        if self.state.is_terminal() {
            return Ok(Step::Done(self.terminal_outcome()));
        }

        let locator = WindowLocator::new(self.desktop);
        let (hwnd, window) = locator.locate_with_rect(&self.config.window_title)?;

        let confirm = self.config.confirm_region.resolve(&window);
        let label = ButtonLabel::classify(&self.read_text(hwnd, confirm));
        debug!(state = %self.state, ?label, "confirm region");

        if label == ButtonLabel::Start {
            self.run.start_found_ever = true;
        } else if !self.run.start_found_ever
            && self.run.started_at.elapsed() >= self.config.start_check_timeout()
        {
            return Ok(self.finish(QuizState::Aborted(AbortReason::WrongScreen)));
        }

        match label {
            ButtonLabel::Confirm => return Ok(self.finish(QuizState::Stopped)),
            ButtonLabel::Start if self.run.start_clicked => {
                return Ok(self.finish(QuizState::Aborted(AbortReason::StartUnresponsive)));
            }
            ButtonLabel::Start => return Ok(self.click_start(hwnd, confirm)),
            ButtonLabel::Neither => {}
        }

        match self.state {
            QuizState::Answering => self.answer(hwnd),
            _ => Ok(Step::Continue(self.idle_wait())),
        }
    }

    fn click_start(&mut self, hwnd: WindowHandle, confirm: Rect) -> Step {
        self.events.info(START_LABEL);
        let (x, y) = confirm.center();
        if !self.input().click(hwnd, x, y) {
            debug!("start button click was not delivered");
        }

        self.run.start_clicked = true;
        self.state = QuizState::Answering;

        self.events
            .info(format!("等待 {} 秒...", self.config.start_settle().as_secs()));
        if !self.wait(self.config.start_settle()) {
            return Step::Done(SessionOutcome::Cancelled);
        }
        Step::Continue(Duration::ZERO)
    }

    fn answer(&mut self, hwnd: WindowHandle) -> Result<Step> {
        // The window may have moved since the confirm check
        let window = WindowLocator::new(self.desktop).rectangle(hwnd)?;
        let question = self.read_text(hwnd, self.config.question_region.resolve(&window));
        if question.is_empty() {
            return Ok(Step::Continue(self.config.poll_interval()));
        }

        let Some(record) = self.answers.best_match(&question) else {
            debug!(question = %question, "no answer above threshold");
            return Ok(Step::Continue(self.idle_wait()));
        };
        self.events
            .info(format!("{} ---> {}", record.question, record.answer));

        match answer_point(&window, &record.answer, self.config) {
            Some((x, y)) => {
                if !self.input().click(hwnd, x, y) {
                    debug!("answer click was not delivered");
                }
            }
            None => warn!("unknown answer letter {:?}", record.answer),
        }

        if !self.wait(self.config.answer_delay()) {
            return Ok(Step::Done(SessionOutcome::Cancelled));
        }
        Ok(Step::Continue(self.config.poll_interval()))
    }

    /// Captures `rect` and returns its normalized text; blank captures read as empty.
    fn read_text(&self, hwnd: WindowHandle, rect: Rect) -> String {
        let img = RegionCapturer::new(self.desktop, self.config.focus_settle()).capture(hwnd, rect);
        if is_blank(&img) {
            return String::new();
        }
        normalize_text(&self.recognizer.recognize_text(&img))
    }

    fn input(&self) -> InputSynthesizer<'a> {
        InputSynthesizer::new(self.desktop, self.config.click_hold(), self.stop.clone())
    }

    fn wait(&self, duration: Duration) -> bool {
        self.stop.sleep(duration, self.config.sleep_slice())
    }

    fn idle_wait(&self) -> Duration {
        self.config.poll_interval() + self.config.idle_delay()
    }

    fn finish(&mut self, state: QuizState) -> Step {
        self.state = state;
        let outcome = self.terminal_outcome();
        self.events.info(outcome.to_string());
        Step::Done(outcome)
    }

    fn terminal_outcome(&self) -> SessionOutcome {
        match self.state {
            QuizState::Aborted(AbortReason::WrongScreen) => SessionOutcome::WrongScreen,
            QuizState::Aborted(AbortReason::StartUnresponsive) => SessionOutcome::StartUnresponsive,
            _ => SessionOutcome::Stopped,
        }
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::{AnswerRecord, DEFAULT_MATCH_THRESHOLD};
    use crate::automation::events::{create_event_queue, SessionEvent};
    use crate::desktop::fake::FakeDesktop;
    use crate::ocr::fake::ScriptedRecognizer;
    use std::sync::mpsc::Receiver;
    use std::thread;

    const CONFIRM_SIZE: (u32, u32) = (400, 85);
    const QUESTION_SIZE: (u32, u32) = (730, 120);

    fn fast_config() -> AssistantConfig {
        AssistantConfig {
            start_settle_ms: 0,
            answer_delay_ms: 0,
            idle_delay_ms: 0,
            poll_interval_ms: 0,
            sleep_slice_ms: 10,
            focus_settle_ms: 0,
            click_hold_ms: 0,
            start_check_timeout_ms: 60_000,
            ..AssistantConfig::default()
        }
    }

    struct Harness {
        desktop: FakeDesktop,
        script: ScriptedRecognizer,
        recognizer: Recognizer,
        answers: AnswerIndex,
        config: AssistantConfig,
        stop: StopSignal,
        events: EventSink,
        receiver: Receiver<SessionEvent>,
    }

    impl Harness {
        fn new(config: AssistantConfig) -> Self {
            let script = ScriptedRecognizer::new();
            let (events, receiver) = create_event_queue();
            Self {
                desktop: FakeDesktop::new("咸鱼之王", Rect::new(0, 0, 1000, 1000)),
                recognizer: Recognizer::new(Box::new(script.clone())),
                script,
                answers: AnswerIndex::new(
                    vec![AnswerRecord::new("问题一", "A"), AnswerRecord::new("问题二", "B")],
                    DEFAULT_MATCH_THRESHOLD,
                ),
                config,
                stop: StopSignal::new(),
                events,
                receiver,
            }
        }

        fn controller(&self) -> QuizController<'_> {
            QuizController::new(
                &self.desktop,
                &self.recognizer,
                &self.answers,
                &self.config,
                self.stop.clone(),
                self.events.clone(),
            )
        }

        fn lines(&self) -> Vec<String> {
            self.receiver
                .try_iter()
                .filter_map(|e| match e {
                    SessionEvent::Info(line) | SessionEvent::Fatal(line) => Some(line),
                    SessionEvent::Finished(_) => None,
                })
                .collect()
        }
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(ButtonLabel::classify("开始答题"), ButtonLabel::Start);
        assert_eq!(ButtonLabel::classify("确定开始答题"), ButtonLabel::Start);
        assert_eq!(ButtonLabel::classify("开始答题确定"), ButtonLabel::Start);
        assert_eq!(ButtonLabel::classify("确定"), ButtonLabel::Confirm);
        assert_eq!(ButtonLabel::classify("取消"), ButtonLabel::Neither);
        assert_eq!(ButtonLabel::classify(""), ButtonLabel::Neither);
    }

    #[test]
    fn test_start_then_answer_a() {
        let h = Harness::new(fast_config());
        h.script.script(CONFIRM_SIZE, &["开始 答题", ""]);
        h.script.script(QUESTION_SIZE, &["问题一"]);
        let mut controller = h.controller();

        assert_eq!(controller.tick().unwrap(), Step::Continue(Duration::ZERO));
        assert_eq!(controller.state(), &QuizState::Answering);
        assert!(controller.run_state().start_clicked);
        assert_eq!(h.desktop.clicks(), vec![(500, 827)]);

        assert!(matches!(controller.tick().unwrap(), Step::Continue(_)));
        assert_eq!(h.desktop.clicks(), vec![(500, 827), (300, 800)]);

        let lines = h.lines();
        assert_eq!(lines[0], "开始答题");
        assert_eq!(lines[1], "等待 0 秒...");
        assert_eq!(lines[2], "问题一 ---> A");
    }

    #[test]
    fn test_answer_b_clicks_right_position() {
        let h = Harness::new(fast_config());
        h.script.script(CONFIRM_SIZE, &["开始答题", ""]);
        h.script.script(QUESTION_SIZE, &["问题二？"]);
        let mut controller = h.controller();
        controller.tick().unwrap();
        controller.tick().unwrap();
        assert_eq!(h.desktop.clicks(), vec![(500, 827), (700, 800)]);
    }

    #[test]
    fn test_confirm_stops_without_clicking() {
        let h = Harness::new(fast_config());
        h.script.script(CONFIRM_SIZE, &["确定"]);
        let mut controller = h.controller();

        assert_eq!(
            controller.tick().unwrap(),
            Step::Done(SessionOutcome::Stopped)
        );
        assert_eq!(controller.state(), &QuizState::Stopped);
        assert!(h.desktop.clicks().is_empty());
        assert_eq!(h.lines(), vec!["检测到确定按钮，停止运行".to_string()]);
    }

    #[test]
    fn test_confirm_preempts_answering() {
        let h = Harness::new(fast_config());
        h.script.script(CONFIRM_SIZE, &["开始答题", "确定"]);
        h.script.script(QUESTION_SIZE, &["问题一"]);
        let mut controller = h.controller();

        assert_eq!(controller.run(), SessionOutcome::Stopped);
        // Only the start click; the question region was never read
        assert_eq!(h.desktop.clicks(), vec![(500, 827)]);
        assert!(!h.script.calls().contains(&QUESTION_SIZE));
    }

    #[test]
    fn test_wrong_screen_with_zero_timeout() {
        let h = Harness::new(AssistantConfig {
            start_check_timeout_ms: 0,
            ..fast_config()
        });
        let mut controller = h.controller();

        assert_eq!(controller.run(), SessionOutcome::WrongScreen);
        assert_eq!(
            controller.state(),
            &QuizState::Aborted(AbortReason::WrongScreen)
        );
        assert!(h.desktop.clicks().is_empty());
        assert_eq!(h.lines(), vec!["请在咸鱼大冲关界面启动".to_string()]);
    }

    #[test]
    fn test_no_start_button_keeps_waiting_within_timeout() {
        let h = Harness::new(fast_config());
        let mut controller = h.controller();
        for _ in 0..3 {
            assert!(matches!(controller.tick().unwrap(), Step::Continue(_)));
        }
        assert_eq!(controller.state(), &QuizState::AwaitingStartButton);
    }

    #[test]
    fn test_start_unresponsive() {
        let h = Harness::new(fast_config());
        h.script.script(CONFIRM_SIZE, &["开始答题"]);
        let mut controller = h.controller();

        assert_eq!(controller.run(), SessionOutcome::StartUnresponsive);
        assert_eq!(h.desktop.clicks(), vec![(500, 827)]);
        assert_eq!(
            h.lines().last().map(String::as_str),
            Some("答题按钮点击无响应，停止运行")
        );
    }

    #[test]
    fn test_unmatched_or_empty_question_retries() {
        let h = Harness::new(AssistantConfig {
            poll_interval_ms: 7,
            idle_delay_ms: 5,
            ..fast_config()
        });
        h.script.script(CONFIRM_SIZE, &["开始答题", ""]);
        h.script.script(QUESTION_SIZE, &["", "完全无关的句子内容"]);
        let mut controller = h.controller();

        controller.tick().unwrap();
        // Empty question: plain poll wait
        assert_eq!(
            controller.tick().unwrap(),
            Step::Continue(Duration::from_millis(7))
        );
        // No match: poll plus idle
        assert_eq!(
            controller.tick().unwrap(),
            Step::Continue(Duration::from_millis(12))
        );
        assert_eq!(controller.state(), &QuizState::Answering);
        assert_eq!(h.desktop.clicks(), vec![(500, 827)]);
    }

    #[test]
    fn test_blank_capture_reads_as_empty() {
        let h = Harness::new(fast_config());
        h.desktop.fail_grab();
        h.script.script(CONFIRM_SIZE, &["开始答题"]);
        let mut controller = h.controller();

        assert!(matches!(controller.tick().unwrap(), Step::Continue(_)));
        assert_eq!(controller.state(), &QuizState::AwaitingStartButton);
        assert!(h.script.calls().is_empty());
    }

    #[test]
    fn test_window_lost_is_fatal() {
        let h = Harness::new(fast_config());
        h.desktop.close_window();
        let mut controller = h.controller();

        assert!(controller.tick().unwrap_err().is_fatal());
        assert_eq!(
            controller.run(),
            SessionOutcome::Failed("未找到咸鱼之王窗口".to_string())
        );
        assert_eq!(h.lines(), vec!["未找到咸鱼之王窗口".to_string()]);
    }

    #[test]
    fn test_stop_interrupts_answer_delay() {
        let h = Harness::new(AssistantConfig {
            answer_delay_ms: 5_000,
            poll_interval_ms: 5_000,
            ..fast_config()
        });
        h.script.script(CONFIRM_SIZE, &["开始答题", ""]);
        h.script.script(QUESTION_SIZE, &["问题一"]);

        let stopper = h.stop.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            stopper.request_stop();
        });

        let started = Instant::now();
        assert_eq!(h.controller().run(), SessionOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(2));
        handle.join().unwrap();
    }

    #[test]
    fn test_stop_interrupts_start_settle() {
        let h = Harness::new(AssistantConfig {
            start_settle_ms: 5_000,
            ..fast_config()
        });
        h.script.script(CONFIRM_SIZE, &["开始答题"]);

        let stopper = h.stop.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            stopper.request_stop();
        });

        let started = Instant::now();
        let mut controller = h.controller();
        assert_eq!(
            controller.tick().unwrap(),
            Step::Done(SessionOutcome::Cancelled)
        );
        assert!(started.elapsed() < Duration::from_secs(1));
        handle.join().unwrap();
    }

    #[test]
    fn test_stopped_controller_never_clicks() {
        let h = Harness::new(fast_config());
        h.script.script(CONFIRM_SIZE, &["开始答题"]);
        h.stop.request_stop();
        assert_eq!(h.controller().run(), SessionOutcome::Cancelled);
        assert!(h.desktop.calls().is_empty());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
