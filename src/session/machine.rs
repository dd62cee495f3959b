//! The take-quiz flow as a plain state machine.
//!
//! [`QuizSession`] never performs I/O and never reads a clock. Callers feed it
//! user actions, one-second ticks and gateway results, and execute the
//! [`SessionCommand`]s it hands back. The countdown is recomputed from an
//! absolute deadline on every tick.

use std::time::Duration;

use tokio::time::Instant;

use super::gateway::GatewayError;
use super::types::{QuizPaper, SubmitRequest, SubmitResult};

/// Work the caller must perform on behalf of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Preflight { quiz_id: String },
    Submit { quiz_id: String, request: SubmitRequest },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Pick a quiz from the list and ask the server to open it.
    Open(String),
    Select { question: usize, option: usize },
    Clear { question: usize },
    Next,
    Previous,
    Jump(usize),
    Submit,
    /// Resend the preserved answers after a failed submit.
    Retry,
    /// Back to the quiz list. Nothing is submitted.
    Leave,
}

/// Shown on the quiz list after a refused preflight or a closed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    WindowClosed(String),
    AlreadySubmitted(String),
    Rejected(String),
}

impl From<GatewayError> for Notice {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::WindowClosed(message) => Self::WindowClosed(message),
            GatewayError::AlreadySubmitted(message) => Self::AlreadySubmitted(message),
            other => Self::Rejected(other.to_string()),
        }
    }
}

/// An opened quiz with the student's local answer buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    paper: QuizPaper,
    question_index: usize,
    answers: Vec<Option<i32>>,
    started_at: Instant,
    deadline: Instant,
    remaining_seconds: u64,
}

impl Attempt {
    fn begin(paper: QuizPaper, now: Instant) -> Self {
        let budget = paper.time_budget();
        let answers = vec![None; paper.questions.len()];
        Self {
            paper,
            question_index: 0,
            answers,
            started_at: now,
            deadline: now + budget,
            remaining_seconds: whole_seconds_up(budget),
        }
    }

    pub fn paper(&self) -> &QuizPaper {
        &self.paper
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn answers(&self) -> &[Option<i32>] {
        &self.answers
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    fn expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    fn refresh(&mut self, now: Instant) {
        self.remaining_seconds = whole_seconds_up(self.deadline.saturating_duration_since(now));
    }

    fn request(&self, now: Instant, auto_submitted: bool) -> SubmitRequest {
        let elapsed = now.min(self.deadline).saturating_duration_since(self.started_at);
        SubmitRequest {
            answers: self.answers.clone(),
            time_taken_seconds: i32::try_from(elapsed.as_secs()).unwrap_or(i32::MAX),
            auto_submitted,
        }
    }
}

fn whole_seconds_up(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// How an attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Graded {
        score: i32,
        total_marks: i32,
        percentage: f64,
        attempt_number: i32,
        auto_submitted: bool,
    },
    /// Accepted, but the quiz keeps results hidden.
    Acknowledged { message: String, auto_submitted: bool },
    /// A retried submit found the first one already on record.
    AlreadySubmitted { message: String },
}

impl From<SubmitResult> for Completion {
    fn from(result: SubmitResult) -> Self {
        match (result.score, result.total_marks) {
            (Some(score), Some(total_marks)) => Self::Graded {
                score,
                total_marks,
                percentage: result.percentage.unwrap_or(0.0),
                attempt_number: result.attempt_number,
                auto_submitted: result.auto_submitted,
            },
            _ => Self::Acknowledged {
                message: result.message,
                auto_submitted: result.auto_submitted,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    QuizList { notice: Option<Notice> },
    PreflightCheck { quiz_id: String },
    InProgress { quiz_id: String, attempt: Attempt },
    Submitting { quiz_id: String, attempt: Attempt, request: SubmitRequest },
    Completed(Completion),
    /// The submit failed; the buffer and the unsent request are kept for
    /// [`UserAction::Retry`].
    Error { quiz_id: String, attempt: Attempt, request: SubmitRequest, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    state: SessionState,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self { state: SessionState::QuizList { notice: None } }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    /// True once nothing more can happen without a new [`UserAction::Open`].
    pub fn is_settled(&self) -> bool {
        matches!(self.state, SessionState::QuizList { .. } | SessionState::Completed(_))
    }

    pub fn handle(&mut self, action: UserAction, now: Instant) -> Option<SessionCommand> {
        match action {
            UserAction::Open(quiz_id) => self.open(quiz_id),
            UserAction::Leave => {
                self.leave();
                None
            }
            UserAction::Submit => self.submit(now, false),
            UserAction::Retry => self.retry(),
            navigation => {
                if let SessionState::InProgress { attempt, .. } = &mut self.state {
                    navigate(attempt, navigation);
                }
                None
            }
        }
    }

    /// Countdown step. Reaching the deadline forces an auto-submit that the
    /// student cannot cancel.
    pub fn tick(&mut self, now: Instant) -> Option<SessionCommand> {
        let SessionState::InProgress { attempt, .. } = &mut self.state else {
            return None;
        };
        attempt.refresh(now);
        if attempt.expired(now) {
            return self.submit(now, true);
        }
        None
    }

    pub fn preflight_finished(
        &mut self,
        result: Result<QuizPaper, GatewayError>,
        now: Instant,
    ) {
        let SessionState::PreflightCheck { quiz_id } = &self.state else {
            return;
        };

        self.state = match result {
            Ok(paper) => SessionState::InProgress {
                quiz_id: quiz_id.clone(),
                attempt: Attempt::begin(paper, now),
            },
            Err(err) => SessionState::QuizList { notice: Some(err.into()) },
        };
    }

    pub fn submit_finished(&mut self, result: Result<SubmitResult, GatewayError>) {
        let state = std::mem::replace(&mut self.state, SessionState::QuizList { notice: None });
        let SessionState::Submitting { quiz_id, attempt, request } = state else {
            self.state = state;
            return;
        };

        self.state = match result {
            Ok(result) => SessionState::Completed(result.into()),
            Err(GatewayError::AlreadySubmitted(message)) => {
                SessionState::Completed(Completion::AlreadySubmitted { message })
            }
            Err(err) => SessionState::Error { quiz_id, attempt, request, reason: err.to_string() },
        };
    }

    fn open(&mut self, quiz_id: String) -> Option<SessionCommand> {
        if !self.is_settled() {
            return None;
        }
        self.state = SessionState::PreflightCheck { quiz_id: quiz_id.clone() };
        Some(SessionCommand::Preflight { quiz_id })
    }

    fn leave(&mut self) {
        if !matches!(self.state, SessionState::Submitting { .. }) {
            self.state = SessionState::QuizList { notice: None };
        }
    }

    fn submit(&mut self, now: Instant, auto_submitted: bool) -> Option<SessionCommand> {
        let state = std::mem::replace(&mut self.state, SessionState::QuizList { notice: None });
        let SessionState::InProgress { quiz_id, attempt } = state else {
            self.state = state;
            return None;
        };

        let request = attempt.request(now, auto_submitted);
        self.state = SessionState::Submitting {
            quiz_id: quiz_id.clone(),
            attempt,
            request: request.clone(),
        };
        Some(SessionCommand::Submit { quiz_id, request })
    }

    fn retry(&mut self) -> Option<SessionCommand> {
        let state = std::mem::replace(&mut self.state, SessionState::QuizList { notice: None });
        let SessionState::Error { quiz_id, attempt, request, .. } = state else {
            self.state = state;
            return None;
        };

        self.state = SessionState::Submitting {
            quiz_id: quiz_id.clone(),
            attempt,
            request: request.clone(),
        };
        Some(SessionCommand::Submit { quiz_id, request })
    }
}

fn navigate(attempt: &mut Attempt, action: UserAction) {
    let count = attempt.answers.len();
    match action {
        UserAction::Next if attempt.question_index + 1 < count => attempt.question_index += 1,
        UserAction::Previous => attempt.question_index = attempt.question_index.saturating_sub(1),
        UserAction::Jump(index) if index < count => attempt.question_index = index,
        UserAction::Select { question, option } => {
            let in_range = attempt
                .paper
                .questions
                .get(question)
                .is_some_and(|q| option < q.options.len());
            if let (true, Ok(option)) = (in_range, i32::try_from(option)) {
                attempt.answers[question] = Some(option);
            }
        }
        UserAction::Clear { question } => {
            if let Some(slot) = attempt.answers.get_mut(question) {
                *slot = None;
            }
        }
        _ => {}
    }
}
