use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use super::gateway::QuizGateway;
use super::machine::{QuizSession, SessionCommand, SessionState, UserAction};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Runs one take-quiz session against a gateway: a one-second ticker and the
/// student's actions are multiplexed on a single task, and gateway calls are
/// awaited inline so at most one is in flight.
pub struct SessionDriver<G> {
    gateway: G,
    actions: mpsc::Receiver<UserAction>,
    session: QuizSession,
}

impl<G: QuizGateway> SessionDriver<G> {
    pub fn new(gateway: G, actions: mpsc::Receiver<UserAction>) -> Self {
        Self { gateway, actions, session: QuizSession::new() }
    }

    /// Opens `quiz_id` and drives the session until it settles: completed, or
    /// back on the quiz list after a refusal or [`UserAction::Leave`]. A closed
    /// action channel counts as leaving.
    pub async fn run(mut self, quiz_id: &str) -> SessionState {
        let mut ticker = tokio::time::interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut pending =
            self.session.handle(UserAction::Open(quiz_id.to_string()), Instant::now());

        loop {
            if let Some(command) = pending.take() {
                self.execute(command).await;
                continue;
            }
            if self.session.is_settled() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    pending = self.session.tick(Instant::now());
                }
                action = self.actions.recv() => {
                    let action = action.unwrap_or(UserAction::Leave);
                    pending = self.session.handle(action, Instant::now());
                }
            }
        }

        self.session.into_state()
    }

    async fn execute(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Preflight { quiz_id } => {
                let result = self.gateway.preflight(&quiz_id).await;
                if let Err(err) = &result {
                    tracing::info!(quiz_id = %quiz_id, error = %err, "Quiz preflight refused");
                }
                self.session.preflight_finished(result, Instant::now());
            }
            SessionCommand::Submit { quiz_id, request } => {
                tracing::debug!(
                    quiz_id = %quiz_id,
                    auto_submitted = request.auto_submitted,
                    "Submitting quiz answers"
                );
                let result = self.gateway.submit(&quiz_id, &request).await;
                if let Err(err) = &result {
                    if err.is_benign() {
                        tracing::info!(quiz_id = %quiz_id, error = %err, "Quiz submit refused");
                    } else {
                        tracing::warn!(quiz_id = %quiz_id, error = %err, "Quiz submit failed");
                    }
                }
                self.session.submit_finished(result);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use time::{format_description::well_known::Rfc3339, OffsetDateTime};

    use super::*;
    use crate::session::gateway::GatewayError;
    use crate::session::machine::Completion;
    use crate::session::types::{PaperQuestion, QuizPaper, SubmitRequest, SubmitResult};

    struct FakeGateway {
        paper: QuizPaper,
        failures: Mutex<Vec<GatewayError>>,
        submitted: Mutex<Vec<SubmitRequest>>,
    }

    impl FakeGateway {
        fn new(duration_minutes: i32, window_left: time::Duration) -> Self {
            let server_now = OffsetDateTime::now_utc();
            let paper = QuizPaper {
                id: "quiz-1".to_string(),
                title: "Fixture quiz".to_string(),
                duration_minutes,
                start_time: (server_now - time::Duration::hours(1)).format(&Rfc3339).unwrap(),
                end_time: (server_now + window_left).format(&Rfc3339).unwrap(),
                server_time: server_now.format(&Rfc3339).unwrap(),
                total_marks: 3,
                show_results: true,
                attempts_used: 0,
                questions: vec![
                    PaperQuestion {
                        index: 0,
                        text: "q1".to_string(),
                        options: vec!["a".to_string(), "b".to_string()],
                        marks: 1,
                    },
                    PaperQuestion {
                        index: 1,
                        text: "q2".to_string(),
                        options: vec!["c".to_string(), "d".to_string(), "e".to_string()],
                        marks: 2,
                    },
                ],
            };
            Self { paper, failures: Mutex::new(Vec::new()), submitted: Mutex::new(Vec::new()) }
        }

        fn failing_first_with(self, err: GatewayError) -> Self {
            self.failures.lock().unwrap().push(err);
            self
        }

        fn submitted(&self) -> Vec<SubmitRequest> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QuizGateway for FakeGateway {
        async fn preflight(&self, _quiz_id: &str) -> Result<QuizPaper, GatewayError> {
            Ok(self.paper.clone())
        }

        async fn submit(
            &self,
            quiz_id: &str,
            request: &SubmitRequest,
        ) -> Result<SubmitResult, GatewayError> {
            self.submitted.lock().unwrap().push(request.clone());
            if let Some(err) = self.failures.lock().unwrap().pop() {
                return Err(err);
            }
            Ok(SubmitResult {
                quiz_id: quiz_id.to_string(),
                message: "Quiz submitted successfully".to_string(),
                attempt_number: 1,
                auto_submitted: request.auto_submitted,
                score: Some(3),
                total_marks: Some(3),
                percentage: Some(100.0),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timer_expiry_auto_submits() {
        let gateway = Arc::new(FakeGateway::new(1, time::Duration::hours(1)));
        let (_actions, receiver) = mpsc::channel(8);
        let started = Instant::now();

        let state = SessionDriver::new(gateway.clone(), receiver).run("quiz-1").await;

        assert_eq!(started.elapsed().as_secs(), 60);
        assert!(matches!(
            state,
            SessionState::Completed(Completion::Graded { auto_submitted: true, .. })
        ));
        let submitted = gateway.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].answers, vec![None, None]);
        assert_eq!(submitted[0].time_taken_seconds, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_window_shortens_the_countdown() {
        let gateway = Arc::new(FakeGateway::new(30, time::Duration::seconds(20)));
        let (_actions, receiver) = mpsc::channel(8);
        let started = Instant::now();

        SessionDriver::new(gateway.clone(), receiver).run("quiz-1").await;

        assert_eq!(started.elapsed().as_secs(), 20);
        assert!(gateway.submitted()[0].auto_submitted);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_is_sent_once() {
        let gateway = Arc::new(FakeGateway::new(1, time::Duration::hours(1)));
        let (actions, receiver) = mpsc::channel(8);
        actions.send(UserAction::Select { question: 0, option: 1 }).await.unwrap();
        actions.send(UserAction::Select { question: 1, option: 0 }).await.unwrap();
        actions.send(UserAction::Submit).await.unwrap();
        actions.send(UserAction::Submit).await.unwrap();

        let state = SessionDriver::new(gateway.clone(), receiver).run("quiz-1").await;

        assert!(matches!(
            state,
            SessionState::Completed(Completion::Graded { auto_submitted: false, .. })
        ));
        let submitted = gateway.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].answers, vec![Some(1), Some(0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_resends_the_preserved_buffer() {
        let gateway = Arc::new(
            FakeGateway::new(1, time::Duration::hours(1))
                .failing_first_with(GatewayError::Transport("connection reset".to_string())),
        );
        let (actions, receiver) = mpsc::channel(8);
        actions.send(UserAction::Select { question: 1, option: 2 }).await.unwrap();
        actions.send(UserAction::Submit).await.unwrap();
        actions.send(UserAction::Retry).await.unwrap();

        let state = SessionDriver::new(gateway.clone(), receiver).run("quiz-1").await;

        assert!(matches!(state, SessionState::Completed(_)));
        let submitted = gateway.submitted();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[0], submitted[1]);
        assert_eq!(submitted[1].answers, vec![None, Some(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_action_channel_abandons_the_attempt() {
        let gateway = Arc::new(FakeGateway::new(1, time::Duration::hours(1)));
        let (actions, receiver) = mpsc::channel(8);
        actions.send(UserAction::Select { question: 0, option: 0 }).await.unwrap();
        drop(actions);

        let state = SessionDriver::new(gateway.clone(), receiver).run("quiz-1").await;

        assert_eq!(state, SessionState::QuizList { notice: None });
        assert!(gateway.submitted().is_empty());
    }
}
