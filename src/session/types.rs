//! Wire shapes of the take-quiz endpoints as seen from the client side.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Question paper returned by the attempt preflight. Carries no answer key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuizPaper {
    pub id: String,
    pub title: String,
    pub duration_minutes: i32,
    pub start_time: String,
    pub end_time: String,
    pub server_time: String,
    pub total_marks: i32,
    pub show_results: bool,
    #[serde(default)]
    pub attempts_used: i32,
    pub questions: Vec<PaperQuestion>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaperQuestion {
    pub index: usize,
    pub text: String,
    pub options: Vec<String>,
    pub marks: i32,
}

impl QuizPaper {
    /// Time the student may spend: the quiz duration, cut short when the
    /// window closes first. Measured against the server clock so a skewed
    /// local clock cannot stretch it.
    pub fn time_budget(&self) -> Duration {
        let duration = Duration::from_secs(u64::try_from(self.duration_minutes).unwrap_or(0) * 60);

        let (Ok(end), Ok(server_now)) = (
            OffsetDateTime::parse(&self.end_time, &Rfc3339),
            OffsetDateTime::parse(&self.server_time, &Rfc3339),
        ) else {
            return duration;
        };

        let until_close = u64::try_from((end - server_now).whole_seconds()).unwrap_or(0);
        duration.min(Duration::from_secs(until_close))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitRequest {
    pub answers: Vec<Option<i32>>,
    pub time_taken_seconds: i32,
    pub auto_submitted: bool,
}

/// Acknowledgement of an accepted submission. The score fields are absent
/// when the quiz hides results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmitResult {
    pub quiz_id: String,
    pub message: String,
    pub attempt_number: i32,
    pub auto_submitted: bool,
    #[serde(default)]
    pub score: Option<i32>,
    #[serde(default)]
    pub total_marks: Option<i32>,
    #[serde(default)]
    pub percentage: Option<f64>,
}
