use serde::{Deserialize, Serialize};

use crate::api::pagination::default_limit;
use crate::core::time::format_primitive;
use crate::db::types::Section;
use crate::repositories::quiz_submissions::SubmissionListingRow;
use crate::services::grading::QuestionOutcome;

#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionListQuery {
    #[serde(default)]
    pub(crate) section: Option<Section>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

/// Row of the per-quiz results listing consumed by reporting.
#[derive(Debug, Serialize)]
pub(crate) struct SubmissionListItem {
    pub(crate) student_id: String,
    pub(crate) roll_no: Option<String>,
    pub(crate) name: String,
    pub(crate) section: Option<Section>,
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
    pub(crate) submitted_at: String,
    pub(crate) time_taken_seconds: i32,
    pub(crate) attempt_number: i32,
    pub(crate) auto_submitted: bool,
}

impl From<SubmissionListingRow> for SubmissionListItem {
    fn from(row: SubmissionListingRow) -> Self {
        Self {
            student_id: row.student_id,
            roll_no: row.roll_no,
            name: row.student_name,
            section: row.section,
            score: row.score,
            total_marks: row.total_marks,
            submitted_at: format_primitive(row.submitted_at),
            time_taken_seconds: row.time_taken_seconds,
            attempt_number: row.attempt_number,
            auto_submitted: row.auto_submitted,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewOption {
    pub(crate) index: usize,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
    pub(crate) is_selected: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewQuestion {
    pub(crate) index: usize,
    pub(crate) text: String,
    pub(crate) marks: i32,
    pub(crate) selected_index: Option<i32>,
    pub(crate) correct_answer_index: i32,
    /// `None` when the questions no longer match the graded attempt.
    pub(crate) outcome: Option<QuestionOutcome>,
    pub(crate) options: Vec<ReviewOption>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewResponse {
    pub(crate) quiz_id: String,
    pub(crate) quiz_title: String,
    pub(crate) student_id: String,
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
    pub(crate) percentage: f64,
    pub(crate) attempt_number: i32,
    pub(crate) auto_submitted: bool,
    pub(crate) submitted_at: String,
    /// The quiz was edited after this attempt was graded.
    pub(crate) questions_changed: bool,
    pub(crate) questions: Vec<ReviewQuestion>,
}
