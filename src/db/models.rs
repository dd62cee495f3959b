use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{Section, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) roll_no: Option<String>,
    pub(crate) role: UserRole,
    pub(crate) section: Option<Section>,
    pub(crate) department: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Paper {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) title: String,
    pub(crate) department: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) sections: Json<Vec<Section>>,
    pub(crate) created_at: PrimitiveDateTime,
}

/// A single question as stored inside `quizzes.questions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Question {
    pub(crate) text: String,
    pub(crate) marks: i32,
    #[serde(flatten)]
    pub(crate) kind: QuestionKind,
}

/// Grading contract of a question. New kinds get their own variant so that
/// stored quizzes keep deserializing unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum QuestionKind {
    SingleChoice { options: Vec<String>, correct_answer_index: i32 },
}

impl Question {
    pub(crate) fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::SingleChoice { options, .. } => options,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Quiz {
    pub(crate) id: String,
    pub(crate) paper_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) section: Option<Section>,
    pub(crate) questions: Json<Vec<Question>>,
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) allow_retake: bool,
    pub(crate) show_results: bool,
    pub(crate) show_correct_answers: bool,
    pub(crate) total_marks: i32,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Selected option index per question; `None` means unanswered.
pub(crate) type Answers = Vec<Option<i32>>;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizSubmission {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) student_id: String,
    pub(crate) answers: Json<Answers>,
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) time_taken_seconds: i32,
    pub(crate) attempt_number: i32,
    pub(crate) auto_submitted: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
