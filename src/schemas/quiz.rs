use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Question, QuestionKind, Quiz};
use crate::db::types::{QuizAvailability, Section};

/// Question kinds accepted from authors. Absent means `single_choice`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum QuestionType {
    #[default]
    SingleChoice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct QuestionCreate {
    pub(crate) text: String,
    #[serde(default, rename = "type")]
    pub(crate) kind: QuestionType,
    #[serde(default)]
    pub(crate) options: Vec<String>,
    #[serde(alias = "correctAnswerIndex")]
    pub(crate) correct_answer_index: i32,
    #[serde(default = "default_marks")]
    pub(crate) marks: i32,
}

impl QuestionCreate {
    pub(crate) fn into_question(self) -> Question {
        let kind = match self.kind {
            QuestionType::SingleChoice => QuestionKind::SingleChoice {
                options: self.options.into_iter().map(|option| option.trim().to_string()).collect(),
                correct_answer_index: self.correct_answer_index,
            },
        };

        Question { text: self.text.trim().to_string(), marks: self.marks, kind }
    }
}

/// Body of both `POST /papers/:paper_id/quizzes` and `PUT /quizzes/:quiz_id`;
/// updates replace the definition wholesale.
#[derive(Debug, Clone, Deserialize, Validate)]
pub(crate) struct QuizCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) section: Option<Section>,
    #[validate(length(min = 1, message = "at least one question is required"))]
    pub(crate) questions: Vec<QuestionCreate>,
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(alias = "startTime", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) start_time: OffsetDateTime,
    #[serde(alias = "endTime", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) end_time: OffsetDateTime,
    #[serde(default, alias = "allowRetake")]
    pub(crate) allow_retake: bool,
    #[serde(default = "default_true", alias = "showResults")]
    pub(crate) show_results: bool,
    #[serde(default, alias = "showCorrectAnswers")]
    pub(crate) show_correct_answers: bool,
}

pub(crate) type QuizUpdate = QuizCreate;

#[derive(Debug, Deserialize)]
pub(crate) struct QuizListQuery {
    #[serde(default)]
    pub(crate) section: Option<Section>,
}

/// Full definition including correct answers; only for the paper's staff.
#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: String,
    pub(crate) paper_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) section: Option<Section>,
    pub(crate) questions: Vec<Question>,
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) allow_retake: bool,
    pub(crate) show_results: bool,
    pub(crate) show_correct_answers: bool,
    pub(crate) total_marks: i32,
    pub(crate) availability: QuizAvailability,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizSummary {
    pub(crate) id: String,
    pub(crate) paper_id: String,
    pub(crate) title: String,
    pub(crate) section: Option<Section>,
    pub(crate) question_count: usize,
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) total_marks: i32,
    pub(crate) allow_retake: bool,
    pub(crate) availability: QuizAvailability,
}

/// Question as shown to a student taking the quiz.
#[derive(Debug, Serialize)]
pub(crate) struct PaperQuestion {
    pub(crate) index: usize,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) marks: i32,
}

/// Student view of a quiz: no answer key.
#[derive(Debug, Serialize)]
pub(crate) struct QuizPaperResponse {
    pub(crate) id: String,
    pub(crate) paper_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) section: Option<Section>,
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) server_time: String,
    pub(crate) total_marks: i32,
    pub(crate) allow_retake: bool,
    pub(crate) show_results: bool,
    pub(crate) attempts_used: i32,
    pub(crate) availability: QuizAvailability,
    pub(crate) questions: Vec<PaperQuestion>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    pub(crate) answers: Vec<Option<i32>>,
    #[serde(alias = "timeTakenSeconds")]
    pub(crate) time_taken_seconds: i32,
    #[serde(default, alias = "autoSubmitted")]
    pub(crate) auto_submitted: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) quiz_id: String,
    pub(crate) message: String,
    pub(crate) attempt_number: i32,
    pub(crate) submitted_at: String,
    pub(crate) auto_submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) total_marks: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) percentage: Option<f64>,
}

impl QuizResponse {
    pub(crate) fn from_quiz(quiz: Quiz, availability: QuizAvailability) -> Self {
        Self {
            id: quiz.id,
            paper_id: quiz.paper_id,
            title: quiz.title,
            description: quiz.description,
            section: quiz.section,
            questions: quiz.questions.0,
            duration_minutes: quiz.duration_minutes,
            start_time: format_primitive(quiz.start_time),
            end_time: format_primitive(quiz.end_time),
            allow_retake: quiz.allow_retake,
            show_results: quiz.show_results,
            show_correct_answers: quiz.show_correct_answers,
            total_marks: quiz.total_marks,
            availability,
            created_by: quiz.created_by,
            created_at: format_primitive(quiz.created_at),
            updated_at: format_primitive(quiz.updated_at),
        }
    }
}

impl QuizSummary {
    pub(crate) fn from_quiz(quiz: &Quiz, availability: QuizAvailability) -> Self {
        Self {
            id: quiz.id.clone(),
            paper_id: quiz.paper_id.clone(),
            title: quiz.title.clone(),
            section: quiz.section,
            question_count: quiz.questions.0.len(),
            duration_minutes: quiz.duration_minutes,
            start_time: format_primitive(quiz.start_time),
            end_time: format_primitive(quiz.end_time),
            total_marks: quiz.total_marks,
            allow_retake: quiz.allow_retake,
            availability,
        }
    }
}

impl QuizPaperResponse {
    pub(crate) fn from_quiz(
        quiz: Quiz,
        availability: QuizAvailability,
        server_time: PrimitiveDateTime,
        attempts_used: i32,
    ) -> Self {
        let questions = quiz
            .questions
            .0
            .iter()
            .enumerate()
            .map(|(index, question)| PaperQuestion {
                index,
                text: question.text.clone(),
                options: question.options().to_vec(),
                marks: question.marks,
            })
            .collect();

        Self {
            id: quiz.id,
            paper_id: quiz.paper_id,
            title: quiz.title,
            description: quiz.description,
            section: quiz.section,
            duration_minutes: quiz.duration_minutes,
            start_time: format_primitive(quiz.start_time),
            end_time: format_primitive(quiz.end_time),
            server_time: format_primitive(server_time),
            total_marks: quiz.total_marks,
            allow_retake: quiz.allow_retake,
            show_results: quiz.show_results,
            attempts_used,
            availability,
            questions,
        }
    }
}

/// Percentage with two decimals; zero when the quiz carries no marks.
pub(crate) fn percentage(score: i32, total_marks: i32) -> f64 {
    if total_marks <= 0 {
        return 0.0;
    }
    (f64::from(score) * 10_000.0 / f64::from(total_marks)).round() / 100.0
}

fn default_marks() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

fn parse_offset_datetime_flexible(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    // datetime-local inputs arrive without an offset; treat them as UTC.
    if let Ok(value) =
        PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    {
        return Some(value.assume_utc());
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value.assume_utc());
    }

    None
}

fn deserialize_offset_datetime_flexible<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_offset_datetime_flexible(&raw)
        .ok_or_else(|| D::Error::custom(format!("invalid datetime: {raw}")))
}
