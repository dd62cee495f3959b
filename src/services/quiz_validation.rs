use time::PrimitiveDateTime;
use validator::Validate;

use crate::core::config::QuizSettings;
use crate::core::time::to_primitive_utc;
use crate::db::models::{Paper, Question, QuestionKind, User};
use crate::schemas::quiz::QuizCreate;
use crate::services::errors::QuizError;
use crate::services::grading;

pub(crate) const MAX_QUESTION_MARKS: i32 = 1000;

/// A definition that passed every authoring check and is ready to persist.
#[derive(Debug, Clone)]
pub(crate) struct ValidatedQuiz {
    pub(crate) questions: Vec<Question>,
    pub(crate) total_marks: i32,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
}

/// Checks an authoring payload against the paper it belongs to.
///
/// `creator` is `None` for trusted internal callers; otherwise it has to be
/// the paper's teacher or an admin. `total_marks` is always recomputed from
/// the questions.
pub(crate) fn validate_definition(
    payload: &QuizCreate,
    paper: &Paper,
    creator: Option<&User>,
    limits: &QuizSettings,
) -> Result<ValidatedQuiz, QuizError> {
    payload.validate().map_err(|e| QuizError::validation(e.to_string()))?;

    let start_time = to_primitive_utc(payload.start_time);
    let end_time = to_primitive_utc(payload.end_time);
    if end_time <= start_time {
        return Err(QuizError::validation("end_time must be after start_time"));
    }

    if payload.questions.len() > limits.max_questions {
        return Err(QuizError::validation(format!(
            "a quiz may have at most {} questions",
            limits.max_questions
        )));
    }

    let questions: Vec<Question> =
        payload.questions.iter().cloned().map(|question| question.into_question()).collect();
    for (index, question) in questions.iter().enumerate() {
        validate_question(index, question, limits)?;
    }

    if let Some(creator) = creator {
        if !can_manage_paper(creator, paper) {
            return Err(QuizError::authorization(
                "Only the paper's assigned teacher can manage its quizzes",
            ));
        }
    }

    if let Some(section) = payload.section {
        if !paper.sections.0.contains(&section) {
            return Err(QuizError::validation(format!(
                "section {section} is not offered by paper {}",
                paper.code
            )));
        }
    }

    let total_marks = grading::total_marks(&questions);

    Ok(ValidatedQuiz { questions, total_marks, start_time, end_time })
}

pub(crate) fn can_manage_paper(user: &User, paper: &Paper) -> bool {
    user.is_admin() || paper.teacher_id.as_deref() == Some(user.id.as_str())
}

fn validate_question(
    index: usize,
    question: &Question,
    limits: &QuizSettings,
) -> Result<(), QuizError> {
    if question.text.is_empty() {
        return Err(QuizError::validation(format!("questions[{index}].text must not be empty")));
    }
    if question.marks < 1 {
        return Err(QuizError::validation(format!("questions[{index}].marks must be positive")));
    }
    if question.marks > MAX_QUESTION_MARKS {
        return Err(QuizError::validation(format!(
            "questions[{index}].marks must be at most {MAX_QUESTION_MARKS}"
        )));
    }

    match &question.kind {
        QuestionKind::SingleChoice { options, correct_answer_index } => {
            if options.len() < 2 {
                return Err(QuizError::validation(format!(
                    "questions[{index}].options must contain at least 2 options"
                )));
            }
            if options.len() > limits.max_options {
                return Err(QuizError::validation(format!(
                    "questions[{index}].options must contain at most {} options",
                    limits.max_options
                )));
            }
            if let Some(position) = options.iter().position(|option| option.is_empty()) {
                return Err(QuizError::validation(format!(
                    "questions[{index}].options[{position}] must not be empty"
                )));
            }
            let in_range = usize::try_from(*correct_answer_index)
                .map(|correct| correct < options.len())
                .unwrap_or(false);
            if !in_range {
                return Err(QuizError::validation(format!(
                    "questions[{index}].correct_answer_index is out of range"
                )));
            }
        }
    }

    Ok(())
}
