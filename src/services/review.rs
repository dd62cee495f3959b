use sqlx::PgPool;

use crate::core::time::format_primitive;
use crate::db::models::{Paper, QuestionKind, Quiz, QuizSubmission, User};
use crate::repositories;
use crate::schemas::quiz::percentage;
use crate::schemas::submission::{ReviewOption, ReviewQuestion, ReviewResponse};
use crate::services::errors::QuizError;
use crate::services::grading;

/// Who may look at `student_id`'s answer sheet for this quiz.
pub(crate) fn check_review_access(
    quiz: &Quiz,
    paper: &Paper,
    student_id: &str,
    requester: &User,
) -> Result<(), QuizError> {
    if !quiz.show_correct_answers {
        return Err(QuizError::authorization("Answer review is disabled for this quiz"));
    }

    let is_self = requester.id == student_id;
    let is_paper_teacher = paper.teacher_id.as_deref() == Some(requester.id.as_str());
    if is_self || is_paper_teacher || requester.is_admin() {
        return Ok(());
    }

    Err(QuizError::authorization("You cannot review this submission"))
}

/// Builds per-option display flags. The score shown is the stored one, even
/// if questions were edited after the attempt; per-question outcomes are only
/// given while regrading still reproduces that stored score.
pub(crate) fn reconstruct(quiz: &Quiz, submission: &QuizSubmission) -> ReviewResponse {
    let answers = &submission.answers.0;
    let regraded = grading::grade(&quiz.questions.0, answers);
    let questions_changed = regraded.score != submission.score
        || regraded.total_marks != submission.total_marks;

    let questions = quiz
        .questions
        .0
        .iter()
        .zip(regraded.outcomes)
        .enumerate()
        .map(|(index, (question, outcome))| {
            let selected_index = answers.get(index).copied().flatten();
            let QuestionKind::SingleChoice { options, correct_answer_index } = &question.kind;

            let options = options
                .iter()
                .enumerate()
                .map(|(option_index, text)| {
                    let position = i32::try_from(option_index).ok();
                    ReviewOption {
                        index: option_index,
                        text: text.clone(),
                        is_correct: position == Some(*correct_answer_index),
                        is_selected: position.is_some() && position == selected_index,
                    }
                })
                .collect();

            ReviewQuestion {
                index,
                text: question.text.clone(),
                marks: question.marks,
                selected_index,
                correct_answer_index: *correct_answer_index,
                outcome: (!questions_changed).then_some(outcome),
                options,
            }
        })
        .collect();

    ReviewResponse {
        quiz_id: quiz.id.clone(),
        quiz_title: quiz.title.clone(),
        student_id: submission.student_id.clone(),
        score: submission.score,
        total_marks: submission.total_marks,
        percentage: percentage(submission.score, submission.total_marks),
        attempt_number: submission.attempt_number,
        auto_submitted: submission.auto_submitted,
        submitted_at: format_primitive(submission.submitted_at),
        questions_changed,
        questions,
    }
}

pub(crate) async fn review(
    pool: &PgPool,
    quiz_id: &str,
    student_id: &str,
    requester: &User,
) -> Result<ReviewResponse, QuizError> {
    let quiz = repositories::quizzes::find_by_id(pool, quiz_id)
        .await
        .map_err(|e| QuizError::internal(e, "Failed to load quiz"))?
        .ok_or_else(|| QuizError::not_found("Quiz not found"))?;

    let paper = repositories::papers::find_by_id(pool, &quiz.paper_id)
        .await
        .map_err(|e| QuizError::internal(e, "Failed to load paper"))?
        .ok_or_else(|| QuizError::not_found("Paper not found"))?;

    check_review_access(&quiz, &paper, student_id, requester)?;

    let submission = repositories::quiz_submissions::find_for_student(pool, quiz_id, student_id)
        .await
        .map_err(|e| QuizError::internal(e, "Failed to load submission"))?
        .ok_or_else(|| QuizError::not_found("Submission not found"))?;

    Ok(reconstruct(&quiz, &submission))
}
