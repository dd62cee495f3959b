//! Accept/reject decisions for quiz attempts.
//!
//! The window is always judged against the server clock passed in by the
//! caller. Retake policy is enforced at write time by the unique
//! `(quiz_id, student_id)` index; the pre-read only orders the error
//! reporting.

use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::metrics;
use crate::core::time::within_window;
use crate::db::models::{Quiz, QuizSubmission, User};
use crate::db::types::{QuizAvailability, UserRole};
use crate::repositories;
use crate::services::errors::QuizError;
use crate::services::grading::{self, GradeReport};

pub(crate) const ALREADY_SUBMITTED: &str = "You have already submitted this quiz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WritePath {
    FirstAttempt,
    Retake,
}

#[derive(Debug)]
pub(crate) struct SubmitCommand<'a> {
    pub(crate) quiz_id: &'a str,
    pub(crate) student: &'a User,
    pub(crate) answers: &'a [Option<i32>],
    pub(crate) time_taken_seconds: i32,
    pub(crate) auto_submitted: bool,
}

#[derive(Debug)]
pub(crate) struct SubmitOutcome {
    pub(crate) quiz: Quiz,
    pub(crate) submission: QuizSubmission,
    pub(crate) report: GradeReport,
}

#[derive(Debug)]
pub(crate) struct Preflight {
    pub(crate) quiz: Quiz,
    pub(crate) attempts_used: i32,
}

pub(crate) fn availability(quiz: &Quiz, now: PrimitiveDateTime) -> QuizAvailability {
    if now < quiz.start_time {
        QuizAvailability::Upcoming
    } else if now > quiz.end_time {
        QuizAvailability::Closed
    } else {
        QuizAvailability::Open
    }
}

pub(crate) fn check_window(quiz: &Quiz, now: PrimitiveDateTime) -> Result<(), QuizError> {
    if within_window(now, quiz.start_time, quiz.end_time) {
        return Ok(());
    }

    let reason = match availability(quiz, now) {
        QuizAvailability::Upcoming => "This quiz has not started yet",
        _ => "This quiz is closed for submissions",
    };
    Err(QuizError::Window(reason.to_string()))
}

/// Role and section rules; enrollment is checked against the database separately.
pub(crate) fn check_student(quiz: &Quiz, student: &User) -> Result<(), QuizError> {
    if student.role != UserRole::Student || !student.is_active {
        return Err(QuizError::authorization("Only active students can attempt quizzes"));
    }

    if let Some(section) = quiz.section {
        if student.section != Some(section) {
            return Err(QuizError::authorization(format!(
                "This quiz is restricted to section {section}; disallowed section"
            )));
        }
    }

    Ok(())
}

pub(crate) fn check_payload(
    quiz: &Quiz,
    answers: &[Option<i32>],
    time_taken_seconds: i32,
) -> Result<(), QuizError> {
    let question_count = quiz.questions.0.len();
    if answers.len() > question_count {
        return Err(QuizError::validation(format!(
            "answers has {} entries but the quiz has {question_count} questions",
            answers.len()
        )));
    }
    if time_taken_seconds < 0 {
        return Err(QuizError::validation("time_taken_seconds must not be negative"));
    }
    Ok(())
}

pub(crate) fn write_path(
    quiz: &Quiz,
    existing: Option<&QuizSubmission>,
) -> Result<WritePath, QuizError> {
    match (existing, quiz.allow_retake) {
        (Some(_), false) => Err(QuizError::Conflict(ALREADY_SUBMITTED.to_string())),
        (Some(_), true) => Ok(WritePath::Retake),
        (None, true) => Ok(WritePath::Retake),
        (None, false) => Ok(WritePath::FirstAttempt),
    }
}

async fn load_quiz(pool: &PgPool, quiz_id: &str) -> Result<Quiz, QuizError> {
    repositories::quizzes::find_by_id(pool, quiz_id)
        .await
        .map_err(|e| QuizError::internal(e, "Failed to load quiz"))?
        .ok_or_else(|| QuizError::not_found("Quiz not found"))
}

async fn check_eligibility(pool: &PgPool, quiz: &Quiz, student: &User) -> Result<(), QuizError> {
    check_student(quiz, student)?;

    let enrolled = repositories::papers::is_enrolled(pool, &quiz.paper_id, &student.id)
        .await
        .map_err(|e| QuizError::internal(e, "Failed to check enrollment"))?;
    if !enrolled {
        return Err(QuizError::authorization("You are not enrolled in this paper"));
    }

    Ok(())
}

/// Checks that a student may start an attempt right now.
pub(crate) async fn preflight(
    pool: &PgPool,
    quiz_id: &str,
    student: &User,
    now: PrimitiveDateTime,
) -> Result<Preflight, QuizError> {
    let quiz = load_quiz(pool, quiz_id).await?;
    check_window(&quiz, now)?;
    check_eligibility(pool, &quiz, student).await?;

    let existing = repositories::quiz_submissions::find_for_student(pool, &quiz.id, &student.id)
        .await
        .map_err(|e| QuizError::internal(e, "Failed to load existing submission"))?;
    write_path(&quiz, existing.as_ref())?;

    let attempts_used = existing.map(|submission| submission.attempt_number).unwrap_or(0);
    Ok(Preflight { quiz, attempts_used })
}

/// Runs the full submit guard, grades and persists the attempt.
pub(crate) async fn submit(
    pool: &PgPool,
    command: SubmitCommand<'_>,
    now: PrimitiveDateTime,
) -> Result<SubmitOutcome, QuizError> {
    let result = submit_inner(pool, &command, now).await;

    match &result {
        Ok(outcome) => {
            metrics::record_submission("accepted", command.auto_submitted);
            tracing::info!(
                quiz_id = %outcome.quiz.id,
                student_id = %command.student.id,
                score = outcome.submission.score,
                total_marks = outcome.submission.total_marks,
                correct = outcome.report.correct_count(),
                attempt_number = outcome.submission.attempt_number,
                auto_submitted = command.auto_submitted,
                "Quiz submission accepted"
            );
        }
        Err(err) => {
            metrics::record_submission(err.kind(), command.auto_submitted);
            tracing::info!(
                quiz_id = %command.quiz_id,
                student_id = %command.student.id,
                reason = err.kind(),
                auto_submitted = command.auto_submitted,
                "Quiz submission rejected"
            );
        }
    }

    result
}

async fn submit_inner(
    pool: &PgPool,
    command: &SubmitCommand<'_>,
    now: PrimitiveDateTime,
) -> Result<SubmitOutcome, QuizError> {
    let quiz = load_quiz(pool, command.quiz_id).await?;
    check_window(&quiz, now)?;
    check_eligibility(pool, &quiz, command.student).await?;
    check_payload(&quiz, command.answers, command.time_taken_seconds)?;

    let existing =
        repositories::quiz_submissions::find_for_student(pool, &quiz.id, &command.student.id)
            .await
            .map_err(|e| QuizError::internal(e, "Failed to load existing submission"))?;
    let path = write_path(&quiz, existing.as_ref())?;

    let report = grading::grade(&quiz.questions.0, command.answers);
    let id = Uuid::new_v4().to_string();
    let params = repositories::quiz_submissions::NewSubmission {
        id: &id,
        quiz_id: &quiz.id,
        student_id: &command.student.id,
        answers: command.answers,
        score: report.score,
        total_marks: report.total_marks,
        submitted_at: now,
        time_taken_seconds: command.time_taken_seconds,
        auto_submitted: command.auto_submitted,
    };

    let submission = match path {
        WritePath::FirstAttempt => {
            repositories::quiz_submissions::insert_if_absent(pool, params)
                .await
                .map_err(|e| QuizError::internal(e, "Failed to store submission"))?
                // Lost the race against a concurrent first submit.
                .ok_or_else(|| QuizError::Conflict(ALREADY_SUBMITTED.to_string()))?
        }
        WritePath::Retake => repositories::quiz_submissions::upsert_retake(pool, params)
            .await
            .map_err(|e| QuizError::internal(e, "Failed to store submission"))?,
    };

    Ok(SubmitOutcome { quiz, submission, report })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use sqlx::types::Json;
    use time::macros::datetime;

    use crate::db::models::{Quiz, QuizSubmission, User};
    use crate::db::types::UserRole;
    use crate::services::grading::single_choice;

    pub(crate) fn quiz() -> Quiz {
        Quiz {
            id: "quiz-1".to_string(),
            paper_id: "paper-1".to_string(),
            title: "Weekly quiz".to_string(),
            description: None,
            section: None,
            questions: Json(vec![
                single_choice(&["a", "b"], 1, 1),
                single_choice(&["c", "d", "e"], 0, 2),
            ]),
            duration_minutes: 20,
            start_time: datetime!(2025-03-01 9:00),
            end_time: datetime!(2025-03-01 10:00),
            allow_retake: false,
            show_results: true,
            show_correct_answers: true,
            total_marks: 3,
            created_by: Some("teacher-1".to_string()),
            created_at: datetime!(2025-02-01 0:00),
            updated_at: datetime!(2025-02-01 0:00),
        }
    }

    pub(crate) fn user(id: &str, role: UserRole) -> User {
        User {
            id: id.to_string(),
            username: id.to_string(),
            full_name: format!("User {id}"),
            roll_no: None,
            role,
            section: None,
            department: Some("CSE".to_string()),
            is_active: true,
            created_at: datetime!(2025-01-01 0:00),
            updated_at: datetime!(2025-01-01 0:00),
        }
    }

    pub(crate) fn submission(student_id: &str, answers: Vec<Option<i32>>, score: i32) -> QuizSubmission {
        QuizSubmission {
            id: format!("sub-{student_id}"),
            quiz_id: "quiz-1".to_string(),
            student_id: student_id.to_string(),
            answers: Json(answers),
            score,
            total_marks: 3,
            submitted_at: datetime!(2025-03-01 9:30),
            time_taken_seconds: 600,
            attempt_number: 1,
            auto_submitted: false,
            created_at: datetime!(2025-03-01 9:30),
            updated_at: datetime!(2025-03-01 9:30),
        }
    }
}
