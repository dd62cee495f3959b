use axum::extract::{Path, Query, State};
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::guards::{require_paper_staff, CurrentUser};
use crate::api::pagination::PaginatedResponse;
use crate::api::quizzes::load_quiz_with_paper;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::repositories;
use crate::schemas::quiz::{percentage, QuizPaperResponse, SubmitRequest, SubmitResponse};
use crate::schemas::submission::{ReviewResponse, SubmissionListItem, SubmissionListQuery};
use crate::services::ledger::{self, SubmitCommand};
use crate::services::review;

/// Preflight for the take-quiz flow: window open, student eligible, and no
/// blocking submission. Returns the question paper.
pub(super) async fn start_attempt(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizPaperResponse>, ApiError> {
    let now = primitive_now_utc();
    let preflight = ledger::preflight(state.db(), &quiz_id, &user, now).await?;

    tracing::debug!(quiz_id = %quiz_id, student_id = %user.id, "Quiz attempt started");

    let quiz_state = ledger::availability(&preflight.quiz, now);
    Ok(Json(QuizPaperResponse::from_quiz(preflight.quiz, quiz_state, now, preflight.attempts_used)))
}

pub(super) async fn submit_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let outcome = ledger::submit(
        state.db(),
        SubmitCommand {
            quiz_id: &quiz_id,
            student: &user,
            answers: &payload.answers,
            time_taken_seconds: payload.time_taken_seconds,
            auto_submitted: payload.auto_submitted,
        },
        primitive_now_utc(),
    )
    .await?;

    let submission = outcome.submission;
    let show_results = outcome.quiz.show_results;
    let message = if submission.auto_submitted {
        "Time is up; your answers were submitted automatically"
    } else {
        "Quiz submitted successfully"
    };

    Ok(Json(SubmitResponse {
        quiz_id: outcome.quiz.id,
        message: message.to_string(),
        attempt_number: submission.attempt_number,
        submitted_at: format_primitive(submission.submitted_at),
        auto_submitted: submission.auto_submitted,
        score: show_results.then_some(submission.score),
        total_marks: show_results.then_some(submission.total_marks),
        percentage: show_results.then(|| percentage(submission.score, submission.total_marks)),
    }))
}

pub(super) async fn list_submissions(
    Path(quiz_id): Path<String>,
    Query(params): Query<SubmissionListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<SubmissionListItem>>, ApiError> {
    let (quiz, paper) = load_quiz_with_paper(&state, &quiz_id).await?;
    require_paper_staff(&user, &paper)?;

    let skip = params.skip.max(0);
    let limit = params.limit.clamp(1, 1000);
    // A sectioned quiz lists its own section unless another is asked for.
    let section = params.section.or(quiz.section);

    let rows =
        repositories::quiz_submissions::list_by_quiz(state.db(), &quiz.id, section, skip, limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;
    let total_count = repositories::quiz_submissions::count_by_quiz(state.db(), &quiz.id, section)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count submissions"))?;

    Ok(Json(PaginatedResponse {
        items: rows.into_iter().map(SubmissionListItem::from).collect(),
        total_count,
        skip,
        limit,
    }))
}

pub(super) async fn review_submission(
    Path((quiz_id, student_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let sheet = review::review(state.db(), &quiz_id, &student_id, &user).await?;
    Ok(Json(sheet))
}
