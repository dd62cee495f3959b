use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{
    load_paper, require_paper_access, require_paper_staff, CurrentUser, PaperAccess,
};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::QuizAvailability;
use crate::repositories;
use crate::schemas::quiz::{
    QuizCreate, QuizListQuery, QuizPaperResponse, QuizResponse, QuizSummary, QuizUpdate,
};
use crate::services::ledger::availability;
use crate::services::quiz_validation::validate_definition;

use super::helpers::{self, SectionFilter};

pub(super) async fn create_quiz(
    Path(paper_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    let paper = load_paper(&state, &paper_id).await?;
    let validated = validate_definition(&payload, &paper, Some(&user), state.settings().quiz())?;

    let now = primitive_now_utc();
    let quiz = repositories::quizzes::create(
        state.db(),
        repositories::quizzes::CreateQuiz {
            id: &Uuid::new_v4().to_string(),
            paper_id: &paper.id,
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            section: payload.section,
            questions: &validated.questions,
            duration_minutes: payload.duration_minutes,
            start_time: validated.start_time,
            end_time: validated.end_time,
            allow_retake: payload.allow_retake,
            show_results: payload.show_results,
            show_correct_answers: payload.show_correct_answers,
            total_marks: validated.total_marks,
            created_by: Some(&user.id),
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create quiz"))?;

    tracing::info!(
        teacher_id = %user.id,
        paper_id = %paper.id,
        quiz_id = %quiz.id,
        questions = validated.questions.len(),
        total_marks = quiz.total_marks,
        action = "quiz_create",
        "Quiz created"
    );

    let state_now = availability(&quiz, now);
    Ok((StatusCode::CREATED, Json(QuizResponse::from_quiz(quiz, state_now))))
}

pub(super) async fn list_quizzes(
    Path(paper_id): Path<String>,
    Query(params): Query<QuizListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuizSummary>>, ApiError> {
    let paper = load_paper(&state, &paper_id).await?;
    require_paper_access(&state, &user, &paper).await?;

    let filter = helpers::effective_section(&user, params.section);
    let section = match filter {
        SectionFilter::Section(section) => Some(section),
        SectionFilter::All | SectionFilter::UnrestrictedOnly => None,
    };

    let quizzes = repositories::quizzes::list_by_paper(state.db(), &paper.id, section)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;

    let now = primitive_now_utc();
    let summaries = quizzes
        .iter()
        .filter(|quiz| filter != SectionFilter::UnrestrictedOnly || quiz.section.is_none())
        .map(|quiz| QuizSummary::from_quiz(quiz, availability(quiz, now)))
        .collect();

    Ok(Json(summaries))
}

/// Staff get the full definition; students get the question paper without
/// the answer key, and without the questions until the window opens.
pub(super) async fn get_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let (quiz, paper) = helpers::load_quiz_with_paper(&state, &quiz_id).await?;
    let access = require_paper_access(&state, &user, &paper).await?;
    let now = primitive_now_utc();

    if access == PaperAccess::Staff {
        let quiz_state = availability(&quiz, now);
        return Ok(Json(QuizResponse::from_quiz(quiz, quiz_state)).into_response());
    }

    if !helpers::student_can_see(&user, &quiz) {
        return Err(ApiError::forbidden("This quiz is not offered to your section"));
    }

    let attempts_used =
        repositories::quiz_submissions::find_for_student(state.db(), &quiz.id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
            .map(|submission| submission.attempt_number)
            .unwrap_or(0);

    let quiz_state = availability(&quiz, now);
    let mut paper_view = QuizPaperResponse::from_quiz(quiz, quiz_state, now, attempts_used);
    if quiz_state == QuizAvailability::Upcoming {
        paper_view.questions.clear();
    }
    Ok(Json(paper_view).into_response())
}

pub(super) async fn update_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuizUpdate>,
) -> Result<Json<QuizResponse>, ApiError> {
    let (quiz, paper) = helpers::load_quiz_with_paper(&state, &quiz_id).await?;
    let validated = validate_definition(&payload, &paper, Some(&user), state.settings().quiz())?;

    let now = primitive_now_utc();
    let updated = repositories::quizzes::update(
        state.db(),
        &quiz.id,
        repositories::quizzes::UpdateQuiz {
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            section: payload.section,
            questions: &validated.questions,
            duration_minutes: payload.duration_minutes,
            start_time: validated.start_time,
            end_time: validated.end_time,
            allow_retake: payload.allow_retake,
            show_results: payload.show_results,
            show_correct_answers: payload.show_correct_answers,
            total_marks: validated.total_marks,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update quiz"))?;

    let Some(updated) = updated else {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    };

    tracing::info!(
        teacher_id = %user.id,
        quiz_id = %updated.id,
        total_marks = updated.total_marks,
        action = "quiz_update",
        "Quiz updated"
    );

    let quiz_state = availability(&updated, now);
    Ok(Json(QuizResponse::from_quiz(updated, quiz_state)))
}

pub(super) async fn delete_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let (quiz, paper) = helpers::load_quiz_with_paper(&state, &quiz_id).await?;
    require_paper_staff(&user, &paper)?;

    let deleted = repositories::quizzes::delete_by_id(state.db(), &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete quiz"))?;
    if !deleted {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    }

    tracing::info!(
        teacher_id = %user.id,
        quiz_id = %quiz.id,
        action = "quiz_delete",
        "Quiz deleted with its submissions"
    );

    Ok(StatusCode::NO_CONTENT)
}
