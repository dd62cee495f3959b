use axum::extract::{Path, State};
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::guards::{load_paper, require_paper_staff, CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::schemas::marks::{DepartmentQuizMarks, PaperQuizMarks};
use crate::services::aggregation;

pub(super) async fn paper_quiz_marks(
    Path(paper_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<PaperQuizMarks>, ApiError> {
    let paper = load_paper(&state, &paper_id).await?;
    require_paper_staff(&user, &paper)?;

    let marks = aggregation::paper_quiz_marks(state.db(), &paper.id).await?;

    tracing::info!(
        user_id = %user.id,
        paper_id = %paper.id,
        students = marks.averages.len(),
        skipped = marks.diagnostics.len(),
        action = "quiz_marks_paper",
        "Quiz marks aggregated"
    );

    Ok(Json(marks))
}

/// Admin-only sweep over every paper of a department.
pub(super) async fn department_quiz_marks(
    Path(department): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<DepartmentQuizMarks>, ApiError> {
    let marks = aggregation::department_quiz_marks(state.db(), department.trim()).await?;

    tracing::info!(
        admin_id = %admin.id,
        department = %marks.department,
        papers = marks.papers.len(),
        skipped = marks.diagnostics.len(),
        action = "quiz_marks_department",
        "Department quiz marks aggregated"
    );

    Ok(Json(marks))
}
