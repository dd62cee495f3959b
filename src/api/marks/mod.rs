mod handlers;

use axum::{routing::get, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/papers/:paper_id/quiz-marks", get(handlers::paper_quiz_marks))
        .route("/departments/:department/quiz-marks", get(handlers::department_quiz_marks))
}

#[cfg(test)]
mod tests;
