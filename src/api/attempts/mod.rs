mod handlers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/quizzes/:quiz_id/attempt", get(handlers::start_attempt))
        .route("/quizzes/:quiz_id/submit", post(handlers::submit_quiz))
        .route("/quizzes/:quiz_id/submissions", get(handlers::list_submissions))
        .route(
            "/quizzes/:quiz_id/submissions/:student_id/review",
            get(handlers::review_submission),
        )
}
