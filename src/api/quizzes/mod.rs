mod handlers;
mod helpers;

use axum::{routing::get, Router};

use crate::core::state::AppState;

pub(crate) use helpers::load_quiz_with_paper;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/papers/:paper_id/quizzes",
            get(handlers::list_quizzes).post(handlers::create_quiz),
        )
        .route(
            "/quizzes/:quiz_id",
            get(handlers::get_quiz).put(handlers::update_quiz).delete(handlers::delete_quiz),
        )
}
