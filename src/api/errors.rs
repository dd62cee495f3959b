use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::errors::QuizError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(String),
    /// Outside the quiz's submission window.
    WindowClosed(String),
    BadRequest(String),
    NotFound(String),
    /// The student already holds a non-retake submission.
    AlreadySubmitted(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::Validation(message) => Self::BadRequest(message),
            QuizError::Authorization(message) => Self::Forbidden(message),
            QuizError::NotFound(message) => Self::NotFound(message),
            QuizError::Window(message) => Self::WindowClosed(message),
            QuizError::Conflict(message) => Self::AlreadySubmitted(message),
            // Already logged where it was raised.
            QuizError::Internal(message) => Self::Internal(message),
        }
    }
}

fn error_response(status: StatusCode, detail: String, code: Option<&'static str>) -> Response {
    (status, Json(ErrorResponse { status: status.as_u16(), detail, code })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let mut response =
                    error_response(StatusCode::UNAUTHORIZED, message.to_string(), None);
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => error_response(StatusCode::FORBIDDEN, message, None),
            ApiError::WindowClosed(message) => {
                error_response(StatusCode::FORBIDDEN, message, Some("window_closed"))
            }
            ApiError::BadRequest(message) => error_response(StatusCode::BAD_REQUEST, message, None),
            ApiError::NotFound(message) => error_response(StatusCode::NOT_FOUND, message, None),
            ApiError::AlreadySubmitted(message) => {
                error_response(StatusCode::CONFLICT, message, Some("already_submitted"))
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        }
    }
}
