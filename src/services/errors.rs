use thiserror::Error;

/// Failure taxonomy of the quiz engine. Every variant except `Internal`
/// carries a reason that is safe to show to the caller.
#[derive(Debug, Error)]
pub(crate) enum QuizError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Window(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl QuizError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Short label used for metrics and structured logs.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Authorization(_) => "authorization",
            Self::NotFound(_) => "not_found",
            Self::Window(_) => "window",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }
}
