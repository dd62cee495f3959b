use async_trait::async_trait;
use thiserror::Error;

use super::types::{QuizPaper, SubmitRequest, SubmitResult};

/// Server-side refusals a session knows how to present, plus transport
/// failures that leave the attempt retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("{0}")]
    WindowClosed(String),
    #[error("{0}")]
    AlreadySubmitted(String),
    #[error("request rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },
    #[error("transport failure: {0}")]
    Transport(String),
}

impl GatewayError {
    /// Refusals shown to the student as a plain notice rather than a failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::WindowClosed(_) | Self::AlreadySubmitted(_))
    }
}

/// The two server calls a take-quiz session needs.
#[async_trait]
pub trait QuizGateway: Send + Sync {
    async fn preflight(&self, quiz_id: &str) -> Result<QuizPaper, GatewayError>;

    async fn submit(
        &self,
        quiz_id: &str,
        request: &SubmitRequest,
    ) -> Result<SubmitResult, GatewayError>;
}

#[async_trait]
impl<G: QuizGateway + ?Sized> QuizGateway for std::sync::Arc<G> {
    async fn preflight(&self, quiz_id: &str) -> Result<QuizPaper, GatewayError> {
        (**self).preflight(quiz_id).await
    }

    async fn submit(
        &self,
        quiz_id: &str,
        request: &SubmitRequest,
    ) -> Result<SubmitResult, GatewayError> {
        (**self).submit(quiz_id, request).await
    }
}
