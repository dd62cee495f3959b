use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::gateway::{GatewayError, QuizGateway};
use super::types::{QuizPaper, SubmitRequest, SubmitResult};

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: String,
    #[serde(default)]
    code: Option<String>,
}

/// [`QuizGateway`] over the JSON API. `base_url` includes the API prefix,
/// for example `http://localhost:8000/api/v1`.
#[derive(Debug, Clone)]
pub struct HttpQuizGateway {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpQuizGateway {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| GatewayError::Transport(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn endpoint(&self, quiz_id: &str, action: &str) -> String {
        format!("{}/quizzes/{quiz_id}/{action}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        if response.status().is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|err| GatewayError::Transport(format!("unreadable response: {err}")));
        }

        Err(refusal(response).await)
    }
}

async fn refusal(response: Response) -> GatewayError {
    let status = response.status();
    let body = response.json::<ErrorBody>().await.unwrap_or_default();

    match (status, body.code.as_deref()) {
        (_, Some("window_closed")) => GatewayError::WindowClosed(body.detail),
        (StatusCode::CONFLICT, _) => GatewayError::AlreadySubmitted(body.detail),
        _ => GatewayError::Rejected { status: status.as_u16(), detail: body.detail },
    }
}

#[async_trait]
impl QuizGateway for HttpQuizGateway {
    async fn preflight(&self, quiz_id: &str) -> Result<QuizPaper, GatewayError> {
        self.send(self.client.get(self.endpoint(quiz_id, "attempt"))).await
    }

    async fn submit(
        &self,
        quiz_id: &str,
        request: &SubmitRequest,
    ) -> Result<SubmitResult, GatewayError> {
        self.send(self.client.post(self.endpoint(quiz_id, "submit")).json(request)).await
    }
}
