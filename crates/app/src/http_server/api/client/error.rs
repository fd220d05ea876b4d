use reqwest::{Response, StatusCode};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to the content server failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("server rejected the request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    /// Build a rejection from a non-success response, preferring the
    /// `message` of a JSON error body over the raw text.
    pub async fn rejected(response: Response) -> Self {
        let status = response.status();
        let message = match response.text().await {
            Ok(text) => serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text),
            Err(e) => e.to_string(),
        };
        ApiError::Rejected { status, message }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            ApiError::Url(_) => None,
        }
    }
}
