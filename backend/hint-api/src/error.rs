use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors surfaced by `POST /generate-hint`.
#[derive(Debug, Error)]
pub enum HintError {
    /// Rejected before the provider is contacted.
    #[error("{0}")]
    InvalidArgument(String),

    /// The provider call failed or returned unusable output.
    #[error("{0}")]
    UpstreamFailure(String),
}

impl HintError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HintError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            HintError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HintError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            HintError::InvalidArgument(message) => {
                tracing::warn!("Rejected hint request: {}", message)
            }
            HintError::UpstreamFailure(message) => {
                tracing::error!("Hint generation failed: {}", message)
            }
        }

        let json_response = serde_json::json!({
            "detail": self.to_string(),
            "status": status.as_u16()
        });
        (status, Json(json_response)).into_response()
    }
}
