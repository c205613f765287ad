// ABOUTME: Request failure taxonomy and its mapping onto HTTP status codes and JSON bodies.
// ABOUTME: Client errors never reach the store; store failures are 503 and timeouts are 504.

use std::time::Duration;

use axum::Json;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hookstream_core::StoreError;
use thiserror::Error;

/// Why a request did not produce an acknowledged append.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The request itself was unacceptable. The store was not contacted.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// The store was unreachable or refused the command.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// The store did not answer within the configured bound.
    #[error("store did not answer within {0:?}")]
    Timeout(Duration),
}

impl From<BytesRejection> for IngestError {
    fn from(rejection: BytesRejection) -> Self {
        IngestError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IngestError {
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        IngestError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::Rejected { status, .. } => *status,
            IngestError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            IngestError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = self.status();
        let label = match &self {
            IngestError::Rejected { .. } => {
                tracing::warn!(status = %status, error = %self, "rejected request");
                "rejected"
            }
            IngestError::Store(_) | IngestError::Timeout(_) => {
                tracing::error!(status = %status, error = %self, "store call failed");
                "failed"
            }
        };

        (
            status,
            Json(serde_json::json!({ "status": label, "error": self.to_string() })),
        )
            .into_response()
    }
}
