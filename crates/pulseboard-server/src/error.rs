// HTTP mapping for the error taxonomy
//
// Validation and Query errors are the caller's fault (400); Storage errors
// are ours (500). Every failure is logged where it happens; the body
// carries the message so producers can be debugged from their own logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pulseboard_core::PulseboardError;
use serde::Serialize;

/// Error type returned by all HTTP handlers.
#[derive(Debug)]
pub struct ApiError(PulseboardError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn storage(err: anyhow::Error) -> Self {
        ApiError(PulseboardError::storage(err.to_string()))
    }

    pub fn query(msg: impl Into<String>) -> Self {
        ApiError(PulseboardError::query(msg))
    }
}

impl From<PulseboardError> for ApiError {
    fn from(err: PulseboardError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PulseboardError::Validation(_) | PulseboardError::Query(_) => StatusCode::BAD_REQUEST,
            PulseboardError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = ApiError::from(PulseboardError::validation("x")).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError::query("bad window").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError::storage(anyhow::anyhow!("disk full")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
