//! API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to fetch reports: {0}")]
    ReportsFailed(BackendError),
    #[error("PocketBase instance not available")]
    BackendUnavailable,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Failed to calculate work hours: {0}")]
    WorkHoursFailed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::ReportsFailed(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Failed to fetch reports",
                    "details": e.to_string(),
                    "reports": [],
                }),
            ),
            ApiError::BackendUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "PocketBase instance not available",
                    "reports": [],
                }),
            ),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Authentication required" }),
            ),
            ApiError::WorkHoursFailed(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Failed to calculate work hours",
                    "details": details,
                    "method": "failed",
                }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_reports_failure_body() {
        let (status, body) =
            body_of(ApiError::ReportsFailed(BackendError::Request("timeout".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch reports");
        assert!(body["details"].as_str().unwrap().contains("timeout"));
        assert_eq!(body["reports"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn test_unauthenticated_body() {
        let (status, body) = body_of(ApiError::Unauthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Authentication required"}));
    }

    #[tokio::test]
    async fn test_work_hours_failure_body() {
        let (_, body) = body_of(ApiError::WorkHoursFailed("boom".into())).await;
        assert_eq!(body["method"], "failed");
        assert_eq!(body["details"], "boom");
    }
}
