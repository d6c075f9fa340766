use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use super::dto::Violation;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("unknown device")]
    UnknownDevice,
    #[error("payload failed validation ({} violation(s))", .0.len())]
    Validation(Vec<Violation>),
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl IngestError {
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::UnknownDevice => "UnknownDevice",
            IngestError::Validation(_) => "ValidationError",
            IngestError::Storage(_) => "StorageError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::UnknownDevice => StatusCode::UNAUTHORIZED,
            IngestError::Validation(_) => StatusCode::BAD_REQUEST,
            IngestError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub success: bool,
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "no_violations")]
    pub violations: &'a [Violation],
}

fn no_violations(v: &&[Violation]) -> bool {
    v.is_empty()
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let message = match &self {
            IngestError::Storage(e) => {
                error!(error = %format!("{e:#}"), "ingestion rolled back");
                "nothing was saved; try again later".to_string()
            }
            IngestError::UnknownDevice => "device is not registered; nothing was saved".to_string(),
            other => other.to_string(),
        };
        let violations = match &self {
            IngestError::Validation(v) => v.as_slice(),
            _ => &[],
        };
        let body = ErrorBody {
            success: false,
            error: self.kind(),
            message,
            violations,
        };
        (self.status(), Json(body)).into_response()
    }
}
