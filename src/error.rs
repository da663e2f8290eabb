use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failures a brief request can surface to the caller.
///
/// Reconciliation and model enrichment are deliberately absent: unmatched
/// caller keys are dropped, missing values become the sentinel, and a failed
/// model call degrades to the reconciled data. A fill request therefore
/// fails only when the template itself cannot be used, or when the caller is
/// not authorized.
#[derive(Debug, Error)]
pub enum FillError {
    /// The template source could not be read. Fatal to the request; there
    /// is no retry here.
    #[error("template unavailable: {0}")]
    TemplateUnavailable(#[source] std::io::Error),

    /// The template parsed but contained no label lines ending in ':'.
    /// A configuration problem on the template side, reported, not swallowed.
    #[error("no 'Etiqueta:' lines ending in ':' were detected in the template")]
    NoFieldsDetected,

    /// Bearer token missing or wrong.
    #[error("Unauthorized")]
    Unauthorized,
}

impl FillError {
    fn status(&self) -> StatusCode {
        match self {
            FillError::TemplateUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FillError::NoFieldsDetected => StatusCode::BAD_REQUEST,
            FillError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for FillError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
