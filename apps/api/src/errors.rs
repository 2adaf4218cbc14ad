use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::intake::extractor::ExtractError;
use crate::llm_client::LlmError;
use crate::render::RenderError;

/// Upstream error text behind a 5xx response, carried as a response extension
/// until `expose_error_detail` decides whether the client sees it.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    envelope: Value,
    detail: String,
}

/// Response middleware: copies `ErrorDetail` into the body as `error` when `expose` is set.
pub async fn expose_error_detail(State(expose): State<bool>, mut response: Response) -> Response {
    let Some(ErrorDetail {
        mut envelope,
        detail,
    }) = response.extensions_mut().remove::<ErrorDetail>()
    else {
        return response;
    };
    if !expose {
        return response;
    }
    envelope["error"] = Value::String(detail);
    (response.status(), Json(envelope)).into_response()
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("AI error: {0}")]
    Llm(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        AppError::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::bad_request("MISSING_FIELD", format!("{field} is required"))
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Llm(e.to_string())
    }
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::UnsupportedFileType(mime) => AppError::bad_request(
                "UNSUPPORTED_TYPE",
                format!("Unsupported file type: {mime}"),
            ),
            ExtractError::Ocr(msg) => AppError::Internal(anyhow::anyhow!("OCR failed: {msg}")),
            other => AppError::bad_request("EXTRACTION_FAILED", other.to_string()),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::TemplateNotFound(name) => AppError::bad_request(
                "TEMPLATE_NOT_FOUND",
                format!("Unknown template '{name}'"),
            ),
            other => AppError::Render(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, detail) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Unauthorized".to_string(),
                None,
            ),
            AppError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, *code, message.clone(), None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Too many anonymous analyses, sign in or try again later".to_string(),
                None,
            ),
            AppError::Llm(msg) => {
                tracing::error!("AI error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AI_ERROR",
                    "An AI processing error occurred".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Render(msg) => {
                tracing::error!("Render error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    "Document rendering failed".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    Some(format!("{e:#}")),
                )
            }
        };

        let envelope = json!({
            "success": false,
            "message": message,
            "code": code,
        });

        let mut response = (status, Json(envelope.clone())).into_response();
        if let Some(detail) = detail {
            response
                .extensions_mut()
                .insert(ErrorDetail { envelope, detail });
        }
        response
    }
}
