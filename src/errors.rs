use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::data_formats::{NotFoundTemplate, ServerErrorTemplate};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Upload too large")]
    PayloadTooLarge,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Template error: {0}")]
    TemplateError(#[from] askama::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RequestError {
    /// True when the database rejected a write because of a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        if let RequestError::DatabaseError(sqlx::Error::Database(e)) = self {
            return e.message().contains("UNIQUE constraint failed");
        }
        false
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match self {
            RequestError::NotFound => render_error_page(
                StatusCode::NOT_FOUND,
                NotFoundTemplate { current_user: None }.render(),
            ),
            RequestError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            RequestError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "The uploaded file is too large.").into_response()
            }
            error => {
                tracing::error!("{}", error);
                render_error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ServerErrorTemplate { current_user: None }.render(),
                )
            }
        }
    }
}

fn render_error_page(status: StatusCode, page: askama::Result<String>) -> Response {
    match page {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render error page: {}", e);
            (status, status.canonical_reason().unwrap_or("Error")).into_response()
        }
    }
}
