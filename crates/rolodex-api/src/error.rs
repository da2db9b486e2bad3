//! Error type shared by every handler and the auth gate
//!
//! `ApiError` is the only failure type a route returns. Its `IntoResponse`
//! impl writes the production-safe body (`error` and `code`), logs internal
//! failures, and leaves an [`ErrorDetail`] in the response extensions.
//! [`render_errors`] picks that up and, outside production, rewrites the body
//! to also carry `title` and `detail`.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use rolodex_auth::{JwtError, PasswordError};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;
use crate::Environment;

/// Convenient result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Message clients see for any internal failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict { message: String, code: &'static str },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn email_exists() -> Self {
        Self::Conflict {
            message: "User already exists with this email".to_string(),
            code: "EMAIL_EXISTS",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthenticated(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict { code, .. } => *code,
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation Failed",
            Self::Unauthenticated(_) => "Unauthorized",
            Self::Forbidden(_) => "Forbidden",
            Self::NotFound(_) => "Not Found",
            Self::Conflict { .. } => "Conflict",
            Self::Internal(_) => "Server Error",
        }
    }

    /// Message safe to show any client
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Internal(err) => format!("{:#}", err),
            other => other.to_string(),
        }
    }
}

/// True when the store rejected a write because of a unique index
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::Internal(anyhow::Error::new(err).context("database error"))
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(anyhow::Error::new(err).context("password hashing failed"))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        Self::Internal(anyhow::Error::new(err).context("token signing failed"))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(anyhow::Error::new(err).context("blocking task failed"))
    }
}

/// Development-only error information carried from the handler to
/// [`render_errors`]
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    error: String,
    code: &'static str,
    title: &'static str,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            error!(error = ?err, "Request failed with internal error");
        }

        let detail = ErrorDetail {
            error: self.public_message(),
            code: self.code(),
            title: self.title(),
            detail: self.detail(),
        };

        let body = ErrorResponse {
            error: detail.error.clone(),
            code: Some(detail.code.to_string()),
            title: None,
            detail: None,
        };

        let mut response = (self.status(), Json(body)).into_response();
        response.extensions_mut().insert(detail);
        response
    }
}

/// Error rendering layer
///
/// In production the minimal body written by `ApiError` is left untouched.
/// Otherwise the body is replaced with one that also names the error
/// category and its full cause chain.
pub async fn render_errors(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(detail) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };

    if environment.is_production() {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);

    let body = ErrorResponse {
        error: detail.error,
        code: Some(detail.code.to_string()),
        title: Some(detail.title.to_string()),
        detail: Some(detail.detail),
    };

    (parts, Json(body)).into_response()
}
