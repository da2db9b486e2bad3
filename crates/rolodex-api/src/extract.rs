//! Extractors whose rejections are reported as `ApiError`
//!
//! axum's own `Json` and `Query` reject with plain-text bodies and assorted
//! status codes. These wrappers turn every rejection into a 400 validation
//! error with the usual JSON error body.

use axum::extract::{
    rejection::{JsonRejection, QueryRejection},
    FromRequest, FromRequestParts,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        debug!("Rejected query string: {}", rejection.body_text());
        ApiError::validation(rejection.body_text())
    }
}

/// Parse a resource id from the path
///
/// An id that is not a UUID cannot name any stored resource, so it is
/// reported the same way as an unknown one.
pub fn resource_id(raw: &str, kind: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", kind)))
}
