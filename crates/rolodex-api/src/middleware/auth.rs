//! JWT Authentication Middleware
//!
//! Provides authentication middleware for protected API endpoints.
//! Extracts the bearer token from the Authorization header, validates it, and
//! makes the identity available to handlers through request extensions.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use rolodex_auth::{JwtValidator, TokenUser};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;

/// Message returned for every rejected credential
pub const UNAUTHORIZED_MESSAGE: &str = "User is not authorized";

/// Authenticated identity taken from a verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Identity ID
    pub id: Uuid,
    /// Name at the time the token was issued
    pub name: String,
    /// Email at the time the token was issued
    pub email: String,
}

impl From<TokenUser> for AuthUser {
    fn from(user: TokenUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Handlers behind [`require_auth`] take `AuthUser` as an argument. Reaching
/// such a handler without the gate is an authentication failure, not a panic.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthenticated(UNAUTHORIZED_MESSAGE))
    }
}

/// JWT validation state shared across middleware instances
#[derive(Clone)]
pub struct JwtState {
    pub validator: Arc<JwtValidator>,
}

impl JwtState {
    /// Create new JWT state with the given secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            validator: Arc::new(JwtValidator::new(secret)),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or("missing Authorization header")?
        .to_str()
        .map_err(|_| "Authorization header is not valid UTF-8")?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or("Authorization header has no scheme")?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("unsupported authorization scheme");
    }

    let token = token.trim();
    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(token)
}

/// Authentication middleware that validates bearer tokens
///
/// Expects `Authorization: Bearer <token>`; the scheme is matched
/// case-insensitively. On success an [`AuthUser`] is inserted into the
/// request extensions. No store lookup is made.
///
/// # Errors
/// Returns 401 with the same body whether the header is missing, uses another
/// scheme, carries an empty token, or the token fails signature, shape or
/// expiry checks. The specific reason is only logged at debug level.
pub async fn require_auth(
    State(state): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = {
        let token = bearer_token(request.headers()).map_err(|reason| {
            debug!("Rejected request to {}: {}", request.uri().path(), reason);
            ApiError::unauthenticated(UNAUTHORIZED_MESSAGE)
        })?;

        state.validator.validate(token).map_err(|e| {
            debug!("Rejected token for {}: {}", request.uri().path(), e);
            ApiError::unauthenticated(UNAUTHORIZED_MESSAGE)
        })?
    };

    let auth_user = AuthUser::from(claims.user);
    debug!("Authenticated identity {}", auth_user.id);

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
