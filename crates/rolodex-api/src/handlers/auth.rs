//! Registration, login and current identity

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use rolodex_auth::{hash_password, verify_password, TokenUser};
use rolodex_db::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::extract::AppJson;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::validation;
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Email or password is not valid";

/// Register a new identity
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Identity registered", body = RegisterResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let [name, email, _] = validation::require([
        req.name.as_deref(),
        req.email.as_deref(),
        req.password.as_deref(),
    ])?;

    let name = validation::name(name)?;
    let email = validation::email(email)?;
    let city = validation::present(req.city.as_deref())
        .map(validation::city)
        .transpose()?;

    // Passwords are taken verbatim, never trimmed
    let password = req.password.unwrap_or_default();
    validation::password(&password)?;

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        warn!("Registration rejected: email already registered");
        return Err(ApiError::email_exists());
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let now = Utc::now();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(password_hash),
        city: Set(city),
        created_at: Set(now),
        updated_at: Set(now),
    };

    // A concurrent registration can pass the lookup above; the unique index
    // settles the race.
    let created = new_user.insert(&state.db).await.map_err(|e| {
        if is_unique_violation(&e) {
            warn!("Registration rejected by unique email index");
            ApiError::email_exists()
        } else {
            e.into()
        }
    })?;

    info!("Registered identity {}", created.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: created.into(),
        }),
    ))
}

/// Exchange email and password for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let [email, _] = validation::require([req.email.as_deref(), req.password.as_deref()])?;
    let email = email.trim().to_lowercase();
    let password = req.password.unwrap_or_default();

    let Some(found) = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
    else {
        warn!("Login failed: unknown email");
        return Err(ApiError::unauthenticated(INVALID_CREDENTIALS));
    };

    let stored_hash = found.password_hash.clone();
    let valid =
        tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await??;

    if !valid {
        warn!("Login failed: wrong password for identity {}", found.id);
        return Err(ApiError::unauthenticated(INVALID_CREDENTIALS));
    }

    let issued = state.issuer.issue(TokenUser {
        id: found.id,
        name: found.name.clone(),
        email: found.email.clone(),
    })?;

    info!("Identity {} logged in", found.id);

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: issued.token,
        expires_at: issued.claims.expires_at(),
        user: found.into(),
    }))
}

/// Current identity, re-read from the store
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current identity", body = CurrentUserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Identity no longer exists", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> ApiResult<Json<CurrentUserResponse>> {
    debug!("Loading profile for identity {}", auth_user.id);

    let found = user::Entity::find_by_id(auth_user.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(CurrentUserResponse { user: found.into() }))
}
