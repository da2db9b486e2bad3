//! Managed user records
//!
//! Listing, search and lookup are public. Creating a record needs a token,
//! and changing or deleting one is limited to the identity that created it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rolodex_db::entities::managed_user;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::pagination;
use crate::authorize::{require_owner, Action};
use crate::error::{ApiError, ApiResult};
use crate::extract::{resource_id, AppJson, AppQuery};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::validation;
use crate::AppState;

const KIND: &str = "User";

// Needs no quoting in any backend's string literal syntax
const LIKE_ESCAPE: char = '!';

async fn find_record(state: &AppState, raw_id: &str) -> ApiResult<Option<managed_user::Model>> {
    let id = resource_id(raw_id, KIND)?;
    Ok(managed_user::Entity::find_by_id(id).one(&state.db).await?)
}

/// `%term%` with LIKE wildcards in the term escaped
///
/// Only ASCII letters are folded, matching SQLite's `LOWER()`; non-ASCII
/// letters compare case-sensitively on every backend.
fn contains_pattern(term: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_ascii_lowercase().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped.push('%');

    LikeExpr::new(escaped).escape(LIKE_ESCAPE)
}

fn contains_ci(column: managed_user::Column, term: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(contains_pattern(term))
}

/// List managed user records
#[utoipa::path(
    get,
    path = "/api/users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of records", body = ManagedUserList),
        (status = 400, description = "Invalid pagination", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> ApiResult<Json<ManagedUserList>> {
    let (page, limit) = validation::page(&query)?;

    let paginator = managed_user::Entity::find()
        .order_by_desc(managed_user::Column::CreatedAt)
        .order_by_asc(managed_user::Column::Id)
        .paginate(&state.db, limit);

    let total = paginator.num_items().await?;
    let users = paginator.fetch_page(page - 1).await?;

    Ok(Json(ManagedUserList {
        users: users.into_iter().map(ManagedUser::from).collect(),
        pagination: pagination(page, limit, total),
    }))
}

/// Search records by name and/or city
///
/// Both filters are case-insensitive substring matches; when both are given
/// a record must match both.
#[utoipa::path(
    get,
    path = "/api/users/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching records", body = SearchResponse),
        (status = 400, description = "No search term given", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let name = validation::present(query.name.as_deref());
    let city = validation::present(query.city.as_deref());

    if name.is_none() && city.is_none() {
        return Err(ApiError::validation(
            "Please provide a name or city to search",
        ));
    }

    let mut condition = Condition::all();
    if let Some(name) = name {
        condition = condition.add(contains_ci(managed_user::Column::Name, name));
    }
    if let Some(city) = city {
        condition = condition.add(contains_ci(managed_user::Column::City, city));
    }

    let users = managed_user::Entity::find()
        .filter(condition)
        .order_by_asc(managed_user::Column::Name)
        .all(&state.db)
        .await?;

    debug!("Search matched {} records", users.len());

    Ok(Json(SearchResponse {
        count: users.len(),
        users: users.into_iter().map(ManagedUser::from).collect(),
    }))
}

/// Fetch one record
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Record ID")),
    responses(
        (status = 200, description = "Record", body = ManagedUser),
        (status = 404, description = "Record not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ManagedUser>> {
    let record = find_record(&state, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} not found", KIND)))?;

    Ok(Json(record.into()))
}

/// Create a record owned by the caller
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = ManagedUserRequest,
    responses(
        (status = 201, description = "Record created", body = ManagedUser),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    AppJson(req): AppJson<ManagedUserRequest>,
) -> ApiResult<(StatusCode, Json<ManagedUser>)> {
    let [name, city] = validation::require([req.name.as_deref(), req.city.as_deref()])?;

    let now = Utc::now();
    let created = managed_user::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(auth_user.id),
        name: Set(validation::name(name)?),
        city: Set(validation::city(city)?),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    info!("Identity {} created record {}", auth_user.id, created.id);

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Update a record owned by the caller
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Record ID")),
    request_body = ManagedUserRequest,
    responses(
        (status = 200, description = "Updated record", body = ManagedUser),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Record belongs to another identity", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<ManagedUserRequest>,
) -> ApiResult<Json<ManagedUser>> {
    let found = find_record(&state, &id).await?;
    let record = require_owner(found, &auth_user, Action::Update)?;

    let mut active: managed_user::ActiveModel = record.into();
    if let Some(name) = req.name.as_deref() {
        active.name = Set(validation::name(name)?);
    }
    if let Some(city) = req.city.as_deref() {
        active.city = Set(validation::city(city)?);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    info!("Identity {} updated record {}", auth_user.id, updated.id);

    Ok(Json(updated.into()))
}

/// Permanently delete a record owned by the caller
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Record ID")),
    responses(
        (status = 200, description = "Record deleted", body = DeleteResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Record belongs to another identity", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let found = find_record(&state, &id).await?;
    let record = require_owner(found, &auth_user, Action::Delete)?;

    managed_user::Entity::delete_by_id(record.id)
        .exec(&state.db)
        .await?;

    info!("Identity {} deleted record {}", auth_user.id, record.id);

    Ok(Json(DeleteResponse {
        message: "User deleted successfully".to_string(),
        id: record.id,
    }))
}
