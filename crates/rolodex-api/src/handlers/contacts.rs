//! Contact CRUD, restricted to the owning identity

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rolodex_db::entities::contact;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::pagination;
use crate::authorize::{require_owner, Action};
use crate::error::ApiResult;
use crate::extract::{resource_id, AppJson, AppQuery};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::validation;
use crate::AppState;

const KIND: &str = "Contact";

async fn find_contact(state: &AppState, raw_id: &str) -> ApiResult<Option<contact::Model>> {
    let id = resource_id(raw_id, KIND)?;
    Ok(contact::Entity::find_by_id(id).one(&state.db).await?)
}

/// List the caller's contacts
#[utoipa::path(
    get,
    path = "/api/contacts",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Contacts owned by the caller", body = ContactList),
        (status = 400, description = "Invalid pagination", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> ApiResult<Json<ContactList>> {
    let (page, limit) = validation::page(&query)?;
    debug!(
        "Listing contacts for {} (page {}, limit {})",
        auth_user.id, page, limit
    );

    let paginator = contact::Entity::find()
        .filter(contact::Column::OwnerId.eq(auth_user.id))
        .order_by_desc(contact::Column::CreatedAt)
        .order_by_asc(contact::Column::Id)
        .paginate(&state.db, limit);

    let total = paginator.num_items().await?;
    let contacts = paginator.fetch_page(page - 1).await?;

    Ok(Json(ContactList {
        contacts: contacts.into_iter().map(Contact::from).collect(),
        pagination: pagination(page, limit, total),
    }))
}

/// Create a contact owned by the caller
#[utoipa::path(
    post,
    path = "/api/contacts",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Contact created", body = Contact),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    AppJson(req): AppJson<ContactRequest>,
) -> ApiResult<(StatusCode, Json<Contact>)> {
    let [name, email, phone] = validation::require([
        req.name.as_deref(),
        req.email.as_deref(),
        req.phone.as_deref(),
    ])?;

    let now = Utc::now();
    let created = contact::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(auth_user.id),
        name: Set(validation::name(name)?),
        email: Set(validation::email(email)?),
        phone: Set(validation::phone(phone)?),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    info!("Identity {} created contact {}", auth_user.id, created.id);

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Fetch one of the caller's contacts
#[utoipa::path(
    get,
    path = "/api/contacts/{id}",
    params(("id" = String, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Contact", body = Contact),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Contact belongs to another identity", body = ErrorResponse),
        (status = 404, description = "Contact not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
pub async fn get_contact(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Contact>> {
    let found = find_contact(&state, &id).await?;
    let contact = require_owner(found, &auth_user, Action::Read)?;

    Ok(Json(contact.into()))
}

/// Update one of the caller's contacts
///
/// Only the fields present in the body change; the owner never does.
#[utoipa::path(
    put,
    path = "/api/contacts/{id}",
    params(("id" = String, Path, description = "Contact ID")),
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Updated contact", body = Contact),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Contact belongs to another identity", body = ErrorResponse),
        (status = 404, description = "Contact not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<ContactRequest>,
) -> ApiResult<Json<Contact>> {
    let found = find_contact(&state, &id).await?;
    let contact = require_owner(found, &auth_user, Action::Update)?;

    let mut active: contact::ActiveModel = contact.into();
    if let Some(name) = req.name.as_deref() {
        active.name = Set(validation::name(name)?);
    }
    if let Some(email) = req.email.as_deref() {
        active.email = Set(validation::email(email)?);
    }
    if let Some(phone) = req.phone.as_deref() {
        active.phone = Set(validation::phone(phone)?);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    info!("Identity {} updated contact {}", auth_user.id, updated.id);

    Ok(Json(updated.into()))
}

/// Permanently delete one of the caller's contacts
#[utoipa::path(
    delete,
    path = "/api/contacts/{id}",
    params(("id" = String, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Contact deleted", body = DeleteResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Contact belongs to another identity", body = ErrorResponse),
        (status = 404, description = "Contact not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
pub async fn delete_contact(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let found = find_contact(&state, &id).await?;
    let contact = require_owner(found, &auth_user, Action::Delete)?;

    contact::Entity::delete_by_id(contact.id)
        .exec(&state.db)
        .await?;

    info!("Identity {} deleted contact {}", auth_user.id, contact.id);

    Ok(Json(DeleteResponse {
        message: "Contact deleted successfully".to_string(),
        id: contact.id,
    }))
}
