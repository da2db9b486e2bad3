//! API request and response models

use chrono::{DateTime, Utc};
use rolodex_db::entities::{contact, managed_user, user};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short error category (development only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Full error detail (development only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Body returned for unknown routes
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RouteNotFoundResponse {
    pub error: String,
    pub path: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// Time of the check
    pub timestamp: DateTime<Utc>,
    /// Seconds since the server started
    pub uptime_seconds: u64,
    /// "connected" or "disconnected"
    pub database: String,
    /// Service version
    pub version: String,
}

// ============================================================================
// Authentication
// ============================================================================

/// Registration request
///
/// Fields are optional at the wire level so a missing field produces the
/// same validation message as an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Optional home city
    pub city: Option<String>,
}

/// Public view of an identity. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserProfile {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            city: model.city,
            created_at: model.created_at,
        }
    }
}

/// Registration response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserProfile,
}

/// Login request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    /// Bearer token for the Authorization header
    pub token: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

/// Current identity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserResponse {
    pub user: UserProfile,
}

// ============================================================================
// Pagination
// ============================================================================

/// Page selection, `page` from 1 and `limit` between 1 and 100
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Page number (default: 1)
    pub page: Option<u64>,
    /// Page size (default: 10, max: 100)
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

// ============================================================================
// Contacts
// ============================================================================

/// Contact create/update body
///
/// Create requires every field; update applies only the fields present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Exactly ten digits
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Contact {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<contact::Model> for Contact {
    fn from(model: contact::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactList {
    pub contacts: Vec<Contact>,
    pub pagination: Pagination,
}

/// Confirmation for a permanent delete
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
    pub id: Uuid,
}

// ============================================================================
// Managed user records
// ============================================================================

/// Managed user create/update body
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ManagedUserRequest {
    pub name: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManagedUser {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<managed_user::Model> for ManagedUser {
    fn from(model: managed_user::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            city: model.city,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManagedUserList {
    pub users: Vec<ManagedUser>,
    pub pagination: Pagination,
}

/// Search filters; at least one must be present
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    /// Case-insensitive substring of the city
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub count: usize,
    pub users: Vec<ManagedUser>,
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CityStat {
    pub city: String,
    pub user_count: u64,
    /// Share of all records, rounded to two decimals
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentUsersQuery {
    /// Look-back window in days (default: 7, max: 3650)
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecentUser {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub account_age_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardOverview {
    pub total_users: u64,
    pub total_cities: u64,
    pub newest_user: Option<ManagedUser>,
    pub oldest_user: Option<ManagedUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub overview: DashboardOverview,
    pub top_cities: Vec<CityStat>,
}
