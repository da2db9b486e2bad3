//! Aggregate views over managed user records

use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use rolodex_db::entities::managed_user;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::extract::AppQuery;
use crate::models::*;
use crate::AppState;

const DEFAULT_RECENT_DAYS: i64 = 7;
const MAX_RECENT_DAYS: i64 = 3650;
const TOP_CITIES: usize = 5;

async fn city_counts(db: &DatabaseConnection) -> Result<Vec<(String, i64)>, DbErr> {
    managed_user::Entity::find()
        .select_only()
        .column(managed_user::Column::City)
        .column_as(managed_user::Column::Id.count(), "user_count")
        .group_by(managed_user::Column::City)
        .into_tuple()
        .all(db)
        .await
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sort by count (largest first, ties by city name) and attach percentages
fn city_stats(counts: Vec<(String, i64)>) -> Vec<CityStat> {
    let total: i64 = counts.iter().map(|(_, n)| n).sum();

    let mut stats: Vec<CityStat> = counts
        .into_iter()
        .map(|(city, n)| CityStat {
            city,
            user_count: n.max(0) as u64,
            percentage: if total > 0 {
                round2(n as f64 * 100.0 / total as f64)
            } else {
                0.0
            },
        })
        .collect();

    stats.sort_by(|a, b| {
        b.user_count
            .cmp(&a.user_count)
            .then_with(|| a.city.cmp(&b.city))
    });
    stats
}

/// Number of records per city
#[utoipa::path(
    get,
    path = "/api/analytics/users-by-city",
    responses(
        (status = 200, description = "Counts per city", body = Vec<CityStat>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "analytics"
)]
pub async fn users_by_city(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<CityStat>>> {
    let counts = city_counts(&state.db).await?;
    Ok(Json(city_stats(counts)))
}

/// Records created within the last `days` days, newest first
#[utoipa::path(
    get,
    path = "/api/analytics/recent-users",
    params(RecentUsersQuery),
    responses(
        (status = 200, description = "Recently created records", body = Vec<RecentUser>),
        (status = 400, description = "Invalid day count", body = ErrorResponse)
    ),
    tag = "analytics"
)]
pub async fn recent_users(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<RecentUsersQuery>,
) -> ApiResult<Json<Vec<RecentUser>>> {
    let days = query.days.unwrap_or(DEFAULT_RECENT_DAYS);
    if !(1..=MAX_RECENT_DAYS).contains(&days) {
        return Err(ApiError::validation(format!(
            "Days must be between 1 and {}",
            MAX_RECENT_DAYS
        )));
    }

    let now = Utc::now();
    let records = managed_user::Entity::find()
        .filter(managed_user::Column::CreatedAt.gte(now - Duration::days(days)))
        .order_by_desc(managed_user::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let recent = records
        .into_iter()
        .map(|record| RecentUser {
            account_age_seconds: (now - record.created_at).num_seconds(),
            id: record.id,
            name: record.name,
            city: record.city,
            created_at: record.created_at,
        })
        .collect();

    Ok(Json(recent))
}

/// Totals, newest and oldest records, and the busiest cities
#[utoipa::path(
    get,
    path = "/api/analytics/dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "analytics"
)]
pub async fn dashboard(State(state): State<Arc<AppState>>) -> ApiResult<Json<DashboardResponse>> {
    let total_users = managed_user::Entity::find().count(&state.db).await?;
    let counts = city_counts(&state.db).await?;

    let newest_user = managed_user::Entity::find()
        .order_by_desc(managed_user::Column::CreatedAt)
        .one(&state.db)
        .await?;
    let oldest_user = managed_user::Entity::find()
        .order_by_asc(managed_user::Column::CreatedAt)
        .one(&state.db)
        .await?;

    let total_cities = counts.len() as u64;
    let top_cities = city_stats(counts).into_iter().take(TOP_CITIES).collect();

    Ok(Json(DashboardResponse {
        overview: DashboardOverview {
            total_users,
            total_cities,
            newest_user: newest_user.map(ManagedUser::from),
            oldest_user: oldest_user.map(ManagedUser::from),
        },
        top_cities,
    }))
}
