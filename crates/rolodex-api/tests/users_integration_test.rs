//! Integration tests for the managed user directory and analytics

mod common;

use axum::{http::StatusCode, Router};
use chrono::{Duration, Utc};
use common::*;
use rolodex_db::entities::managed_user;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_record(app: &Router, token: &str, name: &str, city: &str) -> Value {
    let response = send(
        app,
        "POST",
        "/api/users",
        Some(token),
        Some(json!({ "name": name, "city": city })),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body
}

/// Insert a record directly so its creation time can be set
async fn insert_record_aged(
    db: &DatabaseConnection,
    owner_id: &str,
    name: &str,
    city: &str,
    age: Duration,
) {
    let created = Utc::now() - age;
    managed_user::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(Uuid::parse_str(owner_id).unwrap()),
        name: Set(name.to_string()),
        city: Set(city.to_string()),
        created_at: Set(created),
        updated_at: Set(created),
    }
    .insert(db)
    .await
    .unwrap();
}

fn names(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_listing_is_public() {
    let (app, _db) = create_test_app().await;
    let (_, token) = register_and_login(&app, "Ada", "a@x.com").await;
    create_record(&app, &token, "Linus", "Helsinki").await;

    let response = send(&app, "GET", "/api/users", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(names(&response.body["users"]), ["Linus"]);
    assert_eq!(
        response.body["pagination"],
        json!({ "page": 1, "limit": 10, "total": 1, "total_pages": 1 })
    );
}

#[tokio::test]
async fn test_listing_rejects_page_past_offset_range() {
    let (app, _db) = create_test_app().await;

    for uri in [
        "/api/users?page=9223372036854775807&limit=10",
        "/api/users?page=18446744073709551615",
    ] {
        let response = send(&app, "GET", uri, None, None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(response.body["error"], "Page out of range");
    }
}

#[tokio::test]
async fn test_create_requires_token_and_fields() {
    let (app, _db) = create_test_app().await;

    let response = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({ "name": "Linus", "city": "Helsinki" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let (_, token) = register_and_login(&app, "Ada", "a@x.com").await;
    let response = send(
        &app,
        "POST",
        "/api/users",
        Some(&token),
        Some(json!({ "name": "Linus" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "All fields are mandatory!");
}

#[tokio::test]
async fn test_get_record_public_and_not_found() {
    let (app, _db) = create_test_app().await;
    let (owner_id, token) = register_and_login(&app, "Ada", "a@x.com").await;
    let created = create_record(&app, &token, "  Linus  ", " Helsinki ").await;

    assert_eq!(created["name"], "Linus");
    assert_eq!(created["city"], "Helsinki");
    assert_eq!(created["owner_id"], owner_id.as_str());

    let uri = format!("/api/users/{}", created["id"].as_str().unwrap());
    let response = send(&app, "GET", &uri, None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "Linus");

    let unknown = format!("/api/users/{}", Uuid::new_v4());
    for token in [None, Some(token.as_str())] {
        let response = send(&app, "GET", &unknown, token, None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["error"], "User not found");
    }
}

#[tokio::test]
async fn test_record_ownership() {
    let (app, _db) = create_test_app().await;
    let (_, ada) = register_and_login(&app, "Ada", "a@x.com").await;
    let (_, bob) = register_and_login(&app, "Bob", "b@x.com").await;

    let created = create_record(&app, &ada, "Linus", "Helsinki").await;
    let uri = format!("/api/users/{}", created["id"].as_str().unwrap());

    let response = send(&app, "PUT", &uri, Some(&bob), Some(json!({ "city": "Oslo" }))).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "User not authorized to update this user");

    let response = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = send(&app, "DELETE", &uri, None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = send(&app, "GET", &uri, None, None).await;
    assert_eq!(response.body["city"], "Helsinki");

    let response = send(&app, "PUT", &uri, Some(&ada), Some(json!({ "city": "Oslo" }))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["city"], "Oslo");
    assert_eq!(response.body["name"], "Linus");

    let response = send(&app, "DELETE", &uri, Some(&ada), None).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = send(&app, "GET", &uri, None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search() {
    let (app, _db) = create_test_app().await;
    let (_, token) = register_and_login(&app, "Ada", "a@x.com").await;

    create_record(&app, &token, "Linus Torvalds", "Helsinki").await;
    create_record(&app, &token, "Linda Liukas", "Helsinki").await;
    create_record(&app, &token, "Guido van Rossum", "Amsterdam").await;
    create_record(&app, &token, "100% Real", "Porto").await;

    let response = send(&app, "GET", "/api/users/search?name=LIN", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 2);
    assert_eq!(
        names(&response.body["users"]),
        ["Linda Liukas", "Linus Torvalds"]
    );

    let response = send(&app, "GET", "/api/users/search?city=amster", None, None).await;
    assert_eq!(names(&response.body["users"]), ["Guido van Rossum"]);

    let response = send(
        &app,
        "GET",
        "/api/users/search?name=linus&city=helsinki",
        None,
        None,
    )
    .await;
    assert_eq!(names(&response.body["users"]), ["Linus Torvalds"]);

    create_record(&app, &token, "Marie Curie", "Évry").await;
    let response = send(&app, "GET", "/api/users/search?city=%C3%89VRY", None, None).await;
    assert_eq!(names(&response.body["users"]), ["Marie Curie"]);

    // `%` is matched literally
    let response = send(&app, "GET", "/api/users/search?name=%25", None, None).await;
    assert_eq!(names(&response.body["users"]), ["100% Real"]);

    for query in ["", "?name=", "?city=%20%20"] {
        let response = send(&app, "GET", &format!("/api/users/search{}", query), None, None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", query);
    }
}

#[tokio::test]
async fn test_users_by_city() {
    let (app, _db) = create_test_app().await;
    let (_, token) = register_and_login(&app, "Ada", "a@x.com").await;

    create_record(&app, &token, "Linus", "Helsinki").await;
    create_record(&app, &token, "Linda", "Helsinki").await;
    create_record(&app, &token, "Guido", "Amsterdam").await;
    create_record(&app, &token, "Bjarne", "Aarhus").await;

    let response = send(&app, "GET", "/api/analytics/users-by-city", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!([
            { "city": "Helsinki", "user_count": 2, "percentage": 50.0 },
            { "city": "Aarhus", "user_count": 1, "percentage": 25.0 },
            { "city": "Amsterdam", "user_count": 1, "percentage": 25.0 }
        ])
    );
}

#[tokio::test]
async fn test_recent_users() {
    let (app, db) = create_test_app().await;
    let (owner_id, _) = register_and_login(&app, "Ada", "a@x.com").await;

    insert_record_aged(&db, &owner_id, "Fresh", "Porto", Duration::hours(1)).await;
    insert_record_aged(&db, &owner_id, "Weekish", "Porto", Duration::days(5)).await;
    insert_record_aged(&db, &owner_id, "Stale", "Porto", Duration::days(30)).await;

    let response = send(&app, "GET", "/api/analytics/recent-users", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(names(&response.body), ["Fresh", "Weekish"]);

    let age = response.body[0]["account_age_seconds"].as_i64().unwrap();
    assert!((3590..=3700).contains(&age), "{}", age);

    let response = send(&app, "GET", "/api/analytics/recent-users?days=60", None, None).await;
    assert_eq!(names(&response.body), ["Fresh", "Weekish", "Stale"]);

    for days in ["0", "-1", "3651", "seven"] {
        let uri = format!("/api/analytics/recent-users?days={}", days);
        let response = send(&app, "GET", &uri, None, None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", days);
    }
}

#[tokio::test]
async fn test_dashboard() {
    let (app, db) = create_test_app().await;
    let (owner_id, _) = register_and_login(&app, "Ada", "a@x.com").await;

    let cities = ["A", "B", "B", "C", "C", "C", "D", "E", "F"];
    for (i, city) in cities.iter().enumerate() {
        let age = Duration::days((cities.len() - i) as i64);
        insert_record_aged(&db, &owner_id, &format!("User {}", i), city, age).await;
    }

    let response = send(&app, "GET", "/api/analytics/dashboard", None, None).await;
    assert_eq!(response.status, StatusCode::OK);

    let overview = &response.body["overview"];
    assert_eq!(overview["total_users"], 9);
    assert_eq!(overview["total_cities"], 6);
    assert_eq!(overview["oldest_user"]["name"], "User 0");
    assert_eq!(overview["newest_user"]["name"], "User 8");

    let top: Vec<&str> = response.body["top_cities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["city"].as_str().unwrap())
        .collect();
    assert_eq!(top, ["C", "B", "A", "D", "E"]);
}

#[tokio::test]
async fn test_dashboard_empty() {
    let (app, _db) = create_test_app().await;

    let response = send(&app, "GET", "/api/analytics/dashboard", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["overview"]["total_users"], 0);
    assert!(response.body["overview"]["newest_user"].is_null());
    assert_eq!(response.body["top_cities"], json!([]));
}
