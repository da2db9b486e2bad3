//! Integration tests for rolodex-db
//!
//! Tests database operations with real SQLite in-memory database

use chrono::{Duration, Utc};
use rolodex_db::{
    connect,
    entities::{contact, managed_user, user},
    migrate,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

/// Helper to create a test database
async fn setup_test_db() -> sea_orm::DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

async fn insert_user(db: &sea_orm::DatabaseConnection, email: &str) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Test User".to_string()),
        email: Set(email.to_string()),
        password_hash: Set("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string()),
        city: Set(Some("Lisbon".to_string())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = db.get_database_backend();
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    assert!(migrate(&db).await.is_ok());
    assert!(migrate(&db).await.is_ok());
}

#[tokio::test]
async fn test_create_and_find_user_by_email() {
    let db = setup_test_db().await;
    let created = insert_user(&db, "a@x.com").await;

    let found = user::Entity::find()
        .filter(user::Column::Email.eq("a@x.com"))
        .one(&db)
        .await
        .unwrap()
        .expect("user should exist");

    assert_eq!(found.id, created.id);
    assert_eq!(found.city.as_deref(), Some("Lisbon"));
}

#[tokio::test]
async fn test_user_city_is_optional() {
    let db = setup_test_db().await;
    let now = Utc::now();

    let created = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("No City".to_string()),
        email: Set("nocity@x.com".to_string()),
        password_hash: Set("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string()),
        city: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .expect("users.city must accept NULL");

    let found = user::Entity::find_by_id(created.id)
        .one(&db)
        .await
        .unwrap()
        .expect("user should exist");
    assert!(found.city.is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_unique_violation() {
    let db = setup_test_db().await;
    insert_user(&db, "dup@x.com").await;

    let now = Utc::now();
    let err = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Other".to_string()),
        email: Set("dup@x.com".to_string()),
        password_hash: Set("hash".to_string()),
        city: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .expect_err("second insert must fail");

    assert!(matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));
    assert_eq!(user::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_password_hash_not_serialized() {
    let db = setup_test_db().await;
    let created = insert_user(&db, "hidden@x.com").await;

    let json = serde_json::to_value(&created).unwrap();
    assert!(json.get("password_hash").is_none());
    assert_eq!(json["email"], "hidden@x.com");
}

#[tokio::test]
async fn test_contact_lifecycle() {
    let db = setup_test_db().await;
    let owner = insert_user(&db, "owner@x.com").await;
    let now = Utc::now();

    let contact = contact::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner.id),
        name: Set("Grace".to_string()),
        email: Set("grace@x.com".to_string()),
        phone: Set("5551234567".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .unwrap();

    let owned = owner.find_related(contact::Entity).all(&db).await.unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].id, contact.id);

    let mut active: contact::ActiveModel = contact.clone().into();
    active.phone = Set("5559999999".to_string());
    let updated = active.update(&db).await.unwrap();
    assert_eq!(updated.phone, "5559999999");
    assert_eq!(updated.owner_id, owner.id);

    contact::Entity::delete_by_id(contact.id)
        .exec(&db)
        .await
        .unwrap();
    assert!(contact::Entity::find_by_id(contact.id)
        .one(&db)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_contact_requires_existing_owner() {
    let db = setup_test_db().await;
    let now = Utc::now();

    let result = contact::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(Uuid::new_v4()),
        name: Set("Orphan".to_string()),
        email: Set("orphan@x.com".to_string()),
        phone: Set("5551234567".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_managed_users_filter_by_created_at() {
    let db = setup_test_db().await;
    let owner = insert_user(&db, "dir@x.com").await;
    let now = Utc::now();

    for (name, age_days) in [("Recent", 1), ("Old", 30)] {
        let created = now - Duration::days(age_days);
        managed_user::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner.id),
            name: Set(name.to_string()),
            city: Set("Porto".to_string()),
            created_at: Set(created),
            updated_at: Set(created),
        }
        .insert(&db)
        .await
        .unwrap();
    }

    let recent = managed_user::Entity::find()
        .filter(managed_user::Column::CreatedAt.gte(now - Duration::days(7)))
        .all(&db)
        .await
        .unwrap();

    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].name, "Recent");
}
