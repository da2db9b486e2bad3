//! Persistence layer for rolodex
//!
//! Holds the SeaORM entities for identities, contacts and managed user
//! records, plus the migrator that creates their tables. Works against
//! SQLite (`sqlite://...`, `sqlite::memory:`) and PostgreSQL
//! (`postgres://...`).

pub mod entities;
pub mod migrator;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

pub use sea_orm;

/// Open a connection pool for the given database URL
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    debug!("Connecting to database");

    let mut options = ConnectOptions::new(database_url.to_string());
    options.sqlx_logging(false);
    // Each pooled connection would otherwise open its own empty database
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    let db = Database::connect(options).await?;
    info!("Database connected ({:?})", db.get_database_backend());

    Ok(db)
}

/// Apply all pending migrations
pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    migrator::Migrator::up(db, None).await?;
    info!("Database migrations applied");
    Ok(())
}
