//! Rolodex server
//!
//! Serves the contacts and user directory API over HTTP, backed by SQLite
//! or PostgreSQL.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rolodex_api::{ApiServer, ApiServerConfig, Environment};

/// Contacts and user directory API with JWT authentication
#[derive(Parser, Debug)]
#[command(name = "rolodex")]
#[command(about = "Run the rolodex API server", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Database URL (sqlite://path?mode=rwc, sqlite::memory:, postgres://...)
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite://rolodex.db?mode=rwc",
        global = true
    )]
    database_url: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(flatten)]
    server_args: ServerArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run migrations and serve the API (the default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
}

#[derive(Args, Debug)]
struct ServerArgs {
    /// HTTP server bind address
    #[arg(long, env = "ROLODEX_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Secret used to sign and verify access tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Token lifetime: <n>s, <n>m, <n>h, <n>d or bare seconds
    #[arg(long, env = "JWT_EXPIRE", default_value = "7d", value_parser = parse_expire)]
    jwt_expire: chrono::Duration,

    /// Deployment mode (development or production)
    #[arg(long, env = "APP_ENV", default_value = "development")]
    environment: Environment,

    /// Allowed CORS origin (repeatable)
    #[arg(long = "cors-origin", env = "CLIENT_URL", value_delimiter = ',')]
    cors_origins: Vec<String>,
}

fn parse_expire(value: &str) -> Result<chrono::Duration, String> {
    rolodex_auth::parse_ttl(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Migrate => {
            let db = rolodex_db::connect(&cli.database_url)
                .await
                .context("Failed to connect to database")?;
            rolodex_db::migrate(&db)
                .await
                .context("Failed to run migrations")?;
            info!("Migrations complete");
            Ok(())
        }
        Commands::Serve => serve(cli.database_url, cli.server_args).await,
    }
}

async fn serve(database_url: String, args: ServerArgs) -> Result<()> {
    let jwt_secret = args
        .jwt_secret
        .filter(|secret| !secret.is_empty())
        .context("JWT_SECRET (or --jwt-secret) is required to serve")?;

    info!("Starting rolodex ({})", args.environment);

    let db = rolodex_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    rolodex_db::migrate(&db)
        .await
        .context("Failed to run migrations")?;

    let config = ApiServerConfig {
        bind_addr: args.bind,
        environment: args.environment,
        cors_origins: args.cors_origins,
        jwt_secret,
        jwt_ttl: args.jwt_expire,
    };

    ApiServer::new(config, db)?.start().await
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
