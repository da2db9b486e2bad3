pub mod authorize;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use chrono::Duration;
use rolodex_auth::TokenIssuer;
use sea_orm::DatabaseConnection;
use std::{fmt, net::SocketAddr, str::FromStr, sync::Arc, time::Instant};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

/// Deployment mode; decides how much error detail clients see
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "unknown environment '{}' (expected development or production)",
                other
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub issuer: TokenIssuer,
    pub environment: Environment,
    pub started_at: Instant,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rolodex API",
        version = "0.1.0",
        description = "Contacts and user directory with JWT authentication",
        contact(
            name = "Rolodex Team",
            email = "team@rolodex.dev"
        )
    ),
    paths(
        handlers::system::health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::current_user,
        handlers::contacts::list_contacts,
        handlers::contacts::create_contact,
        handlers::contacts::get_contact,
        handlers::contacts::update_contact,
        handlers::contacts::delete_contact,
        handlers::users::list_users,
        handlers::users::search_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::analytics::users_by_city,
        handlers::analytics::recent_users,
        handlers::analytics::dashboard,
    ),
    components(
        schemas(
            models::ErrorResponse,
            models::RouteNotFoundResponse,
            models::HealthResponse,
            models::RegisterRequest,
            models::RegisterResponse,
            models::UserProfile,
            models::LoginRequest,
            models::LoginResponse,
            models::CurrentUserResponse,
            models::Pagination,
            models::ContactRequest,
            models::Contact,
            models::ContactList,
            models::DeleteResponse,
            models::ManagedUserRequest,
            models::ManagedUser,
            models::ManagedUserList,
            models::SearchResponse,
            models::CityStat,
            models::RecentUser,
            models::DashboardOverview,
            models::DashboardResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and current identity"),
        (name = "contacts", description = "Contacts owned by the caller"),
        (name = "users", description = "Managed user directory"),
        (name = "analytics", description = "Aggregates over the user directory"),
        (name = "system", description = "System health and info endpoints")
    )
)]
pub struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Deployment mode
    pub environment: Environment,
    /// Allowed CORS origins; empty allows localhost in development and
    /// nothing in production
    pub cors_origins: Vec<String>,
    /// HS256 secret for signing and verifying tokens
    pub jwt_secret: String,
    /// Lifetime of issued tokens
    pub jwt_ttl: Duration,
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
    jwt_state: Arc<middleware::JwtState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, db: DatabaseConnection) -> Result<Self, anyhow::Error> {
        if config.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }

        let issuer = TokenIssuer::new(config.jwt_secret.as_bytes(), config.jwt_ttl)?;
        let jwt_state = Arc::new(middleware::JwtState::new(config.jwt_secret.as_bytes()));

        let state = Arc::new(AppState {
            db,
            issuer,
            environment: config.environment,
            started_at: Instant::now(),
        });

        Ok(Self {
            config,
            state,
            jwt_state,
        })
    }

    fn cors_layer(&self) -> Option<CorsLayer> {
        let allow_origin = if !self.config.cors_origins.is_empty() {
            let origins: Vec<HeaderValue> = self
                .config
                .cors_origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin '{}'", origin);
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        } else if !self.config.environment.is_production() {
            AllowOrigin::predicate(|origin: &HeaderValue, _| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str.starts_with("http://localhost:")
                    || origin_str.starts_with("http://127.0.0.1:")
            })
        } else {
            return None;
        };

        Some(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true)
                .allow_origin(allow_origin),
        )
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        // Build PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/api/openapi.json", get(handlers::openapi_json))
            .route("/api/auth/register", post(handlers::register))
            .route("/api/auth/login", post(handlers::login))
            .route("/api/users", get(handlers::list_users))
            .route("/api/users/search", get(handlers::search_users))
            .route("/api/users/{id}", get(handlers::get_user))
            .route("/api/analytics/users-by-city", get(handlers::users_by_city))
            .route("/api/analytics/recent-users", get(handlers::recent_users))
            .route("/api/analytics/dashboard", get(handlers::dashboard))
            .with_state(self.state.clone());

        // Build PROTECTED routes (require a bearer token)
        let protected_router = Router::new()
            .route("/api/auth/me", get(handlers::current_user))
            .route(
                "/api/contacts",
                get(handlers::list_contacts).post(handlers::create_contact),
            )
            .route(
                "/api/contacts/{id}",
                get(handlers::get_contact)
                    .put(handlers::update_contact)
                    .delete(handlers::delete_contact),
            )
            .route("/api/users", post(handlers::create_user))
            .route(
                "/api/users/{id}",
                put(handlers::update_user).delete(handlers::delete_user),
            )
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                self.jwt_state.clone(),
                middleware::require_auth,
            ));

        // Public and protected methods on the same path merge into one route
        let mut router = public_router
            .merge(protected_router)
            .fallback(handlers::route_not_found)
            .layer(axum_middleware::from_fn_with_state(
                self.config.environment,
                error::render_errors,
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ))
            .layer(TraceLayer::new_for_http());

        if let Some(cors) = self.cors_layer() {
            router = router.layer(cors);
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!(
            "Starting API server on {} ({})",
            self.config.bind_addr, self.config.environment
        );
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
