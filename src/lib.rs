pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod quota;

use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

pub use config::Settings;
pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;

pub use auth::{AuthService, Identity, PasswordHasher, TokenService};
pub use db::{MemoryUserStore, PgUserStore, Plan, PublicUser, User, UserStore};
pub use llm::LlmClient;
pub use quota::QuotaGate;

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "not found" }))
}

fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}

/// Application state shared across all handlers. Built once at startup;
/// no module-level globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub store: Arc<dyn UserStore>,
    pub auth: Arc<AuthService>,
    pub quota: Arc<QuotaGate>,
    pub llm: Arc<LlmClient>,
}

impl AppState {
    /// Production state: connects the Postgres-backed store.
    pub async fn new(config: Settings) -> Result<Self> {
        let store = PgUserStore::connect(&config.database.url, config.database.max_connections)
            .await?;
        Self::with_store(config, Arc::new(store), PasswordHasher::new())
    }

    /// Assembles the state around any `UserStore`; tests inject the
    /// in-memory store and a cheap hasher here.
    pub fn with_store(
        config: Settings,
        store: Arc<dyn UserStore>,
        hasher: PasswordHasher,
    ) -> Result<Self> {
        let tokens = TokenService::new(
            config.auth.jwt_secret.clone(),
            config.auth.token_expiry_days,
        );
        let auth = Arc::new(AuthService::new(store.clone(), hasher, tokens));
        let quota = Arc::new(QuotaGate::new(store.clone()));
        let llm = Arc::new(LlmClient::new(&config.llm)?);

        Ok(Self {
            config: Arc::new(config),
            store,
            auth,
            quota,
            llm,
        })
    }
}

/// Route table and JSON handling, shared by `main` and the integration
/// tests so both serve the identical surface.
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/health", web::get().to(health_check))
        .route("/api/users", web::post().to(auth::handlers::create_user))
        .route("/api/users", web::get().to(auth::handlers::list_users))
        .route("/api/login", web::post().to(auth::handlers::login))
        .route("/api/generate", web::post().to(llm::handlers::generate))
        .default_service(web::route().to(not_found));
}
