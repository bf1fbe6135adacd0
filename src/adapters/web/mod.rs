//! REST API adapter.
//!
//! JSON over axum with session-cookie authentication. Every journal route
//! sits behind a login-required layer; only the login endpoint is open.

mod auth;
mod error;
mod handlers;

pub use auth::{AuthBackend, Credentials, SessionUser};
pub use error::ApiError;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use axum_login::{AuthManagerLayerBuilder, login_required};
use rust_decimal::Decimal;
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::Key;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::domain::error::JournalError;
use crate::ports::config_port::ConfigPort;
use crate::ports::journal_port::JournalPort;

pub struct AppState {
    pub store: Arc<dyn JournalPort + Send + Sync>,
    pub starting_capital: Decimal,
}

fn journal_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/trades",
            get(handlers::list_trades).post(handlers::create_trade),
        )
        .route(
            "/api/trades/{id}",
            get(handlers::get_trade)
                .put(handlers::update_trade)
                .delete(handlers::delete_trade),
        )
        .route(
            "/api/trading-plans",
            get(handlers::list_plans).post(handlers::create_plan),
        )
        .route(
            "/api/trading-plans/{id}",
            get(handlers::get_plan)
                .put(handlers::update_plan)
                .delete(handlers::delete_plan),
        )
        .route("/api/dashboard/stats", get(handlers::dashboard_stats))
        .route("/api/dashboard/breakdown", get(handlers::dashboard_breakdown))
}

pub fn build_router(state: AppState, config: &dyn ConfigPort) -> Result<Router, JournalError> {
    let backend = AuthBackend::from_config(config)?;
    let key = session_key(config)?;
    let lifetime = config.get_int("auth", "session_lifetime", 86_400);

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(lifetime)))
        .with_signed(key);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let router = journal_routes()
        .route("/api/auth/user", get(handlers::current_user))
        .route("/api/auth/logout", post(handlers::logout))
        .route_layer(login_required!(AuthBackend))
        .route("/api/auth/login", post(handlers::login))
        .with_state(Arc::new(state))
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

/// Router without the session machinery, for exercising the journal
/// handlers directly in tests.
pub fn build_test_router(state: AppState) -> Router {
    journal_routes().with_state(Arc::new(state))
}

fn session_key(config: &dyn ConfigPort) -> Result<Key, JournalError> {
    let secret =
        config
            .get_string("auth", "session_secret")
            .ok_or_else(|| JournalError::ConfigMissing {
                section: "auth".into(),
                key: "session_secret".into(),
            })?;
    let bytes = hex::decode(&secret).map_err(|e| JournalError::ConfigInvalid {
        section: "auth".into(),
        key: "session_secret".into(),
        reason: e.to_string(),
    })?;
    Key::try_from(&bytes[..]).map_err(|_| JournalError::ConfigInvalid {
        section: "auth".into(),
        key: "session_secret".into(),
        reason: "must decode to at least 64 bytes".into(),
    })
}
