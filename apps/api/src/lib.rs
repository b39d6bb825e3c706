//! # MBG API
//!
//! REST server for the MBG inventory system.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API Services                                  │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Auth / Users  │  │  Master Data   │  │  Stock                     ││
//! │  │                │  │                │  │                            ││
//! │  │ • register     │  │ • categories   │  │ • list / summary           ││
//! │  │ • login        │  │ • locations    │  │ • adjust / transfer        ││
//! │  │ • refresh, me  │  │ • items        │  │ • movements ledger         ││
//! │  │ • approve      │  │ • suppliers    │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Procurement   │  │  Production    │  │  Distribution / Reporting  ││
//! │  │                │  │                │  │                            ││
//! │  │ • purchase ord │  │ • recipes      │  │ • beneficiaries            ││
//! │  │ • goods receipt│  │ • work orders  │  │ • delivery orders          ││
//! │  │                │  │                │  │ • dashboard, reports       ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │  SQLite      │  │  tower-http  │  │    JWT Auth              ││  │
//! │  │  │  (mbg-db)    │  │              │  │                          ││  │
//! │  │  │ Primary data │  │ CORS         │  │ Access + refresh tokens  ││  │
//! │  │  │ store        │  │ Trace spans  │  │ Role guards              ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (a `.env` file is loaded first when present):
//! - `PORT` - HTTP port (default: 5000)
//! - `DATABASE_URL` - SQLite URL (default: `sqlite://mbg.db`)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `JWT_SECRET` / `JWT_REFRESH_SECRET` - Token signing secrets
//! - `JWT_ACCESS_EXPIRY` / `JWT_REFRESH_EXPIRY` - Lifetimes (default: 15m / 7d)
//! - `CORS_ORIGIN` - Allowed origin(s), comma separated (default: `*`)
//! - `NODE_ENV` - `development` or `production`
//! - `RUST_LOG` - tracing filter

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use mbg_db::Database;
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

// Re-exports
pub use auth::JwtManager;
pub use config::ApiConfig;
pub use error::ApiError;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_refresh_secret.clone(),
            lifetime_secs(config.jwt_access_expiry),
            lifetime_secs(config.jwt_refresh_expiry),
        );
        AppState { db, jwt, config }
    }
}

/// Seconds in a token lifetime; anything past `i64` saturates and is then
/// refused when a token is signed.
fn lifetime_secs(lifetime: std::time::Duration) -> i64 {
    i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX)
}

/// Build the full application router: `/health`, every `/api` route,
/// CORS and request tracing.
pub fn build_router(state: SharedState) -> Router {
    error::expose_error_detail(state.config.environment.is_development());
    let cors = cors_layer(&state.config.cors_origin);

    routes::api_router()
        .route("/health", get(health))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin.trim() == "*" {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origin
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn health(State(state): State<SharedState>) -> (StatusCode, Json<serde_json::Value>) {
    let database = state.db.health_check().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "success": database,
            "data": {
                "status": if database { "ok" } else { "degraded" },
                "database": if database { "up" } else { "down" },
                "environment": state.config.environment.to_string(),
                "version": env!("CARGO_PKG_VERSION"),
            }
        })),
    )
}
