//! # taskgate_api
//!
//! HTTP API library for Taskgate.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, patch, post};
use sqlx::PgPool;
use taskgate_core::auth::AuthError;
use taskgate_core::auth::jwt::TokenIssuer;
use taskgate_core::auth::password::PasswordHasher;
use taskgate_core::notify::Mailer;
use taskgate_core::store::Store;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ApiConfig;
use crate::handlers::{auth, ping, tasks};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// User, reset-token and task persistence.
    pub store: Arc<dyn Store>,
    /// Outgoing mail (password reset links).
    pub mailer: Arc<dyn Mailer>,
    pub tokens: TokenIssuer,
    pub hasher: PasswordHasher,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Assemble state from configuration and the two external seams.
    ///
    /// Fails if the token secrets are empty or identical.
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, AuthError> {
        let tokens = TokenIssuer::new(
            config.access_token_secret.as_bytes(),
            config.refresh_token_secret.as_bytes(),
            chrono::Duration::seconds(config.access_token_ttl_secs),
            chrono::Duration::seconds(config.refresh_token_ttl_secs),
        )?;
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        Ok(Self {
            store,
            mailer,
            tokens,
            hasher,
            config,
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `taskgate_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    taskgate_core::migrate::migrate(pool).await
}

/// CORS for the single front-end origin, with credentials so the refresh
/// cookie is sent.
fn cors_layer(app_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(app_url.trim_end_matches('/')) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            warn!(app_url, error = %e, "APP_URL is not a valid origin; cross-origin requests disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_PING, get(ping::ping))
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_AUTH_GOOGLE, post(auth::google_login_handler))
        .route(routes::POST_AUTH_REFRESH, post(auth::refresh_handler))
        .route(routes::POST_AUTH_LOGOUT, post(auth::logout_handler))
        .route(
            routes::POST_AUTH_FORGOT_PASSWORD,
            post(auth::forgot_password_handler),
        )
        .route(
            routes::POST_AUTH_SET_NEW_PASSWORD,
            post(auth::reset_password_handler),
        );

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .route(
            routes::TASKS,
            get(tasks::list_tasks_handler).post(tasks::create_task_handler),
        )
        .route(
            routes::TASKS_ID,
            patch(tasks::update_task_handler).delete(tasks::delete_task_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors_layer(&state.config.app_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
