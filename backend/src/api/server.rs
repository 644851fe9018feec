use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::token::TokenKeys;
use crate::api::{auth, tasks};
use crate::auth::AuthGate;
use crate::config::Config;
use crate::db;
use crate::store::SqliteStore;

#[derive(Clone)]
pub struct AppState {
    pub store: SqliteStore,
    pub auth: AuthGate<SqliteStore>,
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(store: SqliteStore, tokens: TokenKeys) -> Self {
        Self {
            auth: AuthGate::new(store.clone()),
            store,
            tokens,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/tasks", get(tasks::list))
        .route("/api/tasks/{id}/toggle", post(tasks::toggle))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(&config.database_url, config.db_max_connections)
        .await
        .with_context(|| format!("failed to connect to {}", config.database_url))?;

    if config.reset_database {
        db::schema::reset(&pool)
            .await
            .context("failed to reset database")?;
    } else {
        db::schema::provision(&pool)
            .await
            .context("failed to provision schema")?;
    }

    let state = Arc::new(AppState::new(
        SqliteStore::new(pool),
        TokenKeys::new(&config.jwt_secret),
    ));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    tracing::info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, router(state))
        .await
        .context("server failed")
}
