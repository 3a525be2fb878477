mod config;
mod db;
mod entities;
mod error;
mod importer;
mod models;
mod routes;
mod store;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::Config, store::MovieStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: MovieStore,
}

pub fn app(state: Arc<AppState>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/api/upload", post(routes::upload).layer(upload_limit))
        .route("/api/movies", get(routes::list_movies))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,movie_ingest=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let state = Arc::new(AppState { config: config.clone(), store: MovieStore::new(db) });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(
        addr = %config.addr,
        upload_dir = %config.upload_dir.display(),
        "listening"
    );
    axum::serve(listener, app(state)).await?;

    Ok(())
}
