mod auth;
mod catalog;
mod colleges;
mod community;
mod config;
mod db;
mod errors;
mod exams;
mod extract;
mod mentors;
mod models;
mod payments;
mod profile;
mod query;
mod routes;
mod state;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::TokenService;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::db::create_pool;
use crate::profile::PgProfileStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EduPath API v{}", env!("CARGO_PKG_VERSION"));

    let catalog = Arc::new(Catalog::load(config.catalog_dir.as_deref())?);

    // Initialize PostgreSQL and apply migrations
    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    let profiles = Arc::new(PgProfileStore::new(db.clone()));

    let state = AppState {
        db,
        catalog,
        tokens: TokenService::new(&config.jwt_secret, config.jwt_ttl_secs),
        profiles,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
