use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::TokenService;
use crate::catalog::Catalog;
use crate::profile::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Immutable after startup.
    pub catalog: Arc<Catalog>,
    pub tokens: TokenService,
    /// Bookmarks, shortlist and exam scores. Postgres in production.
    pub profiles: Arc<dyn ProfileStore>,
}
