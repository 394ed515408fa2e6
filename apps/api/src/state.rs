use sqlx::PgPool;

use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Full runtime configuration; handlers currently only need the pool.
    #[allow(dead_code)]
    pub config: Config,
}
