use crate::config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create the database pool
///
/// The pool connects lazily: an unreachable database shows up as an error on
/// the first query instead of aborting startup.
pub fn create_pool(config: &DatabaseConfig) -> PgPool {
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(config.acquire_timeout())
        .connect_lazy_with(config.connect_options())
}
