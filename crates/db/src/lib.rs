//! Store adapters for the notification center.
//!
//! [`store`] defines the read/write contract; [`memory::InMemoryStore`] and
//! [`pg::PgStore`] implement it.

pub mod memory;
pub mod models;
pub mod pg;
pub mod repositories;
pub mod store;

pub use store::{NotificationFilter, NotificationStore, SettingsStore, StoreError};

pub type DbPool = sqlx::PgPool;

/// Open a connection pool.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
