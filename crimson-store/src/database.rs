use crimson_core::StoreError;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct DbClient {
    pub pool: SqlitePool,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// A private in-memory database with the schema applied. Each call gets
    /// its own database; the pool is capped at one connection because a
    /// second connection would see a different (empty) `:memory:` store.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let client = Self { pool };
        client.migrate().await?;
        Ok(client)
    }
}

/// Maps driver errors onto the store error vocabulary. Unique and foreign
/// key violations become `Constraint`; everything else is `Unavailable`.
pub(crate) fn map_db_err(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db)
            if db.is_unique_violation()
                || db.is_foreign_key_violation()
                || db.is_check_violation() =>
        {
            StoreError::Constraint(db.message().to_string())
        }
        _ => StoreError::Unavailable(err.to_string()),
    }
}
