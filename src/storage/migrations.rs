use sqlx::{Executor, SqlitePool};

use crate::domain::error::ApiError;

pub async fn migrate(pool: &SqlitePool) -> Result<(), ApiError> {
    let migration = r#"
    CREATE TABLE IF NOT EXISTS auth_session (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        access_token TEXT NOT NULL,
        refresh_token TEXT NOT NULL,
        token_type TEXT NOT NULL,
        expires_at_ms INTEGER NOT NULL,
        updated_at_ms INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS device_identity (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        device_id TEXT NOT NULL,
        device_name TEXT NOT NULL,
        device_model TEXT NOT NULL,
        created_at_ms INTEGER NOT NULL
    );
    "#;

    pool.execute(migration)
        .await
        .map_err(|error| ApiError::Storage(format!("failed to run migrations: {error}")))?;

    Ok(())
}
