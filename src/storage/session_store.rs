use chrono::DateTime;

use crate::{
    domain::{error::ApiError, models::Session},
    storage::{SqliteStore, now_unix_ms},
};

impl SqliteStore {
    pub async fn load_session(&self) -> Result<Option<Session>, ApiError> {
        let row = sqlx::query_as::<_, (String, String, String, i64)>(
            "SELECT access_token, refresh_token, token_type, expires_at_ms \
             FROM auth_session WHERE id = 1 LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await
        .map_err(|error| ApiError::Storage(format!("failed to load session: {error}")))?;

        row.map(map_session_row).transpose()
    }

    pub async fn save_session(&self, session: &Session) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO auth_session(id, access_token, refresh_token, token_type, expires_at_ms, updated_at_ms) \
             VALUES(1, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
               access_token = excluded.access_token, \
               refresh_token = excluded.refresh_token, \
               token_type = excluded.token_type, \
               expires_at_ms = excluded.expires_at_ms, \
               updated_at_ms = excluded.updated_at_ms",
        )
        .bind(&session.access_token)
        .bind(&session.refresh_token)
        .bind(&session.token_type)
        .bind(session.expires_at.timestamp_millis())
        .bind(i64::try_from(now_unix_ms()).unwrap_or(i64::MAX))
        .execute(self.pool())
        .await
        .map_err(|error| ApiError::Storage(format!("failed to persist session: {error}")))?;

        Ok(())
    }

    pub async fn delete_session(&self) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM auth_session WHERE id = 1")
            .execute(self.pool())
            .await
            .map_err(|error| ApiError::Storage(format!("failed to delete session: {error}")))?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_session_row(row: (String, String, String, i64)) -> Result<Session, ApiError> {
    let (access_token, refresh_token, token_type, expires_at_ms) = row;
    let expires_at = DateTime::from_timestamp_millis(expires_at_ms).ok_or_else(|| {
        ApiError::Storage(format!("invalid session expiry timestamp: {expires_at_ms}"))
    })?;

    Ok(Session {
        access_token,
        refresh_token,
        token_type,
        expires_at,
    })
}
