use uuid::Uuid;

use crate::{
    domain::{error::ApiError, models::DeviceIdentity},
    storage::{SqliteStore, now_unix_ms},
};

impl SqliteStore {
    pub async fn load_identity(&self) -> Result<Option<DeviceIdentity>, ApiError> {
        let row = sqlx::query_as::<_, (String, String, String)>(
            "SELECT device_id, device_name, device_model FROM device_identity WHERE id = 1 LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await
        .map_err(|error| ApiError::Storage(format!("failed to load device identity: {error}")))?;

        Ok(row.map(|(device_id, device_name, device_model)| DeviceIdentity {
            device_id,
            device_name,
            device_model,
        }))
    }

    /// Returns the persisted identity, minting and persisting one on first
    /// run. The generated `device_id` stays stable across restarts so the
    /// server sees one device, not a new one per invocation.
    pub async fn load_or_create_identity(
        &self,
        device_name: &str,
        device_model: &str,
    ) -> Result<DeviceIdentity, ApiError> {
        if let Some(identity) = self.load_identity().await? {
            return Ok(identity);
        }

        let identity = DeviceIdentity {
            device_id: Uuid::new_v4().to_string(),
            device_name: device_name.to_owned(),
            device_model: device_model.to_owned(),
        };

        sqlx::query(
            "INSERT INTO device_identity(id, device_id, device_name, device_model, created_at_ms) \
             VALUES(1, ?, ?, ?, ?) \
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(&identity.device_id)
        .bind(&identity.device_name)
        .bind(&identity.device_model)
        .bind(i64::try_from(now_unix_ms()).unwrap_or(i64::MAX))
        .execute(self.pool())
        .await
        .map_err(|error| ApiError::Storage(format!("failed to persist device identity: {error}")))?;

        Ok(identity)
    }
}
