use tracing::debug;

use crate::{
    application::config::RuntimeConfig,
    domain::error::ApiError,
    security::session::SessionStore,
    storage::SqliteStore,
    transport::ApiClient,
};

/// Everything a command needs: validated config plus a ready API client
/// wired to the persisted session and device identity.
pub struct AppContext {
    pub config: RuntimeConfig,
    pub client: ApiClient,
}

impl AppContext {
    pub async fn connect(config: RuntimeConfig) -> Result<Self, ApiError> {
        let store = SqliteStore::connect(&config.db_path).await?;
        let sessions = SessionStore::load(store.clone()).await?;
        let identity = store
            .load_or_create_identity(&config.device_name, &config.device_model)
            .await?;
        debug!("device identity {}", identity.device_id);

        let client = ApiClient::new(&config, sessions, identity)?;
        Ok(Self { config, client })
    }
}
