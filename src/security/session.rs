use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    domain::{error::ApiError, models::Session},
    storage::SqliteStore,
};

/// Exclusive owner of the authenticated session. Reads and writes go through
/// one `RwLock`, so a fetch racing a pairing or refresh never observes a
/// half-written token pair. The persisted row is updated under the same write
/// guard that replaces the in-memory copy; memory and disk cannot diverge for
/// concurrent readers.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
    store: SqliteStore,
}

impl SessionStore {
    /// Loads the persisted session, if any, and becomes its owner.
    pub async fn load(store: SqliteStore) -> Result<Self, ApiError> {
        let session = store.load_session().await?;
        Ok(Self {
            inner: Arc::new(RwLock::new(session)),
            store,
        })
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    /// True iff a session is present and not expired by wall clock.
    pub async fn is_authenticated(&self) -> bool {
        match self.inner.read().await.as_ref() {
            Some(session) => session.expires_at > Utc::now(),
            None => false,
        }
    }

    pub async fn set_session(&self, session: Session) -> Result<(), ApiError> {
        let mut guard = self.inner.write().await;
        self.store.save_session(&session).await?;
        *guard = Some(session);
        Ok(())
    }

    pub async fn clear_session(&self) -> Result<(), ApiError> {
        let mut guard = self.inner.write().await;
        self.store.delete_session().await?;
        *guard = None;
        Ok(())
    }
}
