use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::{domain::models::EventDetail, transport::ApiClient};

#[derive(Debug, Clone, Default)]
pub struct EventDetailState {
    pub event: Option<EventDetail>,
    pub thumbnail_data: Option<Vec<u8>>,
    pub is_loading: bool,
    pub is_loading_thumbnail: bool,
    pub error_message: Option<String>,
}

impl EventDetailState {
    #[must_use]
    pub fn has_event(&self) -> bool {
        self.event.is_some()
    }

    #[must_use]
    pub fn has_thumbnail(&self) -> bool {
        self.thumbnail_data.is_some()
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error_message.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Single-event view: the record itself plus a lazily fetched thumbnail.
#[derive(Clone)]
pub struct EventDetailController {
    client: ApiClient,
    state: Arc<RwLock<EventDetailState>>,
    version: Arc<AtomicU64>,
}

impl EventDetailController {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(EventDetailState::default())),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn snapshot(&self) -> EventDetailState {
        self.state.read().await.clone()
    }

    /// Monotonic change counter; poll it to learn when to re-read the
    /// snapshot.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Fetches the event and replaces the current record unconditionally, so
    /// repeated calls act as refresh. On failure the stale record stays and
    /// the error is surfaced.
    pub async fn load_event(&self, id: Uuid) {
        {
            let mut state = self.state.write().await;
            state.is_loading = true;
            state.error_message = None;
        }
        self.bump();

        let result = self.client.fetch_event_detail(id).await;

        let mut state = self.state.write().await;
        match result {
            Ok(event) => state.event = Some(event),
            Err(error) => state.error_message = Some(error.to_string()),
        }
        state.is_loading = false;
        drop(state);
        self.bump();
    }

    /// Fetches the thumbnail once: no-op when bytes are already present or a
    /// fetch is in flight. Failures are logged and never surface in
    /// `error_message`; the detail view stays usable without an image.
    pub async fn load_thumbnail(&self, id: Uuid) {
        {
            let mut state = self.state.write().await;
            if state.thumbnail_data.is_some() || state.is_loading_thumbnail {
                return;
            }
            state.is_loading_thumbnail = true;
        }
        self.bump();

        let result = self.client.fetch_event_thumbnail(id).await;

        let mut state = self.state.write().await;
        match result {
            Ok(bytes) => state.thumbnail_data = Some(bytes),
            Err(error) => warn!("failed to load thumbnail for event {id}: {error}"),
        }
        state.is_loading_thumbnail = false;
        drop(state);
        self.bump();
    }

    /// Clears everything; call when navigating away so the next event never
    /// sees this one's data.
    pub async fn reset(&self) {
        self.state.write().await.reset();
        self.bump();
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::Release);
    }
}
