use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    domain::models::{EventPage, EventSummary},
    transport::ApiClient,
};

const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct EventListState {
    /// Insertion order = page arrival order; the server is trusted for
    /// ordering and duplicates are not collapsed.
    pub events: Vec<EventSummary>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub has_more: bool,
    /// Scope of the current sequence. Changing it requires a fresh
    /// `load_first_page`; `load_more` keeps extending this scope only.
    pub camera_filter: Option<Uuid>,
    current_offset: usize,
}

impl EventListState {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && !self.is_loading
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error_message.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn begin_first_page(&mut self, camera_filter: Option<Uuid>) {
        self.is_loading = true;
        self.error_message = None;
        self.current_offset = 0;
        self.camera_filter = camera_filter;
    }

    fn apply_first_page(&mut self, page: EventPage) {
        self.has_more = page.has_more;
        self.current_offset = page.next_offset.unwrap_or(PAGE_SIZE);
        self.events = page.events;
    }

    fn apply_next_page(&mut self, page: EventPage) {
        self.has_more = page.has_more;
        self.current_offset = page.next_offset.unwrap_or(self.current_offset + PAGE_SIZE);
        self.events.extend(page.events);
    }
}

/// Offset-paginated view over the event feed, optionally scoped to one
/// camera.
#[derive(Clone)]
pub struct EventListController {
    client: ApiClient,
    state: Arc<RwLock<EventListState>>,
    version: Arc<AtomicU64>,
}

impl EventListController {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(EventListState::default())),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn snapshot(&self) -> EventListState {
        self.state.read().await.clone()
    }

    /// Monotonic change counter; poll it to learn when to re-read the
    /// snapshot.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Resets the cursor and replaces the sequence with the first page of
    /// the given scope. On failure the previous events stay on screen and
    /// only the error message changes. Deliberately unguarded: a racing
    /// filtered and unfiltered load is last-writer-wins.
    pub async fn load_first_page(&self, camera_filter: Option<Uuid>) {
        {
            let mut state = self.state.write().await;
            state.begin_first_page(camera_filter);
        }
        self.bump();

        let result = self.client.fetch_events(PAGE_SIZE, 0, camera_filter).await;

        let mut state = self.state.write().await;
        match result {
            Ok(page) => state.apply_first_page(page),
            Err(error) => state.error_message = Some(error.to_string()),
        }
        state.is_loading = false;
        drop(state);
        self.bump();
    }

    /// Appends the next page of the current scope. No-op while a load is in
    /// flight or when the server said there is nothing more; the check and
    /// the in-flight mark happen in one critical section, so concurrent
    /// calls cannot double-append.
    pub async fn load_more(&self) {
        let (offset, camera_filter) = {
            let mut state = self.state.write().await;
            if !state.has_more || state.is_loading {
                return;
            }
            state.is_loading = true;
            (state.current_offset, state.camera_filter)
        };
        self.bump();

        let result = self
            .client
            .fetch_events(PAGE_SIZE, offset, camera_filter)
            .await;

        let mut state = self.state.write().await;
        match result {
            Ok(page) => state.apply_next_page(page),
            Err(error) => state.error_message = Some(error.to_string()),
        }
        state.is_loading = false;
        drop(state);
        self.bump();
    }

    pub async fn reset(&self) {
        self.state.write().await.reset();
        self.bump();
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::Release);
    }
}
