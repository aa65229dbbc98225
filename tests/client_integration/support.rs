use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use argus_core::{
    application::config::RuntimeConfig,
    domain::models::Session,
    security::session::SessionStore,
    storage::SqliteStore,
    transport::ApiClient,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::{net::TcpListener, task::JoinHandle};
use uuid::Uuid;

/// Fixture feed size: camera A owns every third event (22), camera B the rest.
pub(crate) const TOTAL_EVENTS: usize = 66;
pub(crate) const VALID_PAIRING_CODE: &str = "123456";
pub(crate) const THUMBNAIL_BYTES: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];

pub(crate) fn camera_a() -> Uuid {
    Uuid::from_u128(0xA)
}

pub(crate) fn camera_b() -> Uuid {
    Uuid::from_u128(0xB)
}

pub(crate) fn event_id(index: usize) -> Uuid {
    Uuid::from_u128(0x1000 + index as u128)
}

fn event_camera(index: usize) -> Uuid {
    if index % 3 == 0 { camera_a() } else { camera_b() }
}

fn fixture_event(index: usize) -> Value {
    let camera = event_camera(index);
    let timestamp = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
        - ChronoDuration::minutes(index as i64);
    json!({
        "id": event_id(index).to_string(),
        "camera_id": camera.to_string(),
        "camera_name": if camera == camera_a() { "Front Door" } else { "Backyard" },
        "timestamp": timestamp.to_rfc3339(),
        "description": format!("Event {index}"),
        "smart_detection_type": if camera == camera_a() { "person" } else { "motion" },
        "confidence": 60 + (index % 40),
        "has_thumbnail": true,
    })
}

fn fixture_event_detail(index: usize) -> Value {
    let mut event = fixture_event(index);
    event["analysis_mode"] = json!("multi_frame");
    event
}

#[derive(Debug, Clone, Default)]
pub(crate) struct StubConfig {
    pub(crate) events_delay_ms: u64,
    /// Extra delay applied only to unfiltered event requests; lets a test
    /// order a filtered and an unfiltered response deterministically.
    pub(crate) unfiltered_extra_delay_ms: u64,
    pub(crate) fail_events: bool,
    pub(crate) expire_session: bool,
    pub(crate) rate_limit_pairing: bool,
    pub(crate) fail_thumbnail: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EventsQuery {
    pub(crate) limit: usize,
    pub(crate) offset: usize,
    #[serde(default)]
    pub(crate) camera_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PairVerifyBody {
    pub(crate) code: String,
    pub(crate) device_id: String,
    pub(crate) device_name: String,
    pub(crate) device_model: String,
}

#[derive(Debug, Deserialize)]
struct RefreshBody {
    refresh_token: String,
}

#[derive(Default)]
pub(crate) struct Stub {
    config: Mutex<StubConfig>,
    events_hits: AtomicUsize,
    thumbnail_hits: AtomicUsize,
    pair_hits: AtomicUsize,
    token_serial: AtomicUsize,
    issued_refresh: Mutex<Option<String>>,
    last_events_query: Mutex<Option<EventsQuery>>,
    last_pair_body: Mutex<Option<PairVerifyBody>>,
}

impl Stub {
    pub(crate) fn configure(&self, apply: impl FnOnce(&mut StubConfig)) {
        apply(&mut self.config.lock().expect("stub config lock"));
    }

    fn config(&self) -> StubConfig {
        self.config.lock().expect("stub config lock").clone()
    }

    pub(crate) fn events_hits(&self) -> usize {
        self.events_hits.load(Ordering::SeqCst)
    }

    pub(crate) fn thumbnail_hits(&self) -> usize {
        self.thumbnail_hits.load(Ordering::SeqCst)
    }

    pub(crate) fn pair_hits(&self) -> usize {
        self.pair_hits.load(Ordering::SeqCst)
    }

    pub(crate) fn last_events_query(&self) -> Option<EventsQuery> {
        self.last_events_query.lock().expect("stub query lock").clone()
    }

    pub(crate) fn last_pair_body(&self) -> Option<PairVerifyBody> {
        self.last_pair_body.lock().expect("stub pair lock").clone()
    }

    fn issue_tokens(&self) -> Value {
        let serial = self.token_serial.fetch_add(1, Ordering::SeqCst) + 1;
        let refresh = format!("refresh-{serial}");
        *self.issued_refresh.lock().expect("stub token lock") = Some(refresh.clone());
        json!({
            "access_token": format!("access-{serial}"),
            "refresh_token": refresh,
            "token_type": "Bearer",
            "expires_in": 3600,
        })
    }
}

fn error_body(code: &str, message: &str) -> Json<Value> {
    Json(json!({"ok": false, "error": {"code": code, "message": message}}))
}

fn session_expired() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        error_body("SESSION_EXPIRED", "the session has expired"),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Bearer "))
}

async fn events_handler(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Query(query): Query<EventsQuery>,
) -> Response {
    stub.events_hits.fetch_add(1, Ordering::SeqCst);
    *stub.last_events_query.lock().expect("stub query lock") = Some(query.clone());

    let config = stub.config();
    if config.events_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.events_delay_ms)).await;
    }
    if query.camera_id.is_none() && config.unfiltered_extra_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.unfiltered_extra_delay_ms)).await;
    }

    if config.expire_session {
        return session_expired();
    }
    if config.fail_events {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("INTERNAL", "simulated failure"),
        )
            .into_response();
    }
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            error_body("UNAUTHORIZED", "missing token"),
        )
            .into_response();
    }

    let filtered: Vec<Value> = (0..TOTAL_EVENTS)
        .filter(|index| {
            query
                .camera_id
                .is_none_or(|camera| event_camera(*index) == camera)
        })
        .map(fixture_event)
        .collect();
    let start = query.offset.min(filtered.len());
    let end = (query.offset + query.limit).min(filtered.len());

    Json(json!({
        "events": &filtered[start..end],
        "has_more": end < filtered.len(),
        "next_offset": end,
    }))
    .into_response()
}

async fn event_detail_handler(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    let config = stub.config();
    if config.expire_session {
        return session_expired();
    }
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            error_body("UNAUTHORIZED", "missing token"),
        )
            .into_response();
    }

    match (0..TOTAL_EVENTS).find(|index| event_id(*index) == id) {
        Some(index) => Json(fixture_event_detail(index)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            error_body("NOT_FOUND", "no such event"),
        )
            .into_response(),
    }
}

async fn thumbnail_handler(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    stub.thumbnail_hits.fetch_add(1, Ordering::SeqCst);

    let config = stub.config();
    if config.fail_thumbnail {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("INTERNAL", "thumbnail backend down"),
        )
            .into_response();
    }
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            error_body("UNAUTHORIZED", "missing token"),
        )
            .into_response();
    }
    if (0..TOTAL_EVENTS).all(|index| event_id(index) != id) {
        return (
            StatusCode::NOT_FOUND,
            error_body("NOT_FOUND", "no such event"),
        )
            .into_response();
    }

    THUMBNAIL_BYTES.to_vec().into_response()
}

async fn cameras_handler(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Response {
    let config = stub.config();
    if config.expire_session {
        return session_expired();
    }
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            error_body("UNAUTHORIZED", "missing token"),
        )
            .into_response();
    }

    Json(json!({
        "cameras": [
            {
                "id": camera_a().to_string(),
                "name": "Front Door",
                "is_enabled": true,
                "is_online": true,
                "source_type": "rtsp",
                "last_event_at": "2025-01-01T12:00:00Z",
            },
            {
                "id": camera_b().to_string(),
                "name": "Backyard",
                "is_enabled": true,
                "is_online": false,
                "source_type": "onvif",
            },
        ]
    }))
    .into_response()
}

async fn pair_verify_handler(
    State(stub): State<Arc<Stub>>,
    Json(body): Json<PairVerifyBody>,
) -> Response {
    stub.pair_hits.fetch_add(1, Ordering::SeqCst);
    *stub.last_pair_body.lock().expect("stub pair lock") = Some(body.clone());

    if stub.config().rate_limit_pairing {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            error_body("RATE_LIMITED", "slow down"),
        )
            .into_response();
    }
    if body.code != VALID_PAIRING_CODE {
        return (
            StatusCode::BAD_REQUEST,
            error_body(
                "INVALID_CODE",
                "Invalid pairing code. Check the code shown on the server.",
            ),
        )
            .into_response();
    }
    if body.device_id.is_empty() || body.device_name.is_empty() || body.device_model.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_body("INVALID_DEVICE", "device identity is incomplete"),
        )
            .into_response();
    }

    Json(stub.issue_tokens()).into_response()
}

async fn refresh_handler(State(stub): State<Arc<Stub>>, Json(body): Json<RefreshBody>) -> Response {
    let issued = stub.issued_refresh.lock().expect("stub token lock").clone();
    if issued.as_deref() != Some(body.refresh_token.as_str()) {
        return session_expired();
    }

    Json(stub.issue_tokens()).into_response()
}

pub(crate) struct Backend {
    pub(crate) stub: Arc<Stub>,
    pub(crate) addr: SocketAddr,
    join: JoinHandle<()>,
}

impl Backend {
    pub(crate) async fn stop(self) {
        self.join.abort();
        let _ = self.join.await;
    }
}

pub(crate) async fn spawn_backend() -> Backend {
    let stub = Arc::new(Stub::default());
    let router = Router::new()
        .route("/api/v1/events", get(events_handler))
        .route("/api/v1/events/{id}", get(event_detail_handler))
        .route("/api/v1/events/{id}/thumbnail", get(thumbnail_handler))
        .route("/api/v1/cameras", get(cameras_handler))
        .route("/api/v1/pair/verify", post(pair_verify_handler))
        .route("/api/v1/auth/refresh", post(refresh_handler))
        .with_state(stub.clone());

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("listener should bind");
    let addr = listener
        .local_addr()
        .expect("listener should expose local addr");

    let join = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Backend { stub, addr, join }
}

pub(crate) struct TestClient {
    pub(crate) client: ApiClient,
    pub(crate) store: SqliteStore,
    pub(crate) db_path: PathBuf,
    _temp_dir: TempDir,
}

pub(crate) async fn connect_client(backend: &Backend) -> TestClient {
    let temp_dir = tempfile::tempdir().expect("temp dir should be created");
    let db_path = temp_dir.path().join("argus.db");

    let config = RuntimeConfig::for_test(format!("http://{}", backend.addr), db_path.clone());
    let store = SqliteStore::connect(&db_path)
        .await
        .expect("store should connect");
    let sessions = SessionStore::load(store.clone())
        .await
        .expect("session store should load");
    let identity = store
        .load_or_create_identity(&config.device_name, &config.device_model)
        .await
        .expect("identity should load");
    let client = ApiClient::new(&config, sessions, identity).expect("client should build");

    TestClient {
        client,
        store,
        db_path,
        _temp_dir: temp_dir,
    }
}

/// Seeds a valid session directly, skipping the pairing flow.
pub(crate) async fn authenticate(test_client: &TestClient) {
    test_client
        .client
        .sessions()
        .set_session(Session {
            access_token: "seeded-access".to_owned(),
            refresh_token: "seeded-refresh".to_owned(),
            token_type: "Bearer".to_owned(),
            expires_at: Utc::now() + ChronoDuration::hours(1),
        })
        .await
        .expect("session should persist");
}
