use chrono::{Duration, Utc};
use reqwest::{StatusCode, Url, header::AUTHORIZATION};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use uuid::Uuid;

use crate::{
    application::config::RuntimeConfig,
    domain::{
        error::ApiError,
        models::{Camera, DeviceIdentity, EventDetail, EventPage, Session},
    },
    security::session::SessionStore,
};

/// Error-body code the backend sets on a 401 caused by an expired token, as
/// opposed to a missing or malformed one.
const SESSION_EXPIRED_CODE: &str = "SESSION_EXPIRED";

#[derive(Debug, Clone, Serialize)]
struct PairVerifyRequest {
    code: String,
    device_id: String,
    device_name: String,
    device_model: String,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    token_type: String,
    expires_in: i64,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CamerasResponse {
    cameras: Vec<Camera>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Authenticated HTTP client for the Argus backend (or a local relay serving
/// the same API). Every call reads the current token from the session store;
/// a session-expired response is surfaced as-is, never retried here.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    sessions: SessionStore,
    identity: DeviceIdentity,
}

impl ApiClient {
    pub fn new(
        config: &RuntimeConfig,
        sessions: SessionStore,
        identity: DeviceIdentity,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.server_url)
            .map_err(|error| ApiError::InvalidUrl(format!("{}: {error}", config.server_url)))?;
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|error| ApiError::Network(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            http,
            base_url,
            sessions,
            identity,
        })
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub async fn fetch_events(
        &self,
        limit: usize,
        offset: usize,
        camera_id: Option<Uuid>,
    ) -> Result<EventPage, ApiError> {
        let url = self.endpoint("/api/v1/events")?;
        let bearer = self.bearer().await?;

        debug!("fetching events limit={limit} offset={offset} camera={camera_id:?}");
        let mut request = self.http.get(url).header(AUTHORIZATION, bearer).query(&[
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ]);
        if let Some(camera_id) = camera_id {
            request = request.query(&[("camera_id", camera_id.to_string())]);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        decode_json(response).await
    }

    pub async fn fetch_event_detail(&self, id: Uuid) -> Result<EventDetail, ApiError> {
        let url = self.endpoint(&format!("/api/v1/events/{id}"))?;
        let bearer = self.bearer().await?;

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, bearer)
            .send()
            .await
            .map_err(map_transport_error)?;
        decode_json(response).await
    }

    pub async fn fetch_event_thumbnail(&self, id: Uuid) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&format!("/api/v1/events/{id}/thumbnail"))?;
        let bearer = self.bearer().await?;

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, bearer)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| ApiError::Network(format!("failed to read thumbnail: {error}")))?;
        Ok(bytes.to_vec())
    }

    pub async fn fetch_cameras(&self) -> Result<Vec<Camera>, ApiError> {
        let url = self.endpoint("/api/v1/cameras")?;
        let bearer = self.bearer().await?;

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, bearer)
            .send()
            .await
            .map_err(map_transport_error)?;
        let cameras: CamerasResponse = decode_json(response).await?;
        Ok(cameras.cameras)
    }

    /// Exchanges a verified 6-digit code for a session and stores it. The
    /// device identity rides along so the server can register who paired.
    pub async fn verify_pairing_code(&self, code: &str) -> Result<Session, ApiError> {
        let url = self.endpoint("/api/v1/pair/verify")?;
        let body = PairVerifyRequest {
            code: code.to_owned(),
            device_id: self.identity.device_id.clone(),
            device_name: self.identity.device_name.clone(),
            device_model: self.identity.device_model.clone(),
        };

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let token: TokenResponse = decode_json(response).await?;

        let session = token.into_session();
        self.sessions.set_session(session.clone()).await?;
        Ok(session)
    }

    /// Trades the refresh token for a new session. Rejection of the refresh
    /// token is irrecoverable: the stored session is destroyed and the caller
    /// must re-pair. Never invoked implicitly by the fetch paths.
    pub async fn refresh_session(&self) -> Result<Session, ApiError> {
        let Some(current) = self.sessions.current_session().await else {
            return Err(ApiError::NotAuthenticated);
        };

        let url = self.endpoint("/api/v1/auth/refresh")?;
        let response = self
            .http
            .post(url)
            .json(&RefreshRequest {
                refresh_token: &current.refresh_token,
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        match decode_json::<TokenResponse>(response).await {
            Ok(token) => {
                let session = token.into_session();
                self.sessions.set_session(session.clone()).await?;
                Ok(session)
            }
            Err(error) if error.requires_pairing() => {
                self.sessions.clear_session().await?;
                Err(ApiError::SessionExpired)
            }
            Err(error) => Err(error),
        }
    }

    /// Forgets the stored session. Local-only; the server learns about it the
    /// next time the token fails.
    pub async fn sign_out(&self) -> Result<(), ApiError> {
        self.sessions.clear_session().await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|error| ApiError::InvalidUrl(format!("{path}: {error}")))
    }

    async fn bearer(&self) -> Result<String, ApiError> {
        let Some(session) = self.sessions.current_session().await else {
            return Err(ApiError::NotAuthenticated);
        };
        Ok(format!("{} {}", session.token_type, session.access_token))
    }
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(map_status(status, &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|error| ApiError::Network(format!("failed to decode response: {error}")))
}

fn map_status(status: StatusCode, body: &str) -> ApiError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error);
    let code = detail.as_ref().and_then(|detail| detail.code.as_deref());
    let message = detail.as_ref().and_then(|detail| detail.message.as_deref());

    match status {
        StatusCode::UNAUTHORIZED => {
            if code == Some(SESSION_EXPIRED_CODE) {
                ApiError::SessionExpired
            } else {
                ApiError::NotAuthenticated
            }
        }
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => match message {
            Some(message) => ApiError::Rejected(message.to_owned()),
            None => ApiError::Server(status.as_u16()),
        },
        _ => ApiError::Server(status.as_u16()),
    }
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    ApiError::Network(error.to_string())
}
