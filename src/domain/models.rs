use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smart detection category reported for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartDetectionType {
    Person,
    Vehicle,
    Package,
    Animal,
    Motion,
}

impl SmartDetectionType {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Vehicle => "Vehicle",
            Self::Package => "Package",
            Self::Animal => "Animal",
            Self::Motion => "Motion",
        }
    }
}

/// How the server analyzed the clip. Decoded for completeness; the client
/// only ever displays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    SingleFrame,
    MultiFrame,
    VideoNative,
}

impl AnalysisMode {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SingleFrame => "Single Frame",
            Self::MultiFrame => "Multi-Frame",
            Self::VideoNative => "Video Native",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub camera_id: Uuid,
    pub camera_name: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub smart_detection_type: SmartDetectionType,
    pub confidence: u8,
    pub has_thumbnail: bool,
}

/// Full event record served by the detail endpoint. Same identity and fields
/// as [`EventSummary`] plus analysis metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetail {
    pub id: Uuid,
    pub camera_id: Uuid,
    pub camera_name: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub smart_detection_type: SmartDetectionType,
    pub confidence: u8,
    pub has_thumbnail: bool,
    #[serde(default)]
    pub analysis_mode: Option<AnalysisMode>,
}

/// One page of the event feed, server order preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<EventSummary>,
    pub has_more: bool,
    #[serde(default)]
    pub next_offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub id: Uuid,
    pub name: String,
    pub is_enabled: bool,
    pub is_online: bool,
    pub source_type: String,
    #[serde(default)]
    pub last_event_at: Option<DateTime<Utc>>,
}

/// Authenticated session. Either absent entirely or fully populated; partial
/// tokens never exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Identity this device presents when pairing. Generated once and persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub device_name: String,
    pub device_model: String,
}
