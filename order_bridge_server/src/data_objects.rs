use order_bridge_engine::{db_types::Order, helpers::Secret, IngestOutcome, SessionState};
use serde::{Deserialize, Serialize};

/// Partner portal credentials. The password is wrapped as soon as it is deserialized, so it never reaches the logs.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectRequest {
    pub username: String,
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: Secret<String>,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Secret<String>, D::Error>
where D: serde::Deserializer<'de> {
    String::deserialize(deserializer).map(Secret::new)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub connected: bool,
    pub listening: bool,
    pub state: String,
    pub order_count: i64,
}

impl StatusResponse {
    pub fn new(state: SessionState, connected: bool, listening: bool, order_count: i64) -> Self {
        Self { connected, listening, state: state.to_string(), order_count }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// One of `created`, `duplicate` or `dropped`
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub order: Option<Order>,
}

impl From<IngestOutcome> for IngestResponse {
    fn from(outcome: IngestOutcome) -> Self {
        match outcome {
            IngestOutcome::Created(order) => Self { outcome: "created".into(), reason: None, order: Some(order) },
            IngestOutcome::Duplicate(order) => Self { outcome: "duplicate".into(), reason: None, order: Some(order) },
            IngestOutcome::Dropped(e) => Self { outcome: "dropped".into(), reason: Some(e.to_string()), order: None },
        }
    }
}
