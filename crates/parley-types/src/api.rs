use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Auth --

/// Login doubles as signup: an unseen username is created on the spot.
/// Fields are optional so that absent and empty values can both be rejected
/// with a 400 instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
    pub created_at: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub user1: Option<String>,
    pub user2: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub sender: String,
    pub receiver: String,
    pub message: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// -- Push --

#[derive(Debug, Serialize, Deserialize)]
pub struct PushKeyResponse {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub username: Option<String>,
    /// Opaque browser push subscription descriptor, stored verbatim.
    pub subscription: Option<serde_json::Value>,
}
