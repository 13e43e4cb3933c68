use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use parley_types::api::{AckResponse, PushKeyResponse, SubscribeRequest};

use crate::auth::AppState;
use crate::error::{ApiError, required};

/// Public VAPID key for client subscription; empty string when push is not
/// configured (clients treat that as "push unavailable", not an error).
pub async fn get_push_key(State(state): State<AppState>) -> Json<PushKeyResponse> {
    Json(PushKeyResponse {
        key: state.vapid_public_key.clone().unwrap_or_default(),
    })
}

/// Save or replace a user's push subscription descriptor.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = required(req.username, "username and subscription are required.")?;
    let subscription = req
        .subscription
        .filter(|v| !v.is_null())
        .ok_or(ApiError::Validation("username and subscription are required."))?;

    let stored = serde_json::to_string(&subscription).unwrap();

    {
        let db = state.db.clone();
        let name = username.clone();
        tokio::task::spawn_blocking(move || db.upsert_subscription(&name, &stored))
            .await
            .map_err(|e| anyhow::anyhow!("blocking task failed: {e}"))??;
    }

    info!("push subscription saved for {}", username);
    Ok((
        StatusCode::CREATED,
        Json(AckResponse {
            message: "Subscription saved.".to_owned(),
        }),
    ))
}
