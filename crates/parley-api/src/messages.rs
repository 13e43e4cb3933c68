use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use parley_db::models::MessageRow;
use parley_types::api::{AckResponse, HistoryQuery, MessageResponse, SendMessageRequest};

use crate::auth::AppState;
use crate::error::{ApiError, required};

/// History for a pair of users, both directions, oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let user1 = required(query.user1, "user1 and user2 are required.")?;
    let user2 = required(query.user2, "user1 and user2 are required.")?;

    let db = state.db.clone();
    let rows = tokio::task::spawn_blocking(move || db.get_messages_between(&user1, &user2))
        .await
        .map_err(|e| anyhow::anyhow!("blocking task failed: {e}"))??;

    Ok(Json(rows.into_iter().map(row_to_response).collect()))
}

/// Persist a message, then hand it to the delivery router. Persistence is
/// the only durability guarantee: the response does not wait on (or reflect)
/// live delivery or push dispatch.
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let sender = required(req.sender, "Sender, receiver, and message are required.")?;
    let receiver = required(req.receiver, "Sender, receiver, and message are required.")?;
    let body = required(req.message, "Sender, receiver, and message are required.")?;

    ensure_user_exists(&state, &sender, "Sender does not exist.").await?;
    ensure_user_exists(&state, &receiver, "Receiver does not exist.").await?;

    let message = MessageResponse {
        id: Uuid::new_v4(),
        sender,
        receiver,
        message: body,
        created_at: chrono::Utc::now(),
    };

    {
        let db = state.db.clone();
        let msg = message.clone();
        tokio::task::spawn_blocking(move || {
            db.insert_message(
                &msg.id.to_string(),
                &msg.sender,
                &msg.receiver,
                &msg.message,
                &msg
                    .created_at
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            )
        })
        .await
        .map_err(|e| anyhow::anyhow!("blocking task failed: {e}"))??;
    }

    state.router.route(message).await;

    Ok((
        StatusCode::CREATED,
        Json(AckResponse {
            message: "Message sent successfully.".to_owned(),
        }),
    ))
}

async fn ensure_user_exists(
    state: &AppState,
    username: &str,
    missing_msg: &'static str,
) -> Result<(), ApiError> {
    let db = state.db.clone();
    let name = username.to_owned();
    let found = tokio::task::spawn_blocking(move || db.get_user_by_username(&name))
        .await
        .map_err(|e| anyhow::anyhow!("blocking task failed: {e}"))??;

    if found.is_none() {
        return Err(ApiError::NotFound(missing_msg));
    }
    Ok(())
}

fn row_to_response(row: MessageRow) -> MessageResponse {
    let id = row.id.parse().unwrap_or_else(|e| {
        warn!("Corrupt message id '{}': {}", row.id, e);
        Uuid::default()
    });
    let created_at = row
        .created_at
        .parse::<chrono::DateTime<chrono::Utc>>()
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on message '{}': {}", row.created_at, row.id, e);
            chrono::DateTime::default()
        });

    MessageResponse {
        id,
        sender: row.sender,
        receiver: row.receiver,
        message: row.body,
        created_at,
    }
}
