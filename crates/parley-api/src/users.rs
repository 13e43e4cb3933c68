use axum::{Json, extract::State};

use parley_types::api::UserResponse;

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let db = state.db.clone();
    let rows = tokio::task::spawn_blocking(move || db.list_users())
        .await
        .map_err(|e| anyhow::anyhow!("blocking task failed: {e}"))??;

    let users = rows
        .into_iter()
        .map(|row| UserResponse {
            username: row.username,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(users))
}
