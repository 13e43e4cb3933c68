use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use parley_db::Database;
use parley_gateway::router::DeliveryRouter;
use parley_types::api::{AckResponse, LoginRequest};

use crate::error::{ApiError, required};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub router: DeliveryRouter,
    /// Served to clients for push subscription; empty when push is disabled.
    pub vapid_public_key: Option<String>,
}

/// Login doubles as signup: a previously unseen username is created with the
/// supplied password. Passwords are stored and compared verbatim, a known
/// limitation of this service.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = required(req.username, "Username and password are required.")?;
    let password = required(req.password, "Username and password are required.")?;

    let existing = {
        let db = state.db.clone();
        let name = username.clone();
        tokio::task::spawn_blocking(move || db.get_user_by_username(&name))
            .await
            .map_err(|e| anyhow::anyhow!("blocking task failed: {e}"))??
    };

    match existing {
        None => {
            let db = state.db.clone();
            let id = Uuid::new_v4().to_string();
            let name = username.clone();
            tokio::task::spawn_blocking(move || db.create_user(&id, &name, &password))
                .await
                .map_err(|e| anyhow::anyhow!("blocking task failed: {e}"))??;

            info!("{} signed up", username);
            Ok((
                StatusCode::CREATED,
                Json(AckResponse {
                    message: "Signup successful.".to_owned(),
                }),
            ))
        }
        Some(user) => {
            if user.password != password {
                return Err(ApiError::Auth);
            }

            info!("{} logged in", username);
            Ok((
                StatusCode::OK,
                Json(AckResponse {
                    message: "Login successful.".to_owned(),
                }),
            ))
        }
    }
}
