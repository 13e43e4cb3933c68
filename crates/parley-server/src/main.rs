use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use parley_api::auth::{self, AppState, AppStateInner};
use parley_api::{messages, push, users};
use parley_gateway::connection;
use parley_gateway::presence::PresenceRegistry;
use parley_gateway::router::DeliveryRouter;
use parley_push::{PushTransport, VapidConfig, WebPushSender};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("PARLEY_DB_PATH").unwrap_or_else(|_| "parley.db".into());
    let host = std::env::var("PARLEY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PARLEY_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = Arc::new(parley_db::Database::open(&PathBuf::from(&db_path))?);

    let presence = PresenceRegistry::new();

    // Absent VAPID keys disable push entirely; that is not an error.
    let vapid_public_key = std::env::var("VAPID_PUBLIC_KEY").ok();
    let vapid_private_key = std::env::var("VAPID_PRIVATE_KEY").ok();
    let push_transport: Option<Arc<dyn PushTransport>> =
        match (vapid_public_key.clone(), vapid_private_key) {
            (Some(public_key), Some(private_pem)) => {
                let subject = std::env::var("VAPID_SUBJECT")
                    .unwrap_or_else(|_| "mailto:admin@example.com".into());
                let vapid = VapidConfig::new(public_key, &private_pem, subject)?;
                info!("Web push enabled");
                Some(Arc::new(WebPushSender::new(vapid)))
            }
            _ => {
                info!("VAPID keys not configured, web push disabled");
                None
            }
        };

    let router = DeliveryRouter::new(presence.clone(), db.clone(), push_transport);

    let state: AppState = Arc::new(AppStateInner {
        db,
        router,
        vapid_public_key,
    });

    let app = build_router(state, presence);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Parley server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState, presence: PresenceRegistry) -> Router {
    let api = Router::new()
        .route("/login", post(auth::login))
        .route("/users", get(users::list_users))
        .route(
            "/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .route("/vapidPublicKey", get(push::get_push_key))
        .route("/subscribe", post(push::subscribe))
        .with_state(state);

    let ws = Router::new()
        .route("/ws", get(ws_upgrade))
        .with_state(presence);

    Router::new()
        .merge(api)
        .merge(ws)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn ws_upgrade(
    State(presence): State<PresenceRegistry>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::handle_connection(socket, presence))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
        response::Response,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    use parley_api::auth::{AppState, AppStateInner};
    use parley_gateway::presence::PresenceRegistry;
    use parley_gateway::router::DeliveryRouter;
    use parley_types::events::ServerEvent;

    use super::build_router;

    fn test_state() -> (AppState, PresenceRegistry) {
        let db = Arc::new(parley_db::Database::open_in_memory().unwrap());
        let presence = PresenceRegistry::new();
        let router = DeliveryRouter::new(presence.clone(), db.clone(), None);
        let state = Arc::new(AppStateInner {
            db,
            router,
            vapid_public_key: None,
        });
        (state, presence)
    }

    fn test_app() -> Router {
        let (state, presence) = test_state();
        build_router(state, presence)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn signup(app: &Router, username: &str, password: &str) {
        let response = app
            .clone()
            .oneshot(post_json(
                "/login",
                serde_json::json!({ "username": username, "password": password }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn first_login_signs_up_then_logs_in_then_rejects_bad_password() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/login",
                serde_json::json!({ "username": "alice", "password": "secret" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["message"], "Signup successful.");

        let response = app
            .clone()
            .oneshot(post_json(
                "/login",
                serde_json::json!({ "username": "alice", "password": "secret" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Login successful.");

        let response = app
            .clone()
            .oneshot(post_json(
                "/login",
                serde_json::json!({ "username": "alice", "password": "wrong" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["error"],
            "Invalid username or password."
        );
    }

    #[tokio::test]
    async fn login_rejects_missing_or_empty_fields() {
        let app = test_app();

        for body in [
            serde_json::json!({}),
            serde_json::json!({ "username": "alice" }),
            serde_json::json!({ "username": "", "password": "secret" }),
        ] {
            let response = app.clone().oneshot(post_json("/login", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(response).await["error"],
                "Username and password are required."
            );
        }
    }

    #[tokio::test]
    async fn users_are_listed_after_signup() {
        let app = test_app();
        signup(&app, "alice", "a").await;
        signup(&app, "bob", "b").await;

        let response = app.clone().oneshot(get("/users")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let users = body_json(response).await;
        let names: Vec<_> = users
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap().to_owned())
            .collect();
        assert!(names.contains(&"alice".to_owned()));
        assert!(names.contains(&"bob".to_owned()));
    }

    #[tokio::test]
    async fn submission_requires_known_sender_and_receiver() {
        let app = test_app();
        signup(&app, "alice", "a").await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/messages",
                serde_json::json!({ "sender": "ghost", "receiver": "alice", "message": "boo" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Sender does not exist.");

        let response = app
            .clone()
            .oneshot(post_json(
                "/messages",
                serde_json::json!({ "sender": "alice", "receiver": "ghost", "message": "boo" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Receiver does not exist.");

        // Nothing was persisted by the rejected submissions
        let response = app
            .clone()
            .oneshot(get("/messages?user1=ghost&user2=alice"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn submission_is_persisted_and_history_is_ordered() {
        let app = test_app();
        signup(&app, "alice", "a").await;
        signup(&app, "bob", "b").await;

        for (sender, receiver, text) in [
            ("alice", "bob", "hi bob"),
            ("bob", "alice", "hi alice"),
            ("alice", "bob", "how are you"),
        ] {
            let response = app
                .clone()
                .oneshot(post_json(
                    "/messages",
                    serde_json::json!({ "sender": sender, "receiver": receiver, "message": text }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            assert_eq!(
                body_json(response).await["message"],
                "Message sent successfully."
            );
        }

        let response = app
            .clone()
            .oneshot(get("/messages?user1=bob&user2=alice"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let history = body_json(response).await;
        let bodies: Vec<_> = history
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["message"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(bodies, ["hi bob", "hi alice", "how are you"]);
    }

    #[tokio::test]
    async fn history_requires_both_users() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(get("/messages?user1=alice"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "user1 and user2 are required."
        );
    }

    #[tokio::test]
    async fn submission_rejects_missing_fields() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/messages",
                serde_json::json!({ "sender": "alice", "receiver": "bob" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Sender, receiver, and message are required."
        );
    }

    #[tokio::test]
    async fn submission_reaches_a_present_receiver_live() {
        let (state, presence) = test_state();
        let app = build_router(state, presence.clone());
        signup(&app, "alice", "a").await;
        signup(&app, "bob", "b").await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        presence.record("alice", Uuid::new_v4(), tx).await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/messages",
                serde_json::json!({ "sender": "bob", "receiver": "alice", "message": "ping" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        match rx.try_recv().unwrap() {
            ServerEvent::Message(msg) => {
                assert_eq!(msg.sender, "bob");
                assert_eq!(msg.receiver, "alice");
                assert_eq!(msg.message, "ping");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn push_key_is_empty_when_unconfigured() {
        let app = test_app();

        let response = app.clone().oneshot(get("/vapidPublicKey")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["key"], "");
    }

    #[tokio::test]
    async fn subscribe_saves_and_validates() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/subscribe",
                serde_json::json!({
                    "username": "alice",
                    "subscription": { "endpoint": "https://push.example/ep", "keys": {} }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["message"], "Subscription saved.");

        let response = app
            .clone()
            .oneshot(post_json(
                "/subscribe",
                serde_json::json!({ "username": "alice" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "username and subscription are required."
        );
    }
}
