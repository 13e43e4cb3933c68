//! Web Push dispatch.
//!
//! The rest of the service only sees [`PushTransport`]: an opaque provider
//! that takes a stored subscription descriptor and a JSON payload and either
//! delivers or fails with a status. [`WebPushSender`] is the production
//! implementation, a VAPID-authorized HTTP POST to the subscription
//! endpoint. Payload content encryption is intentionally out of scope.

pub mod error;
pub mod sender;
pub mod vapid;

pub use error::PushError;
pub use sender::WebPushSender;
pub use vapid::VapidConfig;

use async_trait::async_trait;

#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Dispatch `payload` to the endpoint described by `subscription`.
    async fn send(&self, subscription: &serde_json::Value, payload: &str)
    -> Result<(), PushError>;
}
