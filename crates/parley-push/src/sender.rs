use async_trait::async_trait;
use reqwest::{Url, header};
use tracing::debug;

use crate::PushTransport;
use crate::error::PushError;
use crate::vapid::VapidConfig;

/// Seconds the push service should retain an undelivered notification.
const PUSH_TTL_SECS: &str = "86400";

/// Production transport: VAPID-authorized POST to the subscription endpoint.
pub struct WebPushSender {
    client: reqwest::Client,
    vapid: VapidConfig,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            vapid,
        }
    }
}

#[async_trait]
impl PushTransport for WebPushSender {
    async fn send(
        &self,
        subscription: &serde_json::Value,
        payload: &str,
    ) -> Result<(), PushError> {
        let endpoint = subscription
            .get("endpoint")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PushError::Descriptor("missing endpoint".into()))?;

        let url =
            Url::parse(endpoint).map_err(|e| PushError::Descriptor(format!("bad endpoint: {e}")))?;

        let authorization = self.vapid.authorization(&url)?;

        debug!("dispatching push notification to {}", url);

        let response = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, authorization)
            .header(header::CONTENT_TYPE, "application/json")
            .header("TTL", PUSH_TTL_SECS)
            .body(payload.to_owned())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Endpoint {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}
