use thiserror::Error;

#[derive(Debug, Error)]
pub enum PushError {
    /// The push endpoint answered with a non-success status.
    #[error("push endpoint rejected dispatch: HTTP {status}")]
    Endpoint { status: u16 },

    #[error("push request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("subscription descriptor invalid: {0}")]
    Descriptor(String),

    #[error("VAPID signing failed: {0}")]
    Vapid(#[from] jsonwebtoken::errors::Error),
}

impl PushError {
    /// True when the endpoint is permanently gone and the stored
    /// subscription should be pruned.
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Endpoint { status: 404 | 410 })
    }
}
