use std::sync::Arc;

use tracing::{debug, info, warn};

use parley_db::Database;
use parley_push::PushTransport;
use parley_types::api::MessageResponse;
use parley_types::events::{PushNotification, ServerEvent};

use crate::presence::PresenceRegistry;

/// Routes a freshly persisted message to its receiver: a live emit when the
/// receiver has a connection on record, plus an independent best-effort push
/// notification attempt. The two paths never block or fail each other.
#[derive(Clone)]
pub struct DeliveryRouter {
    presence: PresenceRegistry,
    db: Arc<Database>,
    push: Option<Arc<dyn PushTransport>>,
}

impl DeliveryRouter {
    pub fn new(
        presence: PresenceRegistry,
        db: Arc<Database>,
        push: Option<Arc<dyn PushTransport>>,
    ) -> Self {
        Self { presence, db, push }
    }

    /// Persistence has already succeeded by the time this runs; nothing here
    /// reports back to the submission caller. The live emit is at-most-once
    /// with no acknowledgement, and the push attempt is spawned as its own
    /// task whose outcome is observed only for subscription pruning.
    pub async fn route(&self, message: MessageResponse) {
        if let Some((conn_id, tx)) = self.presence.lookup(&message.receiver).await {
            debug!(
                "live delivery to {} on connection {}",
                message.receiver, conn_id
            );
            let _ = tx.send(ServerEvent::Message(message.clone()));
        }

        if let Some(push) = self.push.clone() {
            let db = self.db.clone();
            tokio::spawn(async move {
                notify_push(push, db, message).await;
            });
        }
    }
}

/// One push attempt. Failures are logged and swallowed; a gone/not-found
/// endpoint prunes the stored subscription so later attempts skip silently.
async fn notify_push(push: Arc<dyn PushTransport>, db: Arc<Database>, message: MessageResponse) {
    let receiver = message.receiver.clone();

    let lookup = {
        let db = db.clone();
        let receiver = receiver.clone();
        tokio::task::spawn_blocking(move || db.get_subscription(&receiver)).await
    };

    let stored = match lookup {
        Ok(Ok(Some(row))) => row.subscription,
        Ok(Ok(None)) => return,
        Ok(Err(e)) => {
            warn!("subscription lookup for {} failed: {}", receiver, e);
            return;
        }
        Err(e) => {
            warn!("subscription lookup task for {} failed: {}", receiver, e);
            return;
        }
    };

    let descriptor: serde_json::Value = match serde_json::from_str(&stored) {
        Ok(value) => value,
        Err(e) => {
            warn!("stored subscription for {} is not valid JSON: {}", receiver, e);
            return;
        }
    };

    let payload = serde_json::to_string(&PushNotification::for_message(&message)).unwrap();

    match push.send(&descriptor, &payload).await {
        Ok(()) => info!("push notification dispatched to {}", receiver),
        Err(e) => {
            warn!("push dispatch to {} failed: {}", receiver, e);
            if e.is_gone() {
                info!("pruning gone push subscription for {}", receiver);
                let prune = {
                    let receiver = receiver.clone();
                    tokio::task::spawn_blocking(move || db.delete_subscription(&receiver)).await
                };
                match prune {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!("failed to prune subscription for {}: {}", receiver, e),
                    Err(e) => warn!("prune task for {} failed: {}", receiver, e),
                }
            }
        }
    }
}
