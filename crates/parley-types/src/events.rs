use serde::{Deserialize, Serialize};

use crate::api::MessageResponse;

/// Events sent FROM server TO client over the live channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerEvent {
    /// Sent once on accept, prompting the client to announce its username.
    Join,

    /// A newly persisted message addressed to this client.
    Message(MessageResponse),
}

/// Commands sent FROM client TO server over the live channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientCommand {
    /// Announce identity. The connection is deliverable from this point on.
    Join { username: String },
}

/// Payload handed to the push transport when the receiver may be away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    pub data: PushNotificationData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushNotificationData {
    pub sender: String,
    pub receiver: String,
}

impl PushNotification {
    pub fn for_message(msg: &MessageResponse) -> Self {
        Self {
            title: format!("New message from {}", msg.sender),
            body: msg.message.clone(),
            data: PushNotificationData {
                sender: msg.sender.clone(),
                receiver: msg.receiver.clone(),
            },
        }
    }
}
