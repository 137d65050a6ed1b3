use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Channel, Message};

/// Change notifications sent over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms the subscription
    Ready { channel_id: Uuid },

    /// A message row was inserted
    MessageCreate(Message),

    /// A channel row was inserted
    ChannelCreate(Channel),
}

impl GatewayEvent {
    /// Returns the channel_id if this event is scoped to a specific channel.
    /// Events that return `None` are global and should be delivered to all clients.
    pub fn channel_id(&self) -> Option<Uuid> {
        match self {
            Self::Ready { channel_id } => Some(*channel_id),
            Self::MessageCreate(message) => Some(message.channel_id),
            Self::ChannelCreate(_) => None,
        }
    }
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Receive inserts for one channel. Replaces any previous subscription.
    Subscribe { channel_id: Uuid },
}
