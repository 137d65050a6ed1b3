use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use teamchat_types::api::{AiRespondRequest, NewChannel};
use teamchat_types::events::GatewayEvent;
use teamchat_types::models::{Channel, Message};

use crate::ClientError;

/// Everything the chat session needs from the server.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn list_channels(&self) -> Result<Vec<Channel>, ClientError>;

    async fn create_channels(&self, channels: &[NewChannel]) -> Result<Vec<Channel>, ClientError>;

    /// Up to `limit` most recent messages, oldest first.
    async fn recent_messages(&self, channel_id: Uuid, limit: u32) -> Result<Vec<Message>, ClientError>;

    async fn insert_message(&self, channel_id: Uuid, user_name: &str, content: &str) -> Result<Message, ClientError>;

    /// Ask the assistant endpoint for a reply.
    async fn ai_respond(&self, request: &AiRespondRequest) -> Result<String, ClientError>;

    /// Open a live feed of inserts for one channel.
    async fn subscribe(&self, channel_id: Uuid) -> Result<Subscription, ClientError>;
}

/// A live feed of gateway events. Dropping it tears the feed down.
pub struct Subscription {
    events: mpsc::Receiver<GatewayEvent>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(events: mpsc::Receiver<GatewayEvent>, task: Option<JoinHandle<()>>) -> Self {
        Self { events, task }
    }

    /// Next event, or `None` once the feed has closed.
    pub async fn next(&mut self) -> Option<GatewayEvent> {
        self.events.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
