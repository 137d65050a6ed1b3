use tracing::{error, info, warn};
use uuid::Uuid;

use teamchat_types::ASSISTANT_NAME;
use teamchat_types::api::{AiRespondRequest, default_channels};
use teamchat_types::events::GatewayEvent;
use teamchat_types::mention::mentions_assistant;
use teamchat_types::models::{Channel, Message};

use crate::{ChatBackend, ClientError, Subscription};

/// Messages loaded when a channel becomes active.
pub const HISTORY_LIMIT: u32 = 100;

pub const DEFAULT_USER: &str = "You";

/// What a send did. Rows reach local state through the live feed, not here.
#[derive(Debug, Default)]
pub struct SendOutcome {
    pub user_message: Option<Message>,
    pub ai_reply: Option<Message>,
}

/// Client-side chat state: channels, the active channel's messages and its
/// live feed.
pub struct ChatSession<B> {
    backend: B,
    channels: Vec<Channel>,
    active: Option<Channel>,
    messages: Vec<Message>,
    user_name: String,
    /// Set while an assistant reply is owed for the last posted message.
    pending_reply: Option<AiRespondRequest>,
    subscription: Option<Subscription>,
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(backend: B, user_name: impl Into<String>) -> Self {
        Self {
            backend,
            channels: Vec::new(),
            active: None,
            messages: Vec::new(),
            user_name: user_name.into(),
            pending_reply: None,
            subscription: None,
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn active_channel(&self) -> Option<&Channel> {
        self.active.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn set_user_name(&mut self, user_name: impl Into<String>) {
        self.user_name = user_name.into();
    }

    pub fn is_ai_thinking(&self) -> bool {
        self.pending_reply.is_some()
    }

    /// Load channels, seeding the defaults into an empty store, and
    /// activate the first one.
    pub async fn load_channels(&mut self) -> Result<(), ClientError> {
        let mut channels = self.backend.list_channels().await?;

        if channels.is_empty() {
            channels = match self.backend.create_channels(&default_channels()).await {
                Ok(created) => {
                    info!("Seeded {} default channels", created.len());
                    created
                }
                // Another client seeded first
                Err(e) if e.is_conflict() => self.backend.list_channels().await?,
                Err(e) => return Err(e),
            };
        }

        self.channels = channels;
        if let Some(first) = self.channels.first().map(|c| c.id) {
            self.select_channel(first).await?;
        }
        Ok(())
    }

    /// Make a channel active: open a live feed scoped to it, load its recent
    /// messages, then replace the previous channel and feed. On error the
    /// previous channel stays active with its feed.
    pub async fn select_channel(&mut self, channel_id: Uuid) -> Result<(), ClientError> {
        let channel = self
            .channels
            .iter()
            .find(|c| c.id == channel_id)
            .cloned()
            .ok_or_else(|| ClientError::Status {
                status: 404,
                body: format!("unknown channel {}", channel_id),
            })?;

        // Feed first, so nothing inserted after the history read is missed
        let subscription = self.backend.subscribe(channel_id).await?;
        let messages = self.backend.recent_messages(channel_id, HISTORY_LIMIT).await?;

        self.subscription = Some(subscription);
        self.active = Some(channel);
        self.messages = messages;
        Ok(())
    }

    /// Channel lookup by display name, with or without a leading `#`.
    pub fn find_channel(&self, name: &str) -> Option<&Channel> {
        let name = name.trim_start_matches('#');
        self.channels.iter().find(|c| c.name == name)
    }

    /// Wait for the next live event and fold it into local state.
    /// Returns `None` when there is no feed or it has closed.
    pub async fn next_event(&mut self) -> Option<GatewayEvent> {
        let event = self.subscription.as_mut()?.next().await;
        match event {
            Some(event) => {
                self.apply_event(&event);
                Some(event)
            }
            None => {
                warn!("Live feed closed");
                self.subscription = None;
                None
            }
        }
    }

    /// Fold a live event into local state. Inserts for other channels are ignored.
    pub fn apply_event(&mut self, event: &GatewayEvent) {
        match event {
            GatewayEvent::MessageCreate(message) => {
                if self.active.as_ref().is_some_and(|c| c.id == message.channel_id) {
                    self.messages.push(message.clone());
                }
            }
            GatewayEvent::ChannelCreate(channel) => {
                if !self.channels.iter().any(|c| c.id == channel.id) {
                    self.channels.push(channel.clone());
                }
            }
            GatewayEvent::Ready { .. } => {}
        }
    }

    /// Post a message to the active channel. When it mentions the assistant,
    /// ask for a reply and post that too. Assistant failures are logged, not
    /// returned.
    pub async fn send_message(&mut self, input: &str) -> Result<SendOutcome, ClientError> {
        let user_message = self.post_message(input).await?;
        let ai_reply = self.answer_pending().await;
        Ok(SendOutcome { user_message, ai_reply })
    }

    /// First half of a send: post the user's row. A mention leaves an
    /// assistant reply pending, visible through `is_ai_thinking`.
    pub async fn post_message(&mut self, input: &str) -> Result<Option<Message>, ClientError> {
        let content = input.trim();
        let Some(channel) = self.active.clone() else {
            return Ok(None);
        };
        if content.is_empty() {
            return Ok(None);
        }

        let message = self.backend.insert_message(channel.id, &self.user_name, content).await?;

        if mentions_assistant(content) {
            self.pending_reply = Some(AiRespondRequest {
                message: content.to_string(),
                channel_id: channel.id,
                channel_name: channel.name,
                user_name: self.user_name.clone(),
            });
        }
        Ok(Some(message))
    }

    /// Second half of a send: fetch and post the pending assistant reply,
    /// if any. The thinking flag is cleared whatever the outcome.
    pub async fn answer_pending(&mut self) -> Option<Message> {
        let request = self.pending_reply.clone()?;
        let reply = self.ask_assistant(&request).await;
        self.pending_reply = None;
        reply
    }

    async fn ask_assistant(&self, request: &AiRespondRequest) -> Option<Message> {
        let reply = match self.backend.ai_respond(request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("AI response error: {}", e);
                return None;
            }
        };

        match self.backend.insert_message(request.channel_id, ASSISTANT_NAME, &reply).await {
            Ok(message) => Some(message),
            Err(e) => {
                error!("Failed to post AI reply: {}", e);
                None
            }
        }
    }
}
