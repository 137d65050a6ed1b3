//! Retrieval-augmented replies for the chat assistant.
//!
//! A [`Responder`] reads recent channel history, optionally looks up related
//! knowledge base articles, and asks a chat model for a reply. Each external
//! dependency sits behind a trait so the server wires real implementations
//! and tests wire fakes.

pub mod error;
pub mod openai;
pub mod prompt;
pub mod responder;
pub mod store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use teamchat_types::models::{DocumentMatch, Message};

pub use error::AiError;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use responder::Responder;
pub use store::SqliteStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError>;
}

/// Recent messages of a channel.
#[async_trait]
pub trait History: Send + Sync {
    /// Up to `limit` most recent messages, oldest first.
    async fn recent(&self, channel_id: Uuid, limit: u32) -> Result<Vec<Message>, AiError>;
}

/// Similarity index over knowledge base documents.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn search(&self, embedding: Vec<f32>, match_count: usize) -> Result<Vec<DocumentMatch>, AiError>;
}
