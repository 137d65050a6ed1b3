use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ASSISTANT_NAME;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A chat message row. `is_ai` is derived from the author and is true
/// exactly when the author is the assistant identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub user_name: String,
    pub content: String,
    pub is_ai: bool,
    pub created_at: DateTime<Utc>,
}

/// A knowledge base article returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMatch {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub similarity: f32,
}

pub fn is_assistant(user_name: &str) -> bool {
    user_name == ASSISTANT_NAME
}
