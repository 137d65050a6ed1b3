use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use teamchat_db::Database;
use teamchat_types::models::{DocumentMatch, Message};

use crate::{AiError, History, KnowledgeBase};

/// History and knowledge base backed by the chat database.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

async fn blocking<T, F>(f: F) -> Result<T, AiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AiError::Store(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
        .map_err(AiError::Store)
}

#[async_trait]
impl History for SqliteStore {
    async fn recent(&self, channel_id: Uuid, limit: u32) -> Result<Vec<Message>, AiError> {
        let db = self.db.clone();
        blocking(move || db.recent_messages(&channel_id.to_string(), limit)).await
    }
}

#[async_trait]
impl KnowledgeBase for SqliteStore {
    async fn search(&self, embedding: Vec<f32>, match_count: usize) -> Result<Vec<DocumentMatch>, AiError> {
        let db = self.db.clone();
        blocking(move || db.match_documents(&embedding, match_count)).await
    }
}
