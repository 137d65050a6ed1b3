use std::sync::Arc;

use tracing::{debug, warn};

use teamchat_types::api::AiRespondRequest;

use crate::prompt;
use crate::{AiError, ChatMessage, ChatModel, CompletionRequest, Embedder, History, KnowledgeBase};

#[derive(Debug, Clone)]
pub struct ResponderSettings {
    /// Prior messages included as conversation context.
    pub history_limit: u32,
    /// Knowledge base articles requested per reply.
    pub match_count: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self {
            history_limit: 10,
            match_count: 3,
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

/// Generates assistant replies from channel history, the knowledge base
/// and a chat model.
#[derive(Clone)]
pub struct Responder {
    history: Arc<dyn History>,
    chat: Arc<dyn ChatModel>,
    embedder: Arc<dyn Embedder>,
    knowledge: Option<Arc<dyn KnowledgeBase>>,
    settings: ResponderSettings,
}

impl Responder {
    pub fn new(history: Arc<dyn History>, chat: Arc<dyn ChatModel>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            history,
            chat,
            embedder,
            knowledge: None,
            settings: ResponderSettings::default(),
        }
    }

    pub fn with_knowledge_base(mut self, knowledge: Arc<dyn KnowledgeBase>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    /// Generate a reply. History and completion failures are returned;
    /// knowledge base failures only drop the extra context.
    pub async fn respond(&self, req: &AiRespondRequest) -> Result<String, AiError> {
        let recent = self.history.recent(req.channel_id, self.settings.history_limit).await?;
        let conversation = prompt::conversation_context(&recent);

        let knowledge = match self.knowledge_context(&req.message).await {
            Ok(context) => context,
            Err(e) => {
                warn!("Knowledge base not available: {}", e);
                String::new()
            }
        };

        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(prompt::system_prompt(&req.channel_name, &knowledge, &conversation)),
                ChatMessage::user(prompt::user_turn(&req.user_name, &req.message)),
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        self.chat.complete(request).await
    }

    async fn knowledge_context(&self, query: &str) -> Result<String, AiError> {
        let Some(knowledge) = &self.knowledge else {
            return Ok(String::new());
        };

        let embedding = self.embedder.embed(query).await?;
        let docs = knowledge.search(embedding, self.settings.match_count).await?;
        debug!("Knowledge base matched {} documents", docs.len());
        Ok(prompt::knowledge_context(&docs))
    }
}
