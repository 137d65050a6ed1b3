use teamchat_types::models::{DocumentMatch, Message};

/// `author: content` lines in the order given.
pub fn conversation_context(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.user_name, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Empty when nothing matched, otherwise a headed list of articles.
pub fn knowledge_context(docs: &[DocumentMatch]) -> String {
    if docs.is_empty() {
        return String::new();
    }

    let articles = docs
        .iter()
        .map(|d| format!("- {}: {}", d.title, d.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\nRelevant knowledge base articles:\n{}", articles)
}

pub fn system_prompt(channel_name: &str, knowledge: &str, conversation: &str) -> String {
    format!(
        "You are Claude, a helpful AI assistant in a team chat app similar to Slack. You're chatting in the #{channel_name} channel.

Your personality:
- Friendly and helpful, but concise
- Use casual language appropriate for chat
- Keep responses under 200 words unless asked for detail
- Use emoji occasionally but don't overdo it
- If you don't know something, say so
- You can help with coding, writing, brainstorming, and general questions

{knowledge}

Recent conversation:
{conversation}"
    )
}

pub fn user_turn(user_name: &str, message: &str) -> String {
    format!("{} says: {}", user_name, message)
}
