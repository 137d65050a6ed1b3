use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Channels --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewChannel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewChannel {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: Some(description.to_string()),
        }
    }
}

/// Channels created when a client finds the store empty.
pub fn default_channels() -> Vec<NewChannel> {
    vec![
        NewChannel::new("general", "General discussion"),
        NewChannel::new("random", "Random chat"),
        NewChannel::new("ai-help", "Ask @Claude for help"),
    ]
}

// -- Messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub user_name: String,
    pub content: String,
}

// -- AI --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRespondRequest {
    pub message: String,
    pub channel_id: Uuid,
    pub channel_name: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiRespondResponse {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ai_request_uses_camel_case() {
        let req: AiRespondRequest = serde_json::from_value(serde_json::json!({
            "message": "@Claude hi",
            "channelId": "00000000-0000-0000-0000-000000000001",
            "channelName": "general",
            "userName": "You",
        }))
        .unwrap();
        assert_eq!(req.channel_name, "general");
        assert_eq!(req.user_name, "You");
        assert_eq!(req.channel_id.as_u128(), 1);
    }

    #[test]
    fn default_channels_are_seeded_in_order() {
        let names: Vec<_> = default_channels().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["general", "random", "ai-help"]);
    }
}
