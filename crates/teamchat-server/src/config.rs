use std::path::PathBuf;

use anyhow::{Context, Result};

use teamchat_ai::OpenAiConfig;
use teamchat_ai::openai::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL};

/// Server settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub openai: OpenAiConfig,
    pub knowledge_base: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = or("TEAMCHAT_PORT", "3000")
            .parse()
            .context("TEAMCHAT_PORT must be a port number")?;

        let knowledge_base = match or("TEAMCHAT_KNOWLEDGE_BASE", "on").to_ascii_lowercase().as_str() {
            "on" | "true" | "1" | "yes" => true,
            "off" | "false" | "0" | "no" => false,
            other => anyhow::bail!("TEAMCHAT_KNOWLEDGE_BASE must be on or off, got '{}'", other),
        };

        Ok(Self {
            host: or("TEAMCHAT_HOST", "0.0.0.0"),
            port,
            db_path: or("TEAMCHAT_DB_PATH", "teamchat.db").into(),
            openai: OpenAiConfig {
                api_key: or("OPENAI_API_KEY", ""),
                base_url: or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
                chat_model: or("TEAMCHAT_CHAT_MODEL", DEFAULT_CHAT_MODEL),
                embedding_model: or("TEAMCHAT_EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            },
            knowledge_base,
        })
    }
}
