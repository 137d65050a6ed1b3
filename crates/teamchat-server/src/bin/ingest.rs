//! Load text files into the knowledge base: `teamchat-ingest <file>...`
//!
//! Each file becomes one document titled after its file stem.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;

use teamchat_ai::{Embedder, OpenAiClient, OpenAiConfig};
use teamchat_ai::openai::{DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL};
use teamchat_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamchat=info".into()),
        )
        .init();

    let files: Vec<String> = std::env::args().skip(1).collect();
    if files.is_empty() {
        bail!("usage: teamchat-ingest <file>...");
    }

    let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;
    let mut openai = OpenAiConfig::new(api_key)
        .with_base_url(std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into()));
    openai.embedding_model =
        std::env::var("TEAMCHAT_EMBEDDING_MODEL").unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.into());
    let embedder = OpenAiClient::new(openai);

    let db_path = std::env::var("TEAMCHAT_DB_PATH").unwrap_or_else(|_| "teamchat.db".into());
    let db = Arc::new(Database::open(Path::new(&db_path))?);

    for file in &files {
        let path = Path::new(file);
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.clone());

        let embedding = embedder.embed(&content).await?;
        let db = db.clone();
        let doc_title = title.clone();
        let id = tokio::task::spawn_blocking(move || db.insert_document(&doc_title, &content, &embedding))
            .await??;

        info!("Ingested '{}' as document {}", title, id);
    }

    Ok(())
}
