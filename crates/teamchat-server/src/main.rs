mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use teamchat_ai::{OpenAiClient, Responder, SqliteStore};
use teamchat_api::state::AppStateInner;
use teamchat_gateway::dispatcher::Dispatcher;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamchat=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.openai.api_key.is_empty() {
        warn!("OPENAI_API_KEY is unset; AI replies will fail");
    }

    // Init database
    let db = Arc::new(teamchat_db::Database::open(&config.db_path)?);

    // AI responder
    let openai = Arc::new(OpenAiClient::new(config.openai.clone()));
    let store = Arc::new(SqliteStore::new(db.clone()));
    let mut responder = Responder::new(store.clone(), openai.clone(), openai);
    if config.knowledge_base {
        responder = responder.with_knowledge_base(store);
    } else {
        info!("Knowledge base disabled");
    }

    let state = Arc::new(AppStateInner {
        db,
        dispatcher: Dispatcher::new(),
        responder,
    });

    let app = teamchat_api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("TeamChat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
