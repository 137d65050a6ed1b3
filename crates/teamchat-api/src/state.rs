use std::sync::Arc;

use axum::http::StatusCode;
use tracing::error;

use teamchat_ai::Responder;
use teamchat_db::{Database, DbError};
use teamchat_gateway::dispatcher::Dispatcher;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub dispatcher: Dispatcher,
    pub responder: Responder,
}

/// Run a blocking DB call off the async runtime, mapping failures to a status.
pub async fn run_db<T, F>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| db_status(&e))
}

fn db_status(e: &anyhow::Error) -> StatusCode {
    match e.downcast_ref::<DbError>() {
        Some(DbError::ChannelNotFound(_)) => StatusCode::NOT_FOUND,
        Some(DbError::DuplicateChannel(_)) => StatusCode::CONFLICT,
        None => {
            error!("Database error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
