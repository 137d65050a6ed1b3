use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use teamchat_types::api::SendMessageRequest;
use teamchat_types::events::GatewayEvent;

use crate::state::{AppState, run_db};

const MAX_LIMIT: u32 = 200;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    100
}

/// Most recent messages of a channel, oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let limit = query.limit.min(MAX_LIMIT);
    let messages = run_db(&state, move |db| db.recent_messages(&channel_id.to_string(), limit)).await?;
    Ok(Json(messages))
}

/// Insert a message and notify the channel's subscribers. `is_ai` is
/// derived from the author by the store.
pub async fn send_message(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.user_name.trim().is_empty() || req.content.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let message = run_db(&state, move |db| {
        db.insert_message(&channel_id.to_string(), &req.user_name, &req.content)
    })
    .await?;

    state.dispatcher.broadcast(GatewayEvent::MessageCreate(message.clone()));

    Ok((StatusCode::CREATED, Json(message)))
}
