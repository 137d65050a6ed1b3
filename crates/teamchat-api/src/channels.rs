use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use teamchat_types::api::NewChannel;
use teamchat_types::events::GatewayEvent;

use crate::state::{AppState, run_db};

pub async fn list_channels(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let channels = run_db(&state, |db| db.list_channels()).await?;
    Ok(Json(channels))
}

/// Insert a batch of channels. The whole batch fails on a taken name.
pub async fn create_channels(
    State(state): State<AppState>,
    Json(req): Json<Vec<NewChannel>>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.is_empty() || req.iter().any(|c| c.name.trim().is_empty()) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let channels = run_db(&state, move |db| db.create_channels(&req)).await?;

    for channel in &channels {
        state.dispatcher.broadcast(GatewayEvent::ChannelCreate(channel.clone()));
    }

    Ok((StatusCode::CREATED, Json(channels)))
}
