use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use teamchat_types::api::{AiRespondRequest, AiRespondResponse, ErrorResponse};

use crate::state::AppState;

const GENERIC_FAILURE: &str = "Failed to generate response";

/// Generate an assistant reply for a message. Every failure past request
/// parsing is reported as the same opaque 500.
pub async fn ai_respond(
    State(state): State<AppState>,
    body: Result<Json<AiRespondRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => {
            info!("Rejected ai-respond body: {}", rejection);
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(rejection.body_text()))).into_response();
        }
    };

    match state.responder.respond(&req).await {
        Ok(response) => Json(AiRespondResponse { response }).into_response(),
        Err(e) => {
            error!("AI response error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(GENERIC_FAILURE))).into_response()
        }
    }
}
