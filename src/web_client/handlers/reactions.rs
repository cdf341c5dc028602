//! Reaction toggle handler.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;

use crate::storage::MessageId;
use crate::web_client::state::SharedState;
use crate::web_client::utils::{bearer_token, respond};

#[derive(Deserialize)]
pub struct ReactRequest {
    emoji: String,
}

pub async fn toggle_reaction_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(message_id): Path<MessageId>,
    axum::Json(req): axum::Json<ReactRequest>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .toggle_reaction(token.as_deref(), message_id, &req.emoji)
            .map(|reacted| serde_json::json!({ "reacted": reacted })),
    )
}
