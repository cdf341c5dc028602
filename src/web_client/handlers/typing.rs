//! Typing indicator handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;

use crate::storage::ConversationId;
use crate::web_client::state::SharedState;
use crate::web_client::utils::{bearer_token, respond};

#[derive(Deserialize)]
pub struct TypingRequest {
    is_typing: bool,
}

pub async fn set_typing_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<ConversationId>,
    axum::Json(req): axum::Json<TypingRequest>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .set_typing(token.as_deref(), conversation_id, req.is_typing)
            .map(|()| serde_json::json!({ "status": "ok" })),
    )
}

pub async fn list_typing_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<ConversationId>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(st.chat.list_typing(token.as_deref(), conversation_id))
}
