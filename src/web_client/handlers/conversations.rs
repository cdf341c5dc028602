//! Inbox, direct-conversation resolution and read receipts.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;

use crate::storage::{ConversationId, UserId};
use crate::web_client::state::SharedState;
use crate::web_client::utils::{bearer_token, respond};

pub async fn list_conversations_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(st.chat.list_my_conversations(token.as_deref()))
}

#[derive(Deserialize)]
pub struct DirectRequest {
    other_user_id: UserId,
}

pub async fn direct_conversation_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<DirectRequest>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .resolve_or_create_direct_conversation(token.as_deref(), req.other_user_id)
            .map(|id| serde_json::json!({ "conversation_id": id })),
    )
}

pub async fn mark_read_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<ConversationId>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .mark_as_read(token.as_deref(), conversation_id)
            .map(|marked| serde_json::json!({ "marked": marked })),
    )
}
