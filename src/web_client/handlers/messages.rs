//! Timeline handlers: list, send and soft-delete.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use serde::Deserialize;

use crate::storage::{ConversationId, MessageId};
use crate::web_client::state::SharedState;
use crate::web_client::utils::{bearer_token, respond, respond_with};

pub async fn list_messages_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<ConversationId>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(st.chat.list_messages(token.as_deref(), conversation_id))
}

#[derive(Deserialize)]
pub struct SendRequest {
    content: String,
    #[serde(default)]
    reply_to_id: Option<MessageId>,
}

pub async fn send_message_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<ConversationId>,
    axum::Json(req): axum::Json<SendRequest>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond_with(
        StatusCode::CREATED,
        st.chat
            .send(token.as_deref(), conversation_id, &req.content, req.reply_to_id)
            .map(|id| serde_json::json!({ "message_id": id })),
    )
}

pub async fn delete_message_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(message_id): Path<MessageId>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .soft_delete(token.as_deref(), message_id)
            .map(|()| serde_json::json!({ "status": "deleted" })),
    )
}

#[derive(Deserialize)]
pub struct BulkDeleteRequest {
    message_ids: Vec<MessageId>,
}

pub async fn bulk_delete_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<BulkDeleteRequest>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .bulk_soft_delete(token.as_deref(), &req.message_ids)
            .map(|deleted| serde_json::json!({ "deleted": deleted })),
    )
}
