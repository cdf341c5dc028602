//! Group management handlers.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::storage::{ConversationId, UserId};
use crate::web_client::state::SharedState;
use crate::web_client::utils::{api_error, bearer_token, chat_error, respond, respond_with};

fn ok() -> serde_json::Value {
    serde_json::json!({ "status": "ok" })
}

#[derive(Deserialize)]
pub struct CreateGroupRequest {
    name: String,
    #[serde(default)]
    member_ids: Vec<UserId>,
}

pub async fn create_group_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<CreateGroupRequest>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond_with(
        StatusCode::CREATED,
        st.chat
            .create_group(token.as_deref(), &req.name, &req.member_ids)
            .map(|id| serde_json::json!({ "conversation_id": id })),
    )
}

pub async fn get_group_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<ConversationId>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    match st.chat.get_group_details(token.as_deref(), conversation_id) {
        Ok(Some(details)) => (StatusCode::OK, axum::Json(details)).into_response(),
        Ok(None) => api_error(StatusCode::NOT_FOUND, "group not found"),
        Err(e) => chat_error(e),
    }
}

#[derive(Deserialize)]
pub struct RenameRequest {
    name: String,
}

pub async fn rename_group_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<ConversationId>,
    axum::Json(req): axum::Json<RenameRequest>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .rename_group(token.as_deref(), conversation_id, &req.name)
            .map(|()| ok()),
    )
}

#[derive(Deserialize)]
pub struct MemberRequest {
    user_id: UserId,
}

pub async fn add_member_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<ConversationId>,
    axum::Json(req): axum::Json<MemberRequest>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .add_member(token.as_deref(), conversation_id, req.user_id)
            .map(|()| ok()),
    )
}

pub async fn remove_member_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path((conversation_id, user_id)): Path<(ConversationId, UserId)>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .remove_member(token.as_deref(), conversation_id, user_id)
            .map(|()| ok()),
    )
}

pub async fn promote_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<ConversationId>,
    axum::Json(req): axum::Json<MemberRequest>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .promote_to_admin(token.as_deref(), conversation_id, req.user_id)
            .map(|()| ok()),
    )
}

pub async fn demote_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path((conversation_id, user_id)): Path<(ConversationId, UserId)>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .demote_admin(token.as_deref(), conversation_id, user_id)
            .map(|()| ok()),
    )
}

pub async fn claim_admin_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<ConversationId>,
) -> Response {
    let token = bearer_token(&headers);
    let st = state.lock().await;
    respond(
        st.chat
            .claim_admin(token.as_deref(), conversation_id)
            .map(|()| ok()),
    )
}
