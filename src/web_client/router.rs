//! Axum router construction.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::web_client::handlers;
use crate::web_client::state::SharedState;

/// Build the complete Axum router with all API routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health::health_handler))
        // Users API
        .route("/api/users", get(handlers::users::search_users_handler))
        .route("/api/users/sync", post(handlers::users::sync_identity_handler))
        .route("/api/users/online", post(handlers::users::set_online_handler))
        // Conversations API
        .route(
            "/api/conversations",
            get(handlers::conversations::list_conversations_handler),
        )
        .route(
            "/api/conversations/direct",
            post(handlers::conversations::direct_conversation_handler),
        )
        .route(
            "/api/conversations/:conversation_id/read",
            post(handlers::conversations::mark_read_handler),
        )
        .route(
            "/api/conversations/:conversation_id/messages",
            get(handlers::messages::list_messages_handler)
                .post(handlers::messages::send_message_handler),
        )
        .route(
            "/api/conversations/:conversation_id/typing",
            get(handlers::typing::list_typing_handler).post(handlers::typing::set_typing_handler),
        )
        // Groups API
        .route("/api/groups", post(handlers::groups::create_group_handler))
        .route(
            "/api/groups/:conversation_id",
            get(handlers::groups::get_group_handler),
        )
        .route(
            "/api/groups/:conversation_id/name",
            put(handlers::groups::rename_group_handler),
        )
        .route(
            "/api/groups/:conversation_id/members",
            post(handlers::groups::add_member_handler),
        )
        .route(
            "/api/groups/:conversation_id/members/:user_id",
            delete(handlers::groups::remove_member_handler),
        )
        .route(
            "/api/groups/:conversation_id/admins",
            post(handlers::groups::promote_handler),
        )
        .route(
            "/api/groups/:conversation_id/admins/:user_id",
            delete(handlers::groups::demote_handler),
        )
        .route(
            "/api/groups/:conversation_id/claim-admin",
            post(handlers::groups::claim_admin_handler),
        )
        // Messages API
        .route(
            "/api/messages/delete",
            post(handlers::messages::bulk_delete_handler),
        )
        .route(
            "/api/messages/:message_id",
            delete(handlers::messages::delete_message_handler),
        )
        .route(
            "/api/messages/:message_id/reactions",
            post(handlers::reactions::toggle_reaction_handler),
        )
        .with_state(state)
}
