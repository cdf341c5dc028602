//! Caller-shaped projections.
//!
//! Everything here is computed per request from stored rows and never
//! written back: `is_me`, `has_reacted`, unread counts and effective admin
//! flags all depend on who is asking.

use serde::Serialize;

use crate::storage::{
    ConversationId, MessageId, MessageRow, ReactionRow, UserId, UserRow,
};

/// Content shown in place of a soft-deleted message.
pub const DELETED_PLACEHOLDER: &str = "This message was deleted";

/// Sender name used when the sender record cannot be resolved.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// Public fields of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub display_name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
    pub is_online: bool,
}

impl From<&UserRow> for UserView {
    fn from(u: &UserRow) -> Self {
        Self {
            id: u.id,
            display_name: u.display_name.clone(),
            email: u.email.clone(),
            avatar_url: u.avatar_url.clone(),
            is_online: u.is_online,
        }
    }
}

/// A group member with their (possibly derived) admin flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberView {
    pub id: UserId,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_online: bool,
    pub is_admin: bool,
}

impl MemberView {
    pub fn new(user: &UserRow, is_admin: bool) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            is_online: user.is_online,
            is_admin,
        }
    }
}

/// The last message of a conversation, as shown in the inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastMessagePreview {
    pub id: MessageId,
    pub sender_id: UserId,
    pub content: String,
    pub is_deleted: bool,
    pub created_at: u64,
}

impl From<&MessageRow> for LastMessagePreview {
    fn from(m: &MessageRow) -> Self {
        Self {
            id: m.id,
            sender_id: m.sender_id,
            content: m.content.clone(),
            is_deleted: m.is_deleted,
            created_at: m.created_at,
        }
    }
}

/// One inbox entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub is_group: bool,
    pub group_name: Option<String>,
    /// The other participant of a direct conversation.
    pub other_user: Option<UserView>,
    /// Members of a group, empty for direct conversations.
    pub group_members: Vec<MemberView>,
    pub member_count: usize,
    pub last_message: Option<LastMessagePreview>,
    pub unread_count: u32,
    pub created_at: u64,
}

impl ConversationSummary {
    /// Inbox ordering key: last activity, newest first.
    pub fn activity_at(&self) -> u64 {
        self.last_message
            .as_ref()
            .map(|m| m.created_at)
            .unwrap_or(self.created_at)
    }
}

/// Admin and membership picture of a group for one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupDetails {
    pub conversation_id: ConversationId,
    pub group_name: Option<String>,
    pub am_i_admin: bool,
    pub members: Vec<MemberView>,
    /// True while the group has no explicit admin.
    pub needs_admin_claim: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionSummary {
    pub emoji: String,
    pub count: u32,
    pub has_reacted: bool,
}

/// Preview of the message a reply quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyPreview {
    pub id: MessageId,
    pub sender_name: String,
    pub content: String,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageView {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub sender_avatar_url: Option<String>,
    pub content: String,
    pub is_deleted: bool,
    pub is_me: bool,
    pub read_count: usize,
    pub reactions: Vec<ReactionSummary>,
    pub reply_to: Option<ReplyPreview>,
    pub created_at: u64,
}

/// Display name for a possibly-missing sender.
pub fn sender_name(sender: Option<&UserRow>) -> String {
    sender
        .and_then(|u| u.display_name.clone())
        .unwrap_or_else(|| UNKNOWN_SENDER.to_string())
}

/// Fold a message's reaction rows into one entry per emoji, in the order each
/// emoji first appeared.
pub fn fold_reactions(rows: &[ReactionRow], viewer: Option<UserId>) -> Vec<ReactionSummary> {
    let mut summaries: Vec<ReactionSummary> = Vec::new();
    for r in rows {
        let idx = match summaries.iter().position(|s| s.emoji == r.emoji) {
            Some(idx) => idx,
            None => {
                summaries.push(ReactionSummary {
                    emoji: r.emoji.clone(),
                    count: 0,
                    has_reacted: false,
                });
                summaries.len() - 1
            }
        };
        let entry = &mut summaries[idx];
        entry.count += 1;
        if viewer == Some(r.user_id) {
            entry.has_reacted = true;
        }
    }
    summaries
}

/// Preview of a quoted message; deleted quotes show the placeholder.
pub fn reply_preview(quoted: &MessageRow, quoted_sender: Option<&UserRow>) -> ReplyPreview {
    let content = if quoted.is_deleted {
        DELETED_PLACEHOLDER.to_string()
    } else {
        quoted.content.clone()
    };
    ReplyPreview {
        id: quoted.id,
        sender_name: sender_name(quoted_sender),
        content,
        is_deleted: quoted.is_deleted,
    }
}

/// Messages `viewer` has not sent and not read.
pub fn unread_count(messages: &[MessageRow], viewer: UserId) -> u32 {
    messages
        .iter()
        .filter(|m| m.sender_id != viewer && !m.read_by.contains(viewer))
        .count() as u32
}
