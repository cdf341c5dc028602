//! The message timeline: send, list, soft-delete, reactions, read receipts.

use std::collections::HashMap;

use crate::error::{ChatError, ChatResult};
use crate::storage::{ConversationId, MessageId, Storage, StorageError, UserId, UserRow};
use crate::views::{self, MessageView, DELETED_PLACEHOLDER};

/// Append a message and move the conversation's last-message pointer to it.
///
/// `reply_to` is stored as given; it is resolved only when the timeline is read.
pub fn send(
    storage: &Storage,
    sender: UserId,
    conversation_id: ConversationId,
    content: &str,
    reply_to: Option<MessageId>,
    now: u64,
) -> ChatResult<MessageId> {
    if storage.get_membership(conversation_id, sender)?.is_none() {
        return Err(ChatError::forbidden("not a member of this conversation"));
    }
    if content.trim().is_empty() {
        return Err(ChatError::invalid("message cannot be empty"));
    }
    let id = storage.insert_message(conversation_id, sender, content, reply_to, now)?;
    storage.set_last_message(conversation_id, id)?;
    Ok(id)
}

/// The full timeline, oldest first, shaped for `viewer`. Non-members see nothing.
pub fn list_messages(
    storage: &Storage,
    viewer: &UserRow,
    conversation_id: ConversationId,
) -> Result<Vec<MessageView>, StorageError> {
    if storage.get_membership(conversation_id, viewer.id)?.is_none() {
        return Ok(Vec::new());
    }

    let messages = storage.list_conversation_messages(conversation_id)?;
    let mut users: HashMap<UserId, Option<UserRow>> = HashMap::new();
    let mut lookup = |id: UserId| -> Result<Option<UserRow>, StorageError> {
        if let Some(cached) = users.get(&id) {
            return Ok(cached.clone());
        }
        let user = storage.get_user(id)?;
        users.insert(id, user.clone());
        Ok(user)
    };

    let mut result = Vec::with_capacity(messages.len());
    for m in &messages {
        let sender = lookup(m.sender_id)?;
        let reactions = storage.list_reactions(m.id)?;

        // Quotes only resolve inside the same conversation.
        let reply_to = match m.reply_to_id {
            Some(quoted_id) => match storage.get_message(quoted_id)? {
                Some(quoted) if quoted.conversation_id == conversation_id => {
                    let quoted_sender = lookup(quoted.sender_id)?;
                    Some(views::reply_preview(&quoted, quoted_sender.as_ref()))
                }
                _ => None,
            },
            None => None,
        };

        result.push(MessageView {
            id: m.id,
            conversation_id: m.conversation_id,
            sender_id: m.sender_id,
            sender_name: views::sender_name(sender.as_ref()),
            sender_avatar_url: sender.as_ref().and_then(|u| u.avatar_url.clone()),
            content: m.content.clone(),
            is_deleted: m.is_deleted,
            is_me: m.sender_id == viewer.id,
            read_count: m.read_by.len(),
            reactions: views::fold_reactions(&reactions, Some(viewer.id)),
            reply_to,
            created_at: m.created_at,
        });
    }
    Ok(result)
}

/// Replace the content of the caller's own message with the placeholder.
/// The row, its id and timestamp stay addressable.
pub fn soft_delete(storage: &Storage, caller: UserId, message_id: MessageId) -> ChatResult<()> {
    let message = storage
        .get_message(message_id)?
        .ok_or_else(|| ChatError::not_found(format!("message {message_id}")))?;
    if message.sender_id != caller {
        return Err(ChatError::forbidden("can only delete your own messages"));
    }
    storage.soft_delete_message(message_id, DELETED_PLACEHOLDER)?;
    Ok(())
}

/// Soft-delete each listed message the caller sent, skipping ids that are
/// missing, foreign or already deleted. Returns how many were deleted.
pub fn bulk_soft_delete(
    storage: &Storage,
    caller: UserId,
    message_ids: &[MessageId],
) -> Result<usize, StorageError> {
    let mut deleted = 0;
    for id in message_ids {
        match storage.get_message(*id)? {
            Some(m) if m.sender_id == caller && !m.is_deleted => {
                if storage.soft_delete_message(*id, DELETED_PLACEHOLDER)? {
                    deleted += 1;
                }
            }
            _ => {}
        }
    }
    Ok(deleted)
}

/// Add the caller's `emoji` reaction, or remove it if already present.
/// Returns whether the reaction exists afterwards.
pub fn toggle_reaction(
    storage: &Storage,
    caller: UserId,
    message_id: MessageId,
    emoji: &str,
    now: u64,
) -> ChatResult<bool> {
    let emoji = emoji.trim();
    if emoji.is_empty() {
        return Err(ChatError::invalid("emoji cannot be empty"));
    }
    let message = storage
        .get_message(message_id)?
        .ok_or_else(|| ChatError::not_found(format!("message {message_id}")))?;
    if storage
        .get_membership(message.conversation_id, caller)?
        .is_none()
    {
        return Err(ChatError::forbidden("not a member of this conversation"));
    }

    match storage.find_reaction(message_id, caller, emoji)? {
        Some(existing) => {
            storage.delete_reaction(existing.id)?;
            Ok(false)
        }
        None => {
            storage.insert_reaction(message_id, caller, emoji, now)?;
            Ok(true)
        }
    }
}

/// Add the caller to `read_by` of every message in the conversation they did
/// not send and have not read. Returns how many messages changed.
pub fn mark_as_read(
    storage: &Storage,
    reader: UserId,
    conversation_id: ConversationId,
) -> Result<usize, StorageError> {
    if storage.get_membership(conversation_id, reader)?.is_none() {
        return Ok(0);
    }
    let mut marked = 0;
    for mut m in storage.list_conversation_messages(conversation_id)? {
        if m.read_by.record(reader, m.sender_id) {
            storage.update_read_by(m.id, &m.read_by)?;
            marked += 1;
        }
    }
    Ok(marked)
}
