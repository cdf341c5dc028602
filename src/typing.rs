//! Typing presence with lazy expiry.
//!
//! An indicator lives for [`TYPING_TTL_MS`] after the last `set_typing(true)`.
//! Nothing sweeps expired rows; reads simply filter them out and the next
//! upsert overwrites them. Debouncing keystrokes is the client's job.

use crate::storage::{ConversationId, Storage, StorageError, UserId, UserRow};

pub const TYPING_TTL_MS: u64 = 3_000;

/// Start or stop the caller's typing indicator. Returns `false` (and does
/// nothing) when the caller is not a member of the conversation.
pub fn set_typing(
    storage: &Storage,
    user: UserId,
    conversation_id: ConversationId,
    is_typing: bool,
    now: u64,
) -> Result<bool, StorageError> {
    if storage.get_membership(conversation_id, user)?.is_none() {
        return Ok(false);
    }
    if is_typing {
        storage.upsert_typing_indicator(conversation_id, user, now + TYPING_TTL_MS)?;
    } else {
        storage.delete_typing_indicator(conversation_id, user)?;
    }
    Ok(true)
}

/// Users other than `viewer` whose indicator has not expired at `now`.
pub fn list_typing(
    storage: &Storage,
    viewer: UserId,
    conversation_id: ConversationId,
    now: u64,
) -> Result<Vec<UserRow>, StorageError> {
    if storage.get_membership(conversation_id, viewer)?.is_none() {
        return Ok(Vec::new());
    }
    let mut users = Vec::new();
    for indicator in storage.list_live_typing_indicators(conversation_id, now)? {
        if indicator.user_id == viewer {
            continue;
        }
        if let Some(user) = storage.get_user(indicator.user_id)? {
            users.push(user);
        }
    }
    Ok(users)
}
