//! Direct-conversation resolution and the caller's inbox.

use std::collections::BTreeSet;

use crate::error::{ChatError, ChatResult};
use crate::groups::admin_flags;
use crate::storage::{direct_key, ConversationId, Storage, StorageError, UserId, UserRow};
use crate::views::{self, ConversationSummary, LastMessagePreview, MemberView, UserView};

/// Return the direct conversation between `caller` and `other`, creating it
/// (with both memberships) if none exists.
///
/// The canonical pair key makes the lookup O(1). Conversations created before
/// the key existed are found by intersecting both users' memberships, oldest
/// conversation first, and get their key backfilled.
pub fn get_or_create_direct(
    storage: &Storage,
    caller: UserId,
    other: UserId,
    now: u64,
) -> ChatResult<ConversationId> {
    if caller == other {
        return Err(ChatError::invalid("cannot message yourself"));
    }
    if storage.get_user(other)?.is_none() {
        return Err(ChatError::not_found(format!("user {other}")));
    }

    let key = direct_key(caller, other);
    if let Some(conv) = storage.find_conversation_by_direct_key(&key)? {
        return Ok(conv.id);
    }

    if let Some(id) = find_unkeyed_direct(storage, caller, other)? {
        storage.set_direct_key(id, &key)?;
        tracing::debug!(conversation = %id, "backfilled direct key {key}");
        return Ok(id);
    }

    let id = storage.insert_conversation(false, None, Some(&key), now)?;
    storage.insert_membership(id, caller, false, now)?;
    storage.insert_membership(id, other, false, now)?;
    Ok(id)
}

fn find_unkeyed_direct(
    storage: &Storage,
    a: UserId,
    b: UserId,
) -> Result<Option<ConversationId>, StorageError> {
    let conversations_of = |user: UserId| -> Result<BTreeSet<ConversationId>, StorageError> {
        Ok(storage
            .list_user_memberships(user)?
            .into_iter()
            .map(|m| m.conversation_id)
            .collect())
    };
    let mine = conversations_of(a)?;
    let theirs = conversations_of(b)?;

    for id in mine.intersection(&theirs) {
        if let Some(conv) = storage.get_conversation(*id)? {
            if !conv.is_group && conv.direct_key.is_none() {
                return Ok(Some(conv.id));
            }
        }
    }
    Ok(None)
}

/// Every conversation `caller` belongs to, most recently active first.
pub fn list_my_conversations(
    storage: &Storage,
    caller: &UserRow,
) -> Result<Vec<ConversationSummary>, StorageError> {
    let mut summaries = Vec::new();

    for membership in storage.list_user_memberships(caller.id)? {
        let Some(conv) = storage.get_conversation(membership.conversation_id)? else {
            continue;
        };
        let members = storage.list_conversation_members(conv.id)?;

        let mut other_user = None;
        let mut group_members = Vec::new();
        if conv.is_group {
            // Same flags as group details, derived admin included.
            for (m, is_admin) in admin_flags(&members) {
                if let Some(user) = storage.get_user(m.user_id)? {
                    group_members.push(MemberView::new(&user, is_admin));
                }
            }
        } else if let Some(other) = members.iter().find(|m| m.user_id != caller.id) {
            other_user = storage.get_user(other.user_id)?.as_ref().map(UserView::from);
        }

        let last_message = match conv.last_message_id {
            Some(id) => storage.get_message(id)?.as_ref().map(LastMessagePreview::from),
            None => None,
        };
        let messages = storage.list_conversation_messages(conv.id)?;

        summaries.push(ConversationSummary {
            id: conv.id,
            is_group: conv.is_group,
            group_name: conv.group_name,
            other_user,
            group_members,
            member_count: members.len(),
            last_message,
            unread_count: views::unread_count(&messages, caller.id),
            created_at: conv.created_at,
        });
    }

    summaries.sort_by(|a, b| {
        b.activity_at()
            .cmp(&a.activity_at())
            .then_with(|| b.id.cmp(&a.id))
    });
    Ok(summaries)
}
