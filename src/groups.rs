//! Group lifecycle and admin governance.
//!
//! Admin rights live on memberships. Groups created before admin tracking
//! have no admin membership at all; for those the earliest member is the
//! *effective* admin, derived on every read and persisted only through a
//! one-time [`claim_admin`].

use std::collections::BTreeSet;

use crate::error::{ChatError, ChatResult};
use crate::storage::{ConversationId, ConversationRow, MembershipRow, Storage, StorageError, UserId};
use crate::views::{GroupDetails, MemberView};

// ---------------------------------------------------------------------------
// Admin derivation
// ---------------------------------------------------------------------------

pub fn has_explicit_admin(members: &[MembershipRow]) -> bool {
    members.iter().any(|m| m.is_admin)
}

/// The first membership created. Ids follow insertion order, so a clock
/// that steps backwards cannot make a later joiner the earliest.
pub fn earliest_member(members: &[MembershipRow]) -> Option<&MembershipRow> {
    members.iter().min_by_key(|m| m.id)
}

/// The derived admin of a legacy group, or `None` once any explicit admin exists.
pub fn effective_admin(members: &[MembershipRow]) -> Option<&MembershipRow> {
    if has_explicit_admin(members) {
        None
    } else {
        earliest_member(members)
    }
}

/// Pair each membership with the admin flag a viewer should see.
pub fn admin_flags(members: &[MembershipRow]) -> Vec<(&MembershipRow, bool)> {
    let derived = effective_admin(members).map(|m| m.id);
    members
        .iter()
        .map(|m| (m, m.is_admin || derived == Some(m.id)))
        .collect()
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

fn load_group(storage: &Storage, conversation_id: ConversationId) -> ChatResult<ConversationRow> {
    let conv = storage
        .get_conversation(conversation_id)?
        .ok_or_else(|| ChatError::not_found(format!("conversation {conversation_id}")))?;
    if !conv.is_group {
        return Err(ChatError::invalid("not a group"));
    }
    Ok(conv)
}

/// Fail with `Forbidden` unless `user` holds an explicit admin membership.
pub fn assert_admin(
    storage: &Storage,
    conversation_id: ConversationId,
    user: UserId,
) -> ChatResult<MembershipRow> {
    match storage.get_membership(conversation_id, user)? {
        Some(m) if m.is_admin => Ok(m),
        _ => Err(ChatError::forbidden("admin only")),
    }
}

fn target_membership(
    storage: &Storage,
    conversation_id: ConversationId,
    user: UserId,
) -> ChatResult<MembershipRow> {
    storage
        .get_membership(conversation_id, user)?
        .ok_or_else(|| ChatError::not_found(format!("user {user} is not a member")))
}

fn clean_name(name: &str) -> ChatResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ChatError::invalid("group name cannot be empty"));
    }
    Ok(name)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Create a group of `member_ids` plus the creator, who becomes its only admin.
pub fn create_group(
    storage: &Storage,
    creator: UserId,
    name: &str,
    member_ids: &[UserId],
    now: u64,
) -> ChatResult<ConversationId> {
    let name = clean_name(name)?;

    let mut seen = BTreeSet::from([creator]);
    let others: Vec<UserId> = member_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();
    for id in &others {
        if storage.get_user(*id)?.is_none() {
            return Err(ChatError::not_found(format!("user {id}")));
        }
    }

    let id = storage.insert_conversation(true, Some(name), None, now)?;
    storage.insert_membership(id, creator, true, now)?;
    for member in others {
        storage.insert_membership(id, member, false, now)?;
    }
    Ok(id)
}

pub fn rename_group(
    storage: &Storage,
    caller: UserId,
    conversation_id: ConversationId,
    name: &str,
) -> ChatResult<()> {
    load_group(storage, conversation_id)?;
    assert_admin(storage, conversation_id, caller)?;
    let name = clean_name(name)?;
    storage.rename_conversation(conversation_id, name)?;
    Ok(())
}

pub fn add_member(
    storage: &Storage,
    caller: UserId,
    conversation_id: ConversationId,
    user: UserId,
    now: u64,
) -> ChatResult<()> {
    load_group(storage, conversation_id)?;
    assert_admin(storage, conversation_id, caller)?;
    if storage.get_user(user)?.is_none() {
        return Err(ChatError::not_found(format!("user {user}")));
    }
    if storage.get_membership(conversation_id, user)?.is_some() {
        return Err(ChatError::Conflict("user is already a member".to_string()));
    }
    storage.insert_membership(conversation_id, user, false, now)?;
    Ok(())
}

pub fn remove_member(
    storage: &Storage,
    caller: UserId,
    conversation_id: ConversationId,
    user: UserId,
) -> ChatResult<()> {
    load_group(storage, conversation_id)?;
    assert_admin(storage, conversation_id, caller)?;
    let membership = target_membership(storage, conversation_id, user)?;
    if membership.is_admin && storage.count_admins(conversation_id)? <= 1 {
        return Err(ChatError::invalid("cannot remove the last admin"));
    }
    storage.delete_membership(membership.id)?;
    storage.delete_typing_indicator(conversation_id, user)?;
    Ok(())
}

pub fn promote_to_admin(
    storage: &Storage,
    caller: UserId,
    conversation_id: ConversationId,
    user: UserId,
) -> ChatResult<()> {
    load_group(storage, conversation_id)?;
    assert_admin(storage, conversation_id, caller)?;
    let membership = target_membership(storage, conversation_id, user)?;
    if !membership.is_admin {
        storage.set_membership_admin(membership.id, true)?;
    }
    Ok(())
}

pub fn demote_admin(
    storage: &Storage,
    caller: UserId,
    conversation_id: ConversationId,
    user: UserId,
) -> ChatResult<()> {
    load_group(storage, conversation_id)?;
    assert_admin(storage, conversation_id, caller)?;
    let membership = target_membership(storage, conversation_id, user)?;
    if !membership.is_admin {
        return Ok(());
    }
    if storage.count_admins(conversation_id)? <= 1 {
        return Err(ChatError::invalid("cannot remove the last admin"));
    }
    storage.set_membership_admin(membership.id, false)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Legacy groups
// ---------------------------------------------------------------------------

/// Persist admin on the earliest membership of a group that has no admin.
///
/// Re-checks for an existing admin inside the caller's transaction, so of two
/// viewers racing to claim only the first succeeds.
pub fn claim_admin(
    storage: &Storage,
    caller: UserId,
    conversation_id: ConversationId,
) -> ChatResult<()> {
    load_group(storage, conversation_id)?;
    let members = storage.list_conversation_members(conversation_id)?;
    if !members.iter().any(|m| m.user_id == caller) {
        return Err(ChatError::forbidden("not a member of this group"));
    }
    if has_explicit_admin(&members) {
        return Err(ChatError::forbidden("group already has an admin"));
    }
    match earliest_member(&members) {
        Some(earliest) if earliest.user_id == caller => {
            storage.set_membership_admin(earliest.id, true)?;
            Ok(())
        }
        _ => Err(ChatError::forbidden(
            "only the earliest member can claim admin",
        )),
    }
}

/// Group name, members and admin picture as seen by `viewer`; `None` when the
/// conversation is missing, not a group, or `viewer` is not a member.
pub fn group_details(
    storage: &Storage,
    viewer: UserId,
    conversation_id: ConversationId,
) -> Result<Option<GroupDetails>, StorageError> {
    let Some(conv) = storage.get_conversation(conversation_id)? else {
        return Ok(None);
    };
    if !conv.is_group {
        return Ok(None);
    }
    let members = storage.list_conversation_members(conversation_id)?;
    let flags = admin_flags(&members);
    let Some(am_i_admin) = flags
        .iter()
        .find(|(m, _)| m.user_id == viewer)
        .map(|(_, is_admin)| *is_admin)
    else {
        return Ok(None);
    };

    let mut views = Vec::with_capacity(flags.len());
    for (m, is_admin) in &flags {
        if let Some(user) = storage.get_user(m.user_id)? {
            views.push(MemberView::new(&user, *is_admin));
        }
    }

    Ok(Some(GroupDetails {
        conversation_id,
        group_name: conv.group_name,
        am_i_admin,
        members: views,
        needs_admin_claim: !has_explicit_admin(&members),
    }))
}
