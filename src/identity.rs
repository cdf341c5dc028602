//! Identity resolution: maps an opaque caller token to an application user.
//!
//! Tokens come from the identity provider and are stable per person. A user
//! record is created on the first authenticated sync and never deleted.

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};
use crate::storage::{Storage, StorageError, UserId, UserRow};

/// Profile fields supplied by the identity provider on sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub display_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

fn usable_token(token: Option<&str>) -> Option<&str> {
    token.map(str::trim).filter(|t| !t.is_empty())
}

/// Look up the user behind `token`. No token, or no matching user, is `None`.
pub fn resolve_caller(
    storage: &Storage,
    token: Option<&str>,
) -> Result<Option<UserRow>, StorageError> {
    match usable_token(token) {
        Some(token) => storage.get_user_by_token(token),
        None => Ok(None),
    }
}

/// Like [`resolve_caller`], for operations that cannot proceed anonymously.
pub fn require_caller(storage: &Storage, token: Option<&str>) -> ChatResult<UserRow> {
    resolve_caller(storage, token)?.ok_or(ChatError::Unauthenticated)
}

/// Upsert the user for `token`: insert online on first sight, otherwise
/// overwrite the profile and force the user online.
pub fn sync_identity(
    storage: &Storage,
    token: Option<&str>,
    profile: &Profile,
    now: u64,
) -> ChatResult<UserId> {
    let token = usable_token(token).ok_or(ChatError::Unauthenticated)?;
    match storage.get_user_by_token(token)? {
        Some(existing) => {
            storage.update_user_profile(existing.id, profile)?;
            Ok(existing.id)
        }
        None => Ok(storage.insert_user(token, profile, now)?),
    }
}

/// Record the caller's online flag. Unresolved callers are ignored.
pub fn set_online_status(
    storage: &Storage,
    token: Option<&str>,
    is_online: bool,
) -> Result<Option<UserId>, StorageError> {
    let Some(user) = resolve_caller(storage, token)? else {
        return Ok(None);
    };
    storage.set_user_online(user.id, is_online)?;
    Ok(Some(user.id))
}

/// Everyone except `caller`, optionally narrowed to display names containing
/// `search_term` (case-insensitive).
pub fn search_users(
    storage: &Storage,
    caller: &UserRow,
    search_term: Option<&str>,
) -> Result<Vec<UserRow>, StorageError> {
    let needle = search_term
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let users = storage
        .list_users()?
        .into_iter()
        .filter(|u| u.id != caller.id)
        .filter(|u| match &needle {
            Some(needle) => u
                .display_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .collect();
    Ok(users)
}
