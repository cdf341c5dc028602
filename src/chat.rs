//! The request-handler surface of huddle.
//!
//! Each method is one independently invoked operation: it resolves the caller
//! from their identity token, checks rights, reads or writes the store, and
//! returns a caller-shaped result. Mutations run inside a single store
//! transaction so a failure leaves nothing half-written. Queries degrade to
//! empty results for unknown callers; mutations fail with
//! [`ChatError::Unauthenticated`].

use std::path::Path;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::ChatResult;
use crate::identity::{self, Profile};
use crate::storage::{ConversationId, MessageId, Storage, StorageError, UserId};
use crate::views::{ConversationSummary, GroupDetails, MessageView, UserView};
use crate::{conversations, groups, messages, typing};

pub struct Chat {
    storage: Storage,
    clock: Arc<dyn Clock>,
}

impl Chat {
    pub fn new(storage: Storage, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Open the database at `path` with the wall clock.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::new(Storage::open(path)?, Arc::new(SystemClock::new())))
    }

    pub fn open_in_memory(clock: Arc<dyn Clock>) -> Result<Self, StorageError> {
        Ok(Self::new(Storage::open_in_memory()?, clock))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    pub fn sync_identity(&self, token: Option<&str>, profile: &Profile) -> ChatResult<UserId> {
        let now = self.now();
        let id = self
            .storage
            .atomically(|s| identity::sync_identity(s, token, profile, now))?;
        tracing::debug!(user = %id, "identity synced");
        Ok(id)
    }

    pub fn set_online_status(&self, token: Option<&str>, is_online: bool) -> ChatResult<()> {
        let updated = self
            .storage
            .atomically(|s| identity::set_online_status(s, token, is_online))?;
        if let Some(user) = updated {
            tracing::debug!(user = %user, is_online, "online status changed");
        }
        Ok(())
    }

    pub fn search_users(
        &self,
        token: Option<&str>,
        search_term: Option<&str>,
    ) -> ChatResult<Vec<UserView>> {
        let Some(me) = identity::resolve_caller(&self.storage, token)? else {
            return Ok(Vec::new());
        };
        let users = identity::search_users(&self.storage, &me, search_term)?;
        Ok(users.iter().map(UserView::from).collect())
    }

    // -----------------------------------------------------------------------
    // Conversations
    // -----------------------------------------------------------------------

    pub fn resolve_or_create_direct_conversation(
        &self,
        token: Option<&str>,
        other: UserId,
    ) -> ChatResult<ConversationId> {
        let now = self.now();
        self.storage.atomically(|s| {
            let me = identity::require_caller(s, token)?;
            conversations::get_or_create_direct(s, me.id, other, now)
        })
    }

    pub fn list_my_conversations(&self, token: Option<&str>) -> ChatResult<Vec<ConversationSummary>> {
        let Some(me) = identity::resolve_caller(&self.storage, token)? else {
            return Ok(Vec::new());
        };
        Ok(conversations::list_my_conversations(&self.storage, &me)?)
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    pub fn create_group(
        &self,
        token: Option<&str>,
        name: &str,
        member_ids: &[UserId],
    ) -> ChatResult<ConversationId> {
        let now = self.now();
        let (creator, id) = self.storage.atomically(|s| {
            let me = identity::require_caller(s, token)?;
            let id = groups::create_group(s, me.id, name, member_ids, now)?;
            Ok::<_, crate::error::ChatError>((me.id, id))
        })?;
        tracing::info!(conversation = %id, creator = %creator, "group created");
        Ok(id)
    }

    pub fn rename_group(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
        name: &str,
    ) -> ChatResult<()> {
        self.storage.atomically(|s| {
            let me = identity::require_caller(s, token)?;
            groups::rename_group(s, me.id, conversation_id, name)
        })
    }

    pub fn add_member(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
        user: UserId,
    ) -> ChatResult<()> {
        let now = self.now();
        self.storage.atomically(|s| {
            let me = identity::require_caller(s, token)?;
            groups::add_member(s, me.id, conversation_id, user, now)
        })?;
        tracing::info!(conversation = %conversation_id, user = %user, "member added");
        Ok(())
    }

    pub fn remove_member(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
        user: UserId,
    ) -> ChatResult<()> {
        self.storage.atomically(|s| {
            let me = identity::require_caller(s, token)?;
            groups::remove_member(s, me.id, conversation_id, user)
        })?;
        tracing::info!(conversation = %conversation_id, user = %user, "member removed");
        Ok(())
    }

    pub fn promote_to_admin(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
        user: UserId,
    ) -> ChatResult<()> {
        self.storage.atomically(|s| {
            let me = identity::require_caller(s, token)?;
            groups::promote_to_admin(s, me.id, conversation_id, user)
        })?;
        tracing::info!(conversation = %conversation_id, user = %user, "admin promoted");
        Ok(())
    }

    pub fn demote_admin(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
        user: UserId,
    ) -> ChatResult<()> {
        self.storage.atomically(|s| {
            let me = identity::require_caller(s, token)?;
            groups::demote_admin(s, me.id, conversation_id, user)
        })?;
        tracing::info!(conversation = %conversation_id, user = %user, "admin demoted");
        Ok(())
    }

    pub fn claim_admin(&self, token: Option<&str>, conversation_id: ConversationId) -> ChatResult<()> {
        let claimant = self.storage.atomically(|s| {
            let me = identity::require_caller(s, token)?;
            groups::claim_admin(s, me.id, conversation_id)?;
            Ok::<_, crate::error::ChatError>(me.id)
        })?;
        tracing::info!(conversation = %conversation_id, user = %claimant, "legacy group admin claimed");
        Ok(())
    }

    pub fn get_group_details(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
    ) -> ChatResult<Option<GroupDetails>> {
        let Some(me) = identity::resolve_caller(&self.storage, token)? else {
            return Ok(None);
        };
        Ok(groups::group_details(&self.storage, me.id, conversation_id)?)
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    pub fn send(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
        content: &str,
        reply_to: Option<MessageId>,
    ) -> ChatResult<MessageId> {
        let now = self.now();
        self.storage.atomically(|s| {
            let me = identity::require_caller(s, token)?;
            messages::send(s, me.id, conversation_id, content, reply_to, now)
        })
    }

    pub fn list_messages(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
    ) -> ChatResult<Vec<MessageView>> {
        let Some(me) = identity::resolve_caller(&self.storage, token)? else {
            return Ok(Vec::new());
        };
        Ok(messages::list_messages(&self.storage, &me, conversation_id)?)
    }

    pub fn soft_delete(&self, token: Option<&str>, message_id: MessageId) -> ChatResult<()> {
        self.storage.atomically(|s| {
            let me = identity::require_caller(s, token)?;
            messages::soft_delete(s, me.id, message_id)
        })?;
        tracing::info!(message = %message_id, "message deleted");
        Ok(())
    }

    pub fn bulk_soft_delete(&self, token: Option<&str>, message_ids: &[MessageId]) -> ChatResult<usize> {
        let deleted = self.storage.atomically(|s| {
            let me = identity::require_caller(s, token)?;
            Ok::<_, crate::error::ChatError>(messages::bulk_soft_delete(s, me.id, message_ids)?)
        })?;
        tracing::info!(requested = message_ids.len(), deleted, "bulk delete");
        Ok(deleted)
    }

    pub fn toggle_reaction(
        &self,
        token: Option<&str>,
        message_id: MessageId,
        emoji: &str,
    ) -> ChatResult<bool> {
        let now = self.now();
        self.storage.atomically(|s| {
            let me = identity::require_caller(s, token)?;
            messages::toggle_reaction(s, me.id, message_id, emoji, now)
        })
    }

    pub fn mark_as_read(&self, token: Option<&str>, conversation_id: ConversationId) -> ChatResult<usize> {
        Ok(self.storage.atomically(|s| {
            match identity::resolve_caller(s, token)? {
                Some(me) => messages::mark_as_read(s, me.id, conversation_id),
                None => Ok(0),
            }
        })?)
    }

    // -----------------------------------------------------------------------
    // Typing
    // -----------------------------------------------------------------------

    pub fn set_typing(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
        is_typing: bool,
    ) -> ChatResult<()> {
        let now = self.now();
        self.storage.atomically(|s| match identity::resolve_caller(s, token)? {
            Some(me) => typing::set_typing(s, me.id, conversation_id, is_typing, now).map(|_| ()),
            None => Ok(()),
        })?;
        Ok(())
    }

    pub fn list_typing(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
    ) -> ChatResult<Vec<UserView>> {
        let Some(me) = identity::resolve_caller(&self.storage, token)? else {
            return Ok(Vec::new());
        };
        let users = typing::list_typing(&self.storage, me.id, conversation_id, self.now())?;
        Ok(users.iter().map(UserView::from).collect())
    }
}
