//! SQLite storage layer for huddle.
//!
//! Holds the six record kinds of the chat domain (users, conversations,
//! memberships, messages, reactions, typing indicators), their secondary
//! indexes, and the uniqueness constraints the engines rely on. Every
//! mutation in the engines runs inside [`Storage::atomically`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Profile;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("already exists: {0}")]
    AlreadyExists(String),
}

// ---------------------------------------------------------------------------
// Typed row ids
// ---------------------------------------------------------------------------

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map($name)
            }
        }
    };
}

row_id!(UserId);
row_id!(ConversationId);
row_id!(MembershipId);
row_id!(MessageId);
row_id!(ReactionId);
row_id!(
    /// Id of a typing indicator row.
    TypingIndicatorId
);

// ---------------------------------------------------------------------------
// Read receipts
// ---------------------------------------------------------------------------

/// The set of users who have read a message.
///
/// Grows only through [`ReadBy::record`], which never admits the sender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadBy(BTreeSet<UserId>);

impl ReadBy {
    /// Record `reader` as having read a message sent by `sender`.
    /// Returns `true` when the set changed.
    pub fn record(&mut self, reader: UserId, sender: UserId) -> bool {
        if reader == sender {
            return false;
        }
        self.0.insert(reader)
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.0.contains(&user)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = UserId> + '_ {
        self.0.iter().copied()
    }
}

impl ToSql for ReadBy {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let json = serde_json::to_string(self)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(ToSqlOutput::from(json))
    }
}

impl FromSql for ReadBy {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        serde_json::from_str(text).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Application user, keyed externally by a stable identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: UserId,
    pub display_name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
    pub identity_token: String,
    pub is_online: bool,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRow {
    pub id: ConversationId,
    pub is_group: bool,
    pub group_name: Option<String>,
    pub last_message_id: Option<MessageId>,
    /// Canonical unordered pair key for direct conversations.
    pub direct_key: Option<String>,
    pub created_at: u64,
}

/// Join row between one user and one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipRow {
    pub id: MembershipId,
    pub user_id: UserId,
    pub conversation_id: ConversationId,
    pub is_admin: bool,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub is_deleted: bool,
    pub read_by: ReadBy,
    /// Stored unchecked; may point at a deleted or missing message.
    pub reply_to_id: Option<MessageId>,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionRow {
    pub id: ReactionId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingIndicatorRow {
    pub id: TypingIndicatorId,
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub expires_at: u64,
}

const USER_COLUMNS: &str =
    "id, display_name, email, avatar_url, identity_token, is_online, created_at";
const CONVERSATION_COLUMNS: &str =
    "id, is_group, group_name, last_message_id, direct_key, created_at";
const MEMBER_COLUMNS: &str = "id, user_id, conversation_id, is_admin, created_at";
const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, content, is_deleted, read_by, reply_to_id, created_at";
const REACTION_COLUMNS: &str = "id, message_id, user_id, emoji, created_at";
const TYPING_COLUMNS: &str = "id, conversation_id, user_id, expires_at";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        display_name: row.get(1)?,
        email: row.get(2)?,
        avatar_url: row.get(3)?,
        identity_token: row.get(4)?,
        is_online: row.get::<_, i32>(5)? != 0,
        created_at: row.get::<_, i64>(6)? as u64,
    })
}

fn conversation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        is_group: row.get::<_, i32>(1)? != 0,
        group_name: row.get(2)?,
        last_message_id: row.get(3)?,
        direct_key: row.get(4)?,
        created_at: row.get::<_, i64>(5)? as u64,
    })
}

fn membership_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MembershipRow> {
    Ok(MembershipRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        conversation_id: row.get(2)?,
        is_admin: row.get::<_, i32>(3)? != 0,
        created_at: row.get::<_, i64>(4)? as u64,
    })
}

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        is_deleted: row.get::<_, i32>(4)? != 0,
        read_by: row.get(5)?,
        reply_to_id: row.get(6)?,
        created_at: row.get::<_, i64>(7)? as u64,
    })
}

fn reaction_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReactionRow> {
    Ok(ReactionRow {
        id: row.get(0)?,
        message_id: row.get(1)?,
        user_id: row.get(2)?,
        emoji: row.get(3)?,
        created_at: row.get::<_, i64>(4)? as u64,
    })
}

fn typing_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TypingIndicatorRow> {
    Ok(TypingIndicatorRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        user_id: row.get(2)?,
        expires_at: row.get::<_, i64>(3)? as u64,
    })
}

/// Canonical key for the unordered pair `{a, b}`.
pub fn direct_key(a: UserId, b: UserId) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}:{hi}")
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create a database at the given path. Creates schema if needed.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    fn create_schema(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                display_name    TEXT,
                email           TEXT NOT NULL,
                avatar_url      TEXT,
                identity_token  TEXT NOT NULL UNIQUE,
                is_online       INTEGER NOT NULL DEFAULT 0,
                created_at      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS conversations (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                is_group        INTEGER NOT NULL,
                group_name      TEXT,
                last_message_id INTEGER,
                direct_key      TEXT UNIQUE,
                created_at      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS members (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         INTEGER NOT NULL REFERENCES users(id),
                conversation_id INTEGER NOT NULL REFERENCES conversations(id),
                is_admin        INTEGER NOT NULL DEFAULT 0,
                created_at      INTEGER NOT NULL,
                UNIQUE (conversation_id, user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_members_user
                ON members(user_id);
            CREATE INDEX IF NOT EXISTS idx_members_conversation
                ON members(conversation_id);

            CREATE TABLE IF NOT EXISTS messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id INTEGER NOT NULL REFERENCES conversations(id),
                sender_id       INTEGER NOT NULL REFERENCES users(id),
                content         TEXT NOT NULL,
                is_deleted      INTEGER NOT NULL DEFAULT 0,
                read_by         TEXT NOT NULL DEFAULT '[]',
                reply_to_id     INTEGER,
                created_at      INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_messages_conversation
                ON messages(conversation_id);
            CREATE INDEX IF NOT EXISTS idx_messages_reply_to
                ON messages(reply_to_id);

            CREATE TABLE IF NOT EXISTS reactions (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id      INTEGER NOT NULL REFERENCES messages(id),
                user_id         INTEGER NOT NULL REFERENCES users(id),
                emoji           TEXT NOT NULL,
                created_at      INTEGER NOT NULL,
                UNIQUE (message_id, user_id, emoji)
            );

            CREATE INDEX IF NOT EXISTS idx_reactions_message
                ON reactions(message_id);

            CREATE TABLE IF NOT EXISTS typing_indicators (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id INTEGER NOT NULL REFERENCES conversations(id),
                user_id         INTEGER NOT NULL REFERENCES users(id),
                expires_at      INTEGER NOT NULL,
                UNIQUE (conversation_id, user_id)
            );
            ",
        )?;
        Ok(())
    }

    /// Run `f` inside one `BEGIN IMMEDIATE` transaction.
    ///
    /// Commits when `f` returns `Ok`; any error rolls back every write `f`
    /// made. Must not be nested.
    pub fn atomically<T, E>(&self, f: impl FnOnce(&Storage) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(StorageError::from)?;
        let value = f(self)?;
        tx.commit().map_err(StorageError::from)?;
        Ok(value)
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Insert a new user, online, for the given identity token.
    pub fn insert_user(
        &self,
        identity_token: &str,
        profile: &Profile,
        now: u64,
    ) -> Result<UserId, StorageError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO users
             (display_name, email, avatar_url, identity_token, is_online, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![
                profile.display_name,
                profile.email,
                profile.avatar_url,
                identity_token,
                now as i64,
            ],
        )?;
        if inserted == 0 {
            return Err(StorageError::AlreadyExists(format!(
                "user with identity token {identity_token}"
            )));
        }
        Ok(UserId(self.conn.last_insert_rowid()))
    }

    pub fn get_user(&self, id: UserId) -> Result<Option<UserRow>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id], user_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn get_user_by_token(&self, identity_token: &str) -> Result<Option<UserRow>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE identity_token = ?1");
        let row = self
            .conn
            .query_row(&sql, params![identity_token], user_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], user_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Overwrite profile fields and mark the user online.
    pub fn update_user_profile(&self, id: UserId, profile: &Profile) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "UPDATE users SET display_name = ?1, email = ?2, avatar_url = ?3, is_online = 1
             WHERE id = ?4",
            params![profile.display_name, profile.email, profile.avatar_url, id],
        )?;
        Ok(affected > 0)
    }

    pub fn set_user_online(&self, id: UserId, is_online: bool) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "UPDATE users SET is_online = ?1 WHERE id = ?2",
            params![is_online as i32, id],
        )?;
        Ok(affected > 0)
    }

    // -----------------------------------------------------------------------
    // Conversations
    // -----------------------------------------------------------------------

    pub fn insert_conversation(
        &self,
        is_group: bool,
        group_name: Option<&str>,
        direct_key: Option<&str>,
        now: u64,
    ) -> Result<ConversationId, StorageError> {
        self.conn.execute(
            "INSERT INTO conversations (is_group, group_name, direct_key, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![is_group as i32, group_name, direct_key, now as i64],
        )?;
        Ok(ConversationId(self.conn.last_insert_rowid()))
    }

    pub fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<ConversationRow>, StorageError> {
        let sql = format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id], conversation_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn find_conversation_by_direct_key(
        &self,
        key: &str,
    ) -> Result<Option<ConversationRow>, StorageError> {
        let sql = format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE direct_key = ?1");
        let row = self
            .conn
            .query_row(&sql, params![key], conversation_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn set_direct_key(&self, id: ConversationId, key: &str) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "UPDATE conversations SET direct_key = ?1 WHERE id = ?2",
            params![key, id],
        )?;
        Ok(affected > 0)
    }

    pub fn rename_conversation(&self, id: ConversationId, name: &str) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "UPDATE conversations SET group_name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(affected > 0)
    }

    pub fn set_last_message(
        &self,
        id: ConversationId,
        message_id: MessageId,
    ) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "UPDATE conversations SET last_message_id = ?1 WHERE id = ?2",
            params![message_id, id],
        )?;
        Ok(affected > 0)
    }

    // -----------------------------------------------------------------------
    // Memberships
    // -----------------------------------------------------------------------

    pub fn insert_membership(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        is_admin: bool,
        now: u64,
    ) -> Result<MembershipId, StorageError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO members (user_id, conversation_id, is_admin, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, conversation_id, is_admin as i32, now as i64],
        )?;
        if inserted == 0 {
            return Err(StorageError::AlreadyExists(format!(
                "membership of user {user_id} in conversation {conversation_id}"
            )));
        }
        Ok(MembershipId(self.conn.last_insert_rowid()))
    }

    pub fn get_membership(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<Option<MembershipRow>, StorageError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE conversation_id = ?1 AND user_id = ?2"
        );
        let row = self
            .conn
            .query_row(&sql, params![conversation_id, user_id], membership_from_row)
            .optional()?;
        Ok(row)
    }

    /// All memberships held by a user, oldest conversation first.
    pub fn list_user_memberships(&self, user_id: UserId) -> Result<Vec<MembershipRow>, StorageError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE user_id = ?1 ORDER BY conversation_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], membership_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// All memberships of a conversation in join order.
    pub fn list_conversation_members(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<MembershipRow>, StorageError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE conversation_id = ?1 ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![conversation_id], membership_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn set_membership_admin(
        &self,
        id: MembershipId,
        is_admin: bool,
    ) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "UPDATE members SET is_admin = ?1 WHERE id = ?2",
            params![is_admin as i32, id],
        )?;
        Ok(affected > 0)
    }

    pub fn count_admins(&self, conversation_id: ConversationId) -> Result<u32, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM members WHERE conversation_id = ?1 AND is_admin = 1",
            params![conversation_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    pub fn delete_membership(&self, id: MembershipId) -> Result<bool, StorageError> {
        let affected = self
            .conn
            .execute("DELETE FROM members WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    pub fn insert_message(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        content: &str,
        reply_to_id: Option<MessageId>,
        now: u64,
    ) -> Result<MessageId, StorageError> {
        self.conn.execute(
            "INSERT INTO messages (conversation_id, sender_id, content, reply_to_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![conversation_id, sender_id, content, reply_to_id, now as i64],
        )?;
        Ok(MessageId(self.conn.last_insert_rowid()))
    }

    pub fn get_message(&self, id: MessageId) -> Result<Option<MessageRow>, StorageError> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id], message_from_row)
            .optional()?;
        Ok(row)
    }

    /// The whole timeline of a conversation, oldest first.
    pub fn list_conversation_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<MessageRow>, StorageError> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = ?1 ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![conversation_id], message_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Replace a message's content with `placeholder` and flag it deleted.
    pub fn soft_delete_message(&self, id: MessageId, placeholder: &str) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "UPDATE messages SET content = ?1, is_deleted = 1 WHERE id = ?2",
            params![placeholder, id],
        )?;
        Ok(affected > 0)
    }

    pub fn update_read_by(&self, id: MessageId, read_by: &ReadBy) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "UPDATE messages SET read_by = ?1 WHERE id = ?2",
            params![read_by, id],
        )?;
        Ok(affected > 0)
    }

    // -----------------------------------------------------------------------
    // Reactions
    // -----------------------------------------------------------------------

    pub fn find_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
        emoji: &str,
    ) -> Result<Option<ReactionRow>, StorageError> {
        let sql = format!(
            "SELECT {REACTION_COLUMNS} FROM reactions
             WHERE message_id = ?1 AND user_id = ?2 AND emoji = ?3"
        );
        let row = self
            .conn
            .query_row(&sql, params![message_id, user_id, emoji], reaction_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn insert_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
        emoji: &str,
        now: u64,
    ) -> Result<ReactionId, StorageError> {
        self.conn.execute(
            "INSERT INTO reactions (message_id, user_id, emoji, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![message_id, user_id, emoji, now as i64],
        )?;
        Ok(ReactionId(self.conn.last_insert_rowid()))
    }

    pub fn delete_reaction(&self, id: ReactionId) -> Result<bool, StorageError> {
        let affected = self
            .conn
            .execute("DELETE FROM reactions WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Reactions on a message in the order they were added.
    pub fn list_reactions(&self, message_id: MessageId) -> Result<Vec<ReactionRow>, StorageError> {
        let sql =
            format!("SELECT {REACTION_COLUMNS} FROM reactions WHERE message_id = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![message_id], reaction_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Typing indicators
    // -----------------------------------------------------------------------

    /// Create the indicator for (conversation, user) or push its expiry out.
    pub fn upsert_typing_indicator(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        expires_at: u64,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO typing_indicators (conversation_id, user_id, expires_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (conversation_id, user_id)
             DO UPDATE SET expires_at = excluded.expires_at",
            params![conversation_id, user_id, expires_at as i64],
        )?;
        Ok(())
    }

    pub fn get_typing_indicator(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<Option<TypingIndicatorRow>, StorageError> {
        let sql = format!(
            "SELECT {TYPING_COLUMNS} FROM typing_indicators
             WHERE conversation_id = ?1 AND user_id = ?2"
        );
        let row = self
            .conn
            .query_row(&sql, params![conversation_id, user_id], typing_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn delete_typing_indicator(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "DELETE FROM typing_indicators WHERE conversation_id = ?1 AND user_id = ?2",
            params![conversation_id, user_id],
        )?;
        Ok(affected > 0)
    }

    /// Indicators in a conversation that expire strictly after `now`.
    pub fn list_live_typing_indicators(
        &self,
        conversation_id: ConversationId,
        now: u64,
    ) -> Result<Vec<TypingIndicatorRow>, StorageError> {
        let sql = format!(
            "SELECT {TYPING_COLUMNS} FROM typing_indicators
             WHERE conversation_id = ?1 AND expires_at > ?2 ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![conversation_id, now as i64], typing_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

/// Resolve the database path: `{data_dir}/huddle.db`.
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("huddle.db")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
