pub mod chat;
pub mod clock;
pub mod conversations;
pub mod error;
pub mod groups;
pub mod identity;
pub mod logging;
pub mod messages;
pub mod storage;
pub mod typing;
pub mod views;
pub mod web_client;

pub use chat::Chat;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ChatError, ChatResult};
pub use identity::Profile;
pub use storage::{ConversationId, MessageId, Storage, StorageError, UserId};
