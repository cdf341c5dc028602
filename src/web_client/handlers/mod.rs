//! Route handler modules for the huddle-web REST API.

pub mod conversations;
pub mod groups;
pub mod health;
pub mod messages;
pub mod reactions;
pub mod typing;
pub mod users;
