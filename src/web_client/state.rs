//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::chat::Chat;

pub struct AppState {
    pub chat: Chat,
}

pub type SharedState = Arc<Mutex<AppState>>;

pub fn shared(chat: Chat) -> SharedState {
    Arc::new(Mutex::new(AppState { chat }))
}
