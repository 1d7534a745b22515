//! Input-mode tracking for multi-step interactions.
//!
//! A command such as `/menu` or `/savephoto` arms an "awaiting" entry; the
//! next matching message consumes it. Entries live in teloxide's
//! [`InMemStorage`] and have no expiry, so an abandoned entry lives until it
//! is taken or the process restarts.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use teloxide::dispatching::dialogue::{InMemStorage, Storage};
use teloxide::types::ChatId;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// What the bot is waiting for in a given keyspace
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AwaitingInput {
    /// Next message in the chat is the menu
    MenuCapture,
    /// Next photo is stored under this name
    PendingPhoto { name: String },
}

/// One keyspace of awaiting entries with at-most-once reads
///
/// `InMemStorage` only offers get and remove as separate calls, so reads and
/// writes go through `gate` to make `take` a single step.
pub struct SessionStore<V> {
    storage: Arc<InMemStorage<V>>,
    gate: Mutex<()>,
}

impl<V> Default for SessionStore<V> {
    fn default() -> Self {
        Self {
            storage: InMemStorage::new(),
            gate: Mutex::new(()),
        }
    }
}

impl<V: Clone + Send + 'static> SessionStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `key`, replacing any earlier payload
    pub async fn set(&self, key: i64, payload: V) {
        let _gate = self.gate.lock().await;
        if let Err(e) = self
            .storage
            .clone()
            .update_dialogue(ChatId(key), payload)
            .await
        {
            warn!(key, error = %e, "Failed to store awaiting entry");
        }
    }

    /// Remove and return the payload for `key`
    pub async fn take(&self, key: i64) -> Option<V> {
        let _gate = self.gate.lock().await;
        let payload = self.storage.clone().get_dialogue(ChatId(key)).await.ok()??;
        // Not found is the only error and means there was nothing to take
        self.storage.clone().remove_dialogue(ChatId(key)).await.ok()?;
        Some(payload)
    }

    pub async fn clear(&self, key: i64) {
        let _gate = self.gate.lock().await;
        let _ = self.storage.clone().remove_dialogue(ChatId(key)).await;
    }

    /// Read the payload without consuming it
    pub async fn peek(&self, key: i64) -> Option<V> {
        self.storage.clone().get_dialogue(ChatId(key)).await.ok()?
    }
}

/// The three independent keyspaces the bot uses
#[derive(Default)]
pub struct InputModeTracker {
    menu_capture: SessionStore<AwaitingInput>,
    user_photo: SessionStore<AwaitingInput>,
    chat_photo: SessionStore<AwaitingInput>,
}

impl InputModeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn await_menu(&self, chat_id: i64) {
        debug!(chat_id, "Awaiting menu");
        self.menu_capture.set(chat_id, AwaitingInput::MenuCapture).await;
    }

    /// Consume the menu-capture flag for the chat
    pub async fn take_menu(&self, chat_id: i64) -> bool {
        self.menu_capture.take(chat_id).await.is_some()
    }

    pub async fn await_user_photo(&self, user_id: i64, name: &str) {
        debug!(user_id, photo_name = %name, "Awaiting personal photo");
        self.user_photo
            .set(
                user_id,
                AwaitingInput::PendingPhoto {
                    name: name.to_string(),
                },
            )
            .await;
    }

    pub async fn await_chat_photo(&self, chat_id: i64, name: &str) {
        debug!(chat_id, photo_name = %name, "Awaiting group photo");
        self.chat_photo
            .set(
                chat_id,
                AwaitingInput::PendingPhoto {
                    name: name.to_string(),
                },
            )
            .await;
    }

    pub async fn take_user_photo(&self, user_id: i64) -> Option<String> {
        match self.user_photo.take(user_id).await {
            Some(AwaitingInput::PendingPhoto { name }) => Some(name),
            _ => None,
        }
    }

    pub async fn take_chat_photo(&self, chat_id: i64) -> Option<String> {
        match self.chat_photo.take(chat_id).await {
            Some(AwaitingInput::PendingPhoto { name }) => Some(name),
            _ => None,
        }
    }

    /// Drop every pending entry owned by this user or chat
    pub async fn clear(&self, user_id: i64, chat_id: i64) {
        self.menu_capture.clear(chat_id).await;
        self.user_photo.clear(user_id).await;
        self.chat_photo.clear(chat_id).await;
    }
}
