//! # Photos Module
//!
//! Named photos kept in blob storage. A photo belongs either to a user
//! (personal) or to a chat (shared with the group); names are unique per owner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{BotError, BotResult};
use crate::store::PhotoStore;
use crate::text_processing::normalize;

/// Longest accepted photo name, in characters
pub const MAX_PHOTO_NAME_LENGTH: usize = 64;

/// Who a named photo belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhotoOwner {
    User(i64),
    Chat(i64),
}

impl PhotoOwner {
    pub fn kind(&self) -> &'static str {
        match self {
            PhotoOwner::User(_) => "user",
            PhotoOwner::Chat(_) => "chat",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            PhotoOwner::User(id) | PhotoOwner::Chat(id) => *id,
        }
    }

    /// Rebuild an owner from its stored `(kind, id)` pair
    pub fn from_parts(kind: &str, id: i64) -> Option<Self> {
        match kind {
            "user" => Some(PhotoOwner::User(id)),
            "chat" => Some(PhotoOwner::Chat(id)),
            _ => None,
        }
    }
}

/// A stored named photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub owner: PhotoOwner,
    pub photo_name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Validates a photo name input
pub fn validate_photo_name(name: &str) -> Result<String, &'static str> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if trimmed.chars().count() > MAX_PHOTO_NAME_LENGTH {
        return Err("too_long");
    }

    Ok(trimmed.to_string())
}

/// File-system safe form of a photo name ("Ảnh đẹp!" -> "anh-dep")
pub fn photo_slug(name: &str) -> String {
    let slug = normalize(name)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>();

    let parts: Vec<&str> = slug.split('-').filter(|part| !part.is_empty()).collect();
    if parts.is_empty() {
        "photo".to_string()
    } else {
        parts.join("-")
    }
}

/// Blob path for a named photo
///
/// The slug keeps paths readable; the hash suffix keeps names that share a
/// slug ("Ảnh đẹp", "anh dep") from overwriting each other.
pub fn photo_blob_path(owner: PhotoOwner, name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    format!(
        "photos/{}/{}/{}-{}.jpg",
        owner.kind(),
        owner.id(),
        photo_slug(name),
        &hex::encode(digest)[..8]
    )
}

/// Object storage used for photo bytes
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `path` and return a URL Telegram can fetch
    async fn put_blob(&self, path: &str, bytes: &[u8], content_type: &str) -> BotResult<String>;
}

/// Blob store writing into a directory that is served under `base_url`
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put_blob(&self, path: &str, bytes: &[u8], content_type: &str) -> BotResult<String> {
        if path.split('/').any(|segment| segment == ".." || segment.is_empty()) {
            return Err(BotError::Blob(format!("invalid blob path: {path}")));
        }

        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        debug!(path = %path, bytes = bytes.len(), content_type = %content_type, "Blob written");
        Ok(format!("{}/{}", self.base_url, path))
    }
}

/// Saves and looks up named photos
#[derive(Clone)]
pub struct PhotoService {
    store: Arc<dyn PhotoStore>,
    blobs: Arc<dyn BlobStore>,
}

impl PhotoService {
    pub fn new(store: Arc<dyn PhotoStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Upload photo bytes and record them under `name` for `owner`
    pub async fn save(
        &self,
        owner: PhotoOwner,
        name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> BotResult<Photo> {
        let path = photo_blob_path(owner, name);
        let url = self.blobs.put_blob(&path, bytes, content_type).await?;
        let photo = self.store.upsert_photo(owner, name, &url).await?;
        info!(owner = ?owner, photo_name = %name, "Photo saved");
        Ok(photo)
    }

    /// Look a photo up by name: the user's own photo first, then the chat's
    pub async fn find(&self, user_id: i64, chat_id: i64, name: &str) -> BotResult<Option<Photo>> {
        if let Some(photo) = self.store.find_photo(PhotoOwner::User(user_id), name).await? {
            return Ok(Some(photo));
        }
        self.store.find_photo(PhotoOwner::Chat(chat_id), name).await
    }

    /// Photo names visible to a user in a chat: their own, then the chat's
    pub async fn list(&self, user_id: i64, chat_id: i64) -> BotResult<Vec<Photo>> {
        let mut photos = self.store.list_photos(PhotoOwner::User(user_id)).await?;
        photos.extend(self.store.list_photos(PhotoOwner::Chat(chat_id)).await?);
        Ok(photos)
    }
}
