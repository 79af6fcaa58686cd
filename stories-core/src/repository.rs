//! Durable storage for the story collection.
//!
//! The collection is stored under a single key as a JSON array of story
//! records. Loading never fails: unreadable storage yields an empty list,
//! corrupt entries are skipped, and expired stories are filtered out.

use crate::story::Story;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Storage key of the story collection.
pub const STORAGE_KEY: &str = "user_stories";

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load/save access to the persisted story collection.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Read every stored story that is still live at `now`.
    async fn load(&self, now: DateTime<Utc>) -> Vec<Story>;

    /// Overwrite the stored collection with `stories`.
    async fn save(&self, stories: &[Story]) -> Result<(), PersistError>;
}

/// Encode a collection in the persisted format.
pub fn encode_stories(stories: &[Story]) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(stories)?)
}

/// Decode a persisted collection, keeping only well-formed live entries.
pub fn decode_stories(raw: &str, now: DateTime<Utc>) -> Vec<Story> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let entries: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "stored story collection is unreadable, starting empty");
            return Vec::new();
        }
    };

    let total = entries.len();
    let mut stories = Vec::with_capacity(total);
    for (index, entry) in entries.into_iter().enumerate() {
        let story: Story = match serde_json::from_value(entry) {
            Ok(story) => story,
            Err(e) => {
                warn!(index, error = %e, "skipping corrupt story entry");
                continue;
            }
        };
        if !story.is_well_formed() {
            warn!(index, story_id = %story.id(), "skipping story that expires before it was created");
            continue;
        }
        if story.is_expired(now) {
            debug!(story_id = %story.id(), "dropping expired story");
            continue;
        }
        stories.push(story);
    }

    debug!(total, live = stories.len(), "decoded story collection");
    stories
}

/// Non-persistent repository for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    raw: Mutex<Option<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already-encoded payload, which may be corrupt.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// The currently stored payload, if anything was saved.
    pub async fn raw(&self) -> Option<String> {
        self.raw.lock().await.clone()
    }

    /// Decode the stored payload without any expiry filtering.
    pub async fn stored(&self) -> Vec<Story> {
        self.raw()
            .await
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StoryRepository for MemoryRepository {
    async fn load(&self, now: DateTime<Utc>) -> Vec<Story> {
        match self.raw.lock().await.as_deref() {
            Some(raw) => decode_stories(raw, now),
            None => Vec::new(),
        }
    }

    async fn save(&self, stories: &[Story]) -> Result<(), PersistError> {
        let encoded = encode_stories(stories)?;
        *self.raw.lock().await = Some(encoded);
        Ok(())
    }
}

/// Repository backed by a JSON file named after the storage key.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    /// Store the collection as `<data_dir>/user_stories.json`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    /// Store the collection at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StoryRepository for FileRepository {
    async fn load(&self, now: DateTime<Utc>) -> Vec<Story> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => decode_stories(&raw, now),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored stories yet");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read stored stories");
                Vec::new()
            }
        }
    }

    async fn save(&self, stories: &[Story]) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write then rename so a crash mid-write leaves the old file intact.
        let encoded = encode_stories(stories)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encoded).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), count = stories.len(), "saved stories");
        Ok(())
    }
}
