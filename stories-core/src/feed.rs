//! The live story feed.
//!
//! `StoryFeed` owns the in-memory working set: loaded from the repository,
//! de-duplicated by id, ordered newest first, and saved back whenever a
//! story is added, viewed for the first time, or reacted to.

use crate::clock::SharedClock;
use crate::repository::StoryRepository;
use crate::seed::default_stories;
use crate::story::{Story, StoryId};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from feed mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("No story with id {0} in the current feed")]
    UnknownStory(StoryId),
}

/// Ordered, de-duplicated, non-expired stories.
pub struct StoryFeed {
    repository: Arc<dyn StoryRepository>,
    clock: SharedClock,
    stories: Vec<Story>,
}

impl StoryFeed {
    /// Load the feed, seeding the default stories if storage is empty.
    pub async fn open(repository: Arc<dyn StoryRepository>, clock: SharedClock) -> Self {
        let mut feed = Self {
            repository,
            clock,
            stories: Vec::new(),
        };
        feed.refresh().await;
        feed
    }

    /// Re-read storage, dropping anything that expired since the last load.
    pub async fn refresh(&mut self) {
        let now = self.clock.now();
        let loaded = self.repository.load(now).await;

        if loaded.is_empty() {
            let seeded = default_stories(now);
            info!(count = seeded.len(), "no stored stories, seeding defaults");
            self.stories = assemble(seeded, now);
            self.persist().await;
        } else {
            self.stories = assemble(loaded, now);
        }
        debug!(count = self.stories.len(), "feed assembled");
    }

    /// Insert a story at the front of the feed.
    pub async fn add_story(&mut self, story: Story) {
        let id = story.id();
        self.stories.retain(|s| s.id() != id);
        self.stories.insert(0, story);
        debug!(story_id = %id, "story added to feed");
        self.persist().await;
    }

    /// Mark a story viewed. Returns whether the flag changed.
    pub async fn mark_viewed(&mut self, id: StoryId) -> Result<bool, FeedError> {
        let story = self.get_mut(id)?;
        let changed = story.mark_viewed();
        if changed {
            debug!(story_id = %id, "story viewed");
            self.persist().await;
        }
        Ok(changed)
    }

    /// Add one reaction to a story. Returns the new count for `symbol`.
    pub async fn add_reaction(&mut self, id: StoryId, symbol: &str) -> Result<u32, FeedError> {
        let count = self.get_mut(id)?.add_reaction(symbol);
        debug!(story_id = %id, symbol, count, "reaction added");
        self.persist().await;
        Ok(count)
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn get(&self, id: StoryId) -> Option<&Story> {
        self.stories.iter().find(|s| s.id() == id)
    }

    pub fn position(&self, id: StoryId) -> Option<usize> {
        self.stories.iter().position(|s| s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub fn unviewed_count(&self) -> usize {
        self.stories.iter().filter(|s| !s.is_viewed()).count()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn get_mut(&mut self, id: StoryId) -> Result<&mut Story, FeedError> {
        self.stories
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(FeedError::UnknownStory(id))
    }

    async fn persist(&self) {
        if let Err(e) = self.repository.save(&self.stories).await {
            warn!(error = %e, "failed to save stories");
        }
    }
}

/// Drop expired and duplicate stories, then order newest first.
fn assemble(stories: Vec<Story>, now: DateTime<Utc>) -> Vec<Story> {
    let mut seen = HashSet::new();
    let mut live: Vec<Story> = stories
        .into_iter()
        .filter(|s| !s.is_expired(now))
        .filter(|s| seen.insert(s.id()))
        .collect();
    live.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    live
}
