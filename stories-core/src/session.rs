//! StorySession - the primary public API for the stories engine.
//!
//! A session ties together the feed, the creation pipeline and the
//! playback engine. Every command that drives the viewer drains the
//! engine's events and applies them to the feed, so viewed flags and
//! reaction counts are persisted as soon as playback reports them.

use crate::clock::{SharedClock, SystemClock};
use crate::creation::{StoryPipeline, StoryRequest, ValidationError};
use crate::feed::{FeedError, StoryFeed};
use crate::playback::{
    PlaybackConfig, PlaybackEngine, PlaybackError, PlaybackEvent, PlaybackKey, TickOutcome,
    TimerId,
};
use crate::repository::{FileRepository, MemoryRepository, StoryRepository};
use crate::story::{Author, Story, StoryId};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from StorySession operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Invalid story: {0}")]
    Validation(#[from] ValidationError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Configuration for creating a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory holding `user_stories.json`. `None` keeps stories in memory.
    pub data_dir: Option<PathBuf>,

    /// Playback timing.
    pub playback: PlaybackConfig,

    /// Author attached to stories created in this session.
    pub author: Author,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            playback: PlaybackConfig::default(),
            author: Author::new("You", "avatars/you.png"),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist stories under `dir`.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = playback;
        self
    }

    pub fn with_author(mut self, author: Author) -> Self {
        self.author = author;
        self
    }
}

/// A stories session.
pub struct StorySession {
    feed: StoryFeed,
    engine: PlaybackEngine,
    pipeline: StoryPipeline,
}

impl StorySession {
    /// Create a session on the system clock.
    ///
    /// Uses a [`FileRepository`] when a data directory is configured and a
    /// [`MemoryRepository`] otherwise.
    pub async fn new(config: SessionConfig) -> Self {
        let repository: Arc<dyn StoryRepository> = match &config.data_dir {
            Some(dir) => {
                let repo = FileRepository::in_dir(dir);
                info!(path = %repo.path().display(), "using file storage");
                Arc::new(repo)
            }
            None => {
                info!("using in-memory storage");
                Arc::new(MemoryRepository::new())
            }
        };
        Self::with_parts(repository, Arc::new(SystemClock), config).await
    }

    /// Create a session from explicit storage and clock.
    pub async fn with_parts(
        repository: Arc<dyn StoryRepository>,
        clock: SharedClock,
        config: SessionConfig,
    ) -> Self {
        let feed = StoryFeed::open(repository, clock.clone()).await;
        Self {
            feed,
            engine: PlaybackEngine::new(config.playback),
            pipeline: StoryPipeline::new(config.author, clock),
        }
    }

    // =========================================================================
    // Feed
    // =========================================================================

    pub fn feed(&self) -> &StoryFeed {
        &self.feed
    }

    pub fn stories(&self) -> &[Story] {
        self.feed.stories()
    }

    pub fn story(&self, id: StoryId) -> Option<&Story> {
        self.feed.get(id)
    }

    /// Validate and publish a new story at the front of the feed.
    pub async fn create_story(&mut self, request: StoryRequest) -> Result<Story, SessionError> {
        let story = self.pipeline.create(request)?;
        self.feed.add_story(story.clone()).await;
        Ok(story)
    }

    /// Reload the feed from storage, dropping expired stories.
    ///
    /// An open viewer keeps playing its own snapshot.
    pub async fn refresh(&mut self) {
        self.feed.refresh().await;
    }

    // =========================================================================
    // Viewer
    // =========================================================================

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    /// The story currently on screen, if the viewer is open.
    pub fn current_story(&self) -> Option<&Story> {
        if !self.engine.is_open() {
            return None;
        }
        self.engine.current_story_id().and_then(|id| self.feed.get(id))
    }

    /// Open the viewer at feed position `index`.
    pub async fn open_viewer(&mut self, index: usize) -> Result<Vec<PlaybackEvent>, SessionError> {
        self.engine.open(self.feed.stories(), index)?;
        Ok(self.sync().await)
    }

    /// Open the viewer on a specific story.
    pub async fn open_story(&mut self, id: StoryId) -> Result<Vec<PlaybackEvent>, SessionError> {
        let index = self.feed.position(id).ok_or(FeedError::UnknownStory(id))?;
        self.open_viewer(index).await
    }

    /// Deliver a timer tick.
    pub async fn tick(&mut self, timer: TimerId) -> (TickOutcome, Vec<PlaybackEvent>) {
        let outcome = self.engine.tick(timer);
        (outcome, self.sync().await)
    }

    /// Tick the active timer, if any.
    pub async fn tick_active(&mut self) -> Option<(TickOutcome, Vec<PlaybackEvent>)> {
        let timer = self.engine.timer()?;
        Some(self.tick(timer.id()).await)
    }

    pub async fn next(&mut self) -> Result<Vec<PlaybackEvent>, SessionError> {
        self.engine.next()?;
        Ok(self.sync().await)
    }

    pub async fn previous(&mut self) -> Result<Vec<PlaybackEvent>, SessionError> {
        self.engine.previous()?;
        Ok(self.sync().await)
    }

    pub async fn navigate(&mut self, index: usize) -> Result<Vec<PlaybackEvent>, SessionError> {
        self.engine.navigate(index)?;
        Ok(self.sync().await)
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.engine.toggle_pause()
    }

    pub fn open_reaction_menu(&mut self) -> Result<(), SessionError> {
        Ok(self.engine.open_reaction_menu()?)
    }

    pub fn close_reaction_menu(&mut self) {
        self.engine.close_reaction_menu();
    }

    pub async fn react(&mut self, symbol: &str) -> Result<Vec<PlaybackEvent>, SessionError> {
        self.engine.react(symbol)?;
        Ok(self.sync().await)
    }

    pub fn begin_reply(&mut self) -> Result<(), SessionError> {
        Ok(self.engine.begin_reply()?)
    }

    pub fn update_reply(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        Ok(self.engine.update_reply(text)?)
    }

    pub async fn send_reply(&mut self) -> Result<Vec<PlaybackEvent>, SessionError> {
        self.engine.send_reply()?;
        Ok(self.sync().await)
    }

    pub fn cancel_reply(&mut self) {
        self.engine.cancel_reply();
    }

    pub async fn handle_key(&mut self, key: PlaybackKey) -> (bool, Vec<PlaybackEvent>) {
        let handled = self.engine.handle_key(key);
        (handled, self.sync().await)
    }

    pub async fn close_viewer(&mut self) -> Vec<PlaybackEvent> {
        self.engine.close();
        self.sync().await
    }

    // =========================================================================
    // Event forwarding
    // =========================================================================

    async fn sync(&mut self) -> Vec<PlaybackEvent> {
        let events = self.engine.take_events();
        for event in &events {
            self.apply(event).await;
        }
        events
    }

    async fn apply(&mut self, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::Viewed { story_id } => {
                if let Err(e) = self.feed.mark_viewed(*story_id).await {
                    warn!(error = %e, "viewed story is no longer in the feed");
                }
            }
            PlaybackEvent::Reacted { story_id, symbol } => {
                if let Err(e) = self.feed.add_reaction(*story_id, symbol).await {
                    warn!(error = %e, "reaction dropped");
                }
            }
            PlaybackEvent::ReplySent { story_id, text } => {
                // Replies leave the device; nothing is stored locally.
                info!(story_id = %story_id, chars = text.chars().count(), "reply sent");
            }
            PlaybackEvent::Advanced { .. } => {}
            PlaybackEvent::Closed { reason } => {
                debug!(?reason, "viewer closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{CloseReason, PlaybackState};
    use crate::testing::TestHarness;

    #[tokio::test]
    async fn test_opening_marks_viewed_and_persists() {
        let mut harness = TestHarness::new().await;
        let first = harness.session().stories()[0].id();

        harness.session_mut().open_viewer(0).await.unwrap();

        assert!(harness.session().story(first).unwrap().is_viewed());
        assert!(harness.stored_story(first).await.unwrap().is_viewed());
    }

    #[tokio::test]
    async fn test_reactions_counted_and_persisted() {
        let mut harness = TestHarness::new().await;
        let session = harness.session_mut();
        session.open_viewer(1).await.unwrap();
        let id = session.current_story().unwrap().id();

        session.open_reaction_menu().unwrap();
        session.react("😂").await.unwrap();
        session.react("😂").await.unwrap();

        assert_eq!(session.engine().state(), PlaybackState::Paused);
        assert_eq!(session.story(id).unwrap().reaction_count("😂"), 2);
        assert_eq!(harness.stored_story(id).await.unwrap().reaction_count("😂"), 2);
    }

    #[tokio::test]
    async fn test_create_story_goes_first() {
        let mut harness = TestHarness::new().await;
        let story = harness
            .session_mut()
            .create_story(StoryRequest::text("fresh off the press"))
            .await
            .unwrap();

        assert_eq!(harness.session().stories()[0].id(), story.id());
        assert_eq!(story.created_at(), harness.now());
        assert!(harness.stored_story(story.id()).await.is_some());
    }

    #[tokio::test]
    async fn test_invalid_story_rejected_without_saving() {
        let mut harness = TestHarness::new().await;
        let before = harness.session().stories().len();

        let err = harness
            .session_mut()
            .create_story(StoryRequest::text("  "))
            .await
            .unwrap_err();

        assert_eq!(err, SessionError::Validation(ValidationError::EmptyContent));
        assert_eq!(harness.session().stories().len(), before);
    }

    #[tokio::test]
    async fn test_open_unknown_story() {
        let mut harness = TestHarness::new().await;
        let missing = StoryId::new();
        let err = harness.session_mut().open_story(missing).await.unwrap_err();
        assert_eq!(err, SessionError::Feed(FeedError::UnknownStory(missing)));
    }

    #[tokio::test]
    async fn test_playing_to_the_end_views_everything() {
        let mut harness = TestHarness::new().await;
        let session = harness.session_mut();
        session.open_viewer(0).await.unwrap();

        let mut finished = false;
        while let Some((outcome, events)) = session.tick_active().await {
            if outcome == TickOutcome::Finished {
                assert!(events.contains(&PlaybackEvent::Closed {
                    reason: CloseReason::EndOfFeed
                }));
                finished = true;
            }
        }

        assert!(finished);
        assert_eq!(session.feed().unviewed_count(), 0);
        assert!(session.current_story().is_none());
    }

    #[tokio::test]
    async fn test_reply_is_not_stored() {
        let mut harness = TestHarness::new().await;
        let session = harness.session_mut();
        session.open_viewer(0).await.unwrap();
        session.begin_reply().unwrap();
        session.update_reply("love this").unwrap();
        let events = session.send_reply().await.unwrap();

        assert!(matches!(
            events.as_slice(),
            [PlaybackEvent::ReplySent { text, .. }] if text == "love this"
        ));
        let raw = harness.raw_storage().await.unwrap_or_default();
        assert!(!raw.contains("love this"));
    }
}
