//! Testing utilities for the stories engine.
//!
//! This module provides tools for integration testing:
//! - `StoryFixtures` for stories with fixed, predictable timestamps
//! - `TestHarness` for a session on in-memory storage and a manual clock
//! - Assertion helpers for verifying viewer and feed state

use crate::clock::ManualClock;
use crate::playback::{PlaybackConfig, PlaybackState};
use crate::repository::MemoryRepository;
use crate::session::{SessionConfig, StorySession};
use crate::story::{Author, Background, PrivacyTier, Story, StoryBody, StoryId, StoryKind};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

/// Builds stories relative to a fixed instant.
///
/// Unless stated otherwise a fixture story was created one hour before
/// [`StoryFixtures::now`] and lives for 24 hours.
#[derive(Debug, Clone)]
pub struct StoryFixtures {
    now: DateTime<Utc>,
    author: Author,
}

impl Default for StoryFixtures {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryFixtures {
    pub fn new() -> Self {
        Self {
            now: Utc
                .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .single()
                .unwrap_or_default(),
            author: Author::new("Test Author", "avatars/test.png"),
        }
    }

    /// The reference instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// A manual clock set to [`StoryFixtures::now`].
    pub fn clock(&self) -> ManualClock {
        ManualClock::new(self.now)
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn text(&self, content: &str) -> Story {
        self.text_created(content, Duration::hours(1))
    }

    /// A text story created `age` before now.
    pub fn text_created(&self, content: &str, age: Duration) -> Story {
        self.build(text_body(content), self.now - age, Duration::hours(24))
    }

    /// A text story with a custom lifetime.
    pub fn text_with_retention(&self, content: &str, retention: Duration) -> Story {
        self.build(text_body(content), self.now - Duration::hours(1), retention)
    }

    /// A text story that expired an hour ago.
    pub fn expired_text(&self, content: &str) -> Story {
        self.build(text_body(content), self.now - Duration::hours(25), Duration::hours(24))
    }

    pub fn photo(&self, media: &str) -> Story {
        let body = StoryBody::Photo {
            media: media.to_string(),
            caption: None,
        };
        self.build(body, self.now - Duration::hours(1), Duration::hours(24))
    }

    pub fn video(&self, media: &str) -> Story {
        let body = StoryBody::Video {
            media: media.to_string(),
            caption: None,
        };
        self.build(body, self.now - Duration::hours(1), Duration::hours(24))
    }

    /// A story of `kind` with placeholder content.
    pub fn of_kind(&self, kind: StoryKind) -> Story {
        match kind {
            StoryKind::Text => self.text("fixture text"),
            StoryKind::Photo => self.photo("fixtures/photo.jpg"),
            StoryKind::Video => self.video("fixtures/clip.mp4"),
        }
    }

    fn build(&self, body: StoryBody, created_at: DateTime<Utc>, retention: Duration) -> Story {
        Story::assemble(
            StoryId::new(),
            self.author.clone(),
            body,
            created_at,
            created_at + retention,
            PrivacyTier::Friends,
        )
    }
}

fn text_body(content: &str) -> StoryBody {
    StoryBody::Text {
        content: content.to_string(),
        background: Background::default(),
    }
}

/// A session over in-memory storage and a manual clock.
pub struct TestHarness {
    session: StorySession,
    repository: Arc<MemoryRepository>,
    clock: ManualClock,
}

impl TestHarness {
    /// A harness whose feed starts with the default seeded stories.
    pub async fn new() -> Self {
        Self::build(&[], PlaybackConfig::default()).await
    }

    /// A harness whose storage starts with `stories`.
    pub async fn with_stories(stories: &[Story]) -> Self {
        Self::build(stories, PlaybackConfig::default()).await
    }

    /// A harness with `stories` and custom playback timing.
    pub async fn with_playback(stories: &[Story], playback: PlaybackConfig) -> Self {
        Self::build(stories, playback).await
    }

    async fn build(stories: &[Story], playback: PlaybackConfig) -> Self {
        use crate::repository::StoryRepository;

        let fixtures = StoryFixtures::new();
        let clock = fixtures.clock();
        let repository = Arc::new(MemoryRepository::new());
        if !stories.is_empty() {
            // In-memory saves only fail on serialization, which stories never hit.
            let _ = repository.save(stories).await;
        }
        let config = SessionConfig::new().with_playback(playback);
        let session =
            StorySession::with_parts(repository.clone(), Arc::new(clock.clone()), config).await;
        Self {
            session,
            repository,
            clock,
        }
    }

    pub fn session(&self) -> &StorySession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut StorySession {
        &mut self.session
    }

    /// Hand the session to a driver, keeping nothing else.
    pub fn into_session(self) -> StorySession {
        self.session
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn now(&self) -> DateTime<Utc> {
        use crate::clock::Clock;
        self.clock.now()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// The persisted payload, if anything was saved.
    pub async fn raw_storage(&self) -> Option<String> {
        self.repository.raw().await
    }

    /// The persisted copy of a story, ignoring expiry.
    pub async fn stored_story(&self, id: StoryId) -> Option<Story> {
        self.repository
            .stored()
            .await
            .into_iter()
            .find(|s| s.id() == id)
    }

    /// Deliver `count` ticks to whatever timer is active.
    ///
    /// Returns how many ticks were actually delivered.
    pub async fn tick_n(&mut self, count: usize) -> usize {
        let mut delivered = 0;
        for _ in 0..count {
            if self.session.tick_active().await.is_none() {
                break;
            }
            delivered += 1;
        }
        delivered
    }

    pub fn state(&self) -> PlaybackState {
        self.session.engine().state()
    }

    pub fn current_index(&self) -> usize {
        self.session.engine().current_index()
    }

    pub fn is_viewed(&self, id: StoryId) -> bool {
        self.session.story(id).is_some_and(|s| s.is_viewed())
    }
}

// =============================================================================
// Assertion helpers
// =============================================================================

/// Assert the viewer is in `expected`.
#[track_caller]
pub fn assert_state(harness: &TestHarness, expected: PlaybackState) {
    let actual = harness.state();
    assert_eq!(actual, expected, "Expected viewer state {expected:?}, got {actual:?}");
}

/// Assert the viewer shows the story at `index`.
#[track_caller]
pub fn assert_current(harness: &TestHarness, index: usize) {
    let actual = harness.current_index();
    assert_eq!(actual, index, "Expected story {index} on screen, got {actual}");
}

/// Assert progress of the current story, within a small tolerance.
#[track_caller]
pub fn assert_progress(harness: &TestHarness, expected: f64) {
    let actual = harness.session().engine().progress();
    assert!(
        (actual - expected).abs() < 1e-6,
        "Expected progress {expected:.3}%, got {actual:.3}%"
    );
}

/// Assert a story has been viewed.
#[track_caller]
pub fn assert_viewed(harness: &TestHarness, id: StoryId) {
    assert!(harness.is_viewed(id), "Expected story {id} to be viewed");
}

/// Assert a story has NOT been viewed.
#[track_caller]
pub fn assert_not_viewed(harness: &TestHarness, id: StoryId) {
    assert!(!harness.is_viewed(id), "Expected story {id} to NOT be viewed");
}

/// Assert the in-memory reaction count for `symbol`.
#[track_caller]
pub fn assert_reactions(harness: &TestHarness, id: StoryId, symbol: &str, count: u32) {
    let actual = harness
        .session()
        .story(id)
        .map(|s| s.reaction_count(symbol))
        .unwrap_or_default();
    assert_eq!(
        actual, count,
        "Expected {count} '{symbol}' reactions on {id}, got {actual}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_timestamps() {
        let fixtures = StoryFixtures::new();
        let story = fixtures.text("hello");
        assert_eq!(story.created_at(), fixtures.now() - Duration::hours(1));
        assert!(!story.is_expired(fixtures.now()));
        assert!(fixtures.expired_text("bye").is_expired(fixtures.now()));
    }

    #[test]
    fn test_of_kind() {
        let fixtures = StoryFixtures::new();
        for kind in StoryKind::all() {
            assert_eq!(fixtures.of_kind(*kind).kind(), *kind);
        }
    }

    #[tokio::test]
    async fn test_harness_with_stories() {
        let fixtures = StoryFixtures::new();
        let story = fixtures.photo("fixtures/a.jpg");
        let mut harness = TestHarness::with_stories(std::slice::from_ref(&story)).await;

        assert_eq!(harness.session().stories().len(), 1);
        assert_not_viewed(&harness, story.id());
        assert_state(&harness, PlaybackState::Idle);

        harness.session_mut().open_viewer(0).await.unwrap();
        assert_viewed(&harness, story.id());
        assert_eq!(harness.tick_n(10).await, 10);
        assert_progress(&harness, 100.0 * 10.0 / 70.0);
    }
}
