//! Ephemeral story engine.
//!
//! This crate provides:
//! - Stories with a fixed lifetime that disappear once they expire
//! - A creation pipeline that validates drafts and stamps expiry
//! - A feed that loads, de-duplicates, orders and persists stories
//! - A timed playback engine with pause, reactions and replies
//!
//! # Quick Start
//!
//! ```ignore
//! use stories_core::{SessionConfig, StoryRequest, StorySession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new().with_data_dir(".stories");
//!     let mut session = StorySession::new(config).await;
//!
//!     session.create_story(StoryRequest::text("Hello!")).await?;
//!     session.open_viewer(0).await?;
//!
//!     while let Some((_outcome, events)) = session.tick_active().await {
//!         for event in events {
//!             println!("{event:?}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod creation;
pub mod feed;
pub mod headless;
pub mod playback;
pub mod repository;
pub mod seed;
pub mod session;
pub mod story;
pub mod testing;

// Primary public API
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use creation::{create_story, Retention, StoryPipeline, StoryRequest, ValidationError};
pub use feed::{FeedError, StoryFeed};
pub use headless::{HeadlessStories, Output};
pub use playback::{
    CloseReason, PlaybackConfig, PlaybackEngine, PlaybackError, PlaybackEvent, PlaybackKey,
    PlaybackState, TickOutcome, TimerHandle, TimerId,
};
pub use repository::{FileRepository, MemoryRepository, PersistError, StoryRepository};
pub use session::{SessionConfig, SessionError, StorySession};
pub use story::{
    Author, Background, PrivacyTier, Story, StoryBody, StoryId, StoryKind, QUICK_REACTIONS,
};
pub use testing::{StoryFixtures, TestHarness};
