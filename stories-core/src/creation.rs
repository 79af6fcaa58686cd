//! Story creation pipeline.
//!
//! Turns a [`StoryRequest`] into a [`Story`] or a [`ValidationError`]. The
//! pipeline never persists anything; the feed does that once the story is
//! added.

use crate::clock::SharedClock;
use crate::story::{Author, Background, PrivacyTier, Story, StoryBody, StoryId, StoryKind};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::info;

/// Maximum length of a text story, in characters.
pub const MAX_TEXT_LENGTH: usize = 500;

/// Maximum length of a photo or video caption, in characters.
pub const MAX_CAPTION_LENGTH: usize = 200;

/// Reasons a creation request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Text stories need some text")]
    EmptyContent,

    #[error("{kind} stories need a media reference")]
    MissingMedia { kind: StoryKind },

    #[error("Too long: at most {max} characters allowed, found {found}")]
    ContentTooLong { max: usize, found: usize },
}

/// How long a story stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Retention {
    SixHours,
    TwelveHours,
    #[default]
    TwentyFourHours,
    /// Custom number of hours, clamped to `[1, 48]`.
    Custom(u32),
}

impl Retention {
    pub const MIN_CUSTOM_HOURS: u32 = 1;
    pub const MAX_CUSTOM_HOURS: u32 = 48;

    /// The presets offered by pickers, in display order.
    pub fn presets() -> &'static [Retention] {
        &[
            Retention::SixHours,
            Retention::TwelveHours,
            Retention::TwentyFourHours,
        ]
    }

    pub fn hours(&self) -> u32 {
        match self {
            Retention::SixHours => 6,
            Retention::TwelveHours => 12,
            Retention::TwentyFourHours => 24,
            Retention::Custom(hours) => {
                (*hours).clamp(Self::MIN_CUSTOM_HOURS, Self::MAX_CUSTOM_HOURS)
            }
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::hours(i64::from(self.hours()))
    }

    pub fn label(&self) -> String {
        format!("{} hours", self.hours())
    }

    /// Parse `6h`, `12h`, `24h` or any other `<n>h` (clamped).
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim().to_lowercase();
        let digits = trimmed.strip_suffix('h').unwrap_or(&trimmed);
        let hours: u32 = digits.parse().ok()?;
        Some(match hours {
            6 => Retention::SixHours,
            12 => Retention::TwelveHours,
            24 => Retention::TwentyFourHours,
            other => Retention::Custom(other),
        })
    }
}

/// Input to the creation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRequest {
    pub kind: StoryKind,
    pub media: Option<String>,
    pub content: Option<String>,
    pub background: Option<Background>,
    pub privacy_tier: PrivacyTier,
    pub retention: Retention,
}

impl StoryRequest {
    /// An empty request of the given kind.
    pub fn new(kind: StoryKind) -> Self {
        Self {
            kind,
            media: None,
            content: None,
            background: None,
            privacy_tier: PrivacyTier::default(),
            retention: Retention::default(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::new(StoryKind::Text)
        }
    }

    pub fn photo(media: impl Into<String>) -> Self {
        Self {
            media: Some(media.into()),
            ..Self::new(StoryKind::Photo)
        }
    }

    pub fn video(media: impl Into<String>) -> Self {
        Self {
            media: Some(media.into()),
            ..Self::new(StoryKind::Video)
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.content = Some(caption.into());
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_privacy(mut self, tier: PrivacyTier) -> Self {
        self.privacy_tier = tier;
        self
    }

    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }
}

/// Validate `request` and build a story created at `now`.
pub fn create_story(
    request: StoryRequest,
    author: Author,
    now: DateTime<Utc>,
) -> Result<Story, ValidationError> {
    let body = build_body(request.kind, request.media, request.content, request.background)?;
    let expires_at = now + request.retention.duration();

    Ok(Story::assemble(
        StoryId::new(),
        author,
        body,
        now,
        expires_at,
        request.privacy_tier,
    ))
}

fn build_body(
    kind: StoryKind,
    media: Option<String>,
    content: Option<String>,
    background: Option<Background>,
) -> Result<StoryBody, ValidationError> {
    match kind {
        StoryKind::Text => {
            let content = content
                .filter(|c| !c.trim().is_empty())
                .ok_or(ValidationError::EmptyContent)?;
            check_length(&content, MAX_TEXT_LENGTH)?;
            Ok(StoryBody::Text {
                content,
                background: background.unwrap_or_default(),
            })
        }
        StoryKind::Photo | StoryKind::Video => {
            let media = media
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .ok_or(ValidationError::MissingMedia { kind })?;
            let caption = content.filter(|c| !c.trim().is_empty());
            if let Some(caption) = &caption {
                check_length(caption, MAX_CAPTION_LENGTH)?;
            }
            Ok(if kind == StoryKind::Photo {
                StoryBody::Photo { media, caption }
            } else {
                StoryBody::Video { media, caption }
            })
        }
    }
}

fn check_length(text: &str, max: usize) -> Result<(), ValidationError> {
    let found = text.chars().count();
    if found > max {
        return Err(ValidationError::ContentTooLong { max, found });
    }
    Ok(())
}

/// Creates stories for one author using a shared clock.
pub struct StoryPipeline {
    author: Author,
    clock: SharedClock,
}

impl StoryPipeline {
    pub fn new(author: Author, clock: SharedClock) -> Self {
        Self { author, clock }
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn create(&self, request: StoryRequest) -> Result<Story, ValidationError> {
        let story = create_story(request, self.author.clone(), self.clock.now())?;
        info!(
            story_id = %story.id(),
            kind = %story.kind(),
            hours = story.retention().num_hours(),
            "story created"
        );
        Ok(story)
    }
}
