//! Story records and the value types they are built from.
//!
//! A [`Story`] is created once by the creation pipeline and afterwards only
//! changes through [`Story::mark_viewed`] and [`Story::add_reaction`]. Every
//! other field is read-only once the record exists.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Reactions offered by the viewer's quick menu, in display order.
pub const QUICK_REACTIONS: [&str; 6] = ["❤️", "😂", "😮", "😢", "😡", "👍"];

/// Unique identifier for stories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub Uuid);

impl StoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build a fixed identifier. Used for seeded and fixture stories.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl Default for StoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity that owns a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub avatar: String,
    #[serde(default)]
    pub verified: bool,
}

impl Author {
    pub fn new(name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: avatar.into(),
            verified: false,
        }
    }

    /// Mark the author as verified.
    pub fn verified(mut self) -> Self {
        self.verified = true;
        self
    }
}

/// What a story displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryKind {
    Photo,
    Video,
    Text,
}

impl StoryKind {
    pub fn all() -> &'static [StoryKind] {
        &[StoryKind::Photo, StoryKind::Video, StoryKind::Text]
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoryKind::Photo => "Photo",
            StoryKind::Video => "Video",
            StoryKind::Text => "Text",
        }
    }

    /// Whether stories of this kind must reference media.
    pub fn requires_media(&self) -> bool {
        matches!(self, StoryKind::Photo | StoryKind::Video)
    }

    /// Parse a kind from user input (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "photo" | "image" => Some(StoryKind::Photo),
            "video" => Some(StoryKind::Video),
            "text" => Some(StoryKind::Text),
            _ => None,
        }
    }
}

impl fmt::Display for StoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Presentation style for text stories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    #[default]
    Sunset,
    Ocean,
    Forest,
    Midnight,
    Candy,
}

impl Background {
    pub fn all() -> &'static [Background] {
        &[
            Background::Sunset,
            Background::Ocean,
            Background::Forest,
            Background::Midnight,
            Background::Candy,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Background::Sunset => "Sunset",
            Background::Ocean => "Ocean",
            Background::Forest => "Forest",
            Background::Midnight => "Midnight",
            Background::Candy => "Candy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|b| b.name().to_lowercase() == lower)
    }
}

/// Who may see a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrivacyTier {
    Public,
    #[default]
    Friends,
    CloseFriends,
}

impl PrivacyTier {
    pub fn all() -> &'static [PrivacyTier] {
        &[
            PrivacyTier::Public,
            PrivacyTier::Friends,
            PrivacyTier::CloseFriends,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrivacyTier::Public => "Public",
            PrivacyTier::Friends => "Friends",
            PrivacyTier::CloseFriends => "Close Friends",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "public" => Some(PrivacyTier::Public),
            "friends" => Some(PrivacyTier::Friends),
            "closefriends" | "close" => Some(PrivacyTier::CloseFriends),
            _ => None,
        }
    }
}

/// Kind-specific payload of a story.
///
/// Flattened into the story record, so the persisted form carries flat
/// `type`, `media`, `content` and `background` fields. For media stories the
/// optional caption is stored under `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoryBody {
    Photo {
        media: String,
        #[serde(rename = "content", default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Video {
        media: String,
        #[serde(rename = "content", default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Text {
        content: String,
        #[serde(default)]
        background: Background,
    },
}

impl StoryBody {
    pub fn kind(&self) -> StoryKind {
        match self {
            StoryBody::Photo { .. } => StoryKind::Photo,
            StoryBody::Video { .. } => StoryKind::Video,
            StoryBody::Text { .. } => StoryKind::Text,
        }
    }
}

/// An ephemeral story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    id: StoryId,
    author: Author,
    #[serde(flatten)]
    body: StoryBody,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    #[serde(default)]
    privacy_tier: PrivacyTier,
    #[serde(default)]
    viewed: bool,
    #[serde(default)]
    reactions: BTreeMap<String, u32>,
}

impl Story {
    /// Assemble a fresh, unviewed story with no reactions.
    ///
    /// Callers outside the crate go through the creation pipeline, which
    /// guarantees `expires_at > created_at`.
    pub(crate) fn assemble(
        id: StoryId,
        author: Author,
        body: StoryBody,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        privacy_tier: PrivacyTier,
    ) -> Self {
        debug_assert!(expires_at > created_at);
        Self {
            id,
            author,
            body,
            created_at,
            expires_at,
            privacy_tier,
            viewed: false,
            reactions: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> StoryId {
        self.id
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn body(&self) -> &StoryBody {
        &self.body
    }

    pub fn kind(&self) -> StoryKind {
        self.body.kind()
    }

    /// Media reference for photo and video stories.
    pub fn media(&self) -> Option<&str> {
        match &self.body {
            StoryBody::Photo { media, .. } | StoryBody::Video { media, .. } => Some(media),
            StoryBody::Text { .. } => None,
        }
    }

    /// Text payload, or the caption of a media story.
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            StoryBody::Photo { caption, .. } | StoryBody::Video { caption, .. } => {
                caption.as_deref()
            }
            StoryBody::Text { content, .. } => Some(content),
        }
    }

    pub fn background(&self) -> Option<Background> {
        match &self.body {
            StoryBody::Text { background, .. } => Some(*background),
            _ => None,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn privacy_tier(&self) -> PrivacyTier {
        self.privacy_tier
    }

    pub fn is_viewed(&self) -> bool {
        self.viewed
    }

    pub fn reactions(&self) -> &BTreeMap<String, u32> {
        &self.reactions
    }

    pub fn reaction_count(&self, symbol: &str) -> u32 {
        self.reactions.get(symbol).copied().unwrap_or(0)
    }

    pub fn total_reactions(&self) -> u32 {
        self.reactions.values().sum()
    }

    /// Retention window chosen at creation.
    pub fn retention(&self) -> Duration {
        self.expires_at - self.created_at
    }

    /// A record whose expiry does not come after its creation is corrupt.
    pub fn is_well_formed(&self) -> bool {
        self.expires_at > self.created_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time until expiry, floored at zero.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    /// Human-readable remaining lifetime, e.g. `5h left`.
    pub fn format_remaining(&self, now: DateTime<Utc>) -> String {
        let remaining = self.time_remaining(now);
        if remaining <= Duration::zero() {
            "expired".to_string()
        } else if remaining.num_hours() >= 1 {
            format!("{}h left", remaining.num_hours())
        } else if remaining.num_minutes() >= 1 {
            format!("{}m left", remaining.num_minutes())
        } else {
            "<1m left".to_string()
        }
    }

    /// Set the viewed flag. Returns `true` only on the first call.
    pub fn mark_viewed(&mut self) -> bool {
        if self.viewed {
            return false;
        }
        self.viewed = true;
        true
    }

    /// Increment the count for `symbol` and return the new count.
    pub fn add_reaction(&mut self, symbol: &str) -> u32 {
        let count = self.reactions.entry(symbol.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }
}
