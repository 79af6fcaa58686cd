//! Default stories shown when nothing is stored yet.

use crate::story::{Author, Background, PrivacyTier, Story, StoryBody, StoryId};
use chrono::{DateTime, Duration, Utc};

/// Build the demonstration feed relative to `now`.
///
/// Identifiers and content are fixed; only the timestamps move with `now`.
/// Every seeded story is live at `now` and expires like any other story.
pub fn default_stories(now: DateTime<Utc>) -> Vec<Story> {
    let seeds: [(u128, Author, StoryBody, i64, PrivacyTier); 5] = [
        (
            0x5eed_0001,
            Author::new("Sarah Johnson", "avatars/sarah.jpg").verified(),
            StoryBody::Photo {
                media: "https://images.example.com/stories/sunset-beach.jpg".to_string(),
                caption: Some("Golden hour never gets old".to_string()),
            },
            1,
            PrivacyTier::Public,
        ),
        (
            0x5eed_0002,
            Author::new("Mike Chen", "avatars/mike.jpg"),
            StoryBody::Text {
                content: "Just shipped the new release. Time for a long nap.".to_string(),
                background: Background::Midnight,
            },
            2,
            PrivacyTier::Friends,
        ),
        (
            0x5eed_0003,
            Author::new("Emma Wilson", "avatars/emma.jpg").verified(),
            StoryBody::Video {
                media: "https://media.example.com/stories/city-timelapse.mp4".to_string(),
                caption: None,
            },
            4,
            PrivacyTier::Public,
        ),
        (
            0x5eed_0004,
            Author::new("Alex Rivera", "avatars/alex.jpg"),
            StoryBody::Photo {
                media: "https://images.example.com/stories/trail-run.jpg".to_string(),
                caption: Some("12 miles before breakfast".to_string()),
            },
            6,
            PrivacyTier::CloseFriends,
        ),
        (
            0x5eed_0005,
            Author::new("Priya Patel", "avatars/priya.jpg"),
            StoryBody::Text {
                content: "Who is coming to the book club on Thursday?".to_string(),
                background: Background::Candy,
            },
            9,
            PrivacyTier::Friends,
        ),
    ];

    seeds
        .into_iter()
        .map(|(id, author, body, hours_ago, tier)| {
            let created_at = now - Duration::hours(hours_ago);
            Story::assemble(
                StoryId::from_u128(id),
                author,
                body,
                created_at,
                created_at + Duration::hours(24),
                tier,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::StoryKind;
    use chrono::TimeZone;

    #[test]
    fn test_seeds_are_deterministic_and_live() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let a = default_stories(now);
        let b = default_stories(now);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        assert!(a.iter().all(|s| !s.is_expired(now) && s.is_well_formed()));
        assert!(a.iter().all(|s| !s.is_viewed()));
    }

    #[test]
    fn test_seeds_newest_first_with_every_kind() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let stories = default_stories(now);
        assert!(stories
            .windows(2)
            .all(|w| w[0].created_at() >= w[1].created_at()));
        for kind in StoryKind::all() {
            assert!(stories.iter().any(|s| s.kind() == *kind));
        }
    }
}
