//! Story tray: one row per story in the feed.

use chrono::{DateTime, Utc};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};
use stories_core::{Story, StoryBody};

use crate::ui::theme::StoryTheme;

/// Longest preview shown for text stories and captions.
const PREVIEW_CHARS: usize = 40;

fn preview(story: &Story) -> String {
    let text = match story.body() {
        StoryBody::Text { content, .. } => content.as_str(),
        StoryBody::Photo { media, caption } | StoryBody::Video { media, caption } => {
            caption.as_deref().unwrap_or(media)
        }
    };
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > PREVIEW_CHARS {
        let cut: String = first_line.chars().take(PREVIEW_CHARS - 1).collect();
        format!("{cut}…")
    } else {
        first_line.to_string()
    }
}

fn tray_item<'a>(story: &Story, now: DateTime<Utc>, theme: &StoryTheme) -> ListItem<'a> {
    let ring = if story.is_viewed() { "○" } else { "◉" };
    let author = story.author();

    let mut spans = vec![
        Span::styled(format!("{ring} "), theme.ring_style(story.is_viewed())),
        Span::styled(
            author.name.clone(),
            Style::default()
                .fg(theme.foreground)
                .add_modifier(if story.is_viewed() {
                    Modifier::empty()
                } else {
                    Modifier::BOLD
                }),
        ),
    ];
    if author.verified {
        spans.push(Span::styled(" ✓", theme.verified_style()));
    }
    spans.push(Span::styled(
        format!("  {} ", theme.kind_icon(story.kind())),
        Style::default().fg(Color::Gray),
    ));
    spans.push(Span::styled(preview(story), theme.caption_style()));
    spans.push(Span::styled(
        format!("  {}", story.format_remaining(now)),
        theme.system_style(),
    ));
    if story.total_reactions() > 0 {
        spans.push(Span::raw(format!("  ♥ {}", story.total_reactions())));
    }

    ListItem::new(Line::from(spans))
}

/// The tray list, ready for `render_stateful_widget`.
pub fn tray_list<'a>(
    stories: &[Story],
    unviewed: usize,
    now: DateTime<Utc>,
    theme: &StoryTheme,
) -> List<'a> {
    let items: Vec<ListItem> = stories.iter().map(|s| tray_item(s, now, theme)).collect();

    List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style(true))
                .title(format!(" Stories ({unviewed} new) ")),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(0x33, 0x22, 0x44))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use stories_core::StoryFixtures;

    #[test]
    fn test_preview_truncates() {
        let fixtures = StoryFixtures::new();
        let long = fixtures.text(&"word ".repeat(20));
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS);
        assert!(shown.ends_with('…'));

        let short = fixtures.text("hi\nsecond line");
        assert_eq!(preview(&short), "hi");
    }

    #[test]
    fn test_preview_falls_back_to_media() {
        let fixtures = StoryFixtures::new();
        assert_eq!(preview(&fixtures.photo("pics/cat.jpg")), "pics/cat.jpg");
    }
}
