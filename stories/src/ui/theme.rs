//! Color theme and styling for the stories TUI

use ratatui::style::{Color, Modifier, Style};
use stories_core::{Background, PrivacyTier, StoryKind};

/// Stories UI color theme
#[derive(Debug, Clone)]
pub struct StoryTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,

    // Progress bar
    pub progress_done: Color,
    pub progress_active: Color,
    pub progress_pending: Color,

    // Tray
    pub unviewed_ring: Color,
    pub viewed_ring: Color,
    pub verified: Color,

    // Text colors
    pub caption_text: Color,
    pub reply_text: Color,
    pub system_text: Color,
    pub error_text: Color,
}

impl Default for StoryTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Magenta,

            progress_done: Color::White,
            progress_active: Color::LightMagenta,
            progress_pending: Color::DarkGray,

            unviewed_ring: Color::LightMagenta,
            viewed_ring: Color::DarkGray,
            verified: Color::LightBlue,

            caption_text: Color::Gray,
            reply_text: Color::Cyan,
            system_text: Color::DarkGray,
            error_text: Color::LightRed,
        }
    }
}

impl StoryTheme {
    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.foreground)
            .add_modifier(Modifier::BOLD)
    }

    pub fn caption_style(&self) -> Style {
        Style::default()
            .fg(self.caption_text)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn reply_style(&self) -> Style {
        Style::default().fg(self.reply_text)
    }

    /// Get style for system messages
    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    pub fn error_style(&self) -> Style {
        Style::default()
            .fg(self.error_text)
            .add_modifier(Modifier::BOLD)
    }

    /// Avatar ring: bright until the story is viewed.
    pub fn ring_style(&self, viewed: bool) -> Style {
        if viewed {
            Style::default().fg(self.viewed_ring)
        } else {
            Style::default()
                .fg(self.unviewed_ring)
                .add_modifier(Modifier::BOLD)
        }
    }

    pub fn verified_style(&self) -> Style {
        Style::default().fg(self.verified)
    }

    /// Fill color behind a text story.
    pub fn background_color(&self, background: Background) -> Color {
        match background {
            Background::Sunset => Color::Rgb(0xf5, 0x6b, 0x3c),
            Background::Ocean => Color::Rgb(0x1e, 0x6f, 0xb8),
            Background::Forest => Color::Rgb(0x2e, 0x7d, 0x32),
            Background::Midnight => Color::Rgb(0x1a, 0x1a, 0x40),
            Background::Candy => Color::Rgb(0xe0, 0x4f, 0x9c),
        }
    }

    pub fn kind_icon(&self, kind: StoryKind) -> &'static str {
        match kind {
            StoryKind::Photo => "▣",
            StoryKind::Video => "▶",
            StoryKind::Text => "¶",
        }
    }

    pub fn privacy_style(&self, tier: PrivacyTier) -> Style {
        match tier {
            PrivacyTier::Public => Style::default().fg(Color::Green),
            PrivacyTier::Friends => Style::default().fg(Color::Yellow),
            PrivacyTier::CloseFriends => Style::default().fg(Color::LightGreen),
        }
    }
}
