//! Screen layouts

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Areas of the viewer screen.
pub struct ViewerLayout {
    pub progress: Rect,
    pub card: Rect,
    pub reply: Rect,
    pub hotkeys: Rect,
}

impl ViewerLayout {
    pub fn calculate(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Progress
                Constraint::Min(5),    // Story
                Constraint::Length(3), // Reply input
                Constraint::Length(1), // Hotkeys
            ])
            .split(area);

        Self {
            progress: chunks[0],
            card: chunks[1],
            reply: chunks[2],
            hotkeys: chunks[3],
        }
    }
}

/// Areas of the tray screen.
pub struct TrayLayout {
    pub title: Rect,
    pub list: Rect,
    pub status: Rect,
    pub hotkeys: Rect,
}

impl TrayLayout {
    pub fn calculate(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        Self {
            title: chunks[0],
            list: chunks[1],
            status: chunks[2],
            hotkeys: chunks[3],
        }
    }
}

/// A `width` x `height` rectangle centered in `area`, shrunk to fit.
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Portrait frame for the viewer, like a phone screen on a wide terminal.
pub fn viewer_frame(area: Rect) -> Rect {
    let width = (area.height.saturating_mul(3) / 2).clamp(40, 90);
    centered_rect_fixed(width, area.height, area)
}
