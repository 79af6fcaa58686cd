//! Render orchestration for the stories TUI

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use stories_core::{PlaybackState, QUICK_REACTIONS};

use crate::app::{App, Screen};
use crate::ui::layout::{centered_rect_fixed, viewer_frame, TrayLayout, ViewerLayout};
use crate::ui::widgets::{tray_list, InputWidget, ProgressBarWidget, StoryCardWidget};

/// Main render function
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    match app.screen {
        Screen::Tray => render_tray(frame, app, area),
        Screen::Viewer => render_viewer(frame, app, area),
        Screen::Create => {
            render_tray(frame, app, area);
            let popup = centered_rect_fixed(64, 18, area);
            if let Some(creation) = app.creation.as_mut() {
                creation.render(frame, popup, &app.theme);
            }
        }
    }
}

/// Render the story tray
fn render_tray(frame: &mut Frame, app: &mut App, area: Rect) {
    let layout = TrayLayout::calculate(area);
    let feed = app.session.feed();

    let title = Line::from(vec![
        Span::styled(
            " Stories ",
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("| {} in your feed ", feed.len()),
            app.theme.system_style(),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), layout.title);

    if feed.is_empty() {
        let empty = Paragraph::new("Nothing here yet. Press n to share a story.")
            .style(app.theme.system_style())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(app.theme.border_style(true)),
            );
        frame.render_widget(empty, layout.list);
    } else {
        let list = tray_list(feed.stories(), feed.unviewed_count(), feed.now(), &app.theme);
        frame.render_stateful_widget(list, layout.list, &mut app.tray_state);
    }

    render_status_line(frame, app, layout.status);
    render_hotkeys(
        frame,
        app,
        layout.hotkeys,
        &[("Enter", "watch"), ("j/k", "move"), ("n", "new"), ("R", "refresh"), ("q", "quit")],
    );
}

/// Render the full-screen viewer
fn render_viewer(frame: &mut Frame, app: &App, area: Rect) {
    let Some(story) = app.current_story() else {
        return;
    };
    let engine = app.session.engine();
    let frame_area = viewer_frame(area);
    frame.render_widget(Clear, frame_area);

    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));
    let inner = outer.inner(frame_area);
    frame.render_widget(outer, frame_area);

    let layout = ViewerLayout::calculate(inner);

    frame.render_widget(
        ProgressBarWidget::new(
            engine.playlist_len(),
            engine.current_index(),
            engine.progress(),
            &app.theme,
        ),
        layout.progress,
    );

    let paused = matches!(
        engine.state(),
        PlaybackState::Paused | PlaybackState::ReactionMenuOpen
    );
    frame.render_widget(
        StoryCardWidget::new(story, app.session.feed().now(), &app.theme).paused(paused),
        layout.card,
    );

    let composing = app.is_composing_reply();
    let title = format!("Reply to {}", story.author().name);
    let input = InputWidget::new(app.reply_buffer(), &app.theme)
        .cursor_position(app.cursor_position())
        .title(&title)
        .placeholder("Press i to reply")
        .active(composing);
    frame.render_widget(input, layout.reply);

    let hotkeys: &[(&str, &str)] = if composing {
        &[("Enter", "send"), ("Esc", "cancel")]
    } else if engine.state() == PlaybackState::ReactionMenuOpen {
        &[("1-6", "react"), ("Esc", "close menu")]
    } else {
        &[
            ("←/→", "prev/next"),
            ("Space", "pause"),
            ("r", "react"),
            ("i", "reply"),
            ("Esc", "close"),
        ]
    };
    render_hotkeys(frame, app, layout.hotkeys, hotkeys);

    if engine.state() == PlaybackState::ReactionMenuOpen {
        render_reaction_menu(frame, app, layout.card);
    } else if let Some(message) = app.status_message() {
        // Transient notices sit over the bottom of the card.
        let bar = Rect {
            y: layout.card.bottom().saturating_sub(2),
            height: 1.min(layout.card.height),
            ..layout.card
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {message} "), app.theme.system_style())),
            bar,
        );
    }
}

/// Render the quick reaction overlay
fn render_reaction_menu(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect_fixed(40, 5, area);
    frame.render_widget(Clear, popup);

    let spans: Vec<Span> = QUICK_REACTIONS
        .iter()
        .enumerate()
        .flat_map(|(i, symbol)| {
            [
                Span::styled(format!("{}", i + 1), app.theme.system_style()),
                Span::raw(format!(" {symbol}  ")),
            ]
        })
        .collect();

    let menu = Paragraph::new(vec![Line::from(""), Line::from(spans)])
        .alignment(ratatui::layout::Alignment::Center)
        .block(
            Block::default()
                .title(" React ")
                .borders(Borders::ALL)
                .border_style(app.theme.border_style(true)),
        );
    frame.render_widget(menu, popup);
}

fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let message = app.status_message().unwrap_or_default();
    frame.render_widget(
        Paragraph::new(Span::styled(format!(" {message}"), app.theme.system_style())),
        area,
    );
}

/// Render a row of `key action` hints
fn render_hotkeys(frame: &mut Frame, app: &App, area: Rect, keys: &[(&str, &str)]) {
    let mut spans = Vec::with_capacity(keys.len() * 2);
    for (key, action) in keys {
        spans.push(Span::styled(
            format!(" {key} "),
            Style::default()
                .fg(Color::Black)
                .bg(app.theme.border_focused),
        ));
        spans.push(Span::styled(format!(" {action}  "), app.theme.system_style()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Action;
    use ratatui::{backend::TestBackend, Terminal};
    use stories_core::{StoryFixtures, TestHarness};

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    async fn app() -> App {
        let fixtures = StoryFixtures::new();
        let stories = [
            fixtures.text_created("Morning run done", chrono::Duration::minutes(5)),
            fixtures.photo("pics/cat.jpg"),
        ];
        App::new(TestHarness::with_stories(&stories).await.into_session())
    }

    #[tokio::test]
    async fn test_tray_lists_authors() {
        let mut app = app().await;
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Stories (2 new)"));
        assert!(text.contains("Test Author"));
        assert!(text.contains("Morning run done"));
    }

    #[tokio::test]
    async fn test_viewer_shows_reaction_menu() {
        let mut app = app().await;
        app.perform(Action::OpenViewer(0)).await;
        app.session.open_reaction_menu().unwrap();

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("React"));
        assert!(text.contains("Reply to Test Author"));
        assert!(text.contains("close menu"));
    }

    #[tokio::test]
    async fn test_wizard_draws_over_tray() {
        let mut app = app().await;
        app.start_creation();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("What are you sharing?"));
        assert!(text.contains("Photo"));
    }
}
