//! Event handling for the stories TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use stories_core::{PlaybackKey, PlaybackState, QUICK_REACTIONS};

use crate::app::{Action, App, Screen};
use crate::creation::WizardOutcome;

/// Result of handling an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
    /// Needs the async session; the run loop awaits it.
    Perform(Action),
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

/// Handle a key event
fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    // Global shortcuts (always work)
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    match app.screen {
        Screen::Tray => handle_tray_key(app, key),
        Screen::Viewer => handle_viewer_key(app, key),
        Screen::Create => handle_creation_key(app, key),
    }
}

fn handle_tray_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Char('q') => EventResult::Quit,
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_previous();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter | KeyCode::Char(' ') => match app.selected() {
            Some(index) => EventResult::Perform(Action::OpenViewer(index)),
            None => {
                app.set_status("No stories yet. Press n to share one");
                EventResult::NeedsRedraw
            }
        },
        KeyCode::Char('n') => {
            app.start_creation();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('R') | KeyCode::F(5) => EventResult::Perform(Action::Refresh),
        _ => EventResult::Continue,
    }
}

fn handle_viewer_key(app: &mut App, key: KeyEvent) -> EventResult {
    if app.is_composing_reply() {
        return handle_reply_key(app, key);
    }
    if app.session.engine().state() == PlaybackState::ReactionMenuOpen {
        return handle_reaction_menu_key(app, key);
    }

    match key.code {
        KeyCode::Left | KeyCode::Char('h') => {
            EventResult::Perform(Action::Key(PlaybackKey::ArrowLeft))
        }
        KeyCode::Right | KeyCode::Char('l') => {
            EventResult::Perform(Action::Key(PlaybackKey::ArrowRight))
        }
        KeyCode::Char(' ') | KeyCode::Char('p') => {
            app.session.toggle_pause();
            EventResult::NeedsRedraw
        }
        KeyCode::Esc => EventResult::Perform(Action::Key(PlaybackKey::Escape)),
        KeyCode::Char('q') => EventResult::Perform(Action::CloseViewer),
        KeyCode::Char('r') => {
            if let Err(e) = app.session.open_reaction_menu() {
                app.set_status(e.to_string());
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char('i') => {
            app.begin_reply();
            EventResult::NeedsRedraw
        }
        KeyCode::Char(c) => match reaction_slot(c) {
            Some(slot) => EventResult::Perform(Action::React(slot)),
            None => EventResult::Continue,
        },
        _ => EventResult::Continue,
    }
}

/// Map `1`..`6` onto the quick reactions.
fn reaction_slot(c: char) -> Option<usize> {
    let digit = c.to_digit(10)? as usize;
    (1..=QUICK_REACTIONS.len()).contains(&digit).then(|| digit - 1)
}

fn handle_reaction_menu_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc | KeyCode::Char('r') => {
            app.session.close_reaction_menu();
            app.set_status("Paused. Space to resume");
            EventResult::NeedsRedraw
        }
        KeyCode::Char(c) => match reaction_slot(c) {
            Some(slot) => EventResult::Perform(Action::React(slot)),
            None => EventResult::Continue,
        },
        _ => EventResult::Continue,
    }
}

/// Keys while composing a reply
fn handle_reply_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => {
            app.cancel_reply();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => EventResult::Perform(Action::SendReply),
        KeyCode::Char(c) => {
            app.type_char(c);
            EventResult::NeedsRedraw
        }
        KeyCode::Backspace => {
            app.backspace();
            EventResult::NeedsRedraw
        }
        KeyCode::Delete => {
            app.delete();
            EventResult::NeedsRedraw
        }
        KeyCode::Left => {
            app.cursor_left();
            EventResult::NeedsRedraw
        }
        KeyCode::Right => {
            app.cursor_right();
            EventResult::NeedsRedraw
        }
        KeyCode::Home => {
            app.cursor_home();
            EventResult::NeedsRedraw
        }
        KeyCode::End => {
            app.cursor_end();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

fn handle_creation_key(app: &mut App, key: KeyEvent) -> EventResult {
    let Some(creation) = app.creation.as_mut() else {
        app.screen = Screen::Tray;
        return EventResult::NeedsRedraw;
    };
    match creation.handle_key(key) {
        WizardOutcome::Continue => EventResult::NeedsRedraw,
        WizardOutcome::Cancelled => {
            app.cancel_creation();
            EventResult::NeedsRedraw
        }
        WizardOutcome::Submit(request) => EventResult::Perform(Action::CreateStory(request)),
    }
}
