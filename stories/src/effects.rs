//! Playback-event-to-UI mapping

use stories_core::{CloseReason, PlaybackEvent};

use crate::app::{App, Screen};

/// Apply a batch of playback events to the UI.
pub fn process_events(app: &mut App, events: &[PlaybackEvent]) {
    for event in events {
        process_event(app, event);
    }
}

/// Process a playback event and update UI state accordingly
pub fn process_event(app: &mut App, event: &PlaybackEvent) {
    match event {
        PlaybackEvent::Viewed { story_id } => {
            // Keep the tray cursor on whatever is playing, so closing the
            // viewer lands on the last story watched.
            if let Some(position) = app.session.feed().position(*story_id) {
                app.tray_state.select(Some(position));
            }
        }

        PlaybackEvent::Reacted { story_id, symbol } => {
            let count = app
                .session
                .story(*story_id)
                .map(|s| s.reaction_count(symbol))
                .unwrap_or_default();
            app.set_status(format!("Reacted {symbol} (x{count})"));
        }

        PlaybackEvent::ReplySent { story_id, .. } => {
            let author = app
                .session
                .story(*story_id)
                .map(|s| s.author().name.clone())
                .unwrap_or_else(|| "story".to_string());
            app.set_status(format!("Reply sent to {author}"));
        }

        PlaybackEvent::Advanced { .. } => {
            app.clear_status();
        }

        PlaybackEvent::Closed { reason } => {
            app.screen = Screen::Tray;
            match reason {
                CloseReason::EndOfFeed => app.set_status("You're all caught up"),
                CloseReason::Escape | CloseReason::UserClosed => app.clear_status(),
            }
        }
    }
}
