//! Main application state and logic

use std::time::{Duration, Instant};

use ratatui::widgets::ListState;
use stories_core::{
    PlaybackKey, Story, StoryRequest, StorySession, TimerId, QUICK_REACTIONS,
};
use tracing::debug;

use crate::creation::StoryCreation;
use crate::effects::process_events;
use crate::ui::theme::StoryTheme;

/// How long to wait for input when no playback timer is running.
pub const IDLE_POLL: Duration = Duration::from_millis(250);

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Tray,
    Viewer,
    Create,
}

/// Work that needs the async session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenViewer(usize),
    Key(PlaybackKey),
    React(usize),
    SendReply,
    CloseViewer,
    CreateStory(StoryRequest),
    Refresh,
}

/// Main application state
pub struct App {
    pub session: StorySession,
    pub theme: StoryTheme,
    pub screen: Screen,
    pub tray_state: ListState,
    pub creation: Option<StoryCreation>,

    // Reply input, mirrored into the engine on every edit
    reply_buffer: String,
    cursor_position: usize,

    status_message: Option<String>,

    // Timer currently being driven and when its next tick is due
    schedule: Option<(TimerId, Instant)>,
}

impl App {
    pub fn new(session: StorySession) -> Self {
        let mut tray_state = ListState::default();
        if !session.stories().is_empty() {
            tray_state.select(Some(0));
        }
        let unviewed = session.feed().unviewed_count();

        let mut app = Self {
            session,
            theme: StoryTheme::default(),
            screen: Screen::Tray,
            tray_state,
            creation: None,
            reply_buffer: String::new(),
            cursor_position: 0,
            status_message: None,
            schedule: None,
        };
        app.set_status(format!("{unviewed} new stories. Enter to watch, n to share one"));
        app
    }

    // =========================================================================
    // Tray
    // =========================================================================

    pub fn selected(&self) -> Option<usize> {
        self.tray_state.selected()
    }

    pub fn select_next(&mut self) {
        let len = self.session.stories().len();
        if len == 0 {
            return;
        }
        let i = self.tray_state.selected().map_or(0, |i| (i + 1) % len);
        self.tray_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        let len = self.session.stories().len();
        if len == 0 {
            return;
        }
        let i = match self.tray_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.tray_state.select(Some(i));
    }

    /// Keep the tray selection inside the feed after it changes size.
    fn clamp_selection(&mut self) {
        let len = self.session.stories().len();
        match self.tray_state.selected() {
            _ if len == 0 => self.tray_state.select(None),
            Some(i) if i >= len => self.tray_state.select(Some(len - 1)),
            None => self.tray_state.select(Some(0)),
            _ => {}
        }
    }

    /// Story under the viewer, if open.
    pub fn current_story(&self) -> Option<&Story> {
        self.session.current_story()
    }

    // =========================================================================
    // Creation
    // =========================================================================

    pub fn start_creation(&mut self) {
        self.creation = Some(StoryCreation::new());
        self.screen = Screen::Create;
    }

    pub fn cancel_creation(&mut self) {
        self.creation = None;
        self.screen = Screen::Tray;
    }

    // =========================================================================
    // Reply input
    // =========================================================================

    /// Start composing a reply to the current story.
    pub fn begin_reply(&mut self) {
        match self.session.begin_reply() {
            Ok(()) => {
                self.reply_buffer.clear();
                self.cursor_position = 0;
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    pub fn cancel_reply(&mut self) {
        self.session.cancel_reply();
        self.reply_buffer.clear();
        self.cursor_position = 0;
    }

    pub fn is_composing_reply(&self) -> bool {
        self.session.engine().is_composing_reply()
    }

    fn sync_reply(&mut self) {
        if let Err(e) = self.session.update_reply(self.reply_buffer.clone()) {
            debug!(error = %e, "reply edit outside compose mode");
        }
    }

    /// Handle a typed character (unicode-safe)
    pub fn type_char(&mut self, c: char) {
        let byte_pos = self
            .reply_buffer
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.reply_buffer.len());
        self.reply_buffer.insert(byte_pos, c);
        self.cursor_position += 1;
        self.sync_reply();
    }

    /// Handle backspace (unicode-safe)
    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            if let Some((byte_pos, ch)) = self.reply_buffer.char_indices().nth(self.cursor_position)
            {
                self.reply_buffer
                    .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
            }
            self.sync_reply();
        }
    }

    /// Handle delete (unicode-safe)
    pub fn delete(&mut self) {
        if let Some((byte_pos, ch)) = self.reply_buffer.char_indices().nth(self.cursor_position) {
            self.reply_buffer
                .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
            self.sync_reply();
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.reply_buffer.chars().count();
        self.cursor_position = (self.cursor_position + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.reply_buffer.chars().count();
    }

    pub fn reply_buffer(&self) -> &str {
        &self.reply_buffer
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    // =========================================================================
    // Playback timing
    // =========================================================================

    /// The timer that should be ticked at `now`, if one is due.
    ///
    /// A newly seen timer is scheduled one interval out. Stopped or replaced
    /// timers drop their schedule, so no tick is ever delivered late to a
    /// timer the engine has already cancelled.
    pub fn due_timer(&mut self, now: Instant) -> Option<TimerId> {
        let Some(handle) = self.session.engine().timer() else {
            self.schedule = None;
            return None;
        };

        match self.schedule {
            Some((id, deadline)) if id == handle.id() => {
                if now < deadline {
                    return None;
                }
                let mut next = deadline + handle.interval();
                if next <= now {
                    // Fell behind (e.g. the terminal was suspended); don't
                    // replay the missed ticks in a burst.
                    next = now + handle.interval();
                }
                self.schedule = Some((id, next));
                Some(id)
            }
            _ => {
                self.schedule = Some((handle.id(), now + handle.interval()));
                None
            }
        }
    }

    /// How long the event loop may block waiting for input.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        match self.schedule {
            Some((_, deadline)) => deadline.saturating_duration_since(now).min(IDLE_POLL),
            None => IDLE_POLL,
        }
    }

    /// Deliver one tick to the engine.
    pub async fn deliver_tick(&mut self, timer: TimerId) {
        let (outcome, events) = self.session.tick(timer).await;
        debug!(?outcome, "tick");
        process_events(self, &events);
    }

    // =========================================================================
    // Async actions
    // =========================================================================

    pub async fn perform(&mut self, action: Action) {
        let result = match action {
            Action::OpenViewer(index) => {
                let result = self.session.open_viewer(index).await;
                if result.is_ok() {
                    self.screen = Screen::Viewer;
                    self.clear_status();
                }
                result
            }
            Action::Key(key) => {
                let (_handled, events) = self.session.handle_key(key).await;
                Ok(events)
            }
            Action::React(slot) => match QUICK_REACTIONS.get(slot) {
                Some(symbol) => self.session.react(symbol).await,
                None => Ok(Vec::new()),
            },
            Action::SendReply => {
                let result = self.session.send_reply().await;
                if result.is_ok() {
                    self.reply_buffer.clear();
                    self.cursor_position = 0;
                }
                result
            }
            Action::CloseViewer => Ok(self.session.close_viewer().await),
            Action::CreateStory(request) => {
                match self.session.create_story(request).await {
                    Ok(story) => {
                        self.creation = None;
                        self.screen = Screen::Tray;
                        let position = self.session.feed().position(story.id());
                        self.tray_state.select(position);
                        self.set_status(format!(
                            "Shared your {} story, {}",
                            story.kind().name().to_lowercase(),
                            story.format_remaining(self.session.feed().now())
                        ));
                    }
                    Err(e) => {
                        if let Some(creation) = self.creation.as_mut() {
                            creation.set_error(e.to_string());
                        } else {
                            self.set_status(e.to_string());
                        }
                    }
                }
                Ok(Vec::new())
            }
            Action::Refresh => {
                self.session.refresh().await;
                self.set_status(format!(
                    "{} stories, {} new",
                    self.session.stories().len(),
                    self.session.feed().unviewed_count()
                ));
                Ok(Vec::new())
            }
        };

        match result {
            Ok(events) => process_events(self, &events),
            Err(e) => self.set_status(e.to_string()),
        }
        self.clamp_selection();
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stories_core::{PlaybackConfig, PlaybackState, StoryFixtures, TestHarness};

    async fn app_with_three() -> App {
        let fixtures = StoryFixtures::new();
        let stories = [
            fixtures.text_created("one", chrono::Duration::minutes(10)),
            fixtures.text_created("two", chrono::Duration::minutes(20)),
            fixtures.text_created("three", chrono::Duration::minutes(30)),
        ];
        let harness = TestHarness::with_playback(&stories, PlaybackConfig::default()).await;
        App::new(harness.into_session())
    }

    #[tokio::test]
    async fn test_tray_selection_wraps() {
        let mut app = app_with_three().await;
        assert_eq!(app.selected(), Some(0));
        app.select_previous();
        assert_eq!(app.selected(), Some(2));
        app.select_next();
        assert_eq!(app.selected(), Some(0));
    }

    #[tokio::test]
    async fn test_open_viewer_switches_screen() {
        let mut app = app_with_three().await;
        app.perform(Action::OpenViewer(1)).await;
        assert_eq!(app.screen, Screen::Viewer);
        assert_eq!(app.session.engine().current_index(), 1);

        app.perform(Action::CloseViewer).await;
        assert_eq!(app.screen, Screen::Tray);
        assert_eq!(app.selected(), Some(1));
    }

    #[tokio::test]
    async fn test_timer_schedule() {
        let mut app = app_with_three().await;
        let start = Instant::now();
        assert_eq!(app.due_timer(start), None);
        assert_eq!(app.poll_timeout(start), IDLE_POLL);

        app.perform(Action::OpenViewer(0)).await;
        let interval = Duration::from_millis(100);

        // First sight of the timer only schedules it.
        assert_eq!(app.due_timer(start), None);
        assert_eq!(app.poll_timeout(start), interval);
        assert_eq!(app.due_timer(start + Duration::from_millis(50)), None);

        let id = app.due_timer(start + interval).expect("tick due");
        app.deliver_tick(id).await;
        assert_eq!(app.session.engine().ticks_processed(), 1);

        // Pausing cancels the timer and its schedule.
        app.session.toggle_pause();
        assert_eq!(app.due_timer(start + interval * 2), None);
        assert_eq!(app.poll_timeout(start + interval * 2), IDLE_POLL);
    }

    #[tokio::test]
    async fn test_due_timer_does_not_burst_after_stall() {
        let mut app = app_with_three().await;
        app.perform(Action::OpenViewer(0)).await;
        let start = Instant::now();
        app.due_timer(start);

        let late = start + Duration::from_secs(5);
        assert!(app.due_timer(late).is_some());
        assert!(app.due_timer(late).is_none());
    }

    #[tokio::test]
    async fn test_reply_editing_mirrors_engine() {
        let mut app = app_with_three().await;
        app.perform(Action::OpenViewer(0)).await;
        app.begin_reply();
        assert!(app.is_composing_reply());
        assert_eq!(app.session.engine().state(), PlaybackState::Paused);

        for c in "nicé!".chars() {
            app.type_char(c);
        }
        app.cursor_left();
        app.backspace();
        assert_eq!(app.reply_buffer(), "nic!");
        assert_eq!(app.session.engine().reply_text(), Some("nic!"));

        app.perform(Action::SendReply).await;
        assert!(!app.is_composing_reply());
        assert_eq!(app.reply_buffer(), "");
        assert_eq!(app.session.engine().state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_empty_reply_reports_error() {
        let mut app = app_with_three().await;
        app.perform(Action::OpenViewer(0)).await;
        app.begin_reply();
        app.perform(Action::SendReply).await;
        assert!(app.is_composing_reply());
        assert!(app.status_message().is_some());
    }

    #[tokio::test]
    async fn test_create_story_selects_it() {
        let mut app = app_with_three().await;
        app.start_creation();
        app.perform(Action::CreateStory(StoryRequest::text("fresh"))).await;
        assert_eq!(app.screen, Screen::Tray);
        assert!(app.creation.is_none());
        assert_eq!(app.session.stories().len(), 4);

        let selected = app.selected().expect("selection");
        assert_eq!(app.session.stories()[selected].content(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_invalid_story_stays_in_wizard() {
        let mut app = app_with_three().await;
        app.start_creation();
        app.perform(Action::CreateStory(StoryRequest::text("   "))).await;
        assert_eq!(app.screen, Screen::Create);
        let error = app.creation.as_ref().and_then(|c| c.error()).unwrap();
        assert!(error.contains("Text stories need some text"));
    }
}
