//! Timed story playback.
//!
//! [`PlaybackEngine`] walks an ordered list of stories, advancing a progress
//! counter on every timer tick and moving to the next story when the current
//! one has been shown for its full duration.
//!
//! The engine owns at most one [`TimerHandle`]. Every transition that moves
//! the current index, pauses, or closes cancels the handle first; a tick
//! carrying the id of a cancelled handle is rejected, so a late tick can
//! never advance a story the viewer has already left.
//!
//! The engine does not touch story data. Viewed and reaction mutations are
//! reported as [`PlaybackEvent`]s and drained by the owner with
//! [`PlaybackEngine::take_events`].

use crate::story::{Story, StoryId, StoryKind};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default interval between progress ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// How long photo and text stories are shown.
pub const DEFAULT_STILL_DURATION: Duration = Duration::from_secs(7);

/// How long video stories are shown.
pub const DEFAULT_VIDEO_DURATION: Duration = Duration::from_secs(30);

/// Errors from playback commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("Cannot play an empty feed")]
    EmptyFeed,

    #[error("Story index {index} is out of range for a feed of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("The viewer is not open")]
    NotOpen,

    #[error("Cannot send an empty reply")]
    EmptyReply,

    #[error("No reply is being composed")]
    NotComposing,
}

/// Timing configuration for playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    pub tick_interval: Duration,
    pub photo_duration: Duration,
    pub text_duration: Duration,
    pub video_duration: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            photo_duration: DEFAULT_STILL_DURATION,
            text_duration: DEFAULT_STILL_DURATION,
            video_duration: DEFAULT_VIDEO_DURATION,
        }
    }
}

impl PlaybackConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tick interval. Zero is bumped to one millisecond.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_photo_duration(mut self, duration: Duration) -> Self {
        self.photo_duration = duration;
        self
    }

    pub fn with_text_duration(mut self, duration: Duration) -> Self {
        self.text_duration = duration;
        self
    }

    pub fn with_video_duration(mut self, duration: Duration) -> Self {
        self.video_duration = duration;
        self
    }

    /// Display duration for a story of `kind`.
    pub fn duration_for(&self, kind: StoryKind) -> Duration {
        match kind {
            StoryKind::Photo => self.photo_duration,
            StoryKind::Text => self.text_duration,
            StoryKind::Video => self.video_duration,
        }
    }
}

/// Viewer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// The viewer has never been opened.
    #[default]
    Idle,
    /// The timer is advancing progress.
    Playing,
    /// Progress is frozen.
    Paused,
    /// The reaction overlay is shown; progress is frozen.
    ReactionMenuOpen,
    /// The viewer was closed.
    Closed,
}

impl PlaybackState {
    /// Whether a story is on screen.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::ReactionMenuOpen
        )
    }
}

/// Why the viewer closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    UserClosed,
    Escape,
    EndOfFeed,
}

/// Something the owner of the engine should act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// A story became the current story.
    Viewed { story_id: StoryId },
    /// The viewer reacted to a story.
    Reacted { story_id: StoryId, symbol: String },
    /// The viewer sent a reply. Delivery is up to the owner.
    ReplySent { story_id: StoryId, text: String },
    /// Playback moved between stories.
    Advanced { from: usize, to: usize },
    Closed { reason: CloseReason },
}

/// Keys the viewer responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackKey {
    ArrowLeft,
    ArrowRight,
    Escape,
    Space,
}

/// Generation number of a timer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// The engine's single active timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    id: TimerId,
    interval: Duration,
}

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Result of delivering a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Progress moved within the current story.
    Progressed,
    /// The current story finished and playback moved on.
    Advanced { to: usize },
    /// The last story finished and the viewer closed.
    Finished,
    /// The tick belonged to a cancelled timer and was ignored.
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct PlaylistEntry {
    id: StoryId,
    kind: StoryKind,
}

#[derive(Debug, Clone)]
struct ReplyDraft {
    text: String,
    resume_after: bool,
}

/// The story viewer state machine.
#[derive(Debug)]
pub struct PlaybackEngine {
    config: PlaybackConfig,
    state: PlaybackState,
    playlist: Vec<PlaylistEntry>,
    index: usize,
    elapsed: Duration,
    timer: Option<TimerHandle>,
    next_timer_id: u64,
    reply: Option<ReplyDraft>,
    events: Vec<PlaybackEvent>,
    ticks_processed: u64,
    stale_ticks: u64,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}

impl PlaybackEngine {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            state: PlaybackState::Idle,
            playlist: Vec::new(),
            index: 0,
            elapsed: Duration::ZERO,
            timer: None,
            next_timer_id: 0,
            reply: None,
            events: Vec::new(),
            ticks_processed: 0,
            stale_ticks: 0,
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Open the viewer on `stories[start]` and start playing.
    ///
    /// Reopening while already open discards the previous playlist.
    pub fn open(&mut self, stories: &[Story], start: usize) -> Result<(), PlaybackError> {
        if stories.is_empty() {
            return Err(PlaybackError::EmptyFeed);
        }
        if start >= stories.len() {
            return Err(PlaybackError::IndexOutOfRange {
                index: start,
                len: stories.len(),
            });
        }

        self.cancel_timer();
        self.playlist = stories
            .iter()
            .map(|s| PlaylistEntry {
                id: s.id(),
                kind: s.kind(),
            })
            .collect();
        self.reply = None;
        self.index = start;
        self.elapsed = Duration::ZERO;
        self.state = PlaybackState::Playing;
        self.start_timer();
        debug!(start, len = self.playlist.len(), "viewer opened");
        self.emit_viewed();
        Ok(())
    }

    /// Close the viewer from any state.
    pub fn close(&mut self) {
        self.close_with(CloseReason::UserClosed);
    }

    /// Deliver a tick from the timer identified by `timer`.
    pub fn tick(&mut self, timer: TimerId) -> TickOutcome {
        let live = self.state == PlaybackState::Playing
            && self.timer.map(|t| t.id) == Some(timer);
        if !live {
            self.stale_ticks += 1;
            return TickOutcome::Stale;
        }

        self.ticks_processed += 1;
        let duration = self.current_duration();
        self.elapsed = (self.elapsed + self.config.tick_interval).min(duration);
        if self.elapsed < duration {
            return TickOutcome::Progressed;
        }

        if self.index + 1 < self.playlist.len() {
            let to = self.index + 1;
            self.move_to(to);
            TickOutcome::Advanced { to }
        } else {
            self.close_with(CloseReason::EndOfFeed);
            TickOutcome::Finished
        }
    }

    /// Tick the active timer, if any. Convenience for drivers.
    pub fn tick_active(&mut self) -> Option<TickOutcome> {
        let timer = self.timer?;
        Some(self.tick(timer.id))
    }

    /// Skip to the next story; past the last story the viewer closes.
    pub fn next(&mut self) -> Result<(), PlaybackError> {
        self.ensure_open()?;
        if self.index + 1 >= self.playlist.len() {
            self.close_with(CloseReason::EndOfFeed);
        } else {
            self.move_to(self.index + 1);
        }
        Ok(())
    }

    /// Go back one story; at the first story this restarts it.
    pub fn previous(&mut self) -> Result<(), PlaybackError> {
        self.ensure_open()?;
        self.move_to(self.index.saturating_sub(1));
        Ok(())
    }

    /// Jump to an arbitrary story in the playlist.
    pub fn navigate(&mut self, index: usize) -> Result<(), PlaybackError> {
        self.ensure_open()?;
        if index >= self.playlist.len() {
            return Err(PlaybackError::IndexOutOfRange {
                index,
                len: self.playlist.len(),
            });
        }
        self.move_to(index);
        Ok(())
    }

    /// Switch between playing and paused, keeping progress.
    ///
    /// Has no effect while the reaction menu is open or a reply is being
    /// composed. Returns whether the state changed.
    pub fn toggle_pause(&mut self) -> bool {
        if self.reply.is_some() {
            return false;
        }
        match self.state {
            PlaybackState::Playing => {
                self.cancel_timer();
                self.state = PlaybackState::Paused;
                debug!(progress = self.progress(), "paused");
                true
            }
            PlaybackState::Paused => {
                self.state = PlaybackState::Playing;
                self.start_timer();
                debug!(progress = self.progress(), "resumed");
                true
            }
            _ => false,
        }
    }

    /// Show the reaction overlay, pausing playback.
    ///
    /// Any reply in progress no longer resumes playback when it ends; the
    /// viewer stays paused until explicitly resumed.
    pub fn open_reaction_menu(&mut self) -> Result<(), PlaybackError> {
        self.ensure_open()?;
        self.cancel_timer();
        self.state = PlaybackState::ReactionMenuOpen;
        if let Some(draft) = self.reply.as_mut() {
            draft.resume_after = false;
        }
        Ok(())
    }

    /// Hide the reaction overlay. Playback stays paused until resumed.
    pub fn close_reaction_menu(&mut self) {
        if self.state == PlaybackState::ReactionMenuOpen {
            self.state = PlaybackState::Paused;
        }
    }

    /// React to the current story and close the reaction overlay.
    pub fn react(&mut self, symbol: &str) -> Result<(), PlaybackError> {
        self.ensure_open()?;
        let story_id = self.playlist[self.index].id;
        self.events.push(PlaybackEvent::Reacted {
            story_id,
            symbol: symbol.to_string(),
        });
        self.close_reaction_menu();
        Ok(())
    }

    /// Focus the reply input. Playback is paused while composing.
    pub fn begin_reply(&mut self) -> Result<(), PlaybackError> {
        self.ensure_open()?;
        if self.reply.is_some() {
            return Ok(());
        }
        let resume_after = self.state == PlaybackState::Playing;
        self.cancel_timer();
        self.state = PlaybackState::Paused;
        self.reply = Some(ReplyDraft {
            text: String::new(),
            resume_after,
        });
        Ok(())
    }

    /// Replace the draft reply text.
    pub fn update_reply(&mut self, text: impl Into<String>) -> Result<(), PlaybackError> {
        let draft = self.reply.as_mut().ok_or(PlaybackError::NotComposing)?;
        draft.text = text.into();
        Ok(())
    }

    /// Send the draft reply to the current story.
    pub fn send_reply(&mut self) -> Result<(), PlaybackError> {
        let draft = self.reply.as_ref().ok_or(PlaybackError::NotComposing)?;
        let text = draft.text.trim().to_string();
        if text.is_empty() {
            return Err(PlaybackError::EmptyReply);
        }
        let story_id = self.playlist[self.index].id;
        self.events.push(PlaybackEvent::ReplySent { story_id, text });
        self.end_reply();
        Ok(())
    }

    /// Abandon the draft reply.
    pub fn cancel_reply(&mut self) {
        self.end_reply();
    }

    /// Apply a keyboard binding. Ignored while a reply is being composed.
    ///
    /// Returns whether the key was handled.
    pub fn handle_key(&mut self, key: PlaybackKey) -> bool {
        if self.reply.is_some()
            || !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
        {
            return false;
        }
        match key {
            PlaybackKey::ArrowLeft => self.previous().is_ok(),
            PlaybackKey::ArrowRight => self.next().is_ok(),
            PlaybackKey::Escape => {
                self.close_with(CloseReason::Escape);
                true
            }
            PlaybackKey::Space => self.toggle_pause(),
        }
    }

    /// Drain the events produced since the last call.
    pub fn take_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn is_paused(&self) -> bool {
        matches!(
            self.state,
            PlaybackState::Paused | PlaybackState::ReactionMenuOpen
        )
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_story_id(&self) -> Option<StoryId> {
        self.playlist.get(self.index).map(|e| e.id)
    }

    pub fn playlist_len(&self) -> usize {
        self.playlist.len()
    }

    /// Identifiers of the playlist, in playback order.
    pub fn playlist(&self) -> impl Iterator<Item = StoryId> + '_ {
        self.playlist.iter().map(|e| e.id)
    }

    /// Completion of the current story, 0 to 100.
    pub fn progress(&self) -> f64 {
        let duration = self.current_duration();
        if duration.is_zero() {
            return 0.0;
        }
        (self.elapsed.as_secs_f64() / duration.as_secs_f64() * 100.0).min(100.0)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Display duration of the current story.
    pub fn current_duration(&self) -> Duration {
        self.playlist
            .get(self.index)
            .map(|e| self.config.duration_for(e.kind))
            .unwrap_or_default()
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    pub fn is_composing_reply(&self) -> bool {
        self.reply.is_some()
    }

    pub fn reply_text(&self) -> Option<&str> {
        self.reply.as_ref().map(|d| d.text.as_str())
    }

    /// Ticks that moved progress.
    pub fn ticks_processed(&self) -> u64 {
        self.ticks_processed
    }

    /// Ticks rejected because their timer was no longer active.
    pub fn stale_ticks(&self) -> u64 {
        self.stale_ticks
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_open(&self) -> Result<(), PlaybackError> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(PlaybackError::NotOpen)
        }
    }

    fn start_timer(&mut self) {
        self.cancel_timer();
        self.next_timer_id += 1;
        self.timer = Some(TimerHandle {
            id: TimerId(self.next_timer_id),
            interval: self.config.tick_interval,
        });
    }

    fn cancel_timer(&mut self) {
        self.timer = None;
    }

    /// Make `index` current with zero progress, keeping play/pause.
    fn move_to(&mut self, index: usize) {
        self.cancel_timer();
        let from = self.index;
        self.index = index;
        self.elapsed = Duration::ZERO;

        match self.state {
            PlaybackState::Playing => self.start_timer(),
            PlaybackState::ReactionMenuOpen => self.state = PlaybackState::Paused,
            _ => {}
        }

        if from != index {
            debug!(from, to = index, "advanced");
            self.events.push(PlaybackEvent::Advanced { from, to: index });
        }
        self.emit_viewed();
    }

    fn end_reply(&mut self) {
        if let Some(draft) = self.reply.take() {
            if draft.resume_after && self.state == PlaybackState::Paused {
                self.state = PlaybackState::Playing;
                self.start_timer();
            }
        }
    }

    fn close_with(&mut self, reason: CloseReason) {
        self.cancel_timer();
        self.reply = None;
        if self.state != PlaybackState::Closed {
            debug!(?reason, "viewer closed");
            self.state = PlaybackState::Closed;
            self.events.push(PlaybackEvent::Closed { reason });
        }
    }

    fn emit_viewed(&mut self) {
        if let Some(entry) = self.playlist.get(self.index) {
            self.events.push(PlaybackEvent::Viewed { story_id: entry.id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StoryFixtures;

    fn feed(kinds: &[StoryKind]) -> Vec<Story> {
        let fixtures = StoryFixtures::new();
        kinds.iter().map(|k| fixtures.of_kind(*k)).collect()
    }

    fn viewed_ids(events: &[PlaybackEvent]) -> Vec<StoryId> {
        events
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Viewed { story_id } => Some(*story_id),
                _ => None,
            })
            .collect()
    }

    /// Tick until the engine leaves the current story.
    fn run_story(engine: &mut PlaybackEngine) -> (u32, TickOutcome) {
        let mut ticks = 0;
        loop {
            ticks += 1;
            match engine.tick_active().expect("timer should be active") {
                TickOutcome::Progressed => continue,
                other => return (ticks, other),
            }
        }
    }

    #[test]
    fn test_open_starts_playing_and_marks_viewed() {
        let stories = feed(&[StoryKind::Text, StoryKind::Photo]);
        let mut engine = PlaybackEngine::default();
        assert_eq!(engine.state(), PlaybackState::Idle);

        engine.open(&stories, 1).unwrap();
        assert_eq!(engine.state(), PlaybackState::Playing);
        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.progress(), 0.0);
        assert!(engine.timer().is_some());
        assert_eq!(viewed_ids(&engine.take_events()), vec![stories[1].id()]);
    }

    #[test]
    fn test_open_rejects_bad_input() {
        let mut engine = PlaybackEngine::default();
        assert_eq!(engine.open(&[], 0), Err(PlaybackError::EmptyFeed));

        let stories = feed(&[StoryKind::Text]);
        assert_eq!(
            engine.open(&stories, 3),
            Err(PlaybackError::IndexOutOfRange { index: 3, len: 1 })
        );
        assert_eq!(engine.state(), PlaybackState::Idle);
        assert!(engine.timer().is_none());
    }

    #[test]
    fn test_tick_increment_matches_duration() {
        let stories = feed(&[StoryKind::Photo, StoryKind::Video]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();

        engine.tick_active();
        // 100ms of a 7s story
        assert!((engine.progress() - 100.0 / 70.0).abs() < 1e-9);

        let (ticks, outcome) = run_story(&mut engine);
        assert_eq!(ticks, 69);
        assert_eq!(outcome, TickOutcome::Advanced { to: 1 });

        engine.tick_active();
        // 100ms of a 30s story
        assert!((engine.progress() - 100.0 / 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_monotonic_and_bounded() {
        let stories = feed(&[StoryKind::Text, StoryKind::Text]);
        let config = PlaybackConfig::new().with_tick_interval(Duration::from_millis(300));
        let mut engine = PlaybackEngine::new(config);
        engine.open(&stories, 0).unwrap();

        let mut last = engine.progress();
        loop {
            let outcome = engine.tick_active().unwrap();
            let progress = engine.progress();
            assert!(progress <= 100.0);
            if let TickOutcome::Advanced { .. } = outcome {
                assert_eq!(progress, 0.0);
                break;
            }
            assert!(progress >= last);
            last = progress;
        }
    }

    #[test]
    fn test_last_story_completion_closes() {
        let stories = feed(&[StoryKind::Text]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        engine.take_events();

        let (_, outcome) = run_story(&mut engine);
        assert_eq!(outcome, TickOutcome::Finished);
        assert_eq!(engine.state(), PlaybackState::Closed);
        assert!(engine.timer().is_none());
        assert_eq!(
            engine.take_events(),
            vec![PlaybackEvent::Closed {
                reason: CloseReason::EndOfFeed
            }]
        );
    }

    #[test]
    fn test_pause_freezes_and_resume_continues() {
        let stories = feed(&[StoryKind::Photo]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        for _ in 0..10 {
            engine.tick_active();
        }
        let frozen = engine.progress();
        let old_timer = engine.timer().unwrap().id();

        assert!(engine.toggle_pause());
        assert_eq!(engine.state(), PlaybackState::Paused);
        assert!(engine.timer().is_none());
        assert_eq!(engine.tick(old_timer), TickOutcome::Stale);
        assert_eq!(engine.progress(), frozen);

        assert!(engine.toggle_pause());
        assert_eq!(engine.state(), PlaybackState::Playing);
        assert_eq!(engine.progress(), frozen);
        let new_timer = engine.timer().unwrap().id();
        assert_ne!(new_timer, old_timer);

        engine.tick(new_timer);
        assert!(engine.progress() > frozen);
    }

    #[test]
    fn test_previous_at_first_story_restarts() {
        let stories = feed(&[StoryKind::Text, StoryKind::Photo]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        for _ in 0..5 {
            engine.tick_active();
        }

        engine.previous().unwrap();
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.progress(), 0.0);
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_next_past_end_closes() {
        let stories = feed(&[StoryKind::Text, StoryKind::Photo]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 1).unwrap();

        engine.next().unwrap();
        assert_eq!(engine.state(), PlaybackState::Closed);
        assert_eq!(engine.next(), Err(PlaybackError::NotOpen));
    }

    #[test]
    fn test_navigation_cancels_old_timer() {
        let stories = feed(&[StoryKind::Text, StoryKind::Photo, StoryKind::Video]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        let first_timer = engine.timer().unwrap().id();

        engine.next().unwrap();
        assert_eq!(engine.tick(first_timer), TickOutcome::Stale);
        assert_eq!(engine.stale_ticks(), 1);
        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.progress(), 0.0);
    }

    #[test]
    fn test_navigation_while_paused_stays_paused() {
        let stories = feed(&[StoryKind::Text, StoryKind::Photo]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        engine.tick_active();
        engine.toggle_pause();

        engine.next().unwrap();
        assert_eq!(engine.state(), PlaybackState::Paused);
        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.progress(), 0.0);
        assert!(engine.timer().is_none());
    }

    #[test]
    fn test_navigate_jumps() {
        let stories = feed(&[StoryKind::Text, StoryKind::Photo, StoryKind::Video]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        engine.take_events();

        engine.navigate(2).unwrap();
        assert_eq!(engine.current_index(), 2);
        assert_eq!(
            engine.take_events(),
            vec![
                PlaybackEvent::Advanced { from: 0, to: 2 },
                PlaybackEvent::Viewed {
                    story_id: stories[2].id()
                },
            ]
        );
        assert_eq!(
            engine.navigate(7),
            Err(PlaybackError::IndexOutOfRange { index: 7, len: 3 })
        );
    }

    #[test]
    fn test_reaction_menu_pauses_until_resumed() {
        let stories = feed(&[StoryKind::Photo]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        engine.tick_active();
        let progress = engine.progress();

        engine.open_reaction_menu().unwrap();
        assert_eq!(engine.state(), PlaybackState::ReactionMenuOpen);
        assert!(engine.timer().is_none());
        assert!(!engine.toggle_pause());

        engine.close_reaction_menu();
        assert_eq!(engine.state(), PlaybackState::Paused);
        assert_eq!(engine.progress(), progress);

        engine.toggle_pause();
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_react_emits_and_closes_menu() {
        let stories = feed(&[StoryKind::Photo]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        engine.open_reaction_menu().unwrap();
        engine.take_events();

        engine.react("❤️").unwrap();
        engine.react("❤️").unwrap();
        assert_eq!(engine.state(), PlaybackState::Paused);
        let reacted = engine
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, PlaybackEvent::Reacted { symbol, .. } if symbol == "❤️"))
            .count();
        assert_eq!(reacted, 2);
    }

    #[test]
    fn test_react_while_playing_keeps_playing() {
        let stories = feed(&[StoryKind::Photo]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        engine.react("👍").unwrap();
        assert_eq!(engine.state(), PlaybackState::Playing);
        assert!(engine.timer().is_some());
    }

    #[test]
    fn test_reply_pauses_and_resumes() {
        let stories = feed(&[StoryKind::Video]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        engine.take_events();

        engine.begin_reply().unwrap();
        assert_eq!(engine.state(), PlaybackState::Paused);
        assert!(engine.is_composing_reply());
        assert!(!engine.handle_key(PlaybackKey::Space));
        assert!(!engine.toggle_pause());

        assert_eq!(engine.send_reply(), Err(PlaybackError::EmptyReply));
        engine.update_reply("  so cool!  ").unwrap();
        engine.send_reply().unwrap();

        assert_eq!(engine.state(), PlaybackState::Playing);
        assert!(!engine.is_composing_reply());
        assert_eq!(
            engine.take_events(),
            vec![PlaybackEvent::ReplySent {
                story_id: stories[0].id(),
                text: "so cool!".to_string()
            }]
        );
    }

    #[test]
    fn test_reply_started_while_paused_stays_paused() {
        let stories = feed(&[StoryKind::Video]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        engine.toggle_pause();

        engine.begin_reply().unwrap();
        engine.cancel_reply();
        assert_eq!(engine.state(), PlaybackState::Paused);
        assert_eq!(engine.update_reply("late"), Err(PlaybackError::NotComposing));
    }

    #[test]
    fn test_reaction_menu_during_reply_keeps_paused() {
        let stories = feed(&[StoryKind::Photo]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();

        engine.begin_reply().unwrap();
        engine.open_reaction_menu().unwrap();
        engine.close_reaction_menu();
        assert_eq!(engine.state(), PlaybackState::Paused);

        engine.cancel_reply();
        assert_eq!(engine.state(), PlaybackState::Paused);
        assert!(engine.timer().is_none());

        // Same for a reply that gets sent.
        engine.toggle_pause();
        engine.begin_reply().unwrap();
        engine.open_reaction_menu().unwrap();
        engine.react("🔥").unwrap();
        engine.update_reply("nice").unwrap();
        engine.send_reply().unwrap();
        assert_eq!(engine.state(), PlaybackState::Paused);
        assert!(engine.timer().is_none());
    }

    #[test]
    fn test_key_bindings() {
        let stories = feed(&[StoryKind::Text, StoryKind::Photo, StoryKind::Video]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();

        assert!(engine.handle_key(PlaybackKey::ArrowRight));
        assert_eq!(engine.current_index(), 1);
        assert!(engine.handle_key(PlaybackKey::ArrowLeft));
        assert_eq!(engine.current_index(), 0);
        assert!(engine.handle_key(PlaybackKey::Space));
        assert_eq!(engine.state(), PlaybackState::Paused);
        assert!(engine.handle_key(PlaybackKey::Escape));
        assert_eq!(engine.state(), PlaybackState::Closed);
        assert!(!engine.handle_key(PlaybackKey::ArrowRight));

        let closed: Vec<_> = engine
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, PlaybackEvent::Closed { .. }))
            .collect();
        assert_eq!(
            closed,
            vec![PlaybackEvent::Closed {
                reason: CloseReason::Escape
            }]
        );
    }

    #[test]
    fn test_close_from_every_state() {
        let stories = feed(&[StoryKind::Text, StoryKind::Photo]);

        let mut idle = PlaybackEngine::default();
        idle.close();
        assert_eq!(idle.state(), PlaybackState::Closed);

        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        engine.open_reaction_menu().unwrap();
        engine.close();
        assert_eq!(engine.state(), PlaybackState::Closed);
        assert!(engine.timer().is_none());

        engine.open(&stories, 0).unwrap();
        engine.begin_reply().unwrap();
        engine.close();
        assert!(!engine.is_composing_reply());
        assert!(engine.timer().is_none());
    }

    #[test]
    fn test_ticks_after_close_are_stale() {
        let stories = feed(&[StoryKind::Text, StoryKind::Photo, StoryKind::Video]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 1).unwrap();
        let timer = engine.timer().unwrap().id();
        engine.close();

        for _ in 0..5 {
            assert_eq!(engine.tick(timer), TickOutcome::Stale);
        }
        assert_eq!(engine.ticks_processed(), 0);
        assert_eq!(engine.progress(), 0.0);
        assert!(engine.tick_active().is_none());
    }

    #[test]
    fn test_reopen_after_close() {
        let stories = feed(&[StoryKind::Text, StoryKind::Photo]);
        let mut engine = PlaybackEngine::default();
        engine.open(&stories, 0).unwrap();
        engine.close();
        engine.open(&stories, 1).unwrap();
        assert_eq!(engine.state(), PlaybackState::Playing);
        assert_eq!(engine.current_index(), 1);
    }
}
