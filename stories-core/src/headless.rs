//! Headless stories interface for programmatic use.
//!
//! [`HeadlessStories`] interprets a small line protocol over a
//! [`StorySession`]. It never reads stdin itself; callers feed it lines and
//! print the returned output. This keeps the protocol testable and lets the
//! terminal client, scripts and agents drive the same code.
//!
//! # Example
//!
//! ```ignore
//! use stories_core::{HeadlessStories, SessionConfig, StorySession};
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = StorySession::new(SessionConfig::new()).await;
//!     let mut driver = HeadlessStories::new(session);
//!
//!     for line in ["#list", "#open 0", "#tick 70", "#status"] {
//!         for out in driver.execute(line).await.lines {
//!             println!("{out}");
//!         }
//!     }
//! }
//! ```

use crate::creation::{Retention, StoryRequest};
use crate::playback::{CloseReason, PlaybackEvent, PlaybackState, TickOutcome};
use crate::session::{SessionError, StorySession};
use crate::story::{Background, PrivacyTier, Story, StoryKind, QUICK_REACTIONS};
use thiserror::Error;

/// Upper bound on ticks delivered by a single `#tick`.
pub const MAX_TICKS_PER_COMMAND: usize = 10_000;

/// Errors from interpreting a command line.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown command '{0}'. Type #help for help.")]
    Unknown(String),

    #[error("{0}")]
    Session(#[from] SessionError),
}

/// Result of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub lines: Vec<String>,
    /// The caller should stop reading input.
    pub quit: bool,
}

impl Output {
    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Whether any line starts with `tag`, e.g. `[ERROR]`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.lines.iter().any(|l| l.starts_with(tag))
    }
}

/// Line-protocol driver over a story session.
pub struct HeadlessStories {
    session: StorySession,
}

impl HeadlessStories {
    pub fn new(session: StorySession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &StorySession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut StorySession {
        &mut self.session
    }

    /// Lines describing every command.
    pub fn help() -> Vec<String> {
        [
            "#list                     - List stories in the feed",
            "#open <n>                 - Open the viewer at story n",
            "#tick [count]             - Deliver timer ticks (default 1)",
            "#next / #prev             - Skip forward or back",
            "#goto <n>                 - Jump to story n",
            "#pause                    - Toggle pause",
            "#menu                     - Open the reaction menu",
            "#react <emoji|1-6>        - React to the current story",
            "#reply <text>             - Reply to the current story",
            "#close                    - Close the viewer",
            "#create text [opts] <text>",
            "#create photo|video [opts] <media> [caption]",
            "    opts: bg=<name> privacy=<public|friends|close> for=<6h|12h|24h|Nh>",
            "#refresh                  - Reload the feed, dropping expired stories",
            "#status                   - Show viewer status",
            "#help                     - Show this help",
            "#quit                     - Exit",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Interpret one input line.
    pub async fn execute(&mut self, line: &str) -> Output {
        let mut out = Output::default();
        let line = line.trim();
        if line.is_empty() {
            return out;
        }

        if let Err(e) = self.dispatch(line, &mut out).await {
            out.push(format!("[ERROR] {e}"));
        }
        out
    }

    async fn dispatch(&mut self, line: &str, out: &mut Output) -> Result<(), CommandError> {
        let Some(command) = line.strip_prefix('#') else {
            return Err(CommandError::Unknown(line.to_string()));
        };
        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map(|(n, r)| (n, r.trim()))
            .unwrap_or((command, ""));

        match name {
            "quit" | "exit" => {
                out.push("Goodbye!");
                out.quit = true;
            }
            "help" => {
                out.push("[HELP]");
                out.lines.extend(Self::help().into_iter().map(|l| format!("  {l}")));
            }
            "list" => self.list(out),
            "status" => self.status(out),
            "refresh" => {
                self.session.refresh().await;
                out.push(format!("[FEED] {} stories", self.session.stories().len()));
            }
            "open" => {
                let index = parse_index(rest, "#open <n>")?;
                let events = self.session.open_viewer(index).await?;
                self.report(&events, out);
            }
            "tick" => {
                let count = if rest.is_empty() {
                    1
                } else {
                    rest.parse::<usize>()
                        .ok()
                        .filter(|&n| n > 0)
                        .ok_or(CommandError::Usage("#tick [count]"))?
                };
                self.tick(count.min(MAX_TICKS_PER_COMMAND), out).await;
            }
            "next" => {
                let events = self.session.next().await?;
                self.report(&events, out);
            }
            "prev" => {
                let events = self.session.previous().await?;
                self.report(&events, out);
            }
            "goto" => {
                let index = parse_index(rest, "#goto <n>")?;
                let events = self.session.navigate(index).await?;
                self.report(&events, out);
            }
            "pause" => {
                if self.session.toggle_pause() {
                    let label = if self.session.engine().is_paused() {
                        "paused"
                    } else {
                        "playing"
                    };
                    out.push(format!("[{}]", label.to_uppercase()));
                } else {
                    out.push("[IGNORED] nothing to pause");
                }
            }
            "menu" => {
                self.session.open_reaction_menu()?;
                out.push(format!("[MENU] {}", QUICK_REACTIONS.join(" ")));
            }
            "react" => {
                let symbol = parse_reaction(rest)?;
                let events = self.session.react(&symbol).await?;
                self.report(&events, out);
            }
            "reply" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("#reply <text>"));
                }
                self.session.begin_reply()?;
                self.session.update_reply(rest)?;
                match self.session.send_reply().await {
                    Ok(events) => self.report(&events, out),
                    Err(e) => {
                        self.session.cancel_reply();
                        return Err(e.into());
                    }
                }
            }
            "close" => {
                let events = self.session.close_viewer().await;
                self.report(&events, out);
            }
            "create" => {
                let request = parse_create(rest)?;
                let story = self.session.create_story(request).await?;
                out.push(format!(
                    "[CREATED] {} story, {}",
                    story.kind(),
                    story.format_remaining(self.session.feed().now())
                ));
            }
            other => return Err(CommandError::Unknown(format!("#{other}"))),
        }
        Ok(())
    }

    async fn tick(&mut self, count: usize, out: &mut Output) {
        let mut delivered = 0;
        for _ in 0..count {
            let Some((outcome, events)) = self.session.tick_active().await else {
                break;
            };
            delivered += 1;
            self.report(&events, out);
            if outcome == TickOutcome::Finished {
                break;
            }
        }

        if delivered == 0 {
            out.push("[IGNORED] viewer is not playing");
        } else if self.session.engine().is_open() {
            out.push(format!(
                "[PROGRESS] story {} at {:.1}% after {delivered} ticks",
                self.session.engine().current_index(),
                self.session.engine().progress()
            ));
        }
    }

    fn list(&self, out: &mut Output) {
        let now = self.session.feed().now();
        out.push(format!(
            "[FEED] {} stories, {} unviewed",
            self.session.stories().len(),
            self.session.feed().unviewed_count()
        ));
        for (i, story) in self.session.stories().iter().enumerate() {
            let marker = if story.is_viewed() { " " } else { "*" };
            let mut line = format!(
                "  [{i}]{marker} {} ({}) - {}",
                story.author().name,
                story.kind(),
                story.format_remaining(now)
            );
            if story.total_reactions() > 0 {
                line.push_str(&format!(" - {}", reaction_summary(story)));
            }
            out.push(line);
        }
    }

    fn status(&self, out: &mut Output) {
        let engine = self.session.engine();
        out.push("[STATUS]");
        out.push(format!("  State: {}", state_label(engine.state())));
        if let Some(story) = self.session.current_story() {
            out.push(format!(
                "  Story: {}/{} by {}",
                engine.current_index() + 1,
                engine.playlist_len(),
                story.author().name
            ));
            out.push(format!("  Progress: {:.1}%", engine.progress()));
        }
        if engine.is_composing_reply() {
            out.push("  Composing reply");
        }
        out.push(format!(
            "  Ticks: {} applied, {} stale",
            engine.ticks_processed(),
            engine.stale_ticks()
        ));
    }

    fn report(&self, events: &[PlaybackEvent], out: &mut Output) {
        for event in events {
            let line = match event {
                PlaybackEvent::Viewed { story_id } => match self.session.story(*story_id) {
                    Some(story) => format!("[VIEWING] {}", describe(story)),
                    None => format!("[VIEWING] {story_id}"),
                },
                PlaybackEvent::Reacted { story_id, symbol } => {
                    let count = self
                        .session
                        .story(*story_id)
                        .map(|s| s.reaction_count(symbol))
                        .unwrap_or_default();
                    format!("[REACTED] {symbol} x{count}")
                }
                PlaybackEvent::ReplySent { story_id, text } => {
                    let to = self
                        .session
                        .story(*story_id)
                        .map(|s| s.author().name.clone())
                        .unwrap_or_else(|| story_id.to_string());
                    format!("[REPLY] to {to}: {text}")
                }
                PlaybackEvent::Advanced { from, to } => format!("[ADVANCED] {from} -> {to}"),
                PlaybackEvent::Closed { reason } => {
                    let why = match reason {
                        CloseReason::UserClosed => "closed",
                        CloseReason::Escape => "escape",
                        CloseReason::EndOfFeed => "end of feed",
                    };
                    format!("[CLOSED] {why}")
                }
            };
            out.push(line);
        }
    }
}

fn describe(story: &Story) -> String {
    let body = match (story.kind(), story.media(), story.content()) {
        (StoryKind::Text, _, Some(content)) => format!("\"{content}\""),
        (_, Some(media), Some(caption)) => format!("{media} \"{caption}\""),
        (_, Some(media), None) => media.to_string(),
        _ => String::new(),
    };
    format!("{} ({}) {body}", story.author().name, story.kind())
}

fn reaction_summary(story: &Story) -> String {
    story
        .reactions()
        .iter()
        .map(|(symbol, count)| format!("{symbol}{count}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn state_label(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Idle => "idle",
        PlaybackState::Playing => "playing",
        PlaybackState::Paused => "paused",
        PlaybackState::ReactionMenuOpen => "reaction menu",
        PlaybackState::Closed => "closed",
    }
}

fn parse_index(arg: &str, usage: &'static str) -> Result<usize, CommandError> {
    arg.parse().map_err(|_| CommandError::Usage(usage))
}

/// Accept a palette position (1-based) or a literal symbol.
fn parse_reaction(arg: &str) -> Result<String, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::Usage("#react <emoji|1-6>"));
    }
    if let Ok(n) = arg.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| QUICK_REACTIONS.get(i))
            .map(|s| s.to_string())
            .ok_or(CommandError::Usage("#react <emoji|1-6>"));
    }
    Ok(arg.to_string())
}

const CREATE_USAGE: &str = "#create text|photo|video [bg=..] [privacy=..] [for=..] <media/text>";

fn parse_create(args: &str) -> Result<StoryRequest, CommandError> {
    let mut tokens = args.split_whitespace().peekable();
    let kind = tokens
        .next()
        .and_then(StoryKind::parse)
        .ok_or(CommandError::Usage(CREATE_USAGE))?;
    let mut request = StoryRequest::new(kind);

    while let Some((key, value)) = tokens.peek().and_then(|t| t.split_once('=')) {
        match key {
            "bg" => {
                request.background =
                    Some(Background::parse(value).ok_or(CommandError::Usage(CREATE_USAGE))?)
            }
            "privacy" => {
                request.privacy_tier =
                    PrivacyTier::parse(value).ok_or(CommandError::Usage(CREATE_USAGE))?
            }
            "for" => {
                request.retention =
                    Retention::parse(value).ok_or(CommandError::Usage(CREATE_USAGE))?
            }
            _ => break,
        }
        tokens.next();
    }

    if kind.requires_media() {
        request.media = tokens.next().map(str::to_string);
    }
    let text = tokens.collect::<Vec<_>>().join(" ");
    if !text.is_empty() {
        request.content = Some(text);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StoryFixtures, TestHarness};

    async fn driver() -> HeadlessStories {
        let fixtures = StoryFixtures::new();
        let stories = [
            fixtures.text_created("first", chrono::Duration::minutes(30)),
            fixtures.photo("pics/second.jpg"),
        ];
        let harness = TestHarness::with_stories(&stories).await;
        HeadlessStories::new(harness.into_session())
    }

    #[test]
    fn test_parse_create_options() {
        let request = parse_create("text bg=ocean privacy=public for=6h good morning").unwrap();
        assert_eq!(request.kind, StoryKind::Text);
        assert_eq!(request.background, Some(Background::Ocean));
        assert_eq!(request.privacy_tier, PrivacyTier::Public);
        assert_eq!(request.retention, Retention::SixHours);
        assert_eq!(request.content.as_deref(), Some("good morning"));

        let request = parse_create("video clips/a.mp4 what a day").unwrap();
        assert_eq!(request.media.as_deref(), Some("clips/a.mp4"));
        assert_eq!(request.content.as_deref(), Some("what a day"));

        assert!(parse_create("gif x").is_err());
        assert!(parse_create("text bg=plaid hi").is_err());
    }

    #[test]
    fn test_parse_reaction() {
        assert_eq!(parse_reaction("1").unwrap(), "❤️");
        assert_eq!(parse_reaction("6").unwrap(), "👍");
        assert!(parse_reaction("0").is_err());
        assert!(parse_reaction("7").is_err());
        assert_eq!(parse_reaction("🔥").unwrap(), "🔥");
    }

    #[tokio::test]
    async fn test_open_tick_and_close() {
        let mut driver = driver().await;

        let out = driver.execute("#open 0").await;
        assert!(out.has_tag("[VIEWING]"));

        let out = driver.execute("#tick 70").await;
        assert!(out.lines.contains(&"[ADVANCED] 0 -> 1".to_string()));

        let out = driver.execute("#close").await;
        assert_eq!(out.lines, vec!["[CLOSED] closed".to_string()]);

        let out = driver.execute("#tick").await;
        assert!(out.has_tag("[IGNORED]"));
    }

    #[tokio::test]
    async fn test_tick_zero_is_a_usage_error() {
        let mut driver = driver().await;
        driver.execute("#open 0").await;

        let out = driver.execute("#tick 0").await;
        assert_eq!(out.lines, vec!["[ERROR] Usage: #tick [count]".to_string()]);
        assert_eq!(driver.session().engine().state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_errors_are_reported() {
        let mut driver = driver().await;
        assert!(driver.execute("#open 9").await.has_tag("[ERROR]"));
        assert!(driver.execute("#next").await.has_tag("[ERROR]"));
        assert!(driver.execute("#bogus").await.has_tag("[ERROR]"));
        assert!(driver.execute("hello").await.has_tag("[ERROR]"));
        assert!(driver.execute("#create text   ").await.has_tag("[ERROR]"));
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let mut driver = driver().await;
        let out = driver.execute("#create text for=12h lunch?").await;
        assert_eq!(out.lines, vec!["[CREATED] Text story, 12h left".to_string()]);

        let out = driver.execute("#list").await;
        assert_eq!(out.lines[0], "[FEED] 3 stories, 3 unviewed");
        assert!(out.lines[1].starts_with("  [0]* You (Text)"));
    }

    #[tokio::test]
    async fn test_empty_reply_rejected_and_resumes() {
        let mut driver = driver().await;
        driver.execute("#open 0").await;
        assert!(driver.execute("#reply").await.has_tag("[ERROR]"));
        assert!(driver.execute("#reply    ").await.has_tag("[ERROR]"));

        let out = driver.execute("#reply nice").await;
        assert!(out.has_tag("[REPLY]"));
        assert_eq!(driver.session().engine().state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_quit() {
        let mut driver = driver().await;
        assert!(driver.execute("#quit").await.quit);
        assert!(!driver.execute("").await.quit);
    }
}
