//! Story creation TUI wizard.
//!
//! A multi-step form that assembles a [`StoryRequest`]. Validation is left
//! to the core pipeline; its error is shown inline on the review step.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use stories_core::{Background, PrivacyTier, Retention, StoryKind, StoryRequest};

use crate::ui::theme::StoryTheme;
use crate::ui::widgets::InputWidget;

/// Steps in story creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationStep {
    Kind,
    Media,
    Content,
    Background,
    Privacy,
    Retention,
    Review,
}

impl CreationStep {
    pub fn title(&self) -> &'static str {
        match self {
            CreationStep::Kind => "What are you sharing?",
            CreationStep::Media => "Media",
            CreationStep::Content => "Text",
            CreationStep::Background => "Background",
            CreationStep::Privacy => "Who can see it?",
            CreationStep::Retention => "How long should it stay up?",
            CreationStep::Review => "Review",
        }
    }
}

/// What the wizard wants from its owner after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardOutcome {
    Continue,
    Cancelled,
    Submit(StoryRequest),
}

/// Story creation state.
pub struct StoryCreation {
    pub step: CreationStep,
    pub kind: StoryKind,
    pub media: String,
    pub content: String,
    pub background: Background,
    pub privacy: PrivacyTier,
    pub retention: Retention,

    // UI state
    list_state: ListState,
    cursor_position: usize,
    error: Option<String>,
}

impl Default for StoryCreation {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryCreation {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            step: CreationStep::Kind,
            kind: StoryKind::Text,
            media: String::new(),
            content: String::new(),
            background: Background::default(),
            privacy: PrivacyTier::default(),
            retention: Retention::default(),
            list_state,
            cursor_position: 0,
            error: None,
        }
    }

    /// Steps for the chosen kind, in order.
    fn steps(&self) -> Vec<CreationStep> {
        let mut steps = vec![CreationStep::Kind];
        if self.kind.requires_media() {
            steps.push(CreationStep::Media);
        }
        steps.push(CreationStep::Content);
        if !self.kind.requires_media() {
            steps.push(CreationStep::Background);
        }
        steps.extend([
            CreationStep::Privacy,
            CreationStep::Retention,
            CreationStep::Review,
        ]);
        steps
    }

    fn next_step(&self) -> Option<CreationStep> {
        let steps = self.steps();
        let pos = steps.iter().position(|s| *s == self.step)?;
        steps.get(pos + 1).copied()
    }

    fn prev_step(&self) -> Option<CreationStep> {
        let steps = self.steps();
        let pos = steps.iter().position(|s| *s == self.step)?;
        pos.checked_sub(1).map(|p| steps[p])
    }

    /// Show a validation error on the review step.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.step = CreationStep::Review;
        self.error = Some(message.into());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The request described by the current answers.
    pub fn build_request(&self) -> StoryRequest {
        let content = Some(self.content.trim().to_string()).filter(|c| !c.is_empty());
        let mut request = StoryRequest::new(self.kind)
            .with_privacy(self.privacy)
            .with_retention(self.retention);
        request.content = content;
        if self.kind.requires_media() {
            request.media = Some(self.media.trim().to_string());
        } else {
            request.background = Some(self.background);
        }
        request
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) -> WizardOutcome {
        match self.step {
            CreationStep::Kind => self.handle_list_selection(key, StoryKind::all().len()),
            CreationStep::Media | CreationStep::Content => self.handle_text_input(key),
            CreationStep::Background => self.handle_list_selection(key, Background::all().len()),
            CreationStep::Privacy => self.handle_list_selection(key, PrivacyTier::all().len()),
            CreationStep::Retention => self.handle_retention(key),
            CreationStep::Review => self.handle_review(key),
        }
    }

    fn go_back(&mut self) -> WizardOutcome {
        match self.prev_step() {
            Some(prev) => {
                self.enter_step(prev);
                WizardOutcome::Continue
            }
            None => WizardOutcome::Cancelled,
        }
    }

    fn advance_step(&mut self) {
        if let Some(next) = self.next_step() {
            self.enter_step(next);
        }
    }

    /// Move to `step`, pointing the list or cursor at the current answer.
    fn enter_step(&mut self, step: CreationStep) {
        self.step = step;
        self.error = None;
        let selected = match step {
            CreationStep::Kind => StoryKind::all().iter().position(|k| *k == self.kind),
            CreationStep::Background => {
                Background::all().iter().position(|b| *b == self.background)
            }
            CreationStep::Privacy => PrivacyTier::all().iter().position(|p| *p == self.privacy),
            CreationStep::Retention => Some(self.retention_index()),
            _ => None,
        };
        self.list_state.select(Some(selected.unwrap_or(0)));
        if let Some(buffer) = self.active_buffer() {
            self.cursor_position = buffer.chars().count();
        }
    }

    fn active_buffer(&self) -> Option<&String> {
        match self.step {
            CreationStep::Media => Some(&self.media),
            CreationStep::Content => Some(&self.content),
            _ => None,
        }
    }

    fn handle_list_selection(&mut self, key: KeyEvent, max_items: usize) -> WizardOutcome {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                let i = self.list_state.selected().unwrap_or(0);
                self.list_state
                    .select(Some(if i == 0 { max_items - 1 } else { i - 1 }));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let i = self.list_state.selected().unwrap_or(0);
                self.list_state.select(Some((i + 1) % max_items));
            }
            KeyCode::Enter => self.confirm_selection(),
            KeyCode::Esc => return self.go_back(),
            _ => {}
        }
        WizardOutcome::Continue
    }

    fn confirm_selection(&mut self) {
        let i = self.list_state.selected().unwrap_or(0);
        match self.step {
            CreationStep::Kind => {
                if let Some(kind) = StoryKind::all().get(i) {
                    self.kind = *kind;
                }
            }
            CreationStep::Background => {
                if let Some(background) = Background::all().get(i) {
                    self.background = *background;
                }
            }
            CreationStep::Privacy => {
                if let Some(tier) = PrivacyTier::all().get(i) {
                    self.privacy = *tier;
                }
            }
            _ => {}
        }
        self.advance_step();
    }

    fn handle_text_input(&mut self, key: KeyEvent) -> WizardOutcome {
        let cursor = self.cursor_position;
        let buffer = match self.step {
            CreationStep::Media => &mut self.media,
            _ => &mut self.content,
        };
        match key.code {
            KeyCode::Char(c) => {
                let byte_pos = buffer
                    .char_indices()
                    .nth(cursor)
                    .map(|(i, _)| i)
                    .unwrap_or(buffer.len());
                buffer.insert(byte_pos, c);
                self.cursor_position += 1;
            }
            KeyCode::Backspace => {
                if cursor > 0 {
                    if let Some((byte_pos, ch)) = buffer.char_indices().nth(cursor - 1) {
                        buffer.replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
                    }
                    self.cursor_position -= 1;
                }
            }
            KeyCode::Delete => {
                if let Some((byte_pos, ch)) = buffer.char_indices().nth(cursor) {
                    buffer.replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
                }
            }
            KeyCode::Left => {
                self.cursor_position = cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                self.cursor_position = (cursor + 1).min(buffer.chars().count());
            }
            KeyCode::Home => self.cursor_position = 0,
            KeyCode::End => self.cursor_position = buffer.chars().count(),
            KeyCode::Enter => self.advance_step(),
            KeyCode::Esc => return self.go_back(),
            _ => {}
        }
        WizardOutcome::Continue
    }

    /// Index into the retention list; the last row is the custom entry.
    fn retention_index(&self) -> usize {
        Retention::presets()
            .iter()
            .position(|r| *r == self.retention)
            .unwrap_or(Retention::presets().len())
    }

    fn handle_retention(&mut self, key: KeyEvent) -> WizardOutcome {
        let rows = Retention::presets().len() + 1;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Down | KeyCode::Char('j') => {
                let i = self.list_state.selected().unwrap_or(0);
                let next = if matches!(key.code, KeyCode::Up | KeyCode::Char('k')) {
                    if i == 0 {
                        rows - 1
                    } else {
                        i - 1
                    }
                } else {
                    (i + 1) % rows
                };
                self.list_state.select(Some(next));
                self.retention = match Retention::presets().get(next) {
                    Some(preset) => *preset,
                    None => Retention::Custom(self.retention.hours()),
                };
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+') | KeyCode::Char('=') => {
                self.adjust_custom_hours(1);
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-') => {
                self.adjust_custom_hours(-1);
            }
            KeyCode::Enter => self.advance_step(),
            KeyCode::Esc => return self.go_back(),
            _ => {}
        }
        WizardOutcome::Continue
    }

    fn adjust_custom_hours(&mut self, delta: i32) {
        let hours = self.retention.hours() as i32 + delta;
        let hours = hours.clamp(
            Retention::MIN_CUSTOM_HOURS as i32,
            Retention::MAX_CUSTOM_HOURS as i32,
        ) as u32;
        self.retention = Retention::Custom(hours);
        self.list_state.select(Some(Retention::presets().len()));
    }

    fn handle_review(&mut self, key: KeyEvent) -> WizardOutcome {
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') => WizardOutcome::Submit(self.build_request()),
            KeyCode::Esc | KeyCode::Char('n') => self.go_back(),
            _ => WizardOutcome::Continue,
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    pub fn render(&mut self, frame: &mut Frame, area: Rect, theme: &StoryTheme) {
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(format!(" New story: {} ", self.step.title()))
            .borders(Borders::ALL)
            .border_style(theme.border_style(true));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(inner);

        match self.step {
            CreationStep::Kind => {
                let items = StoryKind::all()
                    .iter()
                    .map(|k| format!("{} {}", theme.kind_icon(*k), k.name()))
                    .collect();
                self.render_list(frame, chunks[0], items, theme);
            }
            CreationStep::Media => {
                let hint = format!("Path or URL of the {}", self.kind.name().to_lowercase());
                self.render_text_step(frame, chunks[0], &hint, theme);
            }
            CreationStep::Content => {
                let hint = if self.kind.requires_media() {
                    "Caption (optional)"
                } else {
                    "What's on your mind?"
                };
                self.render_text_step(frame, chunks[0], hint, theme);
            }
            CreationStep::Background => {
                let items = Background::all()
                    .iter()
                    .map(|b| b.name().to_string())
                    .collect();
                self.render_list(frame, chunks[0], items, theme);
            }
            CreationStep::Privacy => {
                let items = PrivacyTier::all()
                    .iter()
                    .map(|p| p.label().to_string())
                    .collect();
                self.render_list(frame, chunks[0], items, theme);
            }
            CreationStep::Retention => {
                let mut items: Vec<String> =
                    Retention::presets().iter().map(|r| r.label()).collect();
                let custom = match self.retention {
                    Retention::Custom(_) => format!("Custom: {}  (←/→ to adjust)", self.retention.label()),
                    _ => "Custom  (←/→ to adjust)".to_string(),
                };
                items.push(custom);
                self.render_list(frame, chunks[0], items, theme);
            }
            CreationStep::Review => self.render_review(frame, chunks[0], theme),
        }

        let help = match self.step {
            CreationStep::Review => "Enter: share  Esc: back",
            CreationStep::Media | CreationStep::Content => "Enter: next  Esc: back",
            CreationStep::Retention => "↑/↓: choose  ←/→: custom hours  Enter: next  Esc: back",
            _ => "↑/↓: choose  Enter: next  Esc: back",
        };
        frame.render_widget(
            Paragraph::new(help).style(theme.system_style()),
            chunks[1],
        );
    }

    fn render_list(&mut self, frame: &mut Frame, area: Rect, items: Vec<String>, theme: &StoryTheme) {
        let items: Vec<ListItem> = items
            .into_iter()
            .map(|label| ListItem::new(label).style(Style::default().fg(theme.foreground)))
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().bg(Color::Magenta).fg(Color::White))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_text_step(&self, frame: &mut Frame, area: Rect, hint: &str, theme: &StoryTheme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        frame.render_widget(
            Paragraph::new(hint).style(Style::default().fg(Color::Yellow)),
            chunks[0],
        );

        let buffer = self.active_buffer().map(String::as_str).unwrap_or_default();
        let input = InputWidget::new(buffer, theme)
            .cursor_position(self.cursor_position)
            .title(self.step.title());
        frame.render_widget(input, chunks[1]);

        let count = Paragraph::new(format!("{} characters", buffer.chars().count()))
            .style(theme.system_style());
        frame.render_widget(count, chunks[2]);
    }

    fn render_review(&self, frame: &mut Frame, area: Rect, theme: &StoryTheme) {
        let label = Style::default().fg(Color::Yellow);
        let mut lines = vec![Line::from(vec![
            Span::styled("Type:       ", label),
            Span::raw(self.kind.name()),
        ])];
        if self.kind.requires_media() {
            lines.push(Line::from(vec![
                Span::styled("Media:      ", label),
                Span::raw(self.media.clone()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Caption:    ", label),
                Span::raw(if self.content.trim().is_empty() {
                    "(none)".to_string()
                } else {
                    self.content.clone()
                }),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::styled("Text:       ", label),
                Span::raw(self.content.clone()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Background: ", label),
                Span::styled(
                    self.background.name(),
                    Style::default().bg(theme.background_color(self.background)),
                ),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled("Audience:   ", label),
            Span::styled(self.privacy.label(), theme.privacy_style(self.privacy)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Expires in: ", label),
            Span::raw(self.retention.label()),
        ]));

        if let Some(error) = &self.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(error.clone(), theme.error_style())));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(wizard: &mut StoryCreation, code: KeyCode) -> WizardOutcome {
        wizard.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(wizard: &mut StoryCreation, text: &str) {
        for c in text.chars() {
            press(wizard, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_text_story_flow() {
        let mut wizard = StoryCreation::new();
        // Kind list starts on Photo; Text is last.
        press(&mut wizard, KeyCode::Up);
        press(&mut wizard, KeyCode::Enter);
        assert_eq!(wizard.kind, StoryKind::Text);
        assert_eq!(wizard.step, CreationStep::Content);

        type_text(&mut wizard, "Hello café");
        press(&mut wizard, KeyCode::Enter);
        assert_eq!(wizard.step, CreationStep::Background);

        press(&mut wizard, KeyCode::Down);
        press(&mut wizard, KeyCode::Enter);
        assert_eq!(wizard.background, Background::Ocean);

        press(&mut wizard, KeyCode::Enter); // Privacy keeps Friends
        press(&mut wizard, KeyCode::Enter); // Retention keeps 24h
        assert_eq!(wizard.step, CreationStep::Review);

        match press(&mut wizard, KeyCode::Enter) {
            WizardOutcome::Submit(request) => {
                assert_eq!(request.kind, StoryKind::Text);
                assert_eq!(request.content.as_deref(), Some("Hello café"));
                assert_eq!(request.background, Some(Background::Ocean));
                assert_eq!(request.privacy_tier, PrivacyTier::Friends);
                assert_eq!(request.retention, Retention::TwentyFourHours);
            }
            other => panic!("expected submit, got {other:?}"),
        }
    }

    #[test]
    fn test_media_story_skips_background() {
        let mut wizard = StoryCreation::new();
        press(&mut wizard, KeyCode::Enter);
        assert_eq!(wizard.kind, StoryKind::Photo);
        assert_eq!(wizard.step, CreationStep::Media);

        type_text(&mut wizard, "pics/beach.jpg");
        press(&mut wizard, KeyCode::Enter);
        assert_eq!(wizard.step, CreationStep::Content);
        press(&mut wizard, KeyCode::Enter);
        assert_eq!(wizard.step, CreationStep::Privacy);

        let request = wizard.build_request();
        assert_eq!(request.media.as_deref(), Some("pics/beach.jpg"));
        assert_eq!(request.content, None);
        assert_eq!(request.background, None);
    }

    #[test]
    fn test_unicode_editing() {
        let mut wizard = StoryCreation::new();
        press(&mut wizard, KeyCode::Up);
        press(&mut wizard, KeyCode::Enter);

        type_text(&mut wizard, "héllo");
        press(&mut wizard, KeyCode::Left);
        press(&mut wizard, KeyCode::Backspace);
        assert_eq!(wizard.content, "hélo");
        press(&mut wizard, KeyCode::Home);
        press(&mut wizard, KeyCode::Delete);
        assert_eq!(wizard.content, "élo");
    }

    #[test]
    fn test_custom_retention_is_clamped() {
        let mut wizard = StoryCreation::new();
        wizard.enter_step(CreationStep::Retention);
        for _ in 0..40 {
            press(&mut wizard, KeyCode::Right);
        }
        assert_eq!(wizard.retention, Retention::Custom(48));

        for _ in 0..60 {
            press(&mut wizard, KeyCode::Left);
        }
        assert_eq!(wizard.retention, Retention::Custom(1));

        press(&mut wizard, KeyCode::Down);
        assert_eq!(wizard.retention, Retention::SixHours);
    }

    #[test]
    fn test_escape_walks_back_then_cancels() {
        let mut wizard = StoryCreation::new();
        press(&mut wizard, KeyCode::Up);
        press(&mut wizard, KeyCode::Enter);
        assert_eq!(press(&mut wizard, KeyCode::Esc), WizardOutcome::Continue);
        assert_eq!(wizard.step, CreationStep::Kind);
        assert_eq!(press(&mut wizard, KeyCode::Esc), WizardOutcome::Cancelled);
    }

    #[test]
    fn test_error_shown_on_review() {
        let mut wizard = StoryCreation::new();
        wizard.set_error("Text stories need some text");
        assert_eq!(wizard.step, CreationStep::Review);
        assert_eq!(wizard.error(), Some("Text stories need some text"));

        press(&mut wizard, KeyCode::Esc);
        assert!(wizard.error().is_none());
    }
}
