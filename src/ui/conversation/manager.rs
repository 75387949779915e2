use crate::session::Session;
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, HistoryView, ParsedCommand, SlashCommand,
};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    Terminal,
};
use std::time::Duration;

/// What the event loop should do after a key press
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationAction {
    None,
    Submit(String),
    Exit,
}

/// Owns the session and the widgets around it
pub struct ConversationManager {
    session: Session,
    composer: ConversationComposer,
    title: String,
    last_error: Option<String>,
    notice: Option<String>,
    pending: bool,
    scroll: u16,
}

impl ConversationManager {
    pub fn new(session: Session, title: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            session,
            composer: ConversationComposer::new(placeholder),
            title: title.into(),
            last_error: None,
            notice: None,
            pending: false,
            scroll: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Drive the terminal until the user quits.
    ///
    /// Input is not read while a turn is in flight; the screen shows
    /// "Thinking..." until the reply or the failure arrives.
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|frame| {
                let area = frame.size();
                self.render(area, frame.buffer_mut());
            })?;

            if !event::poll(Duration::from_millis(250))? {
                continue;
            }

            let Event::Key(key) = event::read()? else {
                continue;
            };

            match self.handle_key(key) {
                ConversationAction::None => {}
                ConversationAction::Exit => break,
                ConversationAction::Submit(text) => {
                    self.pending = true;
                    terminal.draw(|frame| {
                        let area = frame.size();
                        self.render(area, frame.buffer_mut());
                    })?;
                    self.submit(text).await;
                }
            }
        }

        Ok(())
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        match key.code {
            KeyCode::Esc => return ConversationAction::Exit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return ConversationAction::Exit;
            }
            KeyCode::PageUp | KeyCode::Up => {
                self.scroll = self.scroll.saturating_add(if key.code == KeyCode::Up { 1 } else { 10 });
                return ConversationAction::None;
            }
            KeyCode::PageDown | KeyCode::Down => {
                self.scroll = self.scroll.saturating_sub(if key.code == KeyCode::Down { 1 } else { 10 });
                return ConversationAction::None;
            }
            _ => {}
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(text) => ConversationAction::Submit(text),
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    /// Run one turn and fold the outcome into what is displayed
    pub async fn submit(&mut self, text: String) {
        self.pending = true;
        self.last_error = None;
        self.notice = None;

        if let Err(failure) = self.session.submit(text).await {
            self.last_error = Some(failure.to_string());
        }

        self.pending = false;
        self.scroll = 0;
    }

    fn handle_slash_command(&mut self, command: ParsedCommand) -> ConversationAction {
        match command.command {
            SlashCommand::Bye => ConversationAction::Exit,
            SlashCommand::Help => {
                self.notice = Some(get_help_text());
                ConversationAction::None
            }
            SlashCommand::Model => {
                self.notice = Some(format!("Model: {}", self.session.model_id()));
                ConversationAction::None
            }
        }
    }

    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(3),    // History
                Constraint::Length(3), // Composer
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled(
                self.title.as_str(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", self.session.model_id()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        buf.set_line(chunks[0].x, chunks[0].y, &title, chunks[0].width);

        let view = HistoryView {
            turns: self.session.history().all(),
            error: self.last_error.as_deref(),
            notice: self.notice.as_deref(),
            pending: self.pending,
            scroll: self.scroll,
        };
        let line_count = view.lines(chunks[1].width.saturating_sub(2)).len();
        self.scroll = clamp_scroll(self.scroll, line_count);
        ratatui::widgets::Widget::render(
            HistoryView {
                scroll: self.scroll,
                ..view
            },
            chunks[1],
            buf,
        );

        self.composer.set_focus(!self.pending);
        ratatui::widgets::Widget::render(&self.composer, chunks[2], buf);
    }
}

/// Scroll offset limited to the scrollback length, saturating at `u16::MAX`
fn clamp_scroll(scroll: u16, line_count: usize) -> u16 {
    scroll.min(u16::try_from(line_count).unwrap_or(u16::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Turn;
    use crate::error::RemoteCallFailure;
    use crate::testing::StubService;
    use crate::turn::TurnProcessor;
    use std::sync::Arc;

    fn manager_with(stub: StubService) -> ConversationManager {
        let session = Session::new(TurnProcessor::new(Arc::new(stub)));
        ConversationManager::new(session, "Chat", "Type...")
    }

    fn press(manager: &mut ConversationManager, code: KeyCode) -> ConversationAction {
        manager.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_line(manager: &mut ConversationManager, text: &str) -> ConversationAction {
        for c in text.chars() {
            press(manager, KeyCode::Char(c));
        }
        press(manager, KeyCode::Enter)
    }

    #[tokio::test]
    async fn submission_round_trip() {
        let mut manager = manager_with(StubService::replying(&["hi"]));

        let action = type_line(&mut manager, "hello");
        assert_eq!(action, ConversationAction::Submit("hello".into()));

        manager.submit("hello".into()).await;

        assert_eq!(
            manager.session().history().all(),
            &[Turn::user("hello"), Turn::assistant("hi")]
        );
        assert!(manager.last_error.is_none());
        assert!(!manager.pending);
    }

    #[tokio::test]
    async fn failure_is_shown_inline_and_cleared_by_next_turn() {
        let stub = StubService::new();
        stub.queue_failure(RemoteCallFailure::network("offline"));
        stub.queue_reply("back");
        let mut manager = manager_with(stub);

        manager.submit("one".into()).await;
        assert_eq!(manager.last_error.as_deref(), Some("offline"));
        assert_eq!(manager.session().history().len(), 1);

        manager.submit("two".into()).await;
        assert!(manager.last_error.is_none());
        assert_eq!(manager.session().history().len(), 3);
    }

    #[test]
    fn escape_and_bye_exit() {
        let mut manager = manager_with(StubService::new());
        assert_eq!(press(&mut manager, KeyCode::Esc), ConversationAction::Exit);
        assert_eq!(type_line(&mut manager, "/bye"), ConversationAction::Exit);
        assert_eq!(
            manager.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            ConversationAction::Exit
        );
    }

    #[test]
    fn model_command_sets_notice_without_touching_history() {
        let mut manager = manager_with(StubService::new());
        assert_eq!(type_line(&mut manager, "/model"), ConversationAction::None);
        assert_eq!(manager.notice.as_deref(), Some("Model: stub-model"));
        assert!(manager.session().history().is_empty());
    }

    #[test]
    fn render_fits_small_area() {
        let mut manager = manager_with(StubService::new());
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        manager.render(area, &mut buf);
        manager.scroll = 500;
        manager.render(area, &mut buf);
        assert!(manager.scroll <= 10);
    }

    #[test]
    fn scroll_clamp_saturates_on_huge_scrollback() {
        assert_eq!(clamp_scroll(500, 10), 10);
        assert_eq!(clamp_scroll(500, 65_600), 500);
        assert_eq!(clamp_scroll(u16::MAX, 100_000), u16::MAX);
    }

    #[tokio::test]
    async fn scroll_survives_render_of_long_reply() {
        let long_reply = "line\n".repeat(65_600);
        let mut manager = manager_with(StubService::replying(&[long_reply.as_str()]));
        manager.submit("dump".into()).await;

        for _ in 0..50 {
            press(&mut manager, KeyCode::PageUp);
        }
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);
        manager.render(area, &mut buf);

        assert_eq!(manager.scroll, 500);
    }
}
