//! Full-screen terminal front end

pub mod conversation;

use crate::session::Session;
use anyhow::{Context, Result};
use conversation::ConversationManager;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};

type ChatTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Take over the terminal for one chat session and restore it afterwards
pub async fn run(session: Session, title: &str, placeholder: &str) -> Result<()> {
    let mut terminal = setup_terminal()?;

    let mut manager = ConversationManager::new(session, title, placeholder);
    let result = manager.run(&mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn setup_terminal() -> Result<ChatTerminal> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    undo_on_error(enter_alternate_screen, abandon_setup)
}

fn enter_alternate_screen() -> Result<ChatTerminal> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn abandon_setup() {
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Run `step`; if it fails, run `undo` before handing back the error
fn undo_on_error<T>(step: impl FnOnce() -> Result<T>, undo: impl FnOnce()) -> Result<T> {
    step().inspect_err(|_| undo())
}
