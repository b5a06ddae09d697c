//! Full-screen browser for query results (`query -I`).
//!
//! The browser is a pure state machine ([`QueryBrowser`]) drawn with
//! ratatui. It blocks on terminal events, so callers run it on a blocking
//! thread.

mod model;
mod render;

pub use model::{Action, Outcome, QueryBrowser, action_for};

use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{self, Event, KeyEventKind};

use crate::error::{CliError, Result};

/// Shows `browser` until the user quits, then returns its final state.
pub fn browse(mut browser: QueryBrowser) -> Result<QueryBrowser> {
    let mut terminal = ratatui::try_init()
        .map_err(|e| CliError::Terminal(format!("failed to enter full-screen mode: {e}")))?;
    let outcome = event_loop(&mut terminal, &mut browser);
    if let Err(e) = ratatui::try_restore() {
        tracing::warn!(error = %e, "failed to restore terminal");
    }
    outcome.map(|()| browser)
}

fn event_loop(terminal: &mut DefaultTerminal, browser: &mut QueryBrowser) -> Result<()> {
    loop {
        terminal.draw(|frame| render::draw(frame, browser))?;
        let action = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => action_for(key),
            Event::Resize(width, height) => Action::Resize { width, height },
            _ => Action::None,
        };
        if browser.update(action) == Outcome::Quit {
            return Ok(());
        }
    }
}
