//! Confirmation and password prompts.

use std::io::{self, BufRead, Cursor, IsTerminal};

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::terminal;

use crate::error::{CliError, Result};
use crate::view::View;

/// Where prompt answers come from.
pub enum Input {
    /// The process stdin. Passwords are read with echo disabled when stdin
    /// is a terminal.
    Terminal,
    /// Pre-recorded answers, one per line.
    Scripted(Box<dyn BufRead + Send>),
}

impl Input {
    pub fn scripted(answers: impl Into<String>) -> Self {
        Self::Scripted(Box::new(Cursor::new(answers.into().into_bytes())))
    }

    /// Reads one line without its line terminator. End of input reads as
    /// an empty line.
    pub fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        match self {
            Self::Terminal => io::stdin().lock().read_line(&mut line)?,
            Self::Scripted(reader) => reader.read_line(&mut line)?,
        };
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    pub fn read_password(&mut self) -> Result<String> {
        match self {
            Self::Terminal if io::stdin().is_terminal() => read_hidden(),
            _ => self.read_line(),
        }
    }
}

/// Asks a yes/no question. Only `y`, `Y` and `yes` confirm.
pub fn confirm(view: &mut View, input: &mut Input, question: &str) -> Result<bool> {
    view.print_inline(format!("{question} (y/n): "));
    let answer = input.read_line()?;
    let confirmed = matches!(answer.trim(), "y" | "Y" | "yes");
    tracing::debug!(confirmed, "confirmation answered");
    Ok(confirmed)
}

/// Prompts for a secret.
pub fn password(view: &mut View, input: &mut Input, prompt: &str) -> Result<String> {
    view.print_inline(prompt);
    let password = input.read_password()?;
    if !matches!(input, Input::Scripted(_)) {
        view.newline();
    }
    Ok(password)
}

fn read_hidden() -> Result<String> {
    let terminal_error = |e: io::Error| CliError::Terminal(e.to_string());
    terminal::enable_raw_mode().map_err(terminal_error)?;
    let result = read_hidden_raw();
    terminal::disable_raw_mode().map_err(terminal_error)?;
    result
}

fn read_hidden_raw() -> Result<String> {
    let mut password = String::new();
    loop {
        let Event::Key(key) = event::read().map_err(|e| CliError::Terminal(e.to_string()))? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(password),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(CliError::Terminal("password entry interrupted".to_string()));
            }
            KeyCode::Backspace => {
                password.pop();
            }
            KeyCode::Char(c) => password.push(c),
            _ => {}
        }
    }
}
