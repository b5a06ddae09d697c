use asvec_client::Neighbor;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::output::{DataLimits, limited_text};

/// What a key press asks the browser to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    /// Open the record under the cursor.
    Select,
    /// Leave the detail view, or quit from the list.
    Back,
    /// Search again using the open record's vector.
    Query,
    Interrupt,
    Resize { width: u16, height: u16 },
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

/// State of the result browser: a list of neighbors and an optional
/// open record.
#[derive(Debug, Clone)]
pub struct QueryBrowser {
    neighbors: Vec<Neighbor>,
    cursor: usize,
    selected: Option<usize>,
    requery: bool,
    scroll: u16,
    size: (u16, u16),
    limits: DataLimits,
}

impl QueryBrowser {
    pub fn new(mut neighbors: Vec<Neighbor>, limits: DataLimits) -> Self {
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Self {
            neighbors,
            cursor: 0,
            selected: None,
            requery: false,
            scroll: 0,
            size: (0, 0),
            limits,
        }
    }

    pub fn neighbors(&self) -> &[Neighbor] {
        &self.neighbors
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The record open in the detail view.
    pub fn selected(&self) -> Option<&Neighbor> {
        self.selected.and_then(|i| self.neighbors.get(i))
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    /// The record to search from next, when the user asked for a requery.
    pub fn selected_for_requery(&self) -> Option<&Neighbor> {
        if self.requery { self.selected() } else { None }
    }

    pub fn update(&mut self, action: Action) -> Outcome {
        if let Action::Resize { width, height } = action {
            self.size = (width, height);
            return Outcome::Continue;
        }
        if action == Action::Interrupt {
            self.requery = false;
            return Outcome::Quit;
        }

        match self.selected {
            None => match action {
                Action::Up => self.cursor = self.cursor.saturating_sub(1),
                Action::Down => {
                    if self.cursor + 1 < self.neighbors.len() {
                        self.cursor += 1;
                    }
                }
                Action::Select if !self.neighbors.is_empty() => {
                    self.selected = Some(self.cursor);
                    self.scroll = 0;
                }
                Action::Back => return Outcome::Quit,
                _ => {}
            },
            Some(_) => match action {
                Action::Up => self.scroll = self.scroll.saturating_sub(1),
                Action::Down => {
                    if usize::from(self.scroll) + 1 < self.detail_lines().len() {
                        self.scroll += 1;
                    }
                }
                Action::Back => self.selected = None,
                Action::Query => {
                    self.requery = true;
                    return Outcome::Quit;
                }
                _ => {}
            },
        }
        Outcome::Continue
    }

    /// Text of the open record, one entry per line. Bins are cut down to
    /// the same limits as the results table.
    pub fn detail_lines(&self) -> Vec<String> {
        let Some(neighbor) = self.selected() else {
            return Vec::new();
        };
        let mut lines = vec![
            format!("Namespace:  {}", neighbor.namespace),
            format!("Set:        {}", neighbor.set.as_deref().unwrap_or("")),
            format!("Key:        {}", neighbor.key),
            format!("Distance:   {}", neighbor.distance),
            format!("Generation: {}", neighbor.record.generation),
            format!(
                "Expiration: {}",
                neighbor
                    .record
                    .expiration
                    .map_or_else(|| "Never".to_string(), |at| at.to_rfc3339())
            ),
            String::new(),
            "Data:".to_string(),
        ];
        let data = &neighbor.record.data;
        let shown = self.limits.max_keys.unwrap_or(data.len());
        lines.extend(
            data.iter()
                .take(shown)
                .map(|(name, value)| format!("  {name}: {}", limited_text(value, self.limits.max_width))),
        );
        if data.len() > shown {
            lines.push("  ...".to_string());
        }
        lines
    }
}

/// Maps a key press to an action for the current view.
pub fn action_for(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Interrupt;
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        KeyCode::Char('q') => Action::Query,
        KeyCode::Esc | KeyCode::Backspace => Action::Back,
        _ => Action::None,
    }
}
