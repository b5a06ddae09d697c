//! The table builder every writer renders through.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use comfy_table::{Cell as TableCell, Color, ContentArrangement, Table};

use super::{Render, RenderMode};
use crate::flags::NOT_SET;

/// Rounded borders with a separator between rows.
const ROWS: &str = "││──├─┼┤│─┼├┤┬┴╭╮╰╯";
/// Rounded borders without row separators, for nested tables.
const CONDENSED: &str = "││──├─┼┤│    ┬┴╭╮╰╯";

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// One cell of a [`TableWriter`].
pub enum Cell {
    /// An optional value that was never set.
    Unset,
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f32),
    Bool(bool),
    /// A nested table, rendered in the same mode as its parent.
    Table(Box<TableWriter>),
}

impl Cell {
    fn number(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::UInt(u) => Some(*u as f64),
            Self::Float(f) => Some(f64::from(*f)),
            Self::Text(text) => text.parse().ok(),
            _ => None,
        }
    }

    fn render(&self, mode: RenderMode) -> String {
        match self {
            Self::Unset => NOT_SET.to_string(),
            Self::Text(text) => text.clone(),
            Self::Int(i) => i.to_string(),
            Self::UInt(u) => u.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Table(table) => table.render(mode),
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u64> for Cell {
    fn from(u: u64) -> Self {
        Self::UInt(u)
    }
}

impl From<u32> for Cell {
    fn from(u: u32) -> Self {
        Self::UInt(u64::from(u))
    }
}

impl From<f32> for Cell {
    fn from(f: f32) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<TableWriter> for Cell {
    fn from(table: TableWriter) -> Self {
        Self::Table(Box::new(table))
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Into::into)
    }
}

/// Rewrites a cell for display. `None` keeps the default rendering.
pub type Transformer = Box<dyn Fn(&Cell) -> Option<String> + Send + Sync>;

/// Renders unset optionals as empty cells.
pub fn remove_nil(cell: &Cell) -> Option<String> {
    matches!(cell, Cell::Unset).then(String::new)
}

/// Cuts text longer than `width` characters. Zero keeps everything.
pub fn truncate(width: usize) -> impl Fn(&Cell) -> Option<String> + Send + Sync {
    move |cell| match cell {
        Cell::Text(text) if width > 0 && text.chars().count() > width => {
            let kept: String = text.chars().take(width.saturating_sub(3)).collect();
            Some(format!("{kept}..."))
        }
        _ => None,
    }
}

/// A titled table with auto-indexed rows, sort keys and per-column
/// transformers.
pub struct TableWriter {
    title: Option<String>,
    headers: Vec<String>,
    show_header: bool,
    rows: Vec<Vec<Cell>>,
    transformers: BTreeMap<usize, Transformer>,
    sort_by: Vec<usize>,
    suppress_empty: bool,
    auto_index: bool,
    condensed: bool,
    color: bool,
}

impl TableWriter {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            title: None,
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            show_header: true,
            rows: Vec::new(),
            transformers: BTreeMap::new(),
            sort_by: Vec::new(),
            suppress_empty: false,
            auto_index: true,
            condensed: false,
            color: false,
        }
    }

    /// A two-column key/value table for nesting inside another cell.
    pub fn key_value() -> Self {
        Self::new(&["Key", "Value"])
            .without_header()
            .without_index()
            .condensed()
            .transform("Value", remove_nil)
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn without_header(mut self) -> Self {
        self.show_header = false;
        self
    }

    pub fn without_index(mut self) -> Self {
        self.auto_index = false;
        self
    }

    pub fn condensed(mut self) -> Self {
        self.condensed = true;
        self
    }

    /// Hides columns whose cells all render empty. Human output only; CSV
    /// keeps a fixed column set.
    pub fn suppress_empty_columns(mut self) -> Self {
        self.suppress_empty = true;
        self
    }

    pub fn transform(
        mut self,
        column: &str,
        transformer: impl Fn(&Cell) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        if let Some(index) = self.column(column) {
            self.transformers.insert(index, Box::new(transformer));
        }
        self
    }

    /// Sorts rows by the named columns, in order. Cells that both hold
    /// numbers compare numerically.
    pub fn sort_by(mut self, columns: &[&str]) -> Self {
        self.sort_by = columns.iter().filter_map(|c| self.column(c)).collect();
        self
    }

    pub fn append_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn sorted_rows(&self) -> Vec<&Vec<Cell>> {
        let mut rows: Vec<&Vec<Cell>> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            self.sort_by
                .iter()
                .map(|&i| match (a.get(i), b.get(i)) {
                    (Some(x), Some(y)) => compare(x, y),
                    (x, y) => x.is_some().cmp(&y.is_some()),
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        rows
    }

    fn texts(&self, mode: RenderMode) -> Vec<Vec<String>> {
        self.sorted_rows()
            .into_iter()
            .map(|row| {
                (0..self.headers.len())
                    .map(|i| match row.get(i) {
                        Some(cell) => self
                            .transformers
                            .get(&i)
                            .and_then(|transform| transform(cell))
                            .unwrap_or_else(|| cell.render(mode)),
                        None => String::new(),
                    })
                    .collect()
            })
            .collect()
    }

    fn render_human(&self) -> String {
        let texts = self.texts(RenderMode::Table);
        let visible: Vec<usize> = (0..self.headers.len())
            .filter(|&i| {
                !self.suppress_empty || texts.is_empty() || texts.iter().any(|row| !row[i].is_empty())
            })
            .collect();

        let mut table = Table::new();
        table.load_preset(if self.condensed { CONDENSED } else { ROWS });
        if self.color {
            table
                .enforce_styling()
                .set_content_arrangement(ContentArrangement::Dynamic);
        } else {
            table
                .force_no_tty()
                .set_content_arrangement(ContentArrangement::Disabled);
        }

        if self.show_header {
            let mut header = Vec::with_capacity(visible.len() + 1);
            if self.auto_index {
                header.push(TableCell::new(""));
            }
            for &i in &visible {
                let cell = TableCell::new(self.headers[i].to_uppercase());
                header.push(if self.color { cell.fg(Color::Cyan) } else { cell });
            }
            table.set_header(header);
        }

        for (n, row) in texts.iter().enumerate() {
            let mut cells = Vec::with_capacity(visible.len() + 1);
            if self.auto_index {
                cells.push(TableCell::new(n + 1));
            }
            cells.extend(visible.iter().map(|&i| TableCell::new(&row[i])));
            table.add_row(cells);
        }

        let body = table.to_string();
        match &self.title {
            Some(title) => titled(title, &body, self.color),
            None => body,
        }
    }

    fn render_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        if self.show_header {
            let mut header: Vec<String> = Vec::with_capacity(self.headers.len() + 1);
            if self.auto_index {
                header.push(String::new());
            }
            header.extend(self.headers.iter().map(|h| csv_field(h)));
            lines.push(header.join(","));
        }
        for (n, row) in self.texts(RenderMode::Csv).into_iter().enumerate() {
            let mut fields: Vec<String> = Vec::with_capacity(row.len() + 1);
            if self.auto_index {
                fields.push((n + 1).to_string());
            }
            fields.extend(row.iter().map(|text| csv_field(text)));
            lines.push(fields.join(","));
        }
        lines.join("\n")
    }
}

impl Render for TableWriter {
    fn render(&self, mode: RenderMode) -> String {
        match mode {
            RenderMode::Table => self.render_human(),
            RenderMode::Csv => self.render_csv(),
        }
    }
}

fn compare(a: &Cell, b: &Cell) -> Ordering {
    match (a.number(), b.number()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.render(RenderMode::Csv).cmp(&b.render(RenderMode::Csv)),
    }
}

fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// Places a centered title box on top of a rendered table, sharing its
/// top border.
fn titled(title: &str, body: &str, color: bool) -> String {
    let mut lines = body.lines();
    let Some(top) = lines.next() else {
        return title.to_string();
    };
    let inner = top.chars().count().saturating_sub(2);
    let title_width = title.chars().count();
    if title_width + 2 > inner {
        return format!("{title}\n{body}");
    }

    let left = (inner - title_width) / 2;
    let right = inner - title_width - left;
    let label = if color {
        format!("{BOLD}{title}{RESET}")
    } else {
        title.to_string()
    };

    let mut top: Vec<char> = top.chars().collect();
    if let Some(first) = top.first_mut() {
        *first = '├';
    }
    if let Some(last) = top.last_mut() {
        *last = '┤';
    }

    let mut out = String::with_capacity(body.len() + 4 * inner);
    out.push('╭');
    out.push_str(&"─".repeat(inner));
    out.push_str("╮\n│");
    out.push_str(&" ".repeat(left));
    out.push_str(&label);
    out.push_str(&" ".repeat(right));
    out.push_str("│\n");
    out.extend(top);
    for line in lines {
        out.push('\n');
        out.push_str(line);
    }
    out
}
