//! Output formatting for CLI commands.
//!
//! Every record kind has a writer that declares its columns, sort order and
//! transformers on top of [`TableWriter`]. Writers render either as a
//! human table or, with the hidden `--format 1`, as CSV. Nested tables
//! follow their parent's mode.

mod index;
mod neighbor;
mod node;
pub mod size;
mod table;
mod user;
pub mod yaml;

pub use index::IndexWriter;
pub use neighbor::{DataLimits, NeighborWriter};
pub(crate) use neighbor::limited_text;
pub use node::NodeWriter;
pub use table::{Cell, TableWriter, Transformer, remove_nil, truncate};
pub use user::{RoleWriter, UserWriter};

/// How a writer lays out its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Table,
    Csv,
}

impl RenderMode {
    /// Maps the hidden `--format` value. `1` is CSV, anything else a table.
    pub fn from_format(format: u8) -> Self {
        match format {
            1 => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Something that can be rendered as a table.
pub trait Render {
    fn render(&self, mode: RenderMode) -> String;
}
