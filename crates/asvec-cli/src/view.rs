//! User-facing output.
//!
//! Command results go to the out stream, diagnostics to the err stream. The
//! out stream counts the lines written through it so the watch loop knows how
//! much of the screen to repaint.

use std::fmt::Display;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// A writer that counts the newlines passing through it.
pub struct LineCounter<W> {
    inner: W,
    lines: usize,
}

impl<W: Write> LineCounter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, lines: 0 }
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn reset(&mut self) {
        self.lines = 0;
    }
}

impl<W: Write> Write for LineCounter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.lines += buf[..written].iter().filter(|&&b| b == b'\n').count();
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// An in-memory sink whose clones share one buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

type Sink = Box<dyn Write + Send>;

/// The pair of output streams a command writes to.
pub struct View {
    out: LineCounter<Sink>,
    err: Sink,
    color: bool,
}

impl View {
    pub fn new(out: Sink, err: Sink, color: bool) -> Self {
        Self {
            out: LineCounter::new(out),
            err,
            color,
        }
    }

    /// Process stdout and stderr. Color is enabled when stdout is a terminal.
    pub fn stdio() -> Self {
        use std::io::IsTerminal;
        let color = io::stdout().is_terminal();
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()), color)
    }

    /// A view writing into two in-memory buffers, without color.
    pub fn captured(out: &SharedBuffer, err: &SharedBuffer) -> Self {
        Self::new(Box::new(out.clone()), Box::new(err.clone()), false)
    }

    pub fn color(&self) -> bool {
        self.color
    }

    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Writes one line to the out stream.
    pub fn print(&mut self, msg: impl Display) {
        let _ = writeln!(self.out, "{msg}");
    }

    /// Writes without a trailing newline and flushes, for prompts.
    pub fn print_inline(&mut self, msg: impl Display) {
        let _ = write!(self.out, "{msg}");
        let _ = self.out.flush();
    }

    pub fn newline(&mut self) {
        let _ = writeln!(self.out);
    }

    /// Writes control sequences or pre-rendered text verbatim.
    pub fn write_raw(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    /// Writes pre-rendered text to the err stream verbatim.
    pub fn write_err_raw(&mut self, text: &str) {
        let _ = self.err.write_all(text.as_bytes());
        let _ = self.err.flush();
    }

    pub fn warning(&mut self, msg: impl Display) {
        self.tagged(YELLOW, "Warning", msg);
    }

    pub fn error(&mut self, msg: impl Display) {
        self.tagged(RED, "Error", msg);
    }

    fn tagged(&mut self, color: &str, tag: &str, msg: impl Display) {
        let _ = if self.color {
            writeln!(self.err, "{color}{tag}:{RESET} {msg}")
        } else {
            writeln!(self.err, "{tag}: {msg}")
        };
    }

    /// Lines written to the out stream since the last reset.
    pub fn line_count(&self) -> usize {
        self.out.lines()
    }

    pub fn reset_line_count(&mut self) {
        self.out.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_counting() {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let mut view = View::captured(&out, &err);

        view.print("one");
        view.print("two\nthree");
        view.print_inline("prompt: ");
        view.warning("not counted");
        assert_eq!(view.line_count(), 3);

        view.reset_line_count();
        view.newline();
        assert_eq!(view.line_count(), 1);
        assert_eq!(out.contents(), "one\ntwo\nthree\nprompt: \n");
    }

    #[test]
    fn test_tags_without_color() {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let mut view = View::captured(&out, &err);

        view.warning("careful");
        view.error("broken");

        assert_eq!(err.contents(), "Warning: careful\nError: broken\n");
        assert!(out.contents().is_empty());
    }

    #[test]
    fn test_tags_with_color() {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let mut view = View::captured(&out, &err);
        view.set_color(true);

        view.error("broken");

        assert_eq!(err.contents(), "\x1b[31mError:\x1b[0m broken\n");
    }
}
