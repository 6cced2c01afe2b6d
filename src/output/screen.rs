use std::io;

use console::Term;

/// The few terminal operations the renderer needs.
///
/// Kept narrow so the redraw bookkeeping can be exercised against a
/// recording implementation instead of a real terminal.
pub trait Screen {
    /// Writes `line` followed by a newline.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Writes `text` without moving to a new line.
    fn write_str(&mut self, text: &str) -> io::Result<()>;

    /// Moves the cursor up `lines` rows, keeping its column.
    fn move_cursor_up(&mut self, lines: usize) -> io::Result<()>;

    /// Returns the cursor to column zero of the current row.
    fn move_to_line_start(&mut self) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

/// Standard output through `console`.
pub struct TermScreen {
    term: Term,
}

impl TermScreen {
    pub fn stdout() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

impl Screen for TermScreen {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.term.write_line(line)
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.term.write_str(text)
    }

    fn move_cursor_up(&mut self, lines: usize) -> io::Result<()> {
        // A zero count still moves one row on most terminals.
        if lines == 0 {
            return Ok(());
        }
        self.term.move_cursor_up(lines)
    }

    fn move_to_line_start(&mut self) -> io::Result<()> {
        self.term.write_str("\r")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.term.flush()
    }
}

#[cfg(test)]
pub(crate) use recording::{RecordingScreen, ScreenOp};
