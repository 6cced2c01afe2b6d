use std::io;

use console::measure_text_width;

use super::columns::{fit_columns, format_line};
use super::screen::Screen;

/// Progress marker written for each idle poll.
pub const IDLE_MARKER: &str = ".";

/// Header, `=` separator and one line per row, columns fitted to content.
pub fn render_table<R, S>(headers: &[&str], rows: &[R]) -> Vec<String>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let widths = fit_columns(headers, rows);
    let separators: Vec<String> = widths.iter().map(|w| "=".repeat(*w)).collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_line(headers, &widths));
    lines.push(format_line(&separators, &widths));
    lines.extend(rows.iter().map(|row| format_line(row.as_ref(), &widths)));
    lines
}

/// What the last frame left on screen.
///
/// After a frame the cursor sits at the start of the line below it; idle
/// markers are appended to that line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderState {
    frame_lines: usize,
    frame_width: usize,
    markers: usize,
}

impl RenderState {
    /// Lines the next redraw has to blank out.
    pub fn erase_budget(&self) -> usize {
        self.frame_lines + usize::from(self.markers > 0)
    }
}

/// Draws frames in place of the previous one.
pub struct Renderer;

impl Renderer {
    /// Blanks the previous frame, draws `lines` where it started and returns
    /// how many lines were drawn.
    pub fn draw_frame<W: Screen + ?Sized>(
        screen: &mut W,
        state: &mut RenderState,
        lines: &[String],
    ) -> io::Result<usize> {
        Self::erase_previous(screen, state)?;

        for line in lines {
            screen.write_line(line)?;
        }
        screen.flush()?;

        state.frame_lines = lines.len();
        state.frame_width = lines
            .iter()
            .map(|line| measure_text_width(line))
            .max()
            .unwrap_or(0);
        state.markers = 0;

        Ok(lines.len())
    }

    /// Appends one idle marker to the current line without erasing anything.
    pub fn draw_marker<W: Screen + ?Sized>(
        screen: &mut W,
        state: &mut RenderState,
    ) -> io::Result<()> {
        screen.write_str(IDLE_MARKER)?;
        screen.flush()?;
        state.markers += 1;
        Ok(())
    }

    /// Overwrites the previous frame with spaces and leaves the cursor at its
    /// top-left corner.
    fn erase_previous<W: Screen + ?Sized>(screen: &mut W, state: &RenderState) -> io::Result<()> {
        if state.erase_budget() == 0 {
            return Ok(());
        }

        screen.move_to_line_start()?;
        screen.move_cursor_up(state.frame_lines)?;

        let blank = " ".repeat(state.frame_width);
        for _ in 0..state.frame_lines {
            screen.write_line(&blank)?;
        }
        // The marker line is blanked without a newline so the terminal never
        // scrolls while erasing.
        if state.markers > 0 {
            screen.write_str(&" ".repeat(state.markers * IDLE_MARKER.len()))?;
            screen.move_to_line_start()?;
        }

        screen.move_cursor_up(state.frame_lines)?;
        Ok(())
    }
}
