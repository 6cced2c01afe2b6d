mod columns;
mod digest;
mod progress;
mod renderer;
mod screen;
mod styling;

pub use digest::render_finished;
pub use progress::FetchProgress;
pub use renderer::{render_table, RenderState, Renderer};
pub use screen::{Screen, TermScreen};
pub use styling::{dim, magenta_bold};

#[cfg(test)]
pub(crate) use screen::{RecordingScreen, ScreenOp};

/// Prints the server being watched.
///
/// Goes out before the first frame and is never redrawn.
pub fn print_banner(url: &str) {
    println!("{} {}", magenta_bold("Build Queue:"), dim(url));
}
