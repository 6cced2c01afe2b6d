use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::bright_yellow;

/// Spinner shown on stderr while a one-shot snapshot is being fetched.
pub struct FetchProgress {
    pb: ProgressBar,
}

impl FetchProgress {
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {msg} {spinner}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(bright_yellow(message).to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    /// Removes the spinner so it leaves nothing behind above the table.
    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}
