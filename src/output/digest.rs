use crate::builds::{FinishedBuildRecord, FinishedStatus};

use super::styling::{bright_green, bright_red, bright_yellow};

pub const FINISHED_HEADER: &str = "Build just finished:";

/// Short colored digest of recently finished builds, empty when none.
///
/// Each line carries its own reset sequence, so the terminal color is back to
/// normal after every build.
pub fn render_finished(builds: &[FinishedBuildRecord]) -> Vec<String> {
    if builds.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::with_capacity(builds.len() + 1);
    lines.push(FINISHED_HEADER.to_string());
    lines.extend(builds.iter().map(|build| {
        let text = format!(
            "{} {} => {}",
            build.team_project, build.definition, build.status
        );
        match build.status {
            FinishedStatus::Failed => bright_red(text).to_string(),
            FinishedStatus::Stopped | FinishedStatus::PartiallySucceeded => {
                bright_yellow(text).to_string()
            }
            FinishedStatus::Succeeded => bright_green(text).to_string(),
        }
    }));
    lines
}
