use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use log::{debug, info, warn};

use crate::builds::{BuildSource, QueuedBuildFilter};
use crate::error::Result;
use crate::output::{render_finished, render_table, FetchProgress, RenderState, Renderer, Screen};
use crate::snapshot::{normalize_batch, sort_rows, NormalizedRow, COLUMN_HEADERS};

/// Replaces the queue table (and digest) when the server cannot be queried.
pub const UNREACHABLE_MESSAGE: &str = "Server not reachable :(";

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Keep polling instead of drawing a single snapshot.
    pub looping: bool,
    /// Pause after a cycle that had something to show.
    pub interval: Duration,
    /// Pause while the queue stays empty.
    pub idle_interval: Duration,
    /// How far back the finished-build digest looks.
    pub finished_window: chrono::Duration,
    /// Show a spinner while a one-shot snapshot is fetched.
    pub show_progress: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            looping: false,
            interval: Duration::from_secs(5),
            idle_interval: Duration::from_secs(30),
            finished_window: chrono::Duration::minutes(5),
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    /// Queue empty twice in a row: marker only, long pause.
    QuietWait,
    /// Frame redrawn: short pause.
    ActiveWait,
    /// One-shot snapshot drawn.
    Done,
}

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub state: PollState,
    /// `None` when the server could not be queried.
    pub build_count: Option<usize>,
    pub lines_drawn: usize,
    /// Pause before the next cycle, `None` once polling is over.
    pub wait: Option<Duration>,
}

/// Repeatedly snapshots the build queue and redraws it in place.
pub struct PollLoop<S, W> {
    source: S,
    screen: W,
    filter: QueuedBuildFilter,
    settings: PollSettings,
    render: RenderState,
    previous_count: Option<usize>,
    state: PollState,
}

impl<S, W> PollLoop<S, W>
where
    S: BuildSource,
    W: Screen,
{
    pub fn new(source: S, screen: W, filter: QueuedBuildFilter, settings: PollSettings) -> Self {
        Self {
            source,
            screen,
            filter,
            settings,
            render: RenderState::default(),
            previous_count: None,
            state: PollState::Idle,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Runs cycles until a one-shot snapshot is drawn, or forever when looping.
    ///
    /// # Errors
    ///
    /// Only fails when the terminal cannot be written to. Build server faults
    /// are reported on screen and polling carries on.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let report = self.run_cycle().await?;
            match report.wait {
                Some(wait) => {
                    debug!("Next poll in {}s", wait.as_secs());
                    tokio::time::sleep(wait).await;
                }
                None => return Ok(()),
            }
        }
    }

    /// Fetches, normalizes, sorts and draws one snapshot.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.state = PollState::Polling;
        let now = Local::now();

        let rows = match self.fetch_snapshot(&now).await {
            Ok(rows) => rows,
            Err(e) if e.is_unreachable() => {
                warn!("Polling the build queue failed: {e}");
                return self.report_unreachable();
            }
            Err(e) => return Err(e),
        };

        let count = rows.len();
        let quiet = self.settings.looping && count == 0 && self.previous_count == Some(0);
        self.previous_count = Some(count);

        if quiet {
            Renderer::draw_marker(&mut self.screen, &mut self.render)?;
            return Ok(self.finish_cycle(PollState::QuietWait, Some(count), 0));
        }

        let mut frame = Vec::new();
        if count > 0 {
            let cells: Vec<[&str; 7]> = rows.iter().map(NormalizedRow::cells).collect();
            frame.push(String::new());
            frame.extend(render_table(&COLUMN_HEADERS, &cells));
        }
        frame.push(String::new());
        frame.push(format!("Total Builds Queued: {count}"));

        if self.settings.looping {
            frame.extend(self.finished_digest(&now).await?);
        }

        let drawn = Renderer::draw_frame(&mut self.screen, &mut self.render, &frame)?;
        let state = if self.settings.looping {
            PollState::ActiveWait
        } else {
            PollState::Done
        };
        Ok(self.finish_cycle(state, Some(count), drawn))
    }

    async fn fetch_snapshot(&self, now: &DateTime<Local>) -> Result<Vec<NormalizedRow>> {
        let progress = (self.settings.show_progress && !self.settings.looping)
            .then(|| FetchProgress::start("Fetching build queue"));

        let fetched = async {
            let records = self.source.list_queued_builds(&self.filter).await?;
            info!("Fetched {} queued builds", records.len());
            normalize_batch(&self.source, &records, now).await
        }
        .await;

        if let Some(progress) = progress {
            progress.finish();
        }
        Ok(sort_rows(fetched?))
    }

    async fn finished_digest(&self, now: &DateTime<Local>) -> Result<Vec<String>> {
        let since = now.with_timezone(&Utc) - self.settings.finished_window;
        match self.source.list_finished_builds(since).await {
            Ok(builds) => {
                for build in &builds {
                    debug!(
                        "{} {} finished at {} ({})",
                        build.team_project, build.definition, build.finish_time, build.status
                    );
                }
                Ok(render_finished(&builds))
            }
            Err(e) if e.is_unreachable() => {
                warn!("Fetching finished builds failed: {e}");
                Ok(vec![UNREACHABLE_MESSAGE.to_string()])
            }
            Err(e) => Err(e),
        }
    }

    fn report_unreachable(&mut self) -> Result<CycleReport> {
        self.previous_count = None;
        let frame = [UNREACHABLE_MESSAGE.to_string()];
        let drawn = Renderer::draw_frame(&mut self.screen, &mut self.render, &frame)?;
        let state = if self.settings.looping {
            PollState::ActiveWait
        } else {
            PollState::Done
        };
        Ok(self.finish_cycle(state, None, drawn))
    }

    fn finish_cycle(
        &mut self,
        state: PollState,
        build_count: Option<usize>,
        lines_drawn: usize,
    ) -> CycleReport {
        self.state = state;
        let wait = match state {
            PollState::QuietWait => Some(self.settings.idle_interval),
            PollState::ActiveWait => Some(self.settings.interval),
            PollState::Idle | PollState::Polling | PollState::Done => None,
        };
        CycleReport {
            state,
            build_count,
            lines_drawn,
            wait,
        }
    }
}

#[cfg(test)]
impl<S, W> PollLoop<S, W> {
    fn screen_mut(&mut self) -> &mut W {
        &mut self.screen
    }

    fn source(&self) -> &S {
        &self.source
    }
}
