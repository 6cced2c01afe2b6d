use anyhow::Result;
use clap::{CommandFactory, Parser};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::Token;
use crate::builds::QueuedBuildFilter;
use crate::config::Config;
use crate::error::BuildQueueError;
use crate::output::{print_banner, TermScreen};
use crate::poll::{PollLoop, PollSettings};
use crate::providers::TfsProvider;

#[derive(Parser)]
#[command(name = "build-queue")]
#[command(author, version, about = "TFS build queue watcher", long_about = None)]
pub struct Cli {
    /// Team project collection URL (e.g. http://tfs:8080/tfs/DefaultCollection)
    #[arg(env = "BUILD_QUEUE_URL")]
    url: Option<String>,

    /// Keep polling and redraw the queue in place
    #[arg(long = "loop", default_value_t = false)]
    looping: bool,

    #[arg(short, long, env = "BUILD_QUEUE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Team project wildcard
    #[arg(short = 'P', long)]
    project: Option<String>,

    /// Build definition wildcard
    #[arg(short, long)]
    definition: Option<String>,

    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    pub fn usage() -> String {
        Self::command().render_usage().to_string()
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let url = resolve_server_url(self.url.as_deref(), &config)?;

        let token = self
            .token
            .clone()
            .or_else(|| config.server.token.clone())
            .map(Token::from);

        let filter = QueuedBuildFilter::new(
            self.project.as_deref().unwrap_or(&config.filter.project),
            self.definition.as_deref().unwrap_or(&config.filter.definition),
        )?;

        let settings = PollSettings {
            looping: self.looping,
            interval: Duration::from_secs(config.poll.interval_secs),
            idle_interval: Duration::from_secs(config.poll.idle_interval_secs),
            finished_window: chrono::Duration::minutes(config.poll.finished_window_mins),
            show_progress: console::user_attended_stderr(),
        };

        info!("Watching build queue at {url} (loop: {})", self.looping);
        print_banner(&url);

        let provider = TfsProvider::new(
            &url,
            token,
            Duration::from_secs(config.server.timeout_secs),
        )?;
        let mut poll = PollLoop::new(provider, TermScreen::stdout(), filter, settings);
        poll.run().await?;

        info!("Polling stopped ({:?})", poll.state());
        Ok(())
    }
}

/// Server URL from the command line (or its env var), else the config file.
fn resolve_server_url(arg: Option<&str>, config: &Config) -> Result<String, BuildQueueError> {
    arg.or(config.server.url.as_deref())
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(ToString::to_string)
        .ok_or(BuildQueueError::ConfigurationMissing)
}
