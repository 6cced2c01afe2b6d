use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glob::Pattern;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{BuildQueueError, Result};

/// Where a queued build request currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueueStatus {
    None,
    Queued,
    InProgress,
    Postponed,
    Retry,
    Completed,
    Canceled,
    /// Any status this build service version does not document.
    #[serde(other)]
    Unknown,
}

impl QueueStatus {
    /// Only a running build has an agent assigned to it.
    pub fn has_agent(self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "None",
            Self::Queued => "Queued",
            Self::InProgress => "InProgress",
            Self::Postponed => "Postponed",
            Self::Retry => "Retry",
            Self::Completed => "Completed",
            Self::Canceled => "Canceled",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Outcome of a build that has finished running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishedStatus {
    Succeeded,
    PartiallySucceeded,
    Stopped,
    Failed,
}

impl fmt::Display for FinishedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Succeeded => "Succeeded",
            Self::PartiallySucceeded => "PartiallySucceeded",
            Self::Stopped => "Stopped",
            Self::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Reference to the build started for a queued request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRef {
    pub id: u64,
}

/// A build request sitting in the server's queue, waiting or running.
#[derive(Debug, Clone)]
pub struct QueuedBuildRecord {
    pub id: u64,
    pub queue_time: DateTime<Utc>,
    pub requested_by: String,
    pub requested_for: String,
    pub definition: String,
    /// Team project owning the definition, when the server reports it.
    pub team_project: Option<String>,
    pub controller: String,
    pub status: QueueStatus,
    /// Set once the server has started a build for this request.
    pub build: Option<BuildRef>,
}

/// One node of a build's information tree.
///
/// Field order is preserved as delivered by the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InformationNode {
    pub fields: IndexMap<String, String>,
    pub children: Vec<InformationNode>,
}

// Dropped with an explicit stack: trees assembled from server data can be
// arbitrarily deep.
impl Drop for InformationNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

#[cfg(test)]
impl InformationNode {
    pub fn with_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<InformationNode>) -> Self {
        self.children = children;
        self
    }
}

/// Freshly fetched details of a running build.
#[derive(Debug, Clone)]
pub struct BuildDetailRecord {
    pub team_project: String,
    pub information: InformationNode,
}

/// A build that reached a terminal state recently.
#[derive(Debug, Clone)]
pub struct FinishedBuildRecord {
    pub team_project: String,
    pub definition: String,
    pub status: FinishedStatus,
    pub finish_time: DateTime<Utc>,
}

/// Wildcard filter on team project and build definition (`*` and `?`).
#[derive(Debug, Clone)]
pub struct QueuedBuildFilter {
    project: Pattern,
    definition: Pattern,
}

impl QueuedBuildFilter {
    pub fn new(project: &str, definition: &str) -> Result<Self> {
        let compile = |pattern: &str| {
            Pattern::new(pattern).map_err(|e| {
                BuildQueueError::Config(format!("Invalid wildcard '{pattern}': {e}"))
            })
        };

        Ok(Self {
            project: compile(project)?,
            definition: compile(definition)?,
        })
    }

    /// Records without a known team project only need to match the
    /// definition pattern.
    pub fn matches(&self, record: &QueuedBuildRecord) -> bool {
        let project_ok = record
            .team_project
            .as_deref()
            .map_or(true, |project| self.project.matches(project));
        project_ok && self.definition.matches(&record.definition)
    }
}

impl Default for QueuedBuildFilter {
    fn default() -> Self {
        Self {
            project: Pattern::new("*").unwrap_or_default(),
            definition: Pattern::new("*").unwrap_or_default(),
        }
    }
}

/// Read access to a build server.
#[async_trait]
pub trait BuildSource {
    /// Build requests currently queued or running that match `filter`.
    async fn list_queued_builds(
        &self,
        filter: &QueuedBuildFilter,
    ) -> Result<Vec<QueuedBuildRecord>>;

    /// Re-reads the build behind a queued request, bypassing anything stale.
    async fn refresh_build_detail(&self, build: &BuildRef) -> Result<BuildDetailRecord>;

    /// Builds that finished at or after `since`.
    async fn list_finished_builds(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<FinishedBuildRecord>>;
}
