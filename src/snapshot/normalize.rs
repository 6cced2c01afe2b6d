use std::fmt::Display;

use chrono::{DateTime, Duration, TimeZone, Utc};
use log::{debug, warn};

use super::agent::resolve_agent;
use crate::builds::{BuildDetailRecord, BuildSource, QueuedBuildRecord};
use crate::error::{BuildQueueError, Result};

/// Shown instead of the team project while a build has not started.
pub const NO_PROJECT: &str = "-------";
/// Shown instead of the agent while a build has not started.
pub const NO_AGENT: &str = "N/A";

pub const COLUMN_HEADERS: [&str; 7] = [
    "Project",
    "Build Definition",
    "Start",
    "Duration",
    "User",
    "Status",
    "Build Controller (Agent)",
];

/// One display row of the queue table.
///
/// `queued_at` is kept next to the formatted `start` label so ordering never
/// depends on how the label happens to be formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub team_project: String,
    pub build_definition: String,
    pub start: String,
    pub elapsed: String,
    pub user: String,
    pub status: String,
    pub machine: String,
    pub queued_at: DateTime<Utc>,
}

impl NormalizedRow {
    /// Cells in `COLUMN_HEADERS` order.
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.team_project,
            &self.build_definition,
            &self.start,
            &self.elapsed,
            &self.user,
            &self.status,
            &self.machine,
        ]
    }
}

/// Flattens a queued build request into a table row.
///
/// `detail` must be the freshly refreshed build behind the request; it is only
/// read for builds that are running.
///
/// # Errors
///
/// Returns `MalformedRecord` when a running request comes without build details.
pub fn normalize<Tz>(
    record: &QueuedBuildRecord,
    detail: Option<&BuildDetailRecord>,
    now: &DateTime<Tz>,
) -> Result<NormalizedRow>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let (team_project, agent) = if record.status.has_agent() {
        let detail = detail.ok_or_else(|| {
            BuildQueueError::MalformedRecord(format!(
                "request {} for '{}' is in progress but has no build",
                record.id, record.definition
            ))
        })?;
        let agent = resolve_agent(&detail.information).unwrap_or_default();
        (detail.team_project.clone(), agent.to_string())
    } else {
        (NO_PROJECT.to_string(), NO_AGENT.to_string())
    };

    Ok(NormalizedRow {
        team_project,
        build_definition: record.definition.clone(),
        start: format_start(record.queue_time, now),
        elapsed: format_elapsed(now.clone().with_timezone(&Utc) - record.queue_time),
        user: effective_user(record).to_string(),
        status: record.status.to_string(),
        machine: format!("{} ({agent})", record.controller),
        queued_at: record.queue_time,
    })
}

/// Normalizes a whole snapshot, refreshing each started build first.
///
/// A data-source failure aborts the batch so no partial table is ever shown.
/// Malformed requests are logged and left out.
pub async fn normalize_batch<S, Tz>(
    source: &S,
    records: &[QueuedBuildRecord],
    now: &DateTime<Tz>,
) -> Result<Vec<NormalizedRow>>
where
    S: BuildSource + ?Sized,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let detail = match &record.build {
            Some(build) => {
                debug!("Refreshing build {} for request {}", build.id, record.id);
                Some(source.refresh_build_detail(build).await?)
            }
            None => None,
        };

        match normalize(record, detail.as_ref(), now) {
            Ok(row) => rows.push(row),
            Err(BuildQueueError::MalformedRecord(reason)) => {
                warn!("Skipping build request: {reason}");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(rows)
}

/// The person a build is for: whoever it was queued on behalf of, if anyone.
fn effective_user(record: &QueuedBuildRecord) -> &str {
    if record.requested_by == record.requested_for {
        &record.requested_by
    } else {
        &record.requested_for
    }
}

/// Formats as `[-][D.]HH:MM:SS`, dropping sub-second precision.
pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let secs = total.unsigned_abs();

    let days = secs / 86_400;
    let hours = secs / 3_600 % 24;
    let minutes = secs / 60 % 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{sign}{days}.{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Time only for builds queued today, full date and time otherwise.
pub(crate) fn format_start<Tz>(queue_time: DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let queued = queue_time.with_timezone(&now.timezone());
    if queued.date_naive() == now.date_naive() {
        queued.format("%H:%M:%S").to_string()
    } else {
        queued.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
