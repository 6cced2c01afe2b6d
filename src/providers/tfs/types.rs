use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::builds::QueueStatus;

/// Envelope the REST API wraps every collection in.
#[derive(Debug, Deserialize)]
pub(super) struct ListResponse<T> {
    pub value: Vec<T>,
}

/// A queued build request (XAML build service).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BuildRequest {
    pub id: u64,
    pub queue_time: DateTime<Utc>,
    pub status: QueueStatus,
    pub requested_by: IdentityRef,
    pub requested_for: Option<IdentityRef>,
    pub definition: DefinitionRef,
    pub controller: Option<ControllerRef>,
    /// Builds started for this request, most recent last.
    #[serde(default)]
    pub builds: Vec<BuildLink>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct IdentityRef {
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct DefinitionRef {
    pub name: String,
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProjectRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ControllerRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct BuildLink {
    pub id: u64,
}

/// A build, as returned by `builds/{id}` and the finished-builds query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Build {
    pub id: u64,
    pub project: ProjectRef,
    pub definition: DefinitionRef,
    pub result: Option<BuildResult>,
    pub finish_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) enum BuildResult {
    Succeeded,
    PartiallySucceeded,
    Failed,
    Canceled,
    Stopped,
    #[serde(other)]
    Other,
}

/// One entry of `builds/{id}/details`: information nodes come back flat,
/// linked through `parentId`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DetailNode {
    pub id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub fields: IndexMap<String, serde_json::Value>,
}
