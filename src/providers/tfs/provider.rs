use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};

use super::client::TfsClient;
use super::information::assemble_tree;
use super::types::{Build, BuildRequest, BuildResult};
use crate::auth::Token;
use crate::builds::{
    BuildDetailRecord, BuildRef, BuildSource, FinishedBuildRecord, FinishedStatus,
    QueuedBuildFilter, QueuedBuildRecord,
};
use crate::error::Result;

/// Build source backed by a TFS team project collection.
pub struct TfsProvider {
    client: TfsClient,
}

impl TfsProvider {
    /// Creates a provider for the collection at `collection_url`
    /// (e.g. <http://tfs:8080/tfs/DefaultCollection>).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or the HTTP client cannot
    /// be built.
    pub fn new(collection_url: &str, token: Option<Token>, timeout: Duration) -> Result<Self> {
        let client = TfsClient::new(collection_url, token, timeout)?;
        Ok(Self { client })
    }

    fn transform_request(request: BuildRequest) -> QueuedBuildRecord {
        let requested_by = request.requested_by.display_name;
        let requested_for = request
            .requested_for
            .map_or_else(|| requested_by.clone(), |identity| identity.display_name);

        QueuedBuildRecord {
            id: request.id,
            queue_time: request.queue_time,
            requested_by,
            requested_for,
            team_project: request.definition.project.map(|project| project.name),
            definition: request.definition.name,
            controller: request
                .controller
                .map(|controller| controller.name)
                .unwrap_or_default(),
            status: request.status,
            build: request.builds.last().map(|link| BuildRef { id: link.id }),
        }
    }

    fn transform_finished(build: Build, since: DateTime<Utc>) -> Option<FinishedBuildRecord> {
        let status = match build.result? {
            BuildResult::Succeeded => FinishedStatus::Succeeded,
            BuildResult::PartiallySucceeded => FinishedStatus::PartiallySucceeded,
            BuildResult::Failed => FinishedStatus::Failed,
            BuildResult::Canceled | BuildResult::Stopped => FinishedStatus::Stopped,
            BuildResult::Other => {
                debug!("Ignoring build {} with an unknown result", build.id);
                return None;
            }
        };

        Some(FinishedBuildRecord {
            team_project: build.project.name,
            definition: build.definition.name,
            status,
            finish_time: build.finish_time.unwrap_or(since),
        })
    }
}

#[async_trait]
impl BuildSource for TfsProvider {
    async fn list_queued_builds(
        &self,
        filter: &QueuedBuildFilter,
    ) -> Result<Vec<QueuedBuildRecord>> {
        let requests = self.client.fetch_build_requests().await?;
        let total = requests.len();

        let records: Vec<_> = requests
            .into_iter()
            .map(Self::transform_request)
            .filter(|record| filter.matches(record))
            .collect();

        info!("{} of {total} build requests match the filter", records.len());
        Ok(records)
    }

    async fn refresh_build_detail(&self, build: &BuildRef) -> Result<BuildDetailRecord> {
        let detail = self.client.fetch_build(build.id).await?;
        let nodes = self.client.fetch_build_details(build.id).await?;
        debug!("Build {} has {} information nodes", build.id, nodes.len());

        Ok(BuildDetailRecord {
            team_project: detail.project.name,
            information: assemble_tree(nodes),
        })
    }

    async fn list_finished_builds(&self, since: DateTime<Utc>) -> Result<Vec<FinishedBuildRecord>> {
        let builds = self.client.fetch_finished_builds(since).await?;
        Ok(builds
            .into_iter()
            .filter_map(|build| Self::transform_finished(build, since))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builds::QueueStatus;
    use crate::error::BuildQueueError;
    use crate::snapshot::resolve_agent;
    use chrono::TimeZone;
    use mockito::Matcher;

    fn provider(server: &mockito::ServerGuard, token: Option<Token>) -> TfsProvider {
        TfsProvider::new(
            &format!("{}/tfs/DefaultCollection", server.url()),
            token,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    const REQUESTS: &str = r#"{
        "count": 3,
        "value": [
            {
                "id": 11,
                "queueTime": "2024-05-14T09:00:00Z",
                "status": "inProgress",
                "requestedBy": { "displayName": "Build Service" },
                "requestedFor": { "displayName": "Alice" },
                "definition": { "name": "CI", "project": { "name": "Web" } },
                "controller": { "name": "ctrl-01" },
                "builds": [ { "id": 501 } ]
            },
            {
                "id": 12,
                "queueTime": "2024-05-14T09:05:00Z",
                "status": "queued",
                "requestedBy": { "displayName": "Bob" },
                "definition": { "name": "Nightly", "project": { "name": "Mobile" } },
                "controller": { "name": "ctrl-02" }
            },
            {
                "id": 13,
                "queueTime": "2024-05-14T09:06:00Z",
                "status": "postponed",
                "requestedBy": { "displayName": "Carol" },
                "requestedFor": { "displayName": "Carol" },
                "definition": { "name": "Release" }
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_list_queued_builds_maps_records() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tfs/DefaultCollection/_apis/build/requests")
            .match_query(Matcher::UrlEncoded("api-version".into(), "1.0".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(REQUESTS)
            .create_async()
            .await;

        let records = provider(&server, None)
            .list_queued_builds(&QueuedBuildFilter::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 3);

        let running = &records[0];
        assert_eq!(running.status, QueueStatus::InProgress);
        assert_eq!(running.requested_by, "Build Service");
        assert_eq!(running.requested_for, "Alice");
        assert_eq!(running.controller, "ctrl-01");
        assert_eq!(running.team_project.as_deref(), Some("Web"));
        assert_eq!(running.build, Some(BuildRef { id: 501 }));
        assert_eq!(
            running.queue_time,
            Utc.with_ymd_and_hms(2024, 5, 14, 9, 0, 0).unwrap()
        );

        // Missing requestedFor means the requester queued it for themselves.
        assert_eq!(records[1].requested_for, "Bob");
        assert_eq!(records[1].build, None);
        assert_eq!(records[2].status, QueueStatus::Postponed);
        assert_eq!(records[2].controller, "");
    }

    #[tokio::test]
    async fn test_undocumented_status_keeps_snapshot() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tfs/DefaultCollection/_apis/build/requests")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"count":3,"value":[
                    {"id":21,"queueTime":"2024-05-14T09:00:00Z","status":"queued",
                     "requestedBy":{"displayName":"Ann"},"definition":{"name":"CI"}},
                    {"id":22,"queueTime":"2024-05-14T09:01:00Z","status":"none",
                     "requestedBy":{"displayName":"Ann"},"definition":{"name":"CI"}},
                    {"id":23,"queueTime":"2024-05-14T09:02:00Z","status":"notYetKnown",
                     "requestedBy":{"displayName":"Ann"},"definition":{"name":"CI"}}
                ]}"#,
            )
            .create_async()
            .await;

        let records = provider(&server, None)
            .list_queued_builds(&QueuedBuildFilter::default())
            .await
            .unwrap();

        let statuses: Vec<QueueStatus> = records.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![QueueStatus::Queued, QueueStatus::None, QueueStatus::Unknown]
        );
    }

    #[tokio::test]
    async fn test_list_queued_builds_applies_filter() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tfs/DefaultCollection/_apis/build/requests")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(REQUESTS)
            .create_async()
            .await;

        let filter = QueuedBuildFilter::new("Web", "*").unwrap();
        let records = provider(&server, None)
            .list_queued_builds(&filter)
            .await
            .unwrap();

        // "Release" has no project and only has to match the definition.
        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![11, 13]);
    }

    #[tokio::test]
    async fn test_token_sent_as_basic_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tfs/DefaultCollection/_apis/build/requests")
            .match_query(Matcher::Any)
            .match_header("authorization", Matcher::Regex("^Basic ".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"count":0,"value":[]}"#)
            .create_async()
            .await;

        let records = provider(&server, Some(Token::from("pat")))
            .list_queued_builds(&QueuedBuildFilter::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_http_error_is_unreachable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tfs/DefaultCollection/_apis/build/requests")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;

        let err = provider(&server, None)
            .list_queued_builds(&QueuedBuildFilter::default())
            .await
            .unwrap_err();

        assert!(err.is_unreachable());
        assert!(matches!(err, BuildQueueError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let provider = TfsProvider::new(
            "http://127.0.0.1:9/tfs/DefaultCollection",
            None,
            Duration::from_secs(2),
        )
        .unwrap();

        let err = provider
            .list_queued_builds(&QueuedBuildFilter::default())
            .await
            .unwrap_err();

        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn test_refresh_build_detail_assembles_information() {
        let mut server = mockito::Server::new_async().await;
        let build_mock = server
            .mock("GET", "/tfs/DefaultCollection/_apis/build/builds/501")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":501,"project":{"name":"Web"},"definition":{"name":"CI"},"result":null}"#,
            )
            .create_async()
            .await;
        let details_mock = server
            .mock("GET", "/tfs/DefaultCollection/_apis/build/builds/501/details")
            .match_query(Matcher::UrlEncoded("types".into(), "*".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"count":3,"value":[
                    {"id":1,"parentId":0,"type":"ActivityTracking","fields":{"DisplayText":"Run On Agent"}},
                    {"id":2,"parentId":1,"type":"AgentScopeActivityTracking","fields":{"ReservedAgentName":"agent-03"}},
                    {"id":3,"parentId":0,"type":"BuildMessage","fields":{"Message":"done"}}
                ]}"#,
            )
            .create_async()
            .await;

        let detail = provider(&server, None)
            .refresh_build_detail(&BuildRef { id: 501 })
            .await
            .unwrap();

        build_mock.assert_async().await;
        details_mock.assert_async().await;
        assert_eq!(detail.team_project, "Web");
        assert_eq!(resolve_agent(&detail.information), Some("agent-03"));
    }

    #[tokio::test]
    async fn test_list_finished_builds_maps_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tfs/DefaultCollection/_apis/build/builds")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("minFinishTime".into(), "2024-05-14T10:00:00Z".into()),
                Matcher::UrlEncoded("statusFilter".into(), "completed".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"count":4,"value":[
                    {"id":1,"project":{"name":"Web"},"definition":{"name":"CI"},"result":"succeeded","finishTime":"2024-05-14T10:01:00Z"},
                    {"id":2,"project":{"name":"Web"},"definition":{"name":"Nightly"},"result":"canceled","finishTime":"2024-05-14T10:02:00Z"},
                    {"id":3,"project":{"name":"Web"},"definition":{"name":"Odd"},"result":"none"},
                    {"id":4,"project":{"name":"Mobile"},"definition":{"name":"App"},"result":"partiallySucceeded"}
                ]}"#,
            )
            .create_async()
            .await;

        let since = Utc.with_ymd_and_hms(2024, 5, 14, 10, 0, 0).unwrap();
        let builds = provider(&server, None)
            .list_finished_builds(since)
            .await
            .unwrap();

        mock.assert_async().await;
        let statuses: Vec<_> = builds.iter().map(|b| b.status).collect();
        assert_eq!(
            statuses,
            vec![
                FinishedStatus::Succeeded,
                FinishedStatus::Stopped,
                FinishedStatus::PartiallySucceeded
            ]
        );
        assert_eq!(builds[2].team_project, "Mobile");
        assert_eq!(builds[2].finish_time, since);
    }
}
