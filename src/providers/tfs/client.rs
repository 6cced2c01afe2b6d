use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::types::{Build, BuildRequest, DetailNode, ListResponse};
use crate::auth::Token;
use crate::error::{BuildQueueError, Result};

const API_VERSION: &str = "1.0";

/// Thin client for the XAML build REST endpoints of a team project collection.
pub struct TfsClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
}

impl TfsClient {
    pub fn new(collection_url: &str, token: Option<Token>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("build-queue/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| BuildQueueError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut base = Url::parse(collection_url)
            .map_err(|e| BuildQueueError::Config(format!("Invalid server URL: {e}")))?;
        // Without the trailing slash `join` would replace the collection name.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let api_url = base
            .join("_apis/build/")
            .map_err(|e| BuildQueueError::Config(format!("Invalid build API URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    /// Helper to build authenticated requests
    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.basic_auth("", Some(token.as_str()))
        } else {
            request
        }
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .api_url
            .join(path)
            .map_err(|e| BuildQueueError::Config(format!("Invalid endpoint '{path}': {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-version", API_VERSION);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {url}");
        let response = self
            .auth_request(self.client.get(url))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    BuildQueueError::DataSourceUnreachable(e.to_string())
                } else {
                    e.into()
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(BuildQueueError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    pub async fn fetch_build_requests(&self) -> Result<Vec<BuildRequest>> {
        let url = self.endpoint("requests", &[])?;
        let response: ListResponse<BuildRequest> = self.get_json(url).await?;
        Ok(response.value)
    }

    pub async fn fetch_build(&self, build_id: u64) -> Result<Build> {
        let url = self.endpoint(&format!("builds/{build_id}"), &[])?;
        self.get_json(url).await
    }

    pub async fn fetch_build_details(&self, build_id: u64) -> Result<Vec<DetailNode>> {
        let url = self.endpoint(&format!("builds/{build_id}/details"), &[("types", "*")])?;
        let response: ListResponse<DetailNode> = self.get_json(url).await?;
        Ok(response.value)
    }

    pub async fn fetch_finished_builds(&self, since: DateTime<Utc>) -> Result<Vec<Build>> {
        let since = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        let url = self.endpoint(
            "builds",
            &[
                ("minFinishTime", since.as_str()),
                ("statusFilter", "completed"),
            ],
        )?;
        let response: ListResponse<Build> = self.get_json(url).await?;
        Ok(response.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> TfsClient {
        TfsClient::new(url, None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_collection_path() {
        let url = client("http://tfs:8080/tfs/DefaultCollection")
            .endpoint("requests", &[])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://tfs:8080/tfs/DefaultCollection/_apis/build/requests?api-version=1.0"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash_and_query() {
        let url = client("http://tfs/tfs/Coll/")
            .endpoint("builds", &[("statusFilter", "completed")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://tfs/tfs/Coll/_apis/build/builds?api-version=1.0&statusFilter=completed"
        );
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let result = TfsClient::new("not a url", None, Duration::from_secs(5));
        assert!(matches!(result, Err(BuildQueueError::Config(_))));
    }
}
