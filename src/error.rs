use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildQueueError {
    #[error("No build server URL given (pass one, set BUILD_QUEUE_URL or server.url)")]
    ConfigurationMissing,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Build server unreachable: {0}")]
    DataSourceUnreachable(String),

    #[error("Build server API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed build record: {0}")]
    MalformedRecord(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildQueueError {
    /// Whether the error came from talking to the build server rather than
    /// from the local pipeline.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::DataSourceUnreachable(_) | Self::Api { .. } | Self::Network(_) | Self::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BuildQueueError>;
