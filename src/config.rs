use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file structure for build-queue.
///
/// Holds the server to watch and how to poll it, so the URL does not have to
/// be typed on every run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Team project collection URL (e.g. `http://tfs:8080/tfs/DefaultCollection`)
    pub url: Option<String>,

    /// Personal access token
    pub token: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollConfig {
    /// Pause between polls while there is something to show
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Pause between polls while the queue stays empty
    #[serde(default = "default_idle_interval_secs")]
    pub idle_interval_secs: u64,

    /// How far back to look for finished builds
    #[serde(default = "default_finished_window_mins")]
    pub finished_window_mins: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Team project wildcard
    #[serde(default = "default_wildcard")]
    pub project: String,

    /// Build definition wildcard
    #[serde(default = "default_wildcard")]
    pub definition: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            idle_interval_secs: default_idle_interval_secs(),
            finished_window_mins: default_finished_window_mins(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            project: default_wildcard(),
            definition: default_wildcard(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    5
}

fn default_idle_interval_secs() -> u64 {
    30
}

fn default_finished_window_mins() -> i64 {
    5
}

fn default_wildcard() -> String {
    "*".to_string()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./build-queue.toml
    /// 3. ./build-queue.json
    /// 4. ./build-queue.yaml
    /// 5. ./build-queue.yml
    /// 6. `<user config dir>/build-queue/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        // No config file found, return defaults
        Ok(Self::default())
    }

    fn candidates() -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = [
            "build-queue.toml",
            "build-queue.json",
            "build-queue.yaml",
            "build-queue.yml",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();

        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("build-queue").join("config.toml"));
        }
        candidates
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }
}
