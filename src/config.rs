//! Application configuration.
//!
//! Settings are kept in a single JSON file: the sync tuning, the remote
//! repositories searches can refer to, and the saved searches themselves.

use crate::error::AppError;
use crate::models::SearchSpec;
use crate::services::gitlab_client::{GitLabClient, GitLabClientConfig};
use crate::services::remote_source::SourceRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Number of issues requested in the single page an import fetches.
pub const FETCH_ISSUES_BUFFER_SIZE: usize = 1024;

/// Default interval between scheduled cycles (5 minutes).
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;

/// Default remote request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetch cycle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum number of issues fetched per import.
    pub buffer_size: usize,

    /// Seconds between scheduled cycles of all searches.
    pub interval_secs: u64,

    /// Whether the import and refresh loops stop between items once cancelled.
    ///
    /// Off by default: a cycle that started runs to completion and only the
    /// remote fetch itself may observe cancellation.
    pub cancel_between_items: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            buffer_size: FETCH_ISSUES_BUFFER_SIZE,
            interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            cancel_between_items: false,
        }
    }
}

/// A GitLab project searches can run against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Presentable repository name; searches refer to the remote by it.
    pub name: String,

    /// Base URL of the GitLab instance (e.g., `https://gitlab.com`).
    pub base_url: String,

    /// Project path with namespace (e.g., `group/project`) or numeric id.
    pub project: String,

    /// Personal access token.
    #[serde(default)]
    pub token: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl From<&RemoteConfig> for GitLabClientConfig {
    fn from(remote: &RemoteConfig) -> Self {
        Self {
            name: remote.name.clone(),
            base_url: remote.base_url.clone(),
            project: remote.project.clone(),
            token: remote.token.clone(),
            timeout_secs: remote.timeout_secs,
        }
    }
}

/// A saved search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Unique search name.
    pub name: String,

    /// Presentable name of the repository to search.
    pub repository: String,

    /// Tracker query string.
    #[serde(default)]
    pub query: String,
}

/// Application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub sync: SyncConfig,
    pub remotes: Vec<RemoteConfig>,
    pub searches: Vec<SearchConfig>,
}

impl AppSettings {
    /// Load settings from `path`, using defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::debug!("Settings file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&raw).map_err(|e| {
            AppError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check the settings for values no cycle could run with.
    ///
    /// A search naming an unknown remote is allowed; its cycles are skipped.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.sync.buffer_size == 0 {
            return Err(AppError::invalid_input_field(
                "Buffer size must be positive",
                "sync.buffer_size",
            ));
        }
        if self.sync.interval_secs == 0 {
            return Err(AppError::invalid_input_field(
                "Sync interval must be positive",
                "sync.interval_secs",
            ));
        }

        let mut names = HashSet::new();
        for search in &self.searches {
            if search.name.trim().is_empty() {
                return Err(AppError::invalid_input_field(
                    "Search name must not be empty",
                    "searches.name",
                ));
            }
            if !names.insert(search.name.as_str()) {
                return Err(AppError::invalid_input_field(
                    format!("Duplicate search name '{}'", search.name),
                    "searches.name",
                ));
            }
        }

        for remote in &self.remotes {
            if remote.base_url.trim().is_empty() {
                return Err(AppError::invalid_input_field(
                    format!("Remote '{}' has no base URL", remote.name),
                    "remotes.base_url",
                ));
            }
        }

        Ok(())
    }

    /// Create the searches described by these settings, each starting empty.
    pub fn build_searches(&self) -> Vec<SearchSpec> {
        self.searches
            .iter()
            .map(|s| SearchSpec::new(&s.name, &s.repository, &s.query))
            .collect()
    }

    /// Create a GitLab client per remote and register them for resolution.
    pub fn build_registry(&self) -> Result<SourceRegistry, AppError> {
        let mut registry = SourceRegistry::new();
        for remote in &self.remotes {
            let client = GitLabClient::new(remote.into())?;
            registry.register(Arc::new(client));
        }
        Ok(registry)
    }
}
