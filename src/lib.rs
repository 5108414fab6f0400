pub mod api;
pub mod avatar;
pub mod dispatch;
pub mod emitter;
pub mod error;
pub mod github;
pub mod intent;
pub mod payload;
pub mod policy;
pub mod signature;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::emitter::JobBus;
use crate::error::{RelayError, Result};
use crate::github::HostClient;
use crate::policy::BranchConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    pub provider: ProviderConfig,
    pub account: AccountConfig,
    #[serde(default)]
    pub project: Vec<ProjectConfig>,
}

impl RelayConfig {
    pub fn find_project(&self, name: &str) -> Option<&ProjectConfig> {
        self.project.iter().find(|proj| proj.name == name)
    }
}

/// Provider-level webhook settings: the shared signing secret and the
/// pull-request trust policy.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub secret: String,
    #[serde(default)]
    pub pull_requests: PullRequestPolicy,
    #[serde(default)]
    pub whitelist: Vec<WhitelistEntry>,
    /// Post a confirmation comment on PRs from non-whitelisted authors.
    #[serde(default)]
    pub ask_to_pr: bool,
}

impl ProviderConfig {
    /// Linear scan; the whitelist is small.
    pub fn whitelisted(&self, login: &str) -> bool {
        self.whitelist.iter().any(|entry| entry.name == login)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestPolicy {
    /// Never test pull requests.
    None,
    /// Test only PRs whose author is whitelisted (or comment-approved).
    Whitelist,
    /// Test every pull request.
    #[default]
    All,
}

/// A hosting-service user allowed to trigger pull-request builds.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct WhitelistEntry {
    pub name: String,
}

/// Per-account credentials for outbound hosting-service calls.
#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
    pub access_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectConfig {
    pub name: String,
    /// Owner of jobs created for this project.
    pub user_id: String,
    #[serde(default)]
    pub branches: HashMap<String, BranchConfig>,
}

impl ProjectConfig {
    pub fn branch(&self, name: &str) -> Option<&BranchConfig> {
        self.branches.get(name)
    }
}

pub struct AppState {
    pub config: RwLock<RelayConfig>,
    pub github: HostClient,
    pub jobs: JobBus,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self> {
        Ok(Self {
            config: RwLock::new(config),
            github: HostClient::new()?,
            jobs: JobBus::default(),
            start_time: Instant::now(),
            started_at: Utc::now(),
        })
    }

    /// Registers a previously unseen branch on a project with the default
    /// branch policy. The sole place the core mutates project state.
    pub fn add_branch(&self, project_name: &str, branch: &str) -> Result<()> {
        let mut config = self.config.write().unwrap();
        let project = config
            .project
            .iter_mut()
            .find(|proj| proj.name == project_name)
            .ok_or_else(|| RelayError::UnknownProject(project_name.to_string()))?;
        project
            .branches
            .entry(branch.to_string())
            .or_insert_with(BranchConfig::default_policy);
        Ok(())
    }
}
