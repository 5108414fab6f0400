//! Policy engine: decides whether an intent becomes a job, and whether
//! that job deploys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProjectConfig;
use crate::intent::{JobIntent, RefSpec, Trigger};

/// The only branch that deploys while mirroring is in effect.
pub const DEPLOY_BRANCH: &str = "master";

/// Per-branch build policy, looked up on the project by branch name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BranchConfig {
    pub active: bool,
    pub mirror_master: bool,
    pub deploy_on_green: bool,
}

impl BranchConfig {
    /// Policy synthesized for branches with no explicit configuration:
    /// tested, mirroring master, never deploying.
    pub const fn default_policy() -> Self {
        Self { active: true, mirror_master: true, deploy_on_green: false }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    TestOnly,
    TestAndDeploy,
}

/// A finalized job, ready for the scheduler. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub trigger: Trigger,
    pub project: String,
    #[serde(rename = "ref")]
    pub ref_spec: RefSpec,
    pub user_id: String,
    pub created: DateTime<Utc>,
}

/// Evaluates an intent against the project's branch policy.
///
/// Returns `None` when the branch is inactive (an expected filtering
/// outcome, not an error). Deploy resolution: a non-master branch with
/// `mirror_master` set never deploys; otherwise the intent's request is
/// honored only when the branch allows deploy-on-green.
pub fn make_job(project: &ProjectConfig, intent: JobIntent) -> Option<Job> {
    let branch_name = intent.branch.as_deref();
    let branch = branch_name
        .and_then(|name| project.branch(name).copied())
        .unwrap_or_else(BranchConfig::default_policy);

    if !branch.active {
        return None;
    }

    let deploy = if branch_name != Some(DEPLOY_BRANCH) && branch.mirror_master {
        // mirror_master branches don't deploy
        false
    } else {
        intent.deploy && branch.deploy_on_green
    };

    Some(Job {
        id: Uuid::now_v7(),
        kind: if deploy { JobKind::TestAndDeploy } else { JobKind::TestOnly },
        trigger: intent.trigger,
        project: project.name.clone(),
        ref_spec: intent.ref_spec,
        user_id: project.user_id.clone(),
        created: Utc::now(),
    })
}
