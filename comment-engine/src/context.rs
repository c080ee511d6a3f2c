//! Read-only data model exposed to comment templates.
//!
//! A [`RenderContext`] is built once per invocation from the environment
//! snapshot, the pull request labels and the caller's metadata. Field names
//! are serialized exactly as templates address them (`Git.Branch`,
//! `Build.URL`, `Meta.Type`, ...).

use serde::Serialize;
use tracing::debug;

use crate::env::{Environment, SensitiveKeys};
use crate::marker::DEFAULT_TYPE;

/// VCS parameters sourced from CircleCI variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitInfo {
    #[serde(rename = "Branch")]
    pub branch: String,
    #[serde(rename = "PR")]
    pub pr: String,
    #[serde(rename = "SHA")]
    pub sha: String,
    #[serde(rename = "Tag")]
    pub tag: String,
}

impl GitInfo {
    fn from_env(env: &Environment) -> Self {
        Self {
            branch: env.get_or("CIRCLE_BRANCH", "").to_string(),
            pr: env.get_or("CIRCLE_PULL_REQUEST", "").to_string(),
            sha: env.get_or("CIRCLE_SHA1", "").to_string(),
            tag: env.get_or("CIRCLE_TAG", "").to_string(),
        }
    }
}

/// Build parameters sourced from CircleCI variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    #[serde(rename = "CI")]
    pub ci: String,
    #[serde(rename = "Index")]
    pub index: String,
    #[serde(rename = "Job")]
    pub job: String,
    #[serde(rename = "Nodes")]
    pub nodes: String,
    #[serde(rename = "Number")]
    pub number: String,
    #[serde(rename = "Owner")]
    pub owner: String,
    #[serde(rename = "Repo")]
    pub repo: String,
    #[serde(rename = "Stage")]
    pub stage: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "Workflow")]
    pub workflow: String,
}

impl BuildInfo {
    fn from_env(env: &Environment) -> Self {
        let get = |key: &str| env.get_or(key, "").to_string();
        Self {
            ci: get("CIRCLECI"),
            index: env.get_or("CIRCLE_NODE_INDEX", "0").to_string(),
            job: get("CIRCLE_JOB"),
            nodes: env.get_or("CIRCLE_NODE_TOTAL", "1").to_string(),
            number: get("CIRCLE_BUILD_NUM"),
            owner: get("CIRCLE_PROJECT_USERNAME"),
            repo: get("CIRCLE_PROJECT_REPONAME"),
            stage: get("CIRCLE_STAGE"),
            url: get("CIRCLE_BUILD_URL"),
            user: get("CIRCLE_USERNAME"),
            workflow: get("CIRCLE_WORKFLOW_ID"),
        }
    }
}

/// Caller-supplied metadata about the comment and its pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meta {
    /// Comment type tag, embedded in the metadata marker.
    #[serde(rename = "Type")]
    pub kind: String,
    /// Pull request title, empty when unknown.
    #[serde(rename = "Title")]
    pub title: String,
    /// Pull request number, 0 when unknown.
    #[serde(rename = "Number")]
    pub number: u64,
}

impl Meta {
    pub fn with_type(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            kind: DEFAULT_TYPE.to_string(),
            title: String::new(),
            number: 0,
        }
    }
}

/// Everything a template can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderContext {
    /// Full environment, already censored.
    #[serde(rename = "Env")]
    pub env: Environment,
    #[serde(rename = "Git")]
    pub git: GitInfo,
    #[serde(rename = "Build")]
    pub build: BuildInfo,
    /// Label names in the order the issue source returned them.
    #[serde(rename = "Labels")]
    pub labels: Vec<String>,
    #[serde(rename = "Meta")]
    pub meta: Meta,
}

impl RenderContext {
    /// Builds the context.
    ///
    /// `env` is censored against `sensitive` before anything is derived from
    /// it, so no facet can carry a raw secret.
    pub fn build(
        mut env: Environment,
        labels: Vec<String>,
        meta: Meta,
        sensitive: &SensitiveKeys,
    ) -> Self {
        env.censor(sensitive);
        let git = GitInfo::from_env(&env);
        let build = BuildInfo::from_env(&env);
        debug!(
            labels = labels.len(),
            kind = %meta.kind,
            branch = %git.branch,
            "render context built"
        );
        Self {
            env,
            git,
            build,
            labels,
            meta,
        }
    }

    /// True iff `name` is one of the labels, by exact comparison.
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label == name)
    }
}
