//! Command line interface.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use comment_engine::{DEFAULT_TYPE, SensitiveKeys};
use hub_client::DEFAULT_API_URL;

#[derive(Debug, Parser)]
#[command(
    name = "hub-comment",
    version,
    about = "Post a templated comment on the current pull request, updating the previous one of the same type"
)]
#[command(group(
    ArgGroup::new("body")
        .required(true)
        .args(["template", "template_file"])
))]
pub struct Cli {
    /// Comment body to post.
    #[arg(long, value_name = "BODY")]
    pub template: Option<String>,

    /// File containing comment body to post.
    #[arg(long, value_name = "PATH")]
    pub template_file: Option<PathBuf>,

    /// Comment type. Only a previous comment of the same type is updated.
    #[arg(long = "type", value_name = "TAG", env = "HUB_COMMENT_TYPE", default_value = DEFAULT_TYPE)]
    pub kind: String,

    /// Render and decide, but do not post anything.
    #[arg(long, env = "HUB_COMMENT_DRY_RUN")]
    pub dry_run: bool,

    /// Extra environment variable to censor (repeatable).
    #[arg(long = "censor", value_name = "KEY")]
    pub censor: Vec<String>,

    /// GitHub API base URL.
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

impl Cli {
    /// Template body from `--template` verbatim, or read from `--template-file`.
    pub fn template_body(&self) -> Result<Vec<u8>> {
        match (&self.template, &self.template_file) {
            (Some(body), _) => Ok(body.clone().into_bytes()),
            (None, Some(path)) => {
                fs::read(path).with_context(|| format!("read template file {}", path.display()))
            }
            (None, None) => anyhow::bail!("a template or a template file must be given"),
        }
    }

    /// Built-in sensitive keys plus any `--censor` additions.
    pub fn sensitive_keys(&self) -> SensitiveKeys {
        SensitiveKeys::with_extra(self.censor.iter().cloned())
    }
}
