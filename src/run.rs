//! The hub-comment pipeline.
//!
//! 1) **Inputs**: environment snapshot, pull request reference, template
//! 2) **Provider reads**: authenticated user, issue labels/title
//! 3) **Synthesis**: censored context → rendered body
//! 4) **Identity**: list comments, pick the one to overwrite
//! 5) **Publish** (skipped on dry runs), then report

use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use comment_engine::{
    CommentTemplate, Decision, Environment, ExistingComment, Meta, RenderContext, Report,
    select_comment, validate_type,
};
use hub_client::{ConfigError, GitHubClient, HubConfig, IssueComment, PullRequestRef};
use tracing::{debug, info, warn};

use crate::cli::Cli;

/// Token used to authenticate against the GitHub API.
const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Link to the current pull request, injected by CircleCI.
const PULL_REQUEST_LINK_VAR: &str = "CIRCLE_PULL_REQUEST";

/// How a run ended without error.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing to do (e.g. not a pull request build).
    Skipped(String),
    /// The report to print on stdout.
    Reported(String),
}

/// Snapshot of the process environment as `KEY=VALUE` entries.
pub fn environment_snapshot() -> Vec<String> {
    std::env::vars_os()
        .map(|(k, v)| format!("{}={}", k.to_string_lossy(), v.to_string_lossy()))
        .collect()
}

/// Runs the whole pipeline against `environ`.
pub async fn run(cli: &Cli, environ: Vec<String>) -> Result<Outcome> {
    let t0 = Instant::now();

    // ---------------------------
    // Step 1: inputs
    // ---------------------------
    validate_type(&cli.kind)?;
    let env = Environment::from_entries(&environ)?;

    let token = env
        .get(GITHUB_TOKEN_VAR)
        .filter(|t| !t.trim().is_empty())
        .ok_or(ConfigError::MissingToken)?
        .to_string();

    // Not set on non-PR branches, or if a build starts before a PR is opened.
    let Some(link) = env.get(PULL_REQUEST_LINK_VAR) else {
        return Ok(Outcome::Skipped(format!(
            "no {PULL_REQUEST_LINK_VAR} set in environment"
        )));
    };
    let pr = PullRequestRef::parse(link).ok_or_else(|| anyhow!("malformed pull request link"))?;
    debug!(pull = %pr, "step1: pull request resolved");

    let template = CommentTemplate::parse(&cli.template_body()?)?;
    debug!("step1: template compiled");

    // ---------------------------
    // Step 2: provider reads
    // ---------------------------
    let client = GitHubClient::new(HubConfig::new(cli.api_url.clone(), token))?;

    let user = client
        .current_user()
        .await
        .context("fetch authenticated user")?;
    let issue = client
        .get_issue(&pr)
        .await
        .with_context(|| format!("fetch pull request {pr}"))?;
    debug!(
        login = %user.login,
        labels = issue.labels.len(),
        "step2: user and issue fetched"
    );

    // ---------------------------
    // Step 3: synthesis
    // ---------------------------
    let ctx = RenderContext::build(
        env,
        issue.label_names(),
        Meta {
            kind: cli.kind.clone(),
            title: issue.title.clone(),
            number: pr.number,
        },
        &cli.sensitive_keys(),
    );
    let body = template.render(&ctx)?;
    debug!(bytes = body.len(), "step3: comment rendered");

    // ---------------------------
    // Step 4: identity
    // ---------------------------
    let comments = client
        .list_comments(&pr)
        .await
        .with_context(|| format!("list comments on {pr}"))?;
    let existing = to_existing(comments);
    let decision = Decision::from_match(
        select_comment(&existing, &user.login, &cli.kind).map(|c| c.id),
    );
    debug!(
        scanned = existing.len(),
        ?decision,
        "step4: decision made"
    );

    // ---------------------------
    // Step 5: publish + report
    // ---------------------------
    let url = if cli.dry_run {
        info!(?decision, "dry run: publish skipped");
        None
    } else {
        let posted = match decision {
            Decision::Create => client.create_comment(&pr, &body).await,
            Decision::Update(id) => client.update_comment(&pr, id, &body).await,
        }
        .with_context(|| format!("publish comment on {pr}"))?;
        info!(id = posted.id, ?decision, "comment published");
        Some(posted.html_url)
    };

    let report = Report {
        decision,
        dry_run: cli.dry_run,
        user_name: user.display_name(),
        user_login: &user.login,
        owner: &pr.owner,
        repo: &pr.repo,
        number: pr.number,
        body: &body,
        url: url.as_deref(),
    };
    debug!("run done in {} ms", t0.elapsed().as_millis());

    Ok(Outcome::Reported(report.to_string()))
}

/// Converts API comments into matcher input, preserving order.
///
/// Comments without an author (deleted accounts) are kept with an empty
/// login, which never equals a real one.
fn to_existing(comments: Vec<IssueComment>) -> Vec<ExistingComment> {
    comments
        .into_iter()
        .map(|c| {
            let author_login = match c.author_login() {
                Some(login) => login.to_string(),
                None => {
                    warn!(id = c.id, "comment has no author");
                    String::new()
                }
            };
            ExistingComment {
                id: c.id,
                author_login,
                updated_at: c.updated_at,
                body: c.body.unwrap_or_default(),
            }
        })
        .collect()
}
