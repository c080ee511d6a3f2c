//! Update-or-create decision and the human readable report.

use std::fmt;

/// What to do with the rendered body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No prior comment of this type: post a new one.
    Create,
    /// Overwrite the comment with this id.
    Update(u64),
}

impl Decision {
    pub fn from_match(found: Option<u64>) -> Self {
        match found {
            Some(id) => Decision::Update(id),
            None => Decision::Create,
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Decision::Update(_))
    }

    /// Fixed phrasing for this decision, depending on whether it was
    /// actually published.
    pub fn headline(&self, dry_run: bool) -> &'static str {
        match (self, dry_run) {
            (Decision::Create, false) => "Posting new comment as",
            (Decision::Update(_), false) => "Updating existing comment by",
            (Decision::Create, true) => "Would have posted new comment as",
            (Decision::Update(_), true) => "Would have updated existing comment by",
        }
    }
}

/// Textual summary of a run, printed once the decision is made (and, unless
/// dry-running, published).
#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub decision: Decision,
    pub dry_run: bool,
    /// Display name of the authenticated user; falls back to the login.
    pub user_name: &'a str,
    pub user_login: &'a str,
    pub owner: &'a str,
    pub repo: &'a str,
    pub number: u64,
    pub body: &'a str,
    /// Link to the published comment; `None` on dry runs.
    pub url: Option<&'a str>,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.user_name.is_empty() {
            self.user_login
        } else {
            self.user_name
        };
        writeln!(
            f,
            "{} {} ({}) on {}/{}#{}:",
            self.decision.headline(self.dry_run),
            name,
            self.user_login,
            self.owner,
            self.repo,
            self.number
        )?;

        writeln!(f)?;
        for line in self.body.split('\n') {
            writeln!(f, "→ {line}")?;
        }
        writeln!(f)?;

        if let Some(url) = self.url {
            writeln!(f, "To view comment visit:")?;
            writeln!(f, "→ {url}")?;
        }
        Ok(())
    }
}
