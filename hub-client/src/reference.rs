//! Pull request references.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Owner, repository and number of a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // e.g. "https://github.com/joshdk/hub-comment/pull/123"
    RE.get_or_init(|| {
        Regex::new(r"^https://.+/([a-zA-Z0-9_.-]+)/([a-zA-Z0-9_.-]+)/pull/([1-9]\d*)/?$")
            .expect("pull link regex is valid")
    })
}

fn short_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // e.g. "joshdk/hub-comment#123"
    RE.get_or_init(|| {
        Regex::new(r"^([a-zA-Z0-9_.-]+)/([a-zA-Z0-9_.-]+)#([1-9]\d*)$")
            .expect("short reference regex is valid")
    })
}

impl PullRequestRef {
    /// Parses a pull request link or an `owner/repo#number` short reference.
    pub fn parse(reference: &str) -> Option<Self> {
        let reference = reference.trim();
        let caps = link_re()
            .captures(reference)
            .or_else(|| short_re().captures(reference))?;
        Some(Self {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
            number: caps[3].parse().ok()?,
        })
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(owner: &str, repo: &str, number: u64) -> PullRequestRef {
        PullRequestRef {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    #[test]
    fn parses_links() {
        assert_eq!(
            PullRequestRef::parse("https://github.com/acme/widget/pull/42"),
            Some(pr("acme", "widget", 42))
        );
        assert_eq!(
            PullRequestRef::parse("https://ghe.example.com/Team_1/my.repo-x/pull/7/"),
            Some(pr("Team_1", "my.repo-x", 7))
        );
    }

    #[test]
    fn parses_short_references() {
        assert_eq!(
            PullRequestRef::parse("joshdk/hub-comment#123"),
            Some(pr("joshdk", "hub-comment", 123))
        );
    }

    #[test]
    fn rejects_malformed_references() {
        for bad in [
            "",
            "http://github.com/acme/widget/pull/42",
            "https://github.com/acme/widget/pull/0",
            "https://github.com/acme/widget/pull/042",
            "https://github.com/acme/widget/issues/42",
            "https://github.com/acme/widget/pull/abc",
            "acme/widget#0",
            "acme#1",
            "https://github.com/acme/widget/pull/99999999999999999999999",
        ] {
            assert_eq!(PullRequestRef::parse(bad), None, "reference {bad:?}");
        }
    }

    #[test]
    fn displays_as_short_reference() {
        assert_eq!(pr("acme", "widget", 42).to_string(), "acme/widget#42");
    }
}
