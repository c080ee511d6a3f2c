//! Selects the existing comment a new render should overwrite.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::marker::parse_type;

/// A comment already present on the pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingComment {
    pub id: u64,
    pub author_login: String,
    pub updated_at: DateTime<Utc>,
    pub body: String,
}

impl ExistingComment {
    /// True when `author_login` wrote this comment and its marker carries
    /// `type_tag`.
    pub fn is_candidate(&self, author_login: &str, type_tag: &str) -> bool {
        self.author_login == author_login && parse_type(&self.body) == Some(type_tag)
    }
}

/// Picks the most recently updated comment authored by `author_login` whose
/// metadata marker carries `type_tag`.
///
/// Every comment is inspected. On equal `updated_at` the one met first keeps
/// its place, so ties follow the order the caller supplied.
pub fn select_comment<'a>(
    comments: &'a [ExistingComment],
    author_login: &str,
    type_tag: &str,
) -> Option<&'a ExistingComment> {
    let mut best: Option<&ExistingComment> = None;
    let mut candidates = 0usize;

    for comment in comments {
        if !comment.is_candidate(author_login, type_tag) {
            continue;
        }
        candidates += 1;

        // Keep any comment that has been more recently updated.
        if best.is_none_or(|b| comment.updated_at > b.updated_at) {
            best = Some(comment);
        }
    }

    debug!(
        scanned = comments.len(),
        candidates,
        selected = ?best.map(|c| c.id),
        "comment selection done"
    );
    best
}
