//! Thin GitHub collaborator for hub-comment.
//!
//! Covers exactly what publishing a pull request comment needs: resolving a
//! pull request reference, the authenticated user, issue metadata (labels,
//! title), listing existing comments, and creating or updating one.

pub mod errors;
pub mod github;
pub mod reference;
pub mod types;

pub use errors::{ConfigError, HubError, HubResult, ProviderError};
pub use github::{DEFAULT_API_URL, GitHubClient, HubConfig};
pub use reference::PullRequestRef;
pub use types::{CommentAuthor, Issue, IssueComment, Label, User};
