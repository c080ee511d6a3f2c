//! Crate-wide error type for comment-engine.
//!
//! Every failure is terminal for the current invocation: the engine never
//! retries and never returns partial output.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type EngineResult<T> = Result<T, EngineError>;

/// Root error type for the comment-engine crate.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The user supplied template could not be compiled.
    #[error("template parse error: {message} (near `{fragment}`)")]
    TemplateParse { message: String, fragment: String },

    /// The template compiled but failed while executing against a context
    /// (undefined field, unknown function, type mismatch).
    #[error("template render error: {message} (near `{fragment}`)")]
    TemplateRender { message: String, fragment: String },

    /// An environment entry without a `=` separator.
    #[error("malformed environment entry: {entry:?} has no '=' separator")]
    MalformedEnvironmentEntry { entry: String },

    /// A comment type tag that cannot be embedded in a metadata marker.
    #[error("invalid comment type {0:?}: must be non-empty and free of ')' and line breaks")]
    InvalidTypeTag(String),
}

impl EngineError {
    /// Builds a parse error from a minijinja error, quoting the offending
    /// line of `source`.
    pub(crate) fn parse(err: &minijinja::Error, source: &str) -> Self {
        EngineError::TemplateParse {
            message: describe(err),
            fragment: fragment_at(err, source),
        }
    }

    /// Builds a render error from a minijinja error, quoting the offending
    /// line of `source`.
    pub(crate) fn render(err: &minijinja::Error, source: &str) -> Self {
        EngineError::TemplateRender {
            message: describe(err),
            fragment: fragment_at(err, source),
        }
    }
}

fn describe(err: &minijinja::Error) -> String {
    match err.detail() {
        Some(detail) => format!("{}: {}", err.kind(), detail),
        None => err.kind().to_string(),
    }
}

/// Returns the source line the engine blamed, or the whole (single-line)
/// source when no line is known.
fn fragment_at(err: &minijinja::Error, source: &str) -> String {
    err.line()
        .and_then(|line| source.lines().nth(line.saturating_sub(1)))
        .unwrap_or(source)
        .trim()
        .to_string()
}
