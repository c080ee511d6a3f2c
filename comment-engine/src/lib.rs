//! Comment synthesis and identity resolution for hub-comment.
//!
//! The crate is pure and synchronous; it performs no I/O.
//!
//! 1) **Synthesis**
//!    - Capture the environment snapshot ([`Environment`]) and censor secrets
//!    - Build the read-only [`RenderContext`] (`Env`, `Git`, `Build`, `Labels`, `Meta`)
//!    - Translate Go-style actions, compile with the metadata marker prepended
//!    - Render and normalize whitespace ([`trim`])
//!
//! 2) **Identity resolution**
//!    - Scan existing comments for the same author and type tag
//!    - Pick the most recently updated one ([`select_comment`])
//!    - Turn the match into an update-or-create [`Decision`]

pub mod context;
pub mod decision;
pub mod env;
pub mod errors;
mod go_compat;
pub mod marker;
pub mod matcher;
pub mod template;
pub mod trim;

pub use context::{BuildInfo, GitInfo, Meta, RenderContext};
pub use decision::{Decision, Report};
pub use env::{CENSOR_MASK, Environment, SensitiveKeys};
pub use errors::{EngineError, EngineResult};
pub use marker::{DEFAULT_TYPE, marker_line, parse_type, validate_type};
pub use matcher::{ExistingComment, select_comment};
pub use template::CommentTemplate;
pub use trim::trim;

/// Raw inputs for a single render.
#[derive(Debug, Clone, Default)]
pub struct ContextInputs {
    /// `KEY=VALUE` entries of the environment snapshot.
    pub environ: Vec<String>,
    /// Pull request label names, in source order.
    pub labels: Vec<String>,
    pub meta: Meta,
    pub sensitive: SensitiveKeys,
}

impl ContextInputs {
    /// Builds the censored render context.
    pub fn into_context(self) -> EngineResult<RenderContext> {
        let env = Environment::from_entries(&self.environ)?;
        Ok(RenderContext::build(
            env,
            self.labels,
            self.meta,
            &self.sensitive,
        ))
    }
}

/// Compiles `template_body` and renders it against the context built from
/// `inputs`.
pub fn render(template_body: &[u8], inputs: ContextInputs) -> EngineResult<String> {
    let template = CommentTemplate::parse(template_body)?;
    let ctx = inputs.into_context()?;
    template.render(&ctx)
}
