//! Comment template compilation and rendering.
//!
//! Templates use minijinja (Jinja2) syntax. Templates written for Go's
//! `text/template` (`{{.Git.Branch}}`, `{{ if .Build.CI }}...{{ end }}`) are
//! translated to Jinja before compilation.
//!
//! Every template is compiled with the metadata marker line and a blank line
//! prepended, so each rendered comment can be recognized again later.

use minijinja::{Environment, Error, ErrorKind, State, UndefinedBehavior};
use tracing::debug;

use crate::context::RenderContext;
use crate::errors::{EngineError, EngineResult};
use crate::go_compat;
use crate::marker::{MARKER_TEMPLATE, validate_type};
use crate::trim::trim;

const TEMPLATE_NAME: &str = "comment";

/// A compiled comment template.
#[derive(Debug)]
pub struct CommentTemplate {
    env: Environment<'static>,
    /// What the user wrote, marker line included. Errors quote this.
    source: String,
}

impl CommentTemplate {
    /// Compiles a user supplied template body.
    ///
    /// The body is trimmed, then the marker line and a blank line are
    /// prepended. Syntax errors are reported with the offending line.
    pub fn parse(body: &[u8]) -> EngineResult<Self> {
        let body = std::str::from_utf8(body).map_err(|e| EngineError::TemplateParse {
            message: format!("template is not valid UTF-8: {e}"),
            fragment: String::from_utf8_lossy(&body[..e.valid_up_to()])
                .lines()
                .last()
                .unwrap_or_default()
                .to_string(),
        })?;

        let body = trim(body);
        let source = format!("{MARKER_TEMPLATE}\n\n{body}");
        let compiled = format!("{MARKER_TEMPLATE}\n\n{}", go_compat::translate(body)?);

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_function("label", label);
        env.add_template_owned(TEMPLATE_NAME, compiled)
            .map_err(|e| EngineError::parse(&e, &source))?;

        debug!(bytes = source.len(), "comment template compiled");
        Ok(Self { env, source })
    }

    /// Renders the template against `ctx` and trims the result.
    pub fn render(&self, ctx: &RenderContext) -> EngineResult<String> {
        validate_type(&ctx.meta.kind)?;

        let template = self
            .env
            .get_template(TEMPLATE_NAME)
            .map_err(|e| EngineError::render(&e, &self.source))?;
        let raw = template
            .render(ctx)
            .map_err(|e| EngineError::render(&e, &self.source))?;

        let body = trim(&raw).to_string();
        debug!(bytes = body.len(), "comment rendered");
        Ok(body)
    }

    /// The template as written, marker line included.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// `label(name)`: true iff `name` is among the `Labels` of the context
/// currently being rendered.
///
/// Reads the render state handed in by the engine on every call instead of
/// capturing a context at construction time.
fn label(state: &State, name: &str) -> Result<bool, Error> {
    let labels = state
        .lookup("Labels")
        .ok_or_else(|| Error::new(ErrorKind::UndefinedError, "Labels is not defined"))?;
    for item in labels.try_iter()? {
        if item.as_str() == Some(name) {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Meta;
    use crate::env::{Environment, SensitiveKeys};
    use crate::marker::parse_type;

    fn ctx(entries: &[&str], labels: &[&str], kind: &str) -> RenderContext {
        RenderContext::build(
            Environment::from_entries(entries).unwrap(),
            labels.iter().map(|l| l.to_string()).collect(),
            Meta::with_type(kind),
            &SensitiveKeys::default(),
        )
    }

    fn render(body: &str, ctx: &RenderContext) -> String {
        CommentTemplate::parse(body.as_bytes())
            .unwrap()
            .render(ctx)
            .unwrap()
    }

    #[test]
    fn go_style_templates_render() {
        let template = CommentTemplate::parse(
            b"Build {{.Build.Number}}{{ if .Build.CI }} on CI{{ else }} locally{{ end }}\n\
              {{ range .Labels }}- {{ . }}\n{{ end }}{{ if label \"bug\" }}bug!{{ end }}",
        )
        .unwrap();

        let out = template
            .render(&ctx(&["CIRCLECI=true", "CIRCLE_BUILD_NUM=7"], &["bug", "wip"], "ci"))
            .unwrap();
        assert_eq!(out, "[//]: # (meta:type=ci)\n\nBuild 7 on CI\n- bug\n- wip\nbug!");

        let out = template.render(&ctx(&[], &[], "ci")).unwrap();
        assert_eq!(out, "[//]: # (meta:type=ci)\n\nBuild  locally");
    }

    #[test]
    fn dots_inside_string_literals_survive() {
        let out = render(r#"{{ "see .Foo docs" }}"#, &ctx(&[], &[], "ci"));
        assert!(out.ends_with("see .Foo docs"), "{out:?}");
    }

    #[test]
    fn unsupported_go_action_is_a_parse_error() {
        match CommentTemplate::parse(b"{{ with .Git }}{{ .Branch }}{{ end }}") {
            Err(EngineError::TemplateParse { fragment, .. }) => {
                assert_eq!(fragment, "{{ with .Git }}")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn marker_and_blank_line_are_prepended() {
        let out = render("\n\n  hello\n\n", &ctx(&[], &[], "lint"));
        assert_eq!(out, "[//]: # (meta:type=lint)\n\n  hello");
    }

    #[test]
    fn empty_body_renders_marker_only() {
        assert_eq!(render("", &ctx(&[], &[], "x")), "[//]: # (meta:type=x)");
    }

    #[test]
    fn rendered_marker_recovers_type() {
        for kind in ["default", "ci", "coverage report"] {
            let out = render("body", &ctx(&[], &[], kind));
            assert_eq!(parse_type(&out), Some(kind));
        }
    }

    #[test]
    fn censored_values_never_reach_output() {
        let out = render(
            "token={{ Env.GITHUB_TOKEN }}",
            &ctx(&["GITHUB_TOKEN=ghp_secret"], &[], "ci"),
        );
        assert!(out.ends_with("token=********"));
        assert!(!out.contains("ghp_secret"));
    }

    #[test]
    fn label_function_reads_the_rendered_context() {
        let template = CommentTemplate::parse(
            br#"{% if label("bug") %}bug{% else %}clean{% endif %}"#,
        )
        .unwrap();
        let with = template.render(&ctx(&[], &["wip", "bug"], "ci")).unwrap();
        let without = template.render(&ctx(&[], &["Bug"], "ci")).unwrap();
        assert!(with.ends_with("\n\nbug"));
        assert!(without.ends_with("\n\nclean"));
    }

    #[test]
    fn labels_can_be_iterated() {
        let out = render(
            "{% for l in Labels %}[{{ l }}]{% endfor %}",
            &ctx(&[], &["b", "a"], "ci"),
        );
        assert!(out.ends_with("[b][a]"));
    }

    #[test]
    fn syntax_error_reports_offending_fragment() {
        let err = CommentTemplate::parse(b"line one\n{% if Git.Branch %}unclosed").unwrap_err();
        match err {
            EngineError::TemplateParse { fragment, .. } => {
                assert!(fragment.contains("unclosed") || fragment.contains("{% if"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn syntax_error_quotes_the_go_form_the_user_wrote() {
        let err = CommentTemplate::parse(b"a\n{{ if .Build.CI }}{{ 1 + }}{{ end }}").unwrap_err();
        match err {
            EngineError::TemplateParse { fragment, .. } => {
                assert_eq!(fragment, "{{ if .Build.CI }}{{ 1 + }}{{ end }}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn undefined_field_fails_render() {
        let template = CommentTemplate::parse(b"ok\n{{.Build.Nope}}").unwrap();
        let err = template.render(&ctx(&[], &[], "ci")).unwrap_err();
        match err {
            EngineError::TemplateRender { fragment, .. } => {
                assert_eq!(fragment, "{{.Build.Nope}}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_function_fails_render() {
        let template = CommentTemplate::parse(b"{{ nope(1) }}").unwrap();
        assert!(matches!(
            template.render(&ctx(&[], &[], "ci")),
            Err(EngineError::TemplateRender { .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        assert!(matches!(
            CommentTemplate::parse(b"ok\n\xff"),
            Err(EngineError::TemplateParse { .. })
        ));
    }

    #[test]
    fn unparseable_type_is_rejected_at_render() {
        let template = CommentTemplate::parse(b"x").unwrap();
        assert!(matches!(
            template.render(&ctx(&[], &[], "a)b")),
            Err(EngineError::InvalidTypeTag(_))
        ));
    }
}
