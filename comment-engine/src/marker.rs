//! Hidden metadata marker embedded at the top of every posted comment.
//!
//! The marker is a Markdown link-reference definition, which renders as
//! nothing on GitHub:
//!
//! ```text
//! [//]: # (meta:type=coverage)
//! ```

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{EngineError, EngineResult};

/// Template source of the marker line; `Meta.Type` is filled in at render time.
pub(crate) const MARKER_TEMPLATE: &str = "[//]: # (meta:type={{ Meta.Type }})";

/// Type tag used when the caller does not pick one.
pub const DEFAULT_TYPE: &str = "default";

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\[//\]: # \(meta:type=([^)\r\n]+)\)[ \t]*\r?$")
            .expect("marker regex is valid")
    })
}

/// Checks that `tag` can round-trip through a marker line.
pub fn validate_type(tag: &str) -> EngineResult<()> {
    if tag.is_empty() || tag.contains(|c: char| matches!(c, ')' | '\r' | '\n')) {
        return Err(EngineError::InvalidTypeTag(tag.to_string()));
    }
    Ok(())
}

/// Formats the marker line for `tag`.
pub fn marker_line(tag: &str) -> String {
    format!("[//]: # (meta:type={tag})")
}

/// Returns the type tag carried by the first marker line in `body`, if any.
pub fn parse_type(body: &str) -> Option<&str> {
    marker_re()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_marker_parses_back() {
        for tag in ["default", "ci", "lint report", "coverage:go"] {
            assert_eq!(parse_type(&marker_line(tag)), Some(tag));
        }
    }

    #[test]
    fn marker_is_found_on_any_line_but_first_one_wins() {
        let body = "intro\n[//]: # (meta:type=a)\n\n[//]: # (meta:type=b)";
        assert_eq!(parse_type(body), Some("a"));
    }

    #[test]
    fn crlf_bodies_are_recognized() {
        assert_eq!(parse_type("[//]: # (meta:type=ci)\r\n\r\nbody"), Some("ci"));
    }

    #[test]
    fn near_misses_are_not_markers() {
        for body in [
            "",
            "plain comment",
            "[//]: # (meta:type=)",
            "see [//]: # (meta:type=ci)",
            "[//]: # (meta:kind=ci)",
            "`[//]: # (meta:type=ci)`",
        ] {
            assert_eq!(parse_type(body), None, "body {body:?}");
        }
    }

    #[test]
    fn type_validation() {
        assert!(validate_type("ci").is_ok());
        assert!(validate_type("lint report").is_ok());
        for bad in ["", "a)b", "a\nb", "a\rb"] {
            assert!(matches!(
                validate_type(bad),
                Err(EngineError::InvalidTypeTag(_))
            ));
        }
    }
}
