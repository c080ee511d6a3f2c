//! Go `text/template` compatibility.
//!
//! Comment templates are compiled by minijinja, but templates written for
//! Go's `text/template` keep working: `{{ ... }}` actions are translated to
//! their Jinja form before compilation.
//!
//! | Go | Jinja |
//! |----|-------|
//! | `{{.Git.Branch}}` | `{{Git.Branch}}` |
//! | `{{ if .Build.CI }}`, `{{ else if x }}`, `{{ else }}`, `{{ end }}` | `{% if %}`, `{% elif %}`, `{% else %}`, `{% endif %}` |
//! | `{{ range .Labels }}{{ . }}{{ end }}` | `{% for dot_1 in Labels %}{{ dot_1 }}{% endfor %}` |
//! | `{{ range $l := .Labels }}{{ $l }}{{ end }}` | `{% for l in Labels %}{{ l }}{% endfor %}` |
//! | `{{ label "bug" }}`, `{{ eq .A "b" }}`, `{{ len .Labels }}` | `{{ label("bug") }}`, `{{ (A == "b") }}`, `{{ (Labels \| length) }}` |
//! | `{{/* note */}}` | `{# note #}` |
//!
//! String literals are never rewritten. Jinja tags pass through with only
//! the leading-dot rewrite applied. A translated action spans as many lines
//! as the original, so compile errors point at the line the user wrote.

use crate::errors::{EngineError, EngineResult};

/// Go functions with a Jinja translation.
const GO_FUNCS: &[&str] = &[
    "and", "or", "not", "eq", "ne", "lt", "le", "gt", "ge", "len", "index", "label",
];

/// Go actions with no Jinja counterpart here.
const UNSUPPORTED: &[&str] = &["with", "define", "template", "block", "break", "continue"];

/// An open `{{ if }}` or `{{ range }}` awaiting its `{{ end }}`.
#[derive(Debug)]
enum Block {
    If,
    /// Loop variable that `.` refers to inside the range.
    Range(String),
}

/// Translates Go actions in `src` to Jinja.
pub(crate) fn translate(src: &str) -> EngineResult<String> {
    let mut out = String::with_capacity(src.len());
    let mut blocks = Vec::new();
    let mut rest = src;

    while let Some(start) = find_open(rest) {
        out.push_str(&rest[..start]);
        let tag = &rest[start..];

        if tag.starts_with("{#") {
            let end = tag.find("#}").map_or(tag.len(), |i| i + 2);
            out.push_str(&tag[..end]);
            rest = &tag[end..];
            continue;
        }

        let is_action = tag.starts_with("{{");
        let Some(len) = tag_len(tag, if is_action { "}}" } else { "%}" }) else {
            // Unterminated; the compiler reports it.
            out.push_str(tag);
            return Ok(out);
        };
        let whole = &tag[..len];
        if is_action {
            out.push_str(&action(whole, &mut blocks)?);
        } else {
            out.push_str(&rewrite_code(whole, current_dot(&blocks)));
        }
        rest = &tag[len..];
    }

    out.push_str(rest);
    Ok(out)
}

fn find_open(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    s.match_indices('{')
        .map(|(i, _)| i)
        .find(|&i| matches!(bytes.get(i + 1), Some(b'{' | b'%' | b'#')))
}

/// Length of the tag at the start of `tag`, closing delimiter included.
fn tag_len(tag: &str, close: &str) -> Option<usize> {
    let bytes = tag.as_bytes();
    let mut i = 2;
    while i < bytes.len() {
        match bytes[i] {
            q @ (b'"' | b'\'' | b'`') => i = skip_literal(bytes, i, q),
            _ if bytes[i..].starts_with(close.as_bytes()) => return Some(i + close.len()),
            _ => i += 1,
        }
    }
    None
}

/// Index just past the string literal opening at `start`.
fn skip_literal(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote != b'`' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn current_dot(blocks: &[Block]) -> Option<&str> {
    blocks.iter().rev().find_map(|b| match b {
        Block::Range(var) => Some(var.as_str()),
        Block::If => None,
    })
}

/// Translates one `{{ ... }}` tag.
fn action(tag: &str, blocks: &mut Vec<Block>) -> EngineResult<String> {
    let inner = &tag[2..tag.len() - 2];
    let (ltrim, inner) = match inner.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", inner),
    };
    let (body, rtrim) = match inner.strip_suffix('-') {
        Some(rest) => (rest, "-"),
        None => (inner, ""),
    };

    let code = body.trim();
    if let Some(comment) = code.strip_prefix("/*").and_then(|c| c.strip_suffix("*/")) {
        return Ok(["{#", comment, "#}"].concat());
    }

    let fail = |message: String| EngineError::TemplateParse {
        message,
        fragment: tag.trim().to_string(),
    };
    let pad = "\n".repeat(body.matches('\n').count());
    let statement = |stmt: String| -> String { format!("{{%{ltrim} {stmt} {pad}{rtrim}%}}") };
    let dot = current_dot(blocks).map(str::to_string);
    let dot = dot.as_deref();

    let words = words(code);
    match words.as_slice() {
        ["if", cond @ ..] if !cond.is_empty() => {
            let cond = expr(cond, dot).map_err(fail)?;
            blocks.push(Block::If);
            Ok(statement(format!("if {cond}")))
        }
        ["else"] if !blocks.is_empty() => Ok(statement("else".into())),
        ["else", "if", cond @ ..] if !cond.is_empty() && !blocks.is_empty() => {
            let cond = expr(cond, dot).map_err(fail)?;
            Ok(statement(format!("elif {cond}")))
        }
        ["range", rest @ ..] if !rest.is_empty() => {
            let (var, over) = range_clause(rest, blocks).map_err(fail)?;
            let over = expr(over, dot).map_err(fail)?;
            let stmt = statement(format!("for {var} in {over}"));
            blocks.push(Block::Range(var));
            Ok(stmt)
        }
        ["end"] => match blocks.pop() {
            Some(Block::If) => Ok(statement("endif".into())),
            Some(Block::Range(_)) => Ok(statement("endfor".into())),
            None => Err(fail("unexpected {{ end }}".into())),
        },
        [keyword @ ("if" | "else" | "range" | "end"), ..] => {
            Err(fail(format!("malformed {{{{ {keyword} }}}} action")))
        }
        [keyword, ..] if UNSUPPORTED.contains(keyword) => {
            Err(fail(format!("unsupported action {{{{ {keyword} }}}}")))
        }
        [head, args @ ..] if !args.is_empty() && GO_FUNCS.contains(head) => {
            let value = expr(&words, dot).map_err(fail)?;
            Ok(format!("{{{{{ltrim} {value} {pad}{rtrim}}}}}"))
        }
        _ => Ok(format!("{{{{{ltrim}{}{rtrim}}}}}", rewrite_code(body, dot))),
    }
}

/// Splits `range` arguments into the loop variable and the ranged value.
fn range_clause<'a>(
    words: &'a [&'a str],
    blocks: &[Block],
) -> Result<(String, &'a [&'a str]), String> {
    let Some(at) = words.iter().position(|w| *w == ":=") else {
        let depth = blocks.iter().filter(|b| matches!(b, Block::Range(_))).count();
        return Ok((format!("dot_{}", depth + 1), words));
    };
    let vars = words[..at].join(" ");
    let vars: Vec<&str> = vars
        .split(',')
        .map(|v| v.trim().trim_start_matches('$'))
        .filter(|v| !v.is_empty())
        .collect();
    match vars.as_slice() {
        [var] if at + 1 < words.len() => Ok((var.to_string(), &words[at + 1..])),
        [_, _] => Err("range with index and element variables is not supported".into()),
        _ => Err("malformed range clause".into()),
    }
}

/// Translates a Go pipeline (a function call or a single operand).
fn expr(words: &[&str], dot: Option<&str>) -> Result<String, String> {
    match words {
        [head, args @ ..] if !args.is_empty() && GO_FUNCS.contains(head) => {
            let args = args
                .iter()
                .map(|w| operand(w, dot))
                .collect::<Result<Vec<_>, _>>()?;
            call(head, &args)
        }
        _ => words
            .iter()
            .map(|w| operand(w, dot))
            .collect::<Result<Vec<_>, _>>()
            .map(|parts| parts.join(" ")),
    }
}

fn operand(word: &str, dot: Option<&str>) -> Result<String, String> {
    match word.strip_prefix('(').and_then(|w| w.strip_suffix(')')) {
        Some(inner) => Ok(format!("({})", expr(&words(inner), dot)?)),
        None => Ok(rewrite_code(word, dot)),
    }
}

fn call(func: &str, args: &[String]) -> Result<String, String> {
    let arity = |ok: bool| {
        if ok {
            Ok(())
        } else {
            Err(format!("wrong number of arguments for {func}: {}", args.len()))
        }
    };
    let compare = |op: &str| -> Result<String, String> {
        arity(args.len() == 2)?;
        Ok(format!("({} {op} {})", args[0], args[1]))
    };

    match func {
        "and" | "or" => Ok(format!("({})", args.join(&format!(" {func} ")))),
        "not" => {
            arity(args.len() == 1)?;
            Ok(format!("(not {})", args[0]))
        }
        // Go's eq is true if the first argument equals any of the others.
        "eq" => {
            arity(args.len() >= 2)?;
            let alternatives: Vec<String> = args[1..]
                .iter()
                .map(|other| format!("{} == {other}", args[0]))
                .collect();
            Ok(format!("({})", alternatives.join(" or ")))
        }
        "ne" => compare("!="),
        "lt" => compare("<"),
        "le" => compare("<="),
        "gt" => compare(">"),
        "ge" => compare(">="),
        "len" => {
            arity(args.len() == 1)?;
            Ok(format!("({} | length)", args[0]))
        }
        "index" => {
            arity(args.len() >= 2)?;
            let keys: String = args[1..].iter().map(|k| format!("[{k}]")).collect();
            Ok(format!("{}{keys}", args[0]))
        }
        _ => {
            arity(args.len() == 1)?;
            Ok(format!("{func}({})", args[0]))
        }
    }
}

/// Splits on whitespace outside string literals and parentheses.
fn words(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut out = Vec::new();
    let mut start = None;
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'"' | b'\'' | b'`' => {
                start.get_or_insert(i);
                i = skip_literal(bytes, i, b);
                continue;
            }
            b'(' => {
                start.get_or_insert(i);
                depth += 1;
            }
            b')' => depth = depth.saturating_sub(1),
            _ if b.is_ascii_whitespace() && depth == 0 => {
                if let Some(from) = start.take() {
                    out.push(&s[from..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
        i += 1;
    }
    if let Some(from) = start {
        out.push(&s[from..]);
    }
    out
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// True when a `.` or `$` after `prev` starts a Go reference rather than
/// an attribute access or a number.
fn at_boundary(prev: Option<char>) -> bool {
    prev.is_none_or(|p| p.is_whitespace() || "([{,!=<>+-*/|~%:".contains(p))
}

/// Rewrites Go references outside string literals.
///
/// `.Field` becomes `Field` (or `<dot>.Field` inside a range), a lone `.`
/// becomes the range variable, `$.Field` becomes `Field` and `$var` becomes
/// `var`. Raw backtick strings become double quoted strings.
fn rewrite_code(code: &str, dot: Option<&str>) -> String {
    let bytes = code.as_bytes();
    let mut out = String::with_capacity(code.len());
    let mut prev: Option<char> = None;
    let mut chars = code.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match c {
            '"' | '\'' | '`' => {
                let end = skip_literal(bytes, i, c as u8);
                let literal = &code[i..end];
                if c == '`' {
                    out.push_str(&requote(literal));
                } else {
                    out.push_str(literal);
                }
                while chars.next_if(|&(j, _)| j < end).is_some() {}
                prev = Some('"');
                continue;
            }
            '$' if at_boundary(prev) => match next {
                Some('.') => {
                    chars.next();
                    continue;
                }
                Some(n) if is_ident_start(n) => continue,
                _ => out.push(c),
            },
            '.' if at_boundary(prev) => match (next, dot) {
                (Some(n), Some(var)) if is_ident_start(n) => {
                    out.push_str(var);
                    out.push('.');
                }
                (Some(n), None) if is_ident_start(n) => {}
                (n, Some(var)) if n.is_none_or(|n| !n.is_alphanumeric() && n != '.') => {
                    out.push_str(var);
                }
                _ => out.push(c),
            },
            _ => out.push(c),
        }
        prev = Some(c);
    }
    out
}

/// Turns a Go raw string into a double quoted one.
fn requote(raw: &str) -> String {
    let inner = raw
        .strip_prefix('`')
        .map(|r| r.strip_suffix('`').unwrap_or(r))
        .unwrap_or(raw);
    format!("\"{}\"", inner.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tr(src: &str) -> String {
        translate(src).unwrap()
    }

    #[test]
    fn leading_dots_are_dropped_inside_tags_only() {
        assert_eq!(
            tr("v{{.Build.Number}} on {{ .Git.Branch }}. Done."),
            "v{{Build.Number}} on {{ Git.Branch }}. Done."
        );
        assert_eq!(
            tr("{% if .Build.CI and not .Git.Tag %}x{% endif %}"),
            "{% if Build.CI and not Git.Tag %}x{% endif %}"
        );
        assert_eq!(tr("{{- .Meta.Type -}}"), "{{- Meta.Type -}}");
        assert_eq!(tr("{{ 1.5 }} {{ Env.HOME }} {{ x[0].y }}"), "{{ 1.5 }} {{ Env.HOME }} {{ x[0].y }}");
    }

    #[test]
    fn string_literals_are_left_alone() {
        assert_eq!(tr(r#"{{ "see .Foo docs" }}"#), r#"{{ "see .Foo docs" }}"#);
        assert_eq!(
            tr(r#"{% if .Git.Branch == 'a .b' %}{{ "}} .X \" .Y" }}{% endif %}"#),
            r#"{% if Git.Branch == 'a .b' %}{{ "}} .X \" .Y" }}{% endif %}"#
        );
        assert_eq!(tr("{{ `raw .X \"q\"` }}"), r#"{{ "raw .X \"q\"" }}"#);
    }

    #[test]
    fn conditionals_become_statements() {
        assert_eq!(
            tr("{{ if .Build.CI }}ci{{ else if .Git.Tag }}tag{{ else }}local{{ end }}"),
            "{% if Build.CI %}ci{% elif Git.Tag %}tag{% else %}local{% endif %}"
        );
        assert_eq!(tr("{{- if .Build.CI -}}x{{- end -}}"), "{%- if Build.CI -%}x{%- endif -%}");
    }

    #[test]
    fn ranges_bind_dot_to_the_element() {
        assert_eq!(
            tr("{{ range .Labels }}[{{ . }}]{{ end }}"),
            "{% for dot_1 in Labels %}[{{ dot_1 }}]{% endfor %}"
        );
        assert_eq!(
            tr("{{ range $l := .Labels }}{{ $l }} {{ $.Meta.Type }}{{ end }}"),
            "{% for l in Labels %}{{ l }} {{ Meta.Type }}{% endfor %}"
        );
        assert_eq!(
            tr("{{ range .A }}{{ range .B }}{{ .C }}{{ end }}{{ end }}"),
            "{% for dot_1 in A %}{% for dot_2 in dot_1.B %}{{ dot_2.C }}{% endfor %}{% endfor %}"
        );
    }

    #[test]
    fn functions_use_jinja_call_and_operator_forms() {
        assert_eq!(tr(r#"{{ if label "bug" }}b{{ end }}"#), r#"{% if label("bug") %}b{% endif %}"#);
        assert_eq!(
            tr(r#"{{ if and .Build.CI (eq .Git.Branch "main" "dev") }}x{{ end }}"#),
            r#"{% if (Build.CI and ((Git.Branch == "main" or Git.Branch == "dev"))) %}x{% endif %}"#
        );
        assert_eq!(tr("{{ len .Labels }}"), "{{ (Labels | length) }}");
        assert_eq!(tr(r#"{{ index .Env "HOME" }}"#), r#"{{ Env["HOME"] }}"#);
        assert_eq!(tr("{{ if not .Git.Tag }}x{{ end }}"), "{% if (not Git.Tag) %}x{% endif %}");
    }

    #[test]
    fn jinja_calls_are_not_mistaken_for_go_calls() {
        assert_eq!(
            tr(r#"{% if label("bug") %}{{ label("x") }}{% endif %}"#),
            r#"{% if label("bug") %}{{ label("x") }}{% endif %}"#
        );
    }

    #[test]
    fn comments_are_translated() {
        assert_eq!(tr("a{{/* note .X */}}b{# keep #}"), "a{# note .X #}b{# keep #}");
    }

    #[test]
    fn translated_actions_keep_line_count() {
        let src = "{{ if\n  .Build.CI }}\nx\n{{ end\n}}";
        assert_eq!(tr(src).matches('\n').count(), src.matches('\n').count());
    }

    #[test]
    fn unbalanced_and_unsupported_actions_fail() {
        for src in ["x{{ end }}", "{{ else }}", "{{ with .Git }}{{ end }}", "{{ if }}", "{{ eq .A }}"] {
            match translate(src) {
                Err(EngineError::TemplateParse { fragment, .. }) => {
                    assert!(src.contains(&fragment), "{src:?} -> {fragment:?}")
                }
                other => panic!("{src:?} translated to {other:?}"),
            }
        }
    }

    #[test]
    fn unterminated_tags_are_left_for_the_compiler() {
        assert_eq!(tr("a {{ .X"), "a {{ .X");
    }
}
