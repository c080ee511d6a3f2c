//! Whitespace normalization for comment bodies.

/// Returns `raw` with all trailing whitespace and all leading blank lines
/// removed.
///
/// Leading whitespace on the first non-blank line is kept intact, so a body
/// that opens with a 4-space-indented Markdown code block survives. Works on
/// code points: a multi-byte character at either edge is never split.
pub fn trim(raw: &str) -> &str {
    // Scan backwards for the last non-whitespace character.
    let Some((last, last_ch)) = raw.char_indices().rev().find(|(_, c)| !c.is_whitespace())
    else {
        return "";
    };
    let end = last + last_ch.len_utf8();

    // Scan forwards for the first non-whitespace character.
    let first = raw[..end]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(last, |(idx, _)| idx);

    // Back up to just after the nearest preceding line break.
    let start = raw[..first]
        .rfind(|c: char| c == '\n' || c == '\r')
        .map_or(0, |idx| idx + 1);

    &raw[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_inputs_trim_to_empty() {
        for body in ["", "    ", "\n\n\n\n", "\n\n\n\n    ", "    \n\n\n\n", "\r\n\t \u{3000}"] {
            assert_eq!(trim(body), "", "input {body:?}");
        }
    }

    #[test]
    fn single_line_cases() {
        let cases = [
            ("hello world", "hello world"),
            ("    hello world", "    hello world"),
            ("hello world    ", "hello world"),
            ("    hello world    ", "    hello world"),
            ("\n\nhello world", "hello world"),
            ("    \n    \n    hello world", "    hello world"),
            ("hello world\n\n", "hello world"),
            ("hello world    \n    \n    ", "hello world"),
        ];
        for (body, expected) in cases {
            let actual = trim(body);
            assert!(!actual.starts_with('\n'));
            assert!(!actual.ends_with('\n'));
            assert_eq!(actual, expected, "input {body:?}");
        }
    }

    #[test]
    fn keeps_code_block_indentation() {
        assert_eq!(trim("\n\n    code\n"), "    code");
        assert_eq!(trim("\r\n\r\n\tcode\r\n"), "\tcode");
    }

    #[test]
    fn inner_blank_lines_survive() {
        assert_eq!(trim("\n# Title\n\n\nbody\n\n"), "# Title\n\n\nbody");
    }

    #[test]
    fn unicode_edges_are_not_split() {
        assert_eq!(trim("🤖"), "🤖");
        assert_eq!(
            trim("    \n    \n    🤖    🤖    \n    \n    "),
            "    🤖    🤖"
        );
        assert_eq!(trim("   \n  🤖   🤖   \n  "), "  🤖   🤖");
        // U+2003 EM SPACE is whitespace and multi-byte.
        assert_eq!(trim("\u{2003}\nélan\u{2003}"), "élan");
    }

    #[test]
    fn trimming_is_idempotent() {
        let samples = [
            "",
            "   ",
            "\n\n    code\n",
            "  \n  🤖   🤖   \n  ",
            "a\n\n b \n",
            "\r\n\tx\r\n",
        ];
        for body in samples {
            let once = trim(body);
            assert_eq!(trim(once), once, "input {body:?}");
        }
    }
}
