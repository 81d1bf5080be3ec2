//! Post-processing: deterministic cleanup of generated text.
//!
//! Chat models wrap answers in ` ```markdown ` fences, emit CRLF line endings
//! or sprinkle zero-width characters despite being asked for plain output.
//! These rules fix the quirks without touching content, and the result is
//! always trimmed so callers can test for emptiness directly.
//!
//! Rules run in order: fences are stripped before line endings are
//! normalised so the fence regex sees the raw model output, and trimming
//! comes last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw model output.
///
/// 1. Strip outer code fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
/// 5. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 6. Trim leading and trailing whitespace
pub fn clean_generated(input: &str) -> String {
    let s = strip_outer_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:markdown|md|text)?\r?\n(.*?)\r?\n```$")
        .expect("fence regex is valid")
});

fn strip_outer_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{4,}").expect("blank-line regex is valid"));

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 5: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let input = "```markdown\n# Notes\n\n- point\n```";
        assert_eq!(clean_generated(input), "# Notes\n\n- point");
    }

    #[test]
    fn test_strip_fences_no_lang() {
        assert_eq!(clean_generated("```\nQ: a | A: b\n```\n"), "Q: a | A: b");
    }

    #[test]
    fn test_inner_code_block_kept() {
        let input = "Intro\n\n```rust\nfn main() {}\n```";
        assert_eq!(clean_generated(input), input);
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(clean_generated("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(clean_generated("a   \nb\t"), "a\nb");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(clean_generated("a\n\n\n\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn test_invisible_chars_removed() {
        assert_eq!(clean_generated("\u{FEFF}sum\u{200B}mary"), "summary");
    }

    #[test]
    fn test_whitespace_only_becomes_empty() {
        assert_eq!(clean_generated("  \n\n\t "), "");
    }
}
