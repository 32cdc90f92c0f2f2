use regex::Regex;
use std::sync::OnceLock;

fn thinking_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<thinking>.*?</thinking>|<think>.*?</think>|<reasoning>.*?</reasoning>")
            .expect("valid thinking regex")
    })
}

fn code_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A reply wrapped entirely in one fenced block, optionally tagged (```text).
    RE.get_or_init(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*\n(.*?)\n?```$").expect("valid fence regex"))
}

pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Truncates to at most `max_chars` characters without splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cleans a single-shot model reply (used for translations).
pub fn clean_model_output(text: &str) -> String {
    let out = thinking_block_re().replace_all(text, "");
    let mut out = out.trim().to_string();

    if let Some(caps) = code_fence_re().captures(&out) {
        out = caps.get(1).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
    }

    // The translation prompt fences the source in triple quotes; models sometimes echo them.
    if out.len() >= 6 && out.starts_with("\"\"\"") && out.ends_with("\"\"\"") {
        out = out[3..out.len() - 3].trim().to_string();
    }

    out
}

/// Text suitable for a clipboard: non-breaking spaces become plain spaces.
pub fn copyable_text(text: &str) -> String {
    text.replace('\u{00A0}', " ")
}

/// Display paragraphs, one per line. Empty lines are kept so spacing survives.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.split('\n').map(|p| p.trim_end_matches('\r')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("اردو", 2).chars().count(), 2);
    }

    #[test]
    fn clean_output_strips_thinking_and_fences() {
        assert_eq!(clean_model_output("<thinking>plan</thinking>\nResult"), "Result");
        assert_eq!(clean_model_output("```text\nسلام\n```"), "سلام");
        assert_eq!(clean_model_output("\"\"\"\nسلام\n\"\"\""), "سلام");
        assert_eq!(clean_model_output("  plain  "), "plain");
    }

    #[test]
    fn copyable_text_replaces_nbsp() {
        assert_eq!(copyable_text("a\u{00A0}b"), "a b");
    }

    #[test]
    fn paragraphs_keep_blank_lines() {
        assert_eq!(paragraphs("one\n\ntwo\r\n"), vec!["one", "", "two", ""]);
    }
}
