// Input hygiene for model output before matching, and cleanup of captured
// step text before it is stored or rendered.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::MAX_ANALYSIS_INPUT_CHARS;

/// Prepare raw model output for matching: unify line endings, remove
/// invisible characters, bound the length.
pub fn prepare_analysis_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let visible = remove_invisible_chars(&unified);
    truncate_chars(&visible, MAX_ANALYSIS_INPUT_CHARS).to_string()
}

/// Remove invisible Unicode characters that break label matching
/// ("Se\u{200B}e" must still read as "See").
/// Preserves standard whitespace (space, newline, tab).
fn remove_invisible_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            if *c == ' ' || *c == '\n' || *c == '\t' {
                return true;
            }
            if matches!(
                *c,
                '\u{200B}'  // Zero-width space
                | '\u{200C}' // Zero-width non-joiner
                | '\u{200D}' // Zero-width joiner
                | '\u{200E}' // Left-to-right mark
                | '\u{200F}' // Right-to-left mark
                | '\u{202A}'..='\u{202E}' // Directional embeddings/overrides
                | '\u{2060}'..='\u{2064}' // Word joiner, invisible operators
                | '\u{FEFF}' // BOM / zero-width no-break space
            ) {
                return false;
            }
            !c.is_control()
        })
        .collect()
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Clean a captured step body: drop lines that bleed in from the next
/// section, strip surrounding emphasis markers and whitespace, remove
/// unsafe HTML. Returns `None` when nothing is left.
pub fn clean_captured_text(raw: &str) -> Option<String> {
    let mut lines: Vec<&str> = raw.lines().map(str::trim_end).collect();

    while let Some(last) = lines.last() {
        if last.trim().is_empty() || is_bleed_line(last) {
            lines.pop();
        } else {
            break;
        }
    }

    let joined = collapse_blank_lines(&lines);
    let stripped = strip_wrapping_emphasis(joined.trim()).trim();
    let safe = sanitize_markdown_output(stripped);
    let safe = safe.trim();

    if safe.is_empty() {
        None
    } else {
        Some(safe.to_string())
    }
}

/// Remove one emphasis run wrapping the whole text (`**text**`, `*text*`).
/// Emphasis inside the text is left alone.
fn strip_wrapping_emphasis(text: &str) -> &str {
    if text.chars().all(|c| c == '*') {
        return "";
    }
    for marker in ["***", "**", "*"] {
        if let Some(inner) = text.strip_prefix(marker).and_then(|t| t.strip_suffix(marker)) {
            if !inner.contains(marker) {
                return inner;
            }
        }
    }
    text
}

/// A trailing line that belongs to whatever follows the captured block:
/// a bare list marker left by the next bullet, a heading, or a rule.
fn is_bleed_line(line: &str) -> bool {
    static BLEED: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^\s*(?:[*\-•+]\s*(?:\*\*)?\s*|#{1,6}(?:\s.*)?|(?:-{3,}|\*{3,}|_{3,}))$")
            .expect("valid regex")
    });
    BLEED.is_match(line)
}

/// Collapse runs of blank lines to a single blank line.
fn collapse_blank_lines(lines: &[&str]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut prev_blank = false;
    for line in lines {
        let blank = line.trim().is_empty();
        if blank && prev_blank {
            continue;
        }
        out.push(if blank { "" } else { line });
        prev_blank = blank;
    }
    out.join("\n")
}

// ═══════════════════════════════════════════════════════════════════════
// OUTPUT SANITIZATION — Strip XSS vectors from model-generated markdown
// ═══════════════════════════════════════════════════════════════════════

/// Strip script-capable HTML from model markdown while preserving plain
/// Markdown, so extracted text can be rendered as-is.
pub fn sanitize_markdown_output(markdown: &str) -> String {
    static BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<(script|style|iframe)\b[^>]*>.*?</(?:script|style|iframe)\s*>")
            .expect("valid regex")
    });
    static TAGS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)</?(?:script|style|iframe|object|embed|applet|form|input|textarea|button|select|meta|link|base|svg|math)\b[^>]*>",
        )
        .expect("valid regex")
    });
    static EVENT_HANDLERS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)\son[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).expect("valid regex")
    });
    static JS_URIS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").expect("valid regex"));

    if !markdown.contains('<') && !markdown.to_lowercase().contains("javascript") {
        return markdown.to_string();
    }

    let cleaned = BLOCKS.replace_all(markdown, "");
    let cleaned = TAGS.replace_all(&cleaned, "");
    let cleaned = EVENT_HANDLERS.replace_all(&cleaned, "");
    JS_URIS.replace_all(&cleaned, "").into_owned()
}
