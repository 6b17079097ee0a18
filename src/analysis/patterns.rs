//! Per-step matcher lists for pulling one step's critique out of model output.
//!
//! Each (routine, step) pair gets four matchers, most specific first:
//!
//! 1. `**Label:** "quoted"`: only the quoted span
//! 2. `**Label:** text`: up to the next bold label, heading, or end of text
//! 3. `### Label`: up to the next heading of the same or higher level
//! 4. `Label: text`: loose keyword ending a word, bounded, up to the next
//!    step keyword
//!
//! Label spellings come from the registry. Matching is case-insensitive,
//! tolerates any run of spaces/`_`/`-` inside a label, an optional
//! parenthetical after it ("See (본 것)"), and a trailing Korean particle.
//! All tables are compiled once and shared read-only.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::registry::{schema_for, StepDefinition, StepSchema};
use super::sanitize::{clean_captured_text, truncate_chars};
use super::sections::heading_block;
use crate::config::LOOSE_CAPTURE_MAX_CHARS;
use crate::models::enums::RoutineType;

/// Particles that may trail a Korean label ("본 것은", "궁금한 점이").
const KOREAN_PARTICLES: &str = "(?:은|는|이|가|을|를|의|에서|으로|로)?";

/// Extraction strategies in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strategy {
    QuotedBoldLabel,
    BoldLabel,
    Heading,
    LooseKeyword,
}

/// A compiled candidate for one step.
#[derive(Debug)]
pub enum Matcher {
    QuotedBoldLabel(Regex),
    BoldLabel(Regex),
    Heading(Regex),
    LooseKeyword {
        label: Regex,
        /// Other steps' keywords in label position, or a heading.
        terminator: Option<Regex>,
    },
}

/// Any bold label (`**X:**` or `**X**:`); ends a strategy-2 capture.
static BOLD_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*[^*\n]{1,80}?(?::[ \t]*\*\*|\*\*[ \t]*:)").expect("valid regex")
});

/// Start of any markdown heading line.
static HEADING_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}[ \t]").expect("valid regex"));

impl Matcher {
    pub fn strategy(&self) -> Strategy {
        match self {
            Matcher::QuotedBoldLabel(_) => Strategy::QuotedBoldLabel,
            Matcher::BoldLabel(_) => Strategy::BoldLabel,
            Matcher::Heading(_) => Strategy::Heading,
            Matcher::LooseKeyword { .. } => Strategy::LooseKeyword,
        }
    }

    /// Cleaned text of the first occurrence that yields anything non-empty.
    pub fn apply(&self, text: &str) -> Option<String> {
        match self {
            Matcher::QuotedBoldLabel(re) => re
                .captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .find_map(|quoted| clean_captured_text(quoted.as_str())),
            Matcher::BoldLabel(re) => re.find_iter(text).find_map(|label| {
                let rest = &text[label.end()..];
                let end = [&*BOLD_LABEL, &*HEADING_START]
                    .iter()
                    .filter_map(|re| re.find(rest).map(|next| next.start()))
                    .min()
                    .unwrap_or(rest.len());
                clean_captured_text(&rest[..end])
            }),
            Matcher::Heading(re) => re.captures_iter(text).find_map(|caps| {
                let level = caps.get(1)?.as_str().len();
                let line = caps.get(0)?;
                clean_captured_text(heading_block(text, line.end(), level))
            }),
            Matcher::LooseKeyword { label, terminator } => label.find_iter(text).find_map(|m| {
                let rest = &text[m.end()..];
                let end = terminator
                    .as_ref()
                    .and_then(|t| t.find(rest))
                    .map_or(rest.len(), |next| next.start());
                clean_captured_text(truncate_chars(&rest[..end], LOOSE_CAPTURE_MAX_CHARS))
            }),
        }
    }
}

static PATTERN_TABLE: LazyLock<HashMap<(RoutineType, &'static str), Vec<Matcher>>> =
    LazyLock::new(|| {
        let mut table = HashMap::new();
        for routine in RoutineType::all() {
            let schema = schema_for(*routine);
            for step in schema.steps {
                table.insert((*routine, step.key), compile_step_patterns(schema, step));
            }
        }
        table
    });

/// Ordered matchers for a step; empty when `step_key` is not in the schema.
pub fn patterns_for(routine: RoutineType, step_key: &str) -> &'static [Matcher] {
    let schema = schema_for(routine);
    match schema.step(step_key) {
        Some(step) => PATTERN_TABLE
            .get(&(routine, step.key))
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        None => &[],
    }
}

/// Build the four matchers for one step of a schema.
pub fn compile_step_patterns(schema: &StepSchema, step: &StepDefinition) -> Vec<Matcher> {
    let all_spellings = label_alternation(&spellings(step, true));
    let keywords = label_alternation(&spellings(step, false));

    let bold_prefix = format!(
        r"\*\*[ \t]*(?:\d+[.)][ \t]*)?(?:{all_spellings})(?:[ \t]*\([^)\n]*\))?[ \t]*:?[ \t]*\*\*[ \t]*:?[ \t]*"
    );

    let quoted = format!(r#"(?i){bold_prefix}["“]([^"”]*)["”]"#);
    let heading = format!(
        r"(?im)^(#{{1,6}})[ \t]*(?:\d+[.)][ \t]*)?(?:\*\*)?[ \t]*(?:{all_spellings})[^\n]*$"
    );
    let loose = format!(
        r"(?im)(?:^|[^\w-])(?:{keywords})(?:[ \t]*\([^)\n]*\))?(?:[ \t]*:[ \t]*|[ \t]+|$|[^\w])"
    );

    vec![
        Matcher::QuotedBoldLabel(compile(&quoted)),
        Matcher::BoldLabel(compile(&format!("(?i){bold_prefix}"))),
        Matcher::Heading(compile(&heading)),
        Matcher::LooseKeyword {
            label: compile(&loose),
            terminator: loose_terminator(schema, step),
        },
    ]
}

/// Keywords of every other step in label position (line start or followed by
/// a colon), or any markdown heading.
fn loose_terminator(schema: &StepSchema, step: &StepDefinition) -> Option<Regex> {
    let others: Vec<&str> = schema
        .steps
        .iter()
        .filter(|other| other.key != step.key)
        .flat_map(|other| spellings(other, false))
        .collect();
    if others.is_empty() {
        return None;
    }
    let alternation = label_alternation(&others);
    Some(compile(&format!(
        r"(?im)^[ \t]*(?:[*\-•][ \t]*)?(?:\*\*)?[ \t]*(?:\d+[.)][ \t]*)?(?:{alternation})(?:[^\w]|$)|(?:^|[^\w-])(?:{alternation})(?:[ \t]*\([^)\n]*\))?[ \t]*:|^#{{1,6}}[ \t]"
    )))
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("step pattern built from registry data must compile")
}

/// English and Korean keywords, plus aliases when `with_aliases`.
fn spellings(step: &StepDefinition, with_aliases: bool) -> Vec<&'static str> {
    let mut out = vec![step.english, step.korean];
    if with_aliases {
        out.extend_from_slice(step.aliases);
    }
    out
}

/// Regex alternation of label spellings, longest first so that a longer
/// spelling is preferred where two share a prefix.
pub(crate) fn label_alternation(spellings: &[&str]) -> String {
    let mut sorted: Vec<&str> = spellings.to_vec();
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    sorted.dedup();
    sorted
        .iter()
        .map(|s| spelling_pattern(s))
        .collect::<Vec<_>>()
        .join("|")
}

/// Pattern for one spelling: separators become `[\s_-]*`; English words get a
/// trailing word boundary, Korean labels an optional particle.
pub(crate) fn spelling_pattern(spelling: &str) -> String {
    let mut pattern = String::new();
    let mut in_separator = false;
    for c in spelling.trim().chars() {
        if c.is_whitespace() || c == '-' || c == '_' {
            if !in_separator {
                pattern.push_str(r"[\s_-]*");
                in_separator = true;
            }
            continue;
        }
        in_separator = false;
        pattern.push_str(&regex::escape(&c.to_string()));
    }

    if spelling.is_ascii() {
        pattern.push_str(r"\b");
    } else {
        pattern.push_str(KOREAN_PARTICLES);
    }
    pattern
}
