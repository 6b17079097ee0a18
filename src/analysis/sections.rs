//! Routine-agnostic overview sections of an analysis: step-by-step,
//! comprehensive, educational.

use std::sync::LazyLock;

use regex::Regex;

use super::patterns::label_alternation;
use super::sanitize::clean_captured_text;

/// Any markdown heading line; group 1 is the run of `#`.
static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]").expect("valid regex"));

/// The three overview sections, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewSection {
    StepByStep,
    Comprehensive,
    Educational,
}

impl OverviewSection {
    /// Number used in the `## N.` heading form.
    pub fn number(&self) -> u8 {
        match self {
            Self::StepByStep => 1,
            Self::Comprehensive => 2,
            Self::Educational => 3,
        }
    }

    /// Heading titles accepted for the section, Korean and English.
    pub fn titles(&self) -> &'static [&'static str] {
        match self {
            Self::StepByStep => &["단계별 분석", "단계별 평가", "Step-by-Step Analysis"],
            Self::Comprehensive => &["종합 분석", "종합 평가", "Comprehensive Analysis", "Overall Analysis"],
            Self::Educational => &[
                "교육적 권장사항",
                "교육적 제안",
                "교육적 피드백",
                "Educational Recommendations",
                "Educational Suggestions",
            ],
        }
    }
}

/// Sub-sections composed into the comprehensive text when the model emits
/// no single "종합 분석" block.
const COMPREHENSIVE_PARTS: &[&str] = &[
    "논리적 연결성",
    "사고의 깊이",
    "개선점과 건설적 피드백",
    "추가 활동 제안",
];

struct SectionMatchers {
    numbered: Regex,
    titled: Regex,
}

static SECTION_MATCHERS: LazyLock<[SectionMatchers; 3]> = LazyLock::new(|| {
    [
        OverviewSection::StepByStep,
        OverviewSection::Comprehensive,
        OverviewSection::Educational,
    ]
    .map(|section| SectionMatchers {
        numbered: Regex::new(&format!(r"(?m)^(##)[ \t]*{}\.[^\n]*$", section.number()))
            .expect("valid regex"),
        titled: Regex::new(&format!(
            r"(?im)^(#{{1,3}})[ \t]*(?:\d+\.[ \t]*)?[^\n]*?(?:{})[^\n]*$",
            label_alternation(section.titles())
        ))
        .expect("valid regex"),
    })
});

static PART_MATCHERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    COMPREHENSIVE_PARTS
        .iter()
        .map(|title| {
            let pattern = format!(
                r"(?im)^(#{{1,6}})[ \t]*(?:\d+\.[ \t]*)?[^\n]*?(?:{})[^\n]*$",
                label_alternation(&[*title])
            );
            (*title, Regex::new(&pattern).expect("valid regex"))
        })
        .collect()
});

/// Body that follows a heading ending at `body_start`, up to the next heading
/// of level `level` or higher (fewer `#`), or end of text.
pub(crate) fn heading_block(text: &str, body_start: usize, level: usize) -> &str {
    let rest = &text[body_start..];
    let end = HEADING_LINE
        .captures_iter(rest)
        .filter_map(|caps| {
            let hashes = caps.get(1)?;
            (hashes.as_str().len() <= level).then(|| hashes.start())
        })
        .find(|start| *start > 0)
        .unwrap_or(rest.len());
    &rest[..end]
}

/// First non-empty block under a heading matched by `re`.
fn block_under(text: &str, re: &Regex) -> Option<String> {
    re.captures_iter(text).find_map(|caps| {
        let level = caps.get(1)?.as_str().len();
        let line = caps.get(0)?;
        clean_captured_text(heading_block(text, line.end(), level))
    })
}

/// Extract one overview section; empty string when absent.
pub fn extract_section(text: &str, section: OverviewSection) -> String {
    let matchers = &SECTION_MATCHERS[section as usize];
    let found = block_under(text, &matchers.numbered).or_else(|| block_under(text, &matchers.titled));

    match (found, section) {
        (Some(body), _) => body,
        (None, OverviewSection::Comprehensive) => compose_comprehensive(text).unwrap_or_default(),
        (None, _) => String::new(),
    }
}

/// Join whichever comprehensive sub-sections are present, each under its
/// own heading.
fn compose_comprehensive(text: &str) -> Option<String> {
    let parts: Vec<String> = PART_MATCHERS
        .iter()
        .filter_map(|(title, re)| block_under(text, re).map(|body| format!("### {title}\n{body}")))
        .collect();

    if parts.is_empty() {
        None
    } else {
        tracing::debug!(parts = parts.len(), "Composed comprehensive section from sub-sections");
        Some(parts.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "## 1. 단계별 분석\n### See (본 것)\n관찰이 구체적입니다.\n\n## 2. 종합 분석\n전체적으로 논리적입니다.\n### 사고의 깊이\n깊이가 있습니다.\n\n## 3. 교육적 권장사항\n관찰 일지를 써보세요.";

    #[test]
    fn numbered_sections_extracted() {
        let step = extract_section(FULL, OverviewSection::StepByStep);
        assert!(step.contains("관찰이 구체적입니다."));
        assert!(!step.contains("전체적으로"));

        let comp = extract_section(FULL, OverviewSection::Comprehensive);
        assert!(comp.starts_with("전체적으로 논리적입니다."));
        assert!(comp.contains("깊이가 있습니다."));
        assert!(!comp.contains("관찰 일지"));

        assert_eq!(extract_section(FULL, OverviewSection::Educational), "관찰 일지를 써보세요.");
    }

    #[test]
    fn titled_sections_without_numbers() {
        let text = "# 종합 평가\nSolid reasoning.\n# Educational Suggestions\nTry a journal.";
        assert_eq!(extract_section(text, OverviewSection::Comprehensive), "Solid reasoning.");
        assert_eq!(extract_section(text, OverviewSection::Educational), "Try a journal.");
    }

    #[test]
    fn comprehensive_composed_from_parts() {
        let text = "### 논리적 연결성\n연결이 자연스럽습니다.\n### 개선점과 건설적 피드백\n근거를 더 제시하세요.";
        let comp = extract_section(text, OverviewSection::Comprehensive);
        assert_eq!(
            comp,
            "### 논리적 연결성\n연결이 자연스럽습니다.\n\n### 개선점과 건설적 피드백\n근거를 더 제시하세요."
        );
    }

    #[test]
    fn missing_sections_are_empty() {
        assert_eq!(extract_section("no headings here", OverviewSection::StepByStep), "");
        assert_eq!(extract_section("no headings here", OverviewSection::Comprehensive), "");
    }

    #[test]
    fn numbered_form_needs_level_two() {
        let text = "### 1. See\nnot the overview";
        assert_eq!(extract_section(text, OverviewSection::StepByStep), "");
    }

    #[test]
    fn heading_block_stops_at_same_level() {
        let text = "## A\nbody\n### sub\nsub body\n## B\nafter";
        let start = text.find('\n').unwrap();
        assert_eq!(heading_block(text, start, 2), "\nbody\n### sub\nsub body\n");
    }
}
