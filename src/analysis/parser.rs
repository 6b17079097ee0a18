use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::confidence::estimate;
use super::patterns::{patterns_for, Strategy};
use super::registry::schema_for;
use super::sanitize::prepare_analysis_text;
use super::sections::{extract_section, OverviewSection};
use super::types::AnalysisRecord;
use crate::models::enums::RoutineType;

/// Text captured for one step and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMatch {
    pub strategy: Strategy,
    pub text: String,
}

/// Parse free-text model output into an analysis record, stamped now.
pub fn parse(raw_text: &str, routine: RoutineType) -> AnalysisRecord {
    parse_at(raw_text, routine, Utc::now())
}

/// `parse` for a raw routine identifier (unknown → See-Think-Wonder).
pub fn parse_for_name(raw_text: &str, routine: &str) -> AnalysisRecord {
    parse(raw_text, RoutineType::resolve(routine))
}

/// Deterministic core of `parse`: identical input gives an identical record.
pub fn parse_at(raw_text: &str, routine: RoutineType, analyzed_at: DateTime<Utc>) -> AnalysisRecord {
    let text = prepare_analysis_text(raw_text);
    let individual_steps = extract_steps(&text, routine);

    tracing::debug!(
        routine = %routine,
        input_chars = text.chars().count(),
        extracted = individual_steps.len(),
        expected = schema_for(routine).steps.len(),
        "Parsed markdown analysis"
    );

    AnalysisRecord {
        individual_steps,
        step_by_step: extract_section(&text, OverviewSection::StepByStep),
        comprehensive: extract_section(&text, OverviewSection::Comprehensive),
        educational: extract_section(&text, OverviewSection::Educational),
        confidence: estimate(raw_text),
        analyzed_at: Some(analyzed_at),
        routine_type: routine,
    }
}

/// Run every step's matcher cascade. Steps with no match are omitted.
pub fn extract_steps(text: &str, routine: RoutineType) -> BTreeMap<String, String> {
    schema_for(routine)
        .step_keys()
        .filter_map(|key| {
            let found = extract_step(text, routine, key);
            if found.is_none() {
                tracing::debug!(routine = %routine, step = key, "No matcher produced text for step");
            }
            found.map(|m| (key.to_string(), m.text))
        })
        .collect()
}

/// First matcher, in priority order, that yields non-empty text for a step.
pub fn extract_step(text: &str, routine: RoutineType, step_key: &str) -> Option<StepMatch> {
    patterns_for(routine, step_key).iter().find_map(|matcher| {
        matcher.apply(text).map(|captured| StepMatch {
            strategy: matcher.strategy(),
            text: captured,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STW_SAMPLE: &str = "* **See (본 것):** \"a red ball\"\n* **Think (생각한 것):** \"it rolls\"\n* **Wonder (궁금한 점):** \"why is it red\"";

    #[test]
    fn see_think_wonder_quoted_labels() {
        let record = parse(STW_SAMPLE, RoutineType::SeeThinkWonder);
        assert_eq!(record.step("see"), Some("a red ball"));
        assert_eq!(record.step("think"), Some("it rolls"));
        assert_eq!(record.step("wonder"), Some("why is it red"));
        assert_eq!(record.individual_steps.len(), 3);
        assert_eq!(record.routine_type, RoutineType::SeeThinkWonder);
        assert!(record.analyzed_at.is_some());
    }

    #[test]
    fn four_c_loose_keyword_fallback() {
        let text = "Overall the response is thoughtful.\nConnect: links to prior lesson on ecosystems";
        let found = extract_step(text, RoutineType::FourC, "connect").unwrap();
        assert_eq!(found.strategy, Strategy::LooseKeyword);
        assert!(found.text.contains("links to prior lesson on ecosystems"));
    }

    #[test]
    fn missing_steps_are_absent_not_empty() {
        let record = parse("**See (본 것):** \"a tall tree\"", RoutineType::SeeThinkWonder);
        assert_eq!(record.individual_steps.len(), 1);
        assert_eq!(record.step("see"), Some("a tall tree"));
        assert!(!record.individual_steps.contains_key("think"));
        assert!(!record.individual_steps.contains_key("wonder"));
    }

    #[test]
    fn parse_is_deterministic_apart_from_timestamp() {
        let at = Utc::now();
        let first = parse_at(STW_SAMPLE, RoutineType::SeeThinkWonder, at);
        let second = parse_at(STW_SAMPLE, RoutineType::SeeThinkWonder, at);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn full_report_with_sections() {
        let text = "## 1. 단계별 분석\n\
### Definition (정의)\n개념을 정확히 정의했습니다.\n\
### Characteristics (특징)\n특징을 세 가지 제시했습니다.\n\
## 2. 종합 분석\n강점: 정확한 정의. 개선점: 사례 부족.\n\
## 3. 교육적 권장사항\n비예시를 더 찾아보게 하세요.";
        let record = parse(text, RoutineType::FrayerModel);
        assert_eq!(record.step("definition"), Some("개념을 정확히 정의했습니다."));
        assert_eq!(record.step("characteristics"), Some("특징을 세 가지 제시했습니다."));
        assert!(record.step("examples").is_none());
        assert!(record.step_by_step.contains("### Definition (정의)"));
        assert_eq!(record.comprehensive, "강점: 정확한 정의. 개선점: 사례 부족.");
        assert_eq!(record.educational, "비예시를 더 찾아보게 하세요.");
        // base + structure + feedback markers
        assert!((record.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn last_bold_step_does_not_swallow_overview_sections() {
        let text = "## 1. 단계별 분석\n\
* **See (본 것):** 관찰이 구체적입니다.\n\
* **Think (생각한 것):** 추론이 타당합니다.\n\
* **Wonder (궁금한 점):** 질문이 좋습니다.\n\n\
## 2. 종합 분석\n전체적으로 논리적입니다.\n\n\
## 3. 교육적 권장사항\n관찰 일지를 써보세요.";
        let record = parse(text, RoutineType::SeeThinkWonder);
        assert_eq!(record.step("see"), Some("관찰이 구체적입니다."));
        assert_eq!(record.step("think"), Some("추론이 타당합니다."));
        assert_eq!(record.step("wonder"), Some("질문이 좋습니다."));
        assert_eq!(record.comprehensive, "전체적으로 논리적입니다.");
        assert_eq!(record.educational, "관찰 일지를 써보세요.");
    }

    #[test]
    fn unknown_routine_name_uses_default_schema() {
        let record = parse_for_name(STW_SAMPLE, "not-a-real-type");
        assert_eq!(record.routine_type, RoutineType::SeeThinkWonder);
        assert_eq!(record.step("think"), Some("it rolls"));
    }

    #[test]
    fn invisible_characters_do_not_break_labels() {
        let record = parse("**Se\u{200B}e (본 것):** \"a red ball\"", RoutineType::SeeThinkWonder);
        assert_eq!(record.step("see"), Some("a red ball"));
    }

    #[test]
    fn used_to_think_bold_blocks() {
        let text = "* **Used to Think (이전 생각):** 식물은 흙을 먹는다고 생각함\n* **Now Think (현재 생각):** 광합성으로 양분을 만든다고 이해함";
        let record = parse(text, RoutineType::UsedToThinkNowThink);
        assert_eq!(record.step("used_to_think"), Some("식물은 흙을 먹는다고 생각함"));
        assert_eq!(record.step("now_think"), Some("광합성으로 양분을 만든다고 이해함"));
    }

    #[test]
    fn empty_text_yields_empty_record() {
        let record = parse("", RoutineType::CircleOfViewpoints);
        assert!(record.is_empty());
        assert_eq!(record.confidence, 0.5);
    }
}
