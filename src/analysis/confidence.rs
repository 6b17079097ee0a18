use crate::config::{
    CONFIDENCE_BASE, CONFIDENCE_CEILING, CONFIDENCE_LONG_TEXT_CHARS,
    CONFIDENCE_VERY_LONG_TEXT_CHARS,
};

const LONG_TEXT_BONUS: f64 = 0.2;
const VERY_LONG_TEXT_BONUS: f64 = 0.1;
const STRUCTURE_BONUS: f64 = 0.2;
const FEEDBACK_MARKERS_BONUS: f64 = 0.1;

const STRENGTH_MARKERS: &[&str] = &["strengths", "강점"];
const IMPROVEMENT_MARKERS: &[&str] = &["improvement areas", "개선점", "개선할 점"];

/// Heuristic quality score for an analysis text, in `[0.5, 0.95]`.
///
/// Additive from 0.5: longer text and the presence of the expected section
/// and feedback markers each add a fixed bonus. This is not a calibrated
/// probability and must not be read as one; it never reaches 1.0.
pub fn estimate(analysis_text: &str) -> f64 {
    let length = analysis_text.chars().count();
    let lower = analysis_text.to_lowercase();
    let mut score = CONFIDENCE_BASE;

    if length > CONFIDENCE_LONG_TEXT_CHARS {
        score += LONG_TEXT_BONUS;
    }
    if length > CONFIDENCE_VERY_LONG_TEXT_CHARS {
        score += VERY_LONG_TEXT_BONUS;
    }
    if analysis_text.contains("## 1.") && analysis_text.contains("## 2.") {
        score += STRUCTURE_BONUS;
    }
    let has_any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));
    if has_any(STRENGTH_MARKERS) && has_any(IMPROVEMENT_MARKERS) {
        score += FEEDBACK_MARKERS_BONUS;
    }

    score.min(CONFIDENCE_CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_text_gets_base() {
        assert_eq!(estimate(""), 0.5);
    }

    #[test]
    fn short_plain_text_gets_base() {
        assert!(approx(estimate("The student noticed the color."), 0.5));
    }

    #[test]
    fn length_bonuses_stack() {
        assert!(approx(estimate(&"a".repeat(1001)), 0.7));
        assert!(approx(estimate(&"a".repeat(2001)), 0.8));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 600 Hangul syllables are 1800 bytes but only 600 characters
        assert!(approx(estimate(&"가".repeat(600)), 0.5));
    }

    #[test]
    fn structure_markers_need_both_sections() {
        assert!(approx(estimate("## 1. 단계별 분석\n## 2. 종합 분석"), 0.7));
        assert!(approx(estimate("## 1. 단계별 분석 only"), 0.5));
    }

    #[test]
    fn feedback_markers_need_both_terms() {
        assert!(approx(estimate("Strengths: clear. Improvement areas: evidence."), 0.6));
        assert!(approx(estimate("강점: 구체적 관찰. 개선점: 근거 부족."), 0.6));
        assert!(approx(estimate("Strengths only"), 0.5));
    }

    #[test]
    fn capped_below_one() {
        let text = format!(
            "## 1. a\n## 2. b\nStrengths and improvement areas\n{}",
            "x".repeat(3000)
        );
        assert!(approx(estimate(&text), 0.95));
    }

    #[test]
    fn always_within_bounds() {
        for text in ["", "x", "## 1.", "y".repeat(5000).as_str()] {
            let score = estimate(text);
            assert!((0.5..=0.95).contains(&score), "{score}");
        }
    }
}
