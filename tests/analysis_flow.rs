use std::collections::BTreeMap;

use routine_analysis::analysis::{
    decode_for_name, estimate, extract_step, parse_at, schema_for_name, Strategy,
};
use routine_analysis::{
    decode, decode_envelope, encode, normalize, normalize_for_routine, parse, reanalyze,
    schema_for, AnalysisRecord, RoutineInfo, RoutineType, TeacherFeedbackRecord,
};

const STW_TEXT: &str = "* **See (본 것):** \"a red ball\"\n* **Think (생각한 것):** \"it rolls\"\n* **Wonder (궁금한 점):** \"why is it red\"";

// ═══════════════════════════════════════════════════════════
// Markdown extraction
// ═══════════════════════════════════════════════════════════

#[test]
fn see_think_wonder_scenario() {
    let record = parse(STW_TEXT, RoutineType::SeeThinkWonder);
    let expected: BTreeMap<String, String> = [
        ("see", "a red ball"),
        ("think", "it rolls"),
        ("wonder", "why is it red"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(record.individual_steps, expected);
}

#[test]
fn four_c_plain_keyword_uses_loose_fallback() {
    let text = "The student made one clear link.\nConnect: links to prior lesson on ecosystems\n";
    let record = parse(text, RoutineType::FourC);
    assert!(record
        .step("connect")
        .is_some_and(|s| s.contains("links to prior lesson on ecosystems")));

    let found = extract_step(text, RoutineType::FourC, "connect").unwrap();
    assert_eq!(found.strategy, Strategy::LooseKeyword);
}

#[test]
fn only_see_block_yields_one_step() {
    let record = parse("**See (본 것):** \"a red ball\"", RoutineType::SeeThinkWonder);
    assert_eq!(record.individual_steps.keys().collect::<Vec<_>>(), vec!["see"]);
}

#[test]
fn parse_is_deterministic() {
    let at = chrono::Utc::now();
    for routine in RoutineType::all() {
        assert_eq!(
            parse_at(STW_TEXT, *routine, at),
            parse_at(STW_TEXT, *routine, at)
        );
    }
}

#[test]
fn unknown_routine_name_falls_back_to_see_think_wonder() {
    let fallback: Vec<_> = schema_for_name("not-a-real-type").step_keys().collect();
    let stw: Vec<_> = schema_for_name("see-think-wonder").step_keys().collect();
    assert_eq!(fallback, stw);
}

#[test]
fn confidence_stays_in_bounds() {
    assert_eq!(estimate(""), 0.5);
    for text in [STW_TEXT, "## 1. a\n## 2. b", "z".repeat(10_000).as_str()] {
        let score = estimate(text);
        assert!((0.5..=0.95).contains(&score));
    }
}

// ═══════════════════════════════════════════════════════════
// Persisted values
// ═══════════════════════════════════════════════════════════

#[test]
fn legacy_record_decodes_directly() {
    let record = decode(r#"{"individualSteps":{"see":"x"}}"#, RoutineType::SeeThinkWonder).unwrap();
    assert_eq!(record.step("see"), Some("x"));
    assert_eq!(record.individual_steps.len(), 1);
}

#[test]
fn truncated_json_falls_through_to_markdown() {
    let raw = "{\"individualSteps\": \n**Think (생각한 것):** \"it rolls\"";
    let record = decode(raw, RoutineType::SeeThinkWonder).unwrap();
    assert_eq!(record.step("think"), Some("it rolls"));
    assert!(decode("{\"individualSteps\": ", RoutineType::SeeThinkWonder).is_some());
}

#[test]
fn encode_decode_round_trip_for_every_routine() {
    for routine in RoutineType::all() {
        let schema = schema_for(*routine);
        let mut record = AnalysisRecord::empty(*routine);
        for key in schema.step_keys() {
            record.individual_steps.insert(key.to_string(), format!("{key} analysis"));
        }
        record.comprehensive = "종합".into();

        let encoded = encode(&record, None, &RoutineInfo::new(*routine, "")).unwrap();
        assert_eq!(decode(&encoded, *routine).as_ref(), Some(&record));
        assert_eq!(decode_for_name(&encoded, routine.as_str()), Some(record));
    }
}

#[test]
fn reanalysis_keeps_teacher_feedback() {
    let routine = RoutineType::ConnectExtendChallenge;
    let info = RoutineInfo::new(routine, "student answer");
    let mut feedback = TeacherFeedbackRecord::new();
    feedback.set_step(routine, "Extend", "Push further", Some(3.0)).unwrap();

    let first = parse("**Connect (연결):** 이전 수업과 연결함", routine);
    let stored = encode(&first, Some(&feedback), &info).unwrap();

    let second = parse("**Extend (확장):** 새로운 관점을 더함", routine);
    let rewritten = reanalyze(&stored, second.clone(), info.clone()).unwrap();

    let envelope = decode_envelope(&rewritten, routine).unwrap();
    assert_eq!(envelope.ai_analysis, second);
    assert_eq!(envelope.teacher_feedback, Some(feedback));
    assert_eq!(envelope.routine_info, info);
}

// ═══════════════════════════════════════════════════════════
// Response key normalization
// ═══════════════════════════════════════════════════════════

#[test]
fn normalization_is_idempotent() {
    let inputs: Vec<Vec<(&str, &str)>> = vec![
        vec![("connect", "a"), ("challenge", "b"), ("concepts", "c"), ("changes", "d")],
        vec![("Definition", "a"), ("non-examples", "b"), ("notes", "c")],
        vec![("see", "a"), ("connect", "b"), ("fourth", "c")],
        vec![],
    ];
    for input in inputs {
        let once = normalize(input);
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
    }
}

#[test]
fn routine_native_keys_follow_schema_order() {
    let mapped = normalize_for_routine(
        RoutineType::ThinkPuzzleExplore,
        [("think", 1), ("puzzle", 2), ("explore", 3)],
    );
    let expected: BTreeMap<String, i32> = [("see", 1), ("think", 2), ("wonder", 3)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    assert_eq!(mapped, expected);
}
