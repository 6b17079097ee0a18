//! Read any persisted analysis value (current envelope, legacy bare record,
//! or markdown) into the canonical record; write only the current envelope.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::parser::parse;
use super::registry::schema_for;
use super::types::{
    AnalysisRecord, RawAnalysisInput, RoutineInfo, StepFeedback, StoredEnvelope, TeacherFeedbackRecord,
};
use super::AnalysisError;
use crate::config::CONFIDENCE_BASE;
use crate::models::enums::RoutineType;

/// Record fields as found in storage. Only `individualSteps` is required;
/// everything else is read leniently.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordFields {
    individual_steps: BTreeMap<String, serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    step_by_step: String,
    #[serde(default, deserialize_with = "lenient_string")]
    comprehensive: String,
    #[serde(default, deserialize_with = "lenient_string")]
    educational: String,
    #[serde(default)]
    confidence: Option<serde_json::Value>,
    #[serde(default)]
    analyzed_at: Option<serde_json::Value>,
    #[serde(default)]
    routine_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeFields {
    ai_analysis: RecordFields,
    #[serde(default)]
    teacher_feedback: Option<serde_json::Value>,
    #[serde(default)]
    routine_info: Option<serde_json::Value>,
}

/// Known persisted JSON shapes, tried in order.
#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedShape {
    Envelope(EnvelopeFields),
    Legacy(RecordFields),
}

/// Borrowing mirror of `StoredEnvelope` for encoding without clones.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a> {
    ai_analysis: &'a AnalysisRecord,
    teacher_feedback: Option<&'a TeacherFeedbackRecord>,
    routine_info: &'a RoutineInfo,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}

/// Decode a persisted value into an analysis record.
///
/// Empty input gives `None`. JSON that does not parse, or parses into no
/// known shape, is re-read as markdown; nothing here fails.
pub fn decode(raw: &str, routine: RoutineType) -> Option<AnalysisRecord> {
    decode_envelope(raw, routine).map(|envelope| envelope.ai_analysis)
}

/// `decode` for a raw routine identifier (unknown → See-Think-Wonder).
pub fn decode_for_name(raw: &str, routine: &str) -> Option<AnalysisRecord> {
    decode(raw, RoutineType::resolve(routine))
}

/// Like `decode`, but keeps teacher feedback and routine info. Legacy and
/// markdown values come back wrapped in an envelope without feedback.
pub fn decode_envelope(raw: &str, routine: RoutineType) -> Option<StoredEnvelope> {
    match RawAnalysisInput::classify(raw) {
        None => {
            tracing::debug!(routine = %routine, "Empty analysis input, nothing to decode");
            None
        }
        Some(RawAnalysisInput::Json(json)) => match decode_json_envelope(json, routine) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::debug!(
                    routine = %routine,
                    error = %e,
                    "JSON analysis not decodable, falling back to markdown parsing"
                );
                Some(markdown_envelope(raw, routine))
            }
        },
        Some(RawAnalysisInput::Markdown(text)) => Some(markdown_envelope(text, routine)),
    }
}

/// Strict JSON decode: errors instead of falling back to markdown.
pub fn decode_json_envelope(json: &str, routine: RoutineType) -> Result<StoredEnvelope, AnalysisError> {
    if json.trim().is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| AnalysisError::JsonParsing(e.to_string()))?;

    // Only objects can carry either shape; arrays and scalars are rejected
    // before serde gets a chance to read a struct from a sequence.
    let shape = match value {
        serde_json::Value::Object(_) => {
            serde_json::from_value::<PersistedShape>(value).map_err(|_| AnalysisError::UnrecognizedEnvelope)?
        }
        _ => return Err(AnalysisError::UnrecognizedEnvelope),
    };

    Ok(match shape {
        PersistedShape::Envelope(fields) => {
            let info = fields
                .routine_info
                .and_then(|v| lenient_value::<RoutineInfo>(v, "routineInfo"));
            let envelope_routine = info.as_ref().map_or(routine, |i| i.routine_type);
            let ai_analysis = into_record(fields.ai_analysis, envelope_routine);
            let routine_info =
                info.unwrap_or_else(|| RoutineInfo::new(ai_analysis.routine_type, String::new()));
            StoredEnvelope {
                teacher_feedback: fields.teacher_feedback.and_then(decode_feedback),
                routine_info,
                ai_analysis,
            }
        }
        PersistedShape::Legacy(fields) => {
            tracing::debug!(routine = %routine, "Decoded legacy bare analysis record");
            let ai_analysis = into_record(fields, routine);
            StoredEnvelope {
                routine_info: RoutineInfo::new(ai_analysis.routine_type, String::new()),
                teacher_feedback: None,
                ai_analysis,
            }
        }
    })
}

fn markdown_envelope(text: &str, routine: RoutineType) -> StoredEnvelope {
    StoredEnvelope {
        ai_analysis: parse(text, routine),
        teacher_feedback: None,
        routine_info: RoutineInfo::new(routine, String::new()),
    }
}

/// Deserialize an optional envelope part; a malformed part is dropped.
fn lenient_value<T: DeserializeOwned>(value: serde_json::Value, part: &str) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!(part, error = %e, "Ignoring malformed envelope part");
            None
        }
    }
}

/// Build a canonical record. Step keys are matched against the record's
/// routine schema; non-string, blank and foreign entries are skipped.
fn into_record(fields: RecordFields, fallback_routine: RoutineType) -> AnalysisRecord {
    let routine = fields
        .routine_type
        .as_deref()
        .map_or(fallback_routine, RoutineType::resolve);
    let schema = schema_for(routine);

    let mut individual_steps = BTreeMap::new();
    for (key, value) in fields.individual_steps {
        let text = match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => s,
            _ => continue,
        };
        match schema.canonical_key(&key) {
            Some(canonical) => {
                individual_steps.insert(canonical.to_string(), text);
            }
            None => {
                tracing::debug!(routine = %routine, step = %key, "Dropping step not in routine schema");
            }
        }
    }

    AnalysisRecord {
        individual_steps,
        step_by_step: fields.step_by_step,
        comprehensive: fields.comprehensive,
        educational: fields.educational,
        confidence: fields
            .confidence
            .and_then(|v| v.as_f64())
            .unwrap_or(CONFIDENCE_BASE),
        analyzed_at: fields
            .analyzed_at
            .as_ref()
            .and_then(|v| v.as_str())
            .and_then(parse_timestamp),
        routine_type: routine,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ═══════════════════════════════════════════════════════════
// Teacher feedback
// ═══════════════════════════════════════════════════════════

/// Read teacher feedback entry by entry: a malformed step entry is skipped,
/// a numeric string score is coerced, and a missing `feedbackAt` is stamped
/// now. Only a non-object value yields `None`.
fn decode_feedback(value: serde_json::Value) -> Option<TeacherFeedbackRecord> {
    let mut fields = match value {
        serde_json::Value::Null => return None,
        serde_json::Value::Object(fields) => fields,
        _ => {
            tracing::warn!("Teacher feedback is not an object, leaving it undecoded");
            return None;
        }
    };

    let feedback_at = fields
        .get("feedbackAt")
        .and_then(|v| v.as_str())
        .and_then(parse_timestamp)
        .unwrap_or_else(|| {
            tracing::debug!("Teacher feedback has no readable feedbackAt, stamping now");
            Utc::now()
        });

    let mut individual_steps = BTreeMap::new();
    if let Some(serde_json::Value::Object(steps)) = fields.remove("individualSteps") {
        for (key, entry) in steps {
            match step_feedback(entry) {
                Some(feedback) => {
                    individual_steps.insert(key, feedback);
                }
                None => {
                    tracing::warn!(step = %key, "Skipping unreadable teacher feedback entry");
                }
            }
        }
    }

    Some(TeacherFeedbackRecord {
        individual_steps,
        feedback_at,
    })
}

fn step_feedback(entry: serde_json::Value) -> Option<StepFeedback> {
    match entry {
        serde_json::Value::String(feedback) if !feedback.trim().is_empty() => {
            Some(StepFeedback { feedback, score: None })
        }
        serde_json::Value::Object(fields) => {
            let feedback = fields
                .get("feedback")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let score = fields.get("score").and_then(lenient_score);
            (!feedback.is_empty() || score.is_some()).then_some(StepFeedback { feedback, score })
        }
        _ => None,
    }
}

/// Scores arrive as numbers, or as numeric strings from form input.
fn lenient_score(value: &serde_json::Value) -> Option<f64> {
    let score = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    score.is_finite().then_some(score)
}

/// Raw `teacherFeedback` of a stored envelope, whatever its shape.
fn stored_feedback_value(raw: &str) -> Option<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
    value
        .get("teacherFeedback")
        .filter(|feedback| !feedback.is_null())
        .cloned()
}

/// Serialize the current envelope shape. This is the only format written.
pub fn encode(
    record: &AnalysisRecord,
    feedback: Option<&TeacherFeedbackRecord>,
    routine_info: &RoutineInfo,
) -> Result<String, AnalysisError> {
    let envelope = EnvelopeRef {
        ai_analysis: record,
        teacher_feedback: feedback,
        routine_info,
    };
    Ok(serde_json::to_string(&envelope)?)
}

pub fn encode_envelope(envelope: &StoredEnvelope) -> Result<String, AnalysisError> {
    encode(
        &envelope.ai_analysis,
        envelope.teacher_feedback.as_ref(),
        &envelope.routine_info,
    )
}

/// Encode a fresh analysis over a previously stored value, carrying its
/// teacher feedback forward. Feedback that cannot be decoded at all is
/// written back verbatim rather than dropped.
pub fn reanalyze(
    existing_raw: &str,
    record: AnalysisRecord,
    routine_info: RoutineInfo,
) -> Result<String, AnalysisError> {
    let previous = decode_envelope(existing_raw, routine_info.routine_type);
    let undecoded_feedback = match &previous {
        Some(StoredEnvelope {
            teacher_feedback: None,
            ..
        }) => stored_feedback_value(existing_raw),
        _ => None,
    };

    let envelope = match previous {
        Some(previous) => StoredEnvelope {
            routine_info,
            ..previous
        }
        .replace_analysis(record),
        None => StoredEnvelope {
            ai_analysis: record,
            teacher_feedback: None,
            routine_info,
        },
    };

    match undecoded_feedback {
        None => encode_envelope(&envelope),
        Some(raw_feedback) => {
            tracing::warn!(
                routine = %envelope.routine_info.routine_type,
                "Carrying undecodable teacher feedback forward verbatim"
            );
            let mut value = serde_json::to_value(EnvelopeRef {
                ai_analysis: &envelope.ai_analysis,
                teacher_feedback: None,
                routine_info: &envelope.routine_info,
            })?;
            value["teacherFeedback"] = raw_feedback;
            Ok(serde_json::to_string(&value)?)
        }
    }
}
