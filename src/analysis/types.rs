use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::registry::schema_for;
use super::AnalysisError;
use crate::config::CONFIDENCE_BASE;
use crate::models::enums::RoutineType;

/// Canonical result of analysing one student submission.
///
/// `individual_steps` only holds steps that were actually extracted; a missing
/// key means "not extracted" and is never represented by an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub individual_steps: BTreeMap<String, String>,
    #[serde(default)]
    pub step_by_step: String,
    #[serde(default)]
    pub comprehensive: String,
    #[serde(default)]
    pub educational: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// `None` only for legacy records persisted without a timestamp.
    #[serde(default)]
    pub analyzed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub routine_type: RoutineType,
}

fn default_confidence() -> f64 {
    CONFIDENCE_BASE
}

impl AnalysisRecord {
    /// Record with no extracted content, stamped now.
    pub fn empty(routine_type: RoutineType) -> Self {
        Self {
            individual_steps: BTreeMap::new(),
            step_by_step: String::new(),
            comprehensive: String::new(),
            educational: String::new(),
            confidence: CONFIDENCE_BASE,
            analyzed_at: Some(Utc::now()),
            routine_type,
        }
    }

    pub fn step(&self, key: &str) -> Option<&str> {
        self.individual_steps.get(key).map(String::as_str)
    }

    /// True when neither steps nor overview sections were extracted.
    pub fn is_empty(&self) -> bool {
        self.individual_steps.is_empty()
            && self.step_by_step.is_empty()
            && self.comprehensive.is_empty()
            && self.educational.is_empty()
    }
}

/// One teacher annotation on a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFeedback {
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Teacher annotations, owned by the review workflow and stored beside
/// (never merged into) the AI analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherFeedbackRecord {
    #[serde(default)]
    pub individual_steps: BTreeMap<String, StepFeedback>,
    pub feedback_at: DateTime<Utc>,
}

impl TeacherFeedbackRecord {
    pub fn new() -> Self {
        Self {
            individual_steps: BTreeMap::new(),
            feedback_at: Utc::now(),
        }
    }

    /// Insert or overwrite feedback for one step of `routine`.
    ///
    /// The key is matched against the routine schema ignoring case and
    /// separators, and stored under its canonical spelling.
    pub fn set_step(
        &mut self,
        routine: RoutineType,
        step: &str,
        feedback: impl Into<String>,
        score: Option<f64>,
    ) -> Result<(), AnalysisError> {
        let key = schema_for(routine)
            .canonical_key(step)
            .ok_or_else(|| AnalysisError::UnknownStep {
                routine,
                step: step.to_string(),
            })?;

        self.individual_steps.insert(
            key.to_string(),
            StepFeedback {
                feedback: feedback.into(),
                score,
            },
        );
        self.feedback_at = Utc::now();
        Ok(())
    }
}

impl Default for TeacherFeedbackRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Routine metadata persisted with every envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineInfo {
    #[serde(rename = "type")]
    pub routine_type: RoutineType,
    #[serde(default)]
    pub extracted_text: String,
}

impl RoutineInfo {
    pub fn new(routine_type: RoutineType, extracted_text: impl Into<String>) -> Self {
        Self {
            routine_type,
            extracted_text: extracted_text.into(),
        }
    }
}

/// The only shape ever written to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEnvelope {
    pub ai_analysis: AnalysisRecord,
    pub teacher_feedback: Option<TeacherFeedbackRecord>,
    pub routine_info: RoutineInfo,
}

impl StoredEnvelope {
    /// Swap in a fresh analysis, keeping whatever the teacher already wrote.
    pub fn replace_analysis(self, ai_analysis: AnalysisRecord) -> Self {
        Self {
            ai_analysis,
            teacher_feedback: self.teacher_feedback,
            routine_info: self.routine_info,
        }
    }
}

/// A persisted or freshly generated analysis value, classified by its first
/// non-whitespace character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawAnalysisInput<'a> {
    Json(&'a str),
    Markdown(&'a str),
}

impl<'a> RawAnalysisInput<'a> {
    /// `None` for empty or whitespace-only input.
    pub fn classify(raw: &'a str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            Some(Self::Json(trimmed))
        } else {
            Some(Self::Markdown(raw))
        }
    }
}
