//! Maps routine-specific response keys onto the four positional slots
//! (`see`, `think`, `wonder`, `fourth_step`) the response view renders.
//!
//! Historical payloads were stored under routine-native names
//! (`connect`, `definition`, ...). Matching ignores case, `_`, `-` and
//! whitespace; keys with no mapping pass through untouched.

use std::collections::BTreeMap;

use super::registry::{fold_key, schema_for};
use crate::models::enums::{ResponseSlot, RoutineType};

/// Global synonym table. Keys are compared after `fold_key`.
static SYNONYMS: &[(&str, ResponseSlot)] = &[
    // 4C
    ("connect", ResponseSlot::See),
    ("challenge", ResponseSlot::Think),
    ("concepts", ResponseSlot::Wonder),
    ("changes", ResponseSlot::FourthStep),
    // Frayer Model
    ("definition", ResponseSlot::See),
    ("characteristics", ResponseSlot::Think),
    ("examples", ResponseSlot::Wonder),
    ("non_examples", ResponseSlot::FourthStep),
    // Circle of Viewpoints
    ("viewpoints", ResponseSlot::See),
    ("perspective", ResponseSlot::Think),
    ("questions", ResponseSlot::Wonder),
    // Used to Think / Now Think
    ("used_to_think", ResponseSlot::See),
    ("now_think", ResponseSlot::Think),
    // Legacy spellings of the fourth slot
    ("fourth", ResponseSlot::FourthStep),
    ("step4", ResponseSlot::FourthStep),
];

/// Resolution priority; lower wins when two input keys land on one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Priority {
    RoutineStep,
    SlotName,
    Synonym,
    PassThrough,
}

/// Slot named directly by `raw` (`"SEE"`, `"fourth-step"`).
fn slot_named(raw: &str) -> Option<ResponseSlot> {
    let folded = fold_key(raw);
    ResponseSlot::all()
        .iter()
        .copied()
        .find(|slot| fold_key(slot.as_str()) == folded)
}

/// Slot a key maps to through the global synonym table.
pub fn synonym_slot(raw: &str) -> Option<ResponseSlot> {
    let folded = fold_key(raw);
    SYNONYMS
        .iter()
        .find(|(name, _)| fold_key(name) == folded)
        .map(|(_, slot)| *slot)
}

/// Normalize a response map through the global synonym table.
///
/// Idempotent: a map that is already keyed by slots comes back unchanged.
pub fn normalize<K, V, I>(responses: I) -> BTreeMap<String, V>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
{
    resolve(responses, |key| {
        if let Some(slot) = slot_named(key) {
            return (slot.as_str().to_string(), Priority::SlotName);
        }
        if let Some(slot) = synonym_slot(key) {
            return (slot.as_str().to_string(), Priority::Synonym);
        }
        (key.to_string(), Priority::PassThrough)
    })
}

/// Normalize using a routine's own step order before the global table.
///
/// A step key of `routine` maps to the slot at its schema position, so
/// think-puzzle-explore's `think` lands in `see`. Apply it to routine-native
/// payloads: think-puzzle-explore's `think` is also a slot name, so feeding
/// an already normalized think-puzzle-explore map back in is not a no-op.
pub fn normalize_for_routine<K, V, I>(routine: RoutineType, responses: I) -> BTreeMap<String, V>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
{
    let schema = schema_for(routine);
    resolve(responses, |key| {
        if let Some(slot) = schema
            .canonical_key(key)
            .and_then(|step| schema.slot_of(step))
        {
            return (slot.as_str().to_string(), Priority::RoutineStep);
        }
        if let Some(slot) = slot_named(key) {
            return (slot.as_str().to_string(), Priority::SlotName);
        }
        if let Some(slot) = synonym_slot(key) {
            return (slot.as_str().to_string(), Priority::Synonym);
        }
        (key.to_string(), Priority::PassThrough)
    })
}

/// Map every key, then keep one value per target key: the best priority
/// wins, ties go to the lexicographically smallest original key so the
/// outcome never depends on input iteration order.
fn resolve<K, V, I, F>(responses: I, target: F) -> BTreeMap<String, V>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    F: Fn(&str) -> (String, Priority),
{
    let mut candidates: Vec<(String, Priority, String, V)> = responses
        .into_iter()
        .map(|(key, value)| {
            let original = key.as_ref().to_string();
            let (target_key, priority) = target(&original);
            (target_key, priority, original, value)
        })
        .collect();

    candidates.sort_by(|a, b| (&a.0, a.1, &a.2).cmp(&(&b.0, b.1, &b.2)));

    let mut normalized = BTreeMap::new();
    for (target_key, _, original, value) in candidates {
        if normalized.contains_key(&target_key) {
            tracing::debug!(
                key = %original,
                slot = %target_key,
                "Response key collides with a higher-priority key, dropped"
            );
            continue;
        }
        normalized.insert(target_key, value);
    }
    normalized
}
