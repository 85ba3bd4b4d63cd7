use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current layout of both persisted history documents
pub const SCHEMA_VERSION: u32 = 1;

/// `item -> student id -> occurrence count` for one class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemAssignmentHistory {
    counts: BTreeMap<String, BTreeMap<String, u32>>,
}

impl ItemAssignmentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, item: &str, student_id: &str) -> u32 {
        self.counts
            .get(item)
            .and_then(|students| students.get(student_id))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of a student's counts over every item this history knows about
    pub fn total_for(&self, student_id: &str) -> u32 {
        self.counts
            .values()
            .filter_map(|students| students.get(student_id))
            .sum()
    }

    pub fn increment(&mut self, item: &str, student_id: &str) {
        *self
            .counts
            .entry(item.to_string())
            .or_default()
            .entry(student_id.to_string())
            .or_insert(0) += 1;
    }

    /// Adds zero entries for items and students seen for the first time
    pub fn ensure_keys<'a, I>(&mut self, items: I, student_ids: &[&str])
    where
        I: IntoIterator<Item = &'a str>,
    {
        for item in items {
            let students = self.counts.entry(item.to_string()).or_default();
            for id in student_ids {
                students.entry(id.to_string()).or_insert(0);
            }
        }
    }

    pub fn counts_for(&self, item: &str) -> Option<&BTreeMap<String, u32>> {
        self.counts.get(item)
    }
}

/// Where a student has sat and who they have sat next to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRecord {
    #[serde(default)]
    pub neighbors: Vec<String>,
    #[serde(default)]
    pub seats: Vec<String>,
}

/// `student id -> seat record` for one class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatingHistory {
    students: BTreeMap<String, SeatRecord>,
}

impl SeatingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, student_id: &str) -> Option<&SeatRecord> {
        self.students.get(student_id)
    }

    pub fn record_mut(&mut self, student_id: &str) -> &mut SeatRecord {
        self.students.entry(student_id.to_string()).or_default()
    }

    pub fn has_sat_next_to(&self, student_id: &str, other_id: &str) -> bool {
        self.get(student_id)
            .map(|r| r.neighbors.iter().any(|n| n == other_id))
            .unwrap_or(false)
    }

    pub fn has_used_seat(&self, student_id: &str, seat: &str) -> bool {
        self.get(student_id)
            .map(|r| r.seats.iter().any(|s| s == seat))
            .unwrap_or(false)
    }
}

/// Rotation history of one assigner, per class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationHistoryDoc {
    pub schema_version: u32,
    #[serde(default)]
    pub classes: BTreeMap<String, ItemAssignmentHistory>,
}

impl Default for RotationHistoryDoc {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            classes: BTreeMap::new(),
        }
    }
}

/// Seating history of one assigner, per class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingHistoryDoc {
    pub schema_version: u32,
    #[serde(default)]
    pub classes: BTreeMap<String, SeatingHistory>,
}

impl Default for SeatingHistoryDoc {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            classes: BTreeMap::new(),
        }
    }
}

pub trait HistoryDocument: Serialize + DeserializeOwned + Default {
    fn schema_version(&self) -> u32;
}

impl HistoryDocument for RotationHistoryDoc {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl HistoryDocument for SeatingHistoryDoc {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

/// Decodes a stored document. Missing, malformed or unknown-version documents
/// start fresh instead of failing the run.
pub fn decode_or_fresh<T: HistoryDocument>(value: &serde_json::Value, assigner_id: &str) -> T {
    if value.is_null() {
        return T::default();
    }
    match serde_json::from_value::<T>(value.clone()) {
        Ok(doc) if doc.schema_version() == SCHEMA_VERSION => doc,
        Ok(doc) => {
            tracing::warn!(
                assigner_id,
                found = doc.schema_version(),
                expected = SCHEMA_VERSION,
                "Unknown history schema version, starting fresh"
            );
            T::default()
        }
        Err(e) => {
            tracing::warn!(assigner_id, error = %e, "Malformed history document, starting fresh");
            T::default()
        }
    }
}

pub fn encode<T: HistoryDocument>(doc: &T) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(doc)
}
