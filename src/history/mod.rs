//! Persisted fairness state
//!
//! Each assigner is stored as one record holding its fixed item list and an
//! opaque JSON history document. Saves are whole-document writes guarded by a
//! version number: a save based on a stale version is rejected so that two
//! concurrent runs cannot silently overwrite each other.

pub mod documents;
pub mod file;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use documents::{
    ItemAssignmentHistory, RotationHistoryDoc, SeatRecord, SeatingHistory, SeatingHistoryDoc,
};
pub use file::JsonFileHistoryStore;
pub use memory::InMemoryHistoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("History for assigner {assigner_id} changed during the run (expected version {expected}, found {found})")]
    VersionConflict {
        assigner_id: String,
        expected: u64,
        found: u64,
    },

    #[error("Assigner not found: {0}")]
    NotFound(String),

    #[error("Assigner already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid assigner id: {0}")]
    InvalidId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignerKind {
    Random,
    Rotation,
    Seat,
}

impl AssignerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignerKind::Random => "random",
            AssignerKind::Rotation => "rotation",
            AssignerKind::Seat => "seat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "random" => Some(AssignerKind::Random),
            "rotation" | "roundrobin" => Some(AssignerKind::Rotation),
            "seat" | "seats" => Some(AssignerKind::Seat),
            _ => None,
        }
    }
}

impl fmt::Display for AssignerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named block of seats; seats are only neighbors within the same zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatZone {
    pub name: String,
    pub seats: Vec<String>,
}

/// One assigner as persisted by a `HistoryStore`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignerRecord {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub kind: AssignerKind,
    /// Fixed at creation time
    pub items: Vec<String>,
    #[serde(default)]
    pub zones: Vec<SeatZone>,
    /// Rotation or seating history document; null until the first run
    #[serde(default)]
    pub history: serde_json::Value,
    /// 0 until the first successful run, then bumped by every save
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AssignerRecord {
    pub fn new(id: &str, owner_id: &str, name: &str, kind: AssignerKind, items: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            kind,
            items,
            zones: Vec::new(),
            history: serde_json::Value::Null,
            version: 0,
            updated_at: None,
        }
    }

    pub fn with_zones(mut self, zones: Vec<SeatZone>) -> Self {
        self.zones = zones;
        self
    }

    pub fn has_history(&self) -> bool {
        !self.history.is_null()
    }
}

/// Loads and saves assigner records
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Registers a new assigner; fails if the id is taken
    async fn create(&self, record: AssignerRecord) -> Result<(), StoreError>;

    async fn load(&self, assigner_id: &str) -> Result<Option<AssignerRecord>, StoreError>;

    /// Replaces the history document if the stored version still equals
    /// `expected_version`. Returns the new version.
    async fn save(
        &self,
        assigner_id: &str,
        history: serde_json::Value,
        expected_version: u64,
    ) -> Result<u64, StoreError>;
}

/// Applies a save to a loaded record, enforcing the version check
pub(crate) fn apply_save(
    record: &mut AssignerRecord,
    history: serde_json::Value,
    expected_version: u64,
) -> Result<u64, StoreError> {
    if record.version != expected_version {
        return Err(StoreError::VersionConflict {
            assigner_id: record.id.clone(),
            expected: expected_version,
            found: record.version,
        });
    }
    record.history = history;
    record.version += 1;
    record.updated_at = Some(Utc::now());
    Ok(record.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_parsing() {
        assert_eq!(AssignerKind::parse("Rotation"), Some(AssignerKind::Rotation));
        assert_eq!(AssignerKind::parse("seats"), Some(AssignerKind::Seat));
        assert_eq!(AssignerKind::parse("lottery"), None);
    }

    #[test]
    fn apply_save_bumps_version() {
        let mut record = AssignerRecord::new("a1", "u1", "Jobs", AssignerKind::Rotation, vec![]);
        assert!(!record.has_history());
        let version = apply_save(&mut record, json!({"schemaVersion": 1}), 0).unwrap();
        assert_eq!(version, 1);
        assert!(record.has_history());
        assert!(record.updated_at.is_some());
    }

    #[test]
    fn apply_save_rejects_stale_version() {
        let mut record = AssignerRecord::new("a1", "u1", "Jobs", AssignerKind::Rotation, vec![]);
        apply_save(&mut record, json!({}), 0).unwrap();
        let err = apply_save(&mut record, json!({"x": 1}), 0).unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict { expected: 0, found: 1, .. }
        ));
        assert_eq!(record.history, json!({}));
    }
}
