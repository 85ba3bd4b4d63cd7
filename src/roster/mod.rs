//! Roster retrieval
//!
//! Engines never read rosters themselves; the orchestrator asks a
//! `RosterProvider` for the class and, when groups are selected, for the
//! groups with their members.

pub mod csv_file;
pub mod memory;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use csv_file::CsvRosterProvider;
pub use memory::InMemoryRosterProvider;
pub use types::{ClassRoster, Group, Sex, Student};

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed roster: {0}")]
    Malformed(String),
}

/// Supplies students and group membership for a class
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Returns None when the class does not exist
    async fn get_class_roster(&self, class_id: &str) -> Result<Option<ClassRoster>, RosterError>;

    async fn get_groups_with_students(&self, class_id: &str) -> Result<Vec<Group>, RosterError>;
}
