use std::fmt;
use thiserror::Error;

use crate::history::StoreError;
use crate::roster::RosterError;

/// Which side of the items/students comparison a capacity check enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityRule {
    /// Every student needs an item (random, seats): items >= students
    ItemPerStudent,
    /// Every item needs a distinct student (rotation): items <= students
    StudentPerItem,
}

/// Details of a failed capacity check, used to build the user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityShortfall {
    pub assigner: String,
    pub items: usize,
    pub rule: CapacityRule,
    /// (label, student count) for every offending group, or a single entry for the class
    pub offenders: Vec<(String, usize)>,
    pub grouped: bool,
}

impl fmt::Display for CapacityShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = match self.rule {
            CapacityRule::ItemPerStudent => "not enough items",
            CapacityRule::StudentPerItem => "more items than students",
        };
        if self.grouped {
            let groups: Vec<String> = self
                .offenders
                .iter()
                .map(|(name, count)| format!("{} ({} students)", name, count))
                .collect();
            write!(
                f,
                "The assigner \"{}\" has {} items, {} for group(s): {}",
                self.assigner,
                self.items,
                noun,
                groups.join(", ")
            )
        } else {
            let students = self.offenders.first().map(|(_, c)| *c).unwrap_or(0);
            write!(
                f,
                "The assigner \"{}\" has {} items but {} students were selected ({})",
                self.assigner, self.items, students, noun
            )
        }
    }
}

#[derive(Error, Debug)]
pub enum AssignError {
    #[error("You must be signed in to run an assigner")]
    Auth,

    #[error("Please select {0} before running the assigner")]
    MissingSelection(&'static str),

    #[error("{0}")]
    InsufficientCapacity(CapacityShortfall),

    #[error("Could not find data for the selected group(s): {}", .0.join(", "))]
    MissingGroupData(Vec<String>),

    #[error("{0} not found")]
    NotFound(String),

    #[error("The assigner \"{name}\" is a {actual} assigner, not a {expected} assigner")]
    KindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Nothing to assign: {0}")]
    NothingToAssign(String),

    #[error("Seat \"{0}\" is not a seat number")]
    InvalidSeat(String),

    #[error("Assignment history storage failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("Failed to load class roster: {0}")]
    Roster(#[from] RosterError),
}

impl AssignError {
    /// Infrastructure failures are logged and replaced with a generic message;
    /// everything else is a validation failure the user can act on.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, AssignError::Persistence(_) | AssignError::Roster(_))
    }
}

pub type Result<T> = std::result::Result<T, AssignError>;
