use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::roster::Student;

/// One student placed on one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedItem {
    pub item: String,
    pub student_number: u32,
    pub student_name: String,
    /// Not part of the response body, kept for history updates and tests
    #[serde(skip)]
    pub student_id: String,
}

impl AssignedItem {
    pub fn new(item: &str, student: &Student) -> Self {
        Self {
            item: item.to_string(),
            student_number: student.number,
            student_name: student.display_name.clone(),
            student_id: student.id.clone(),
        }
    }
}

/// group label -> assignments in item order
pub type AssignmentResult = BTreeMap<String, Vec<AssignedItem>>;

/// A distinct item and how many students it needs this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSlot {
    pub item: String,
    pub multiplicity: usize,
}

/// Collapses repeated labels into slots, keeping first-appearance order
pub fn item_slots(items: &[String]) -> Vec<ItemSlot> {
    let mut slots: Vec<ItemSlot> = Vec::new();
    for item in items {
        match slots.iter_mut().find(|s| s.item == *item) {
            Some(slot) => slot.multiplicity += 1,
            None => slots.push(ItemSlot {
                item: item.clone(),
                multiplicity: 1,
            }),
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_labels_become_multiplicity() {
        let items: Vec<String> = ["Sweep", "Board", "Sweep"].iter().map(|s| s.to_string()).collect();
        let slots = item_slots(&items);
        assert_eq!(
            slots,
            vec![
                ItemSlot { item: "Sweep".to_string(), multiplicity: 2 },
                ItemSlot { item: "Board".to_string(), multiplicity: 1 },
            ]
        );
    }
}
